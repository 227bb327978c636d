//! Text-layer extraction via pdfium.
//!
//! Everything here is blocking; [`crate::PdfiumConverter`] is invoked from
//! `spawn_blocking` by the handler.

use crate::error::ConvertError;
use crate::output::DocumentMetadata;
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Raw extraction result: metadata plus one text string per page.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub metadata: DocumentMetadata,
    pub pages: Vec<String>,
}

/// Open `pdf_path` with pdfium and read every page's text layer.
pub fn extract_document(
    pdfium: &Pdfium,
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<ExtractedDocument, ConvertError> {
    check_magic(pdf_path)?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| classify_load_error(pdf_path, password.is_some(), e))?;

    let metadata = read_metadata(&document);
    info!(
        "PDF loaded: {} pages ({})",
        metadata.page_count,
        pdf_path.display()
    );

    let mut pages = Vec::with_capacity(metadata.page_count);
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| ConvertError::ExtractionFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?
            .all();
        debug!("Page {} → {} chars", idx + 1, text.len());
        pages.push(text);
    }

    Ok(ExtractedDocument { metadata, pages })
}

/// Reject files that do not start with `%PDF` before handing them to pdfium.
fn check_magic(path: &Path) -> Result<(), ConvertError> {
    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConvertError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ConvertError::Internal(format!("cannot open '{}': {e}", path.display())),
    })?;

    let mut magic = Vec::with_capacity(4);
    file.by_ref()
        .take(4)
        .read_to_end(&mut magic)
        .map_err(|e| ConvertError::Internal(format!("cannot read '{}': {e}", path.display())))?;

    if magic.as_slice() != b"%PDF" {
        return Err(ConvertError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

fn classify_load_error(path: &Path, had_password: bool, e: PdfiumError) -> ConvertError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if had_password {
            ConvertError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            ConvertError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else if err_str.contains("FileError") && !path.exists() {
        ConvertError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        ConvertError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}

fn read_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn magic_check_rejects_non_pdf() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello, not a pdf").unwrap();
        match check_magic(f.path()) {
            Err(ConvertError::NotAPdf { magic, .. }) => assert_eq!(magic, b"hell"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn magic_check_rejects_empty_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            check_magic(f.path()),
            Err(ConvertError::NotAPdf { .. })
        ));
    }

    #[test]
    fn magic_check_accepts_pdf_header() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n").unwrap();
        assert!(check_magic(f.path()).is_ok());
    }

    #[test]
    fn magic_check_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.pdf");
        assert!(matches!(
            check_magic(&missing),
            Err(ConvertError::FileNotFound { .. })
        ));
    }
}
