//! The converter seam.
//!
//! The handler only knows [`Converter`]: a blocking `path → Markdown`
//! function. [`PdfiumConverter`] is the production implementation; tests and
//! embedders can plug in anything else.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::output::ConversionOutput;
use crate::pipeline::{bind, extract, postprocess, structure};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Transforms a document on disk into Markdown text.
///
/// Implementations are called from `spawn_blocking` and may block freely.
/// A missing file must be reported as [`ConvertError::FileNotFound`] so the
/// handler can answer `404` instead of `500`.
pub trait Converter: Send + Sync {
    fn convert(&self, path: &Path) -> Result<String, ConvertError>;
}

impl<F> Converter for F
where
    F: Fn(&Path) -> Result<String, ConvertError> + Send + Sync,
{
    fn convert(&self, path: &Path) -> Result<String, ConvertError> {
        self(path)
    }
}

/// Text-layer converter backed by pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumConverter {
    config: ConversionConfig,
}

impl PdfiumConverter {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert and return the full output, including metadata.
    pub fn convert_document(&self, path: &Path) -> Result<ConversionOutput, ConvertError> {
        let start = Instant::now();
        let pdfium = bind::bind_pdfium(self.config.pdfium_lib_path.as_deref())?;
        let extracted =
            extract::extract_document(&pdfium, path, self.config.password.as_deref())?;

        let empty_pages: Vec<usize> = extracted
            .pages
            .iter()
            .enumerate()
            .filter(|(_, text)| text.trim().is_empty())
            .map(|(idx, _)| idx + 1)
            .collect();
        if !empty_pages.is_empty() {
            warn!(
                "{} of {} pages have no text layer: {:?}",
                empty_pages.len(),
                extracted.metadata.page_count,
                empty_pages
            );
        }

        let mut markdown = String::new();
        if self.config.include_metadata {
            markdown.push_str(&extracted.metadata.to_front_matter());
        }
        markdown.push_str(&structure::assemble_pages(
            &extracted.pages,
            &self.config.page_separator,
        ));
        let markdown = postprocess::clean_markdown(&markdown);

        info!(
            "Converted {} ({} pages, {} chars) in {}ms",
            path.display(),
            extracted.metadata.page_count,
            markdown.len(),
            start.elapsed().as_millis()
        );
        debug!("Empty pages: {:?}", empty_pages);

        Ok(ConversionOutput {
            markdown,
            metadata: extracted.metadata,
            empty_pages,
        })
    }
}

impl Converter for PdfiumConverter {
    fn convert(&self, path: &Path) -> Result<String, ConvertError> {
        self.convert_document(path).map(|output| output.markdown)
    }
}
