//! PDFium library binding.
//!
//! Resolution order (first match wins):
//!
//! 1. an explicit path from [`crate::ConversionConfig::pdfium_lib_path`]
//! 2. `PDFIUM_LIB_PATH`: a library file or a directory containing one
//! 3. the platform library name in the current directory (`./libpdfium.so`)
//! 4. the system library search path

use crate::error::ConvertError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment override for the pdfium library location.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to a pdfium library.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, ConvertError> {
    let mut failures = Vec::new();

    let env_path = std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from);
    for candidate in explicit.map(Path::to_path_buf).into_iter().chain(env_path) {
        let lib = library_file(&candidate);
        match Pdfium::bind_to_library(&lib) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", lib.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => failures.push(format!("{}: {e:?}", lib.display())),
        }
    }

    match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./")) {
        Ok(bindings) => return Ok(Pdfium::new(bindings)),
        Err(e) => failures.push(format!("./: {e:?}")),
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => Ok(Pdfium::new(bindings)),
        Err(e) => {
            failures.push(format!("system: {e:?}"));
            Err(ConvertError::PdfiumBindingFailed(failures.join("; ")))
        }
    }
}

/// A directory means "the platform library inside this directory".
fn library_file(candidate: &Path) -> PathBuf {
    if candidate.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(candidate)
    } else {
        candidate.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_candidate_resolves_to_platform_library() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library_file(dir.path());
        assert!(lib.starts_with(dir.path()));
        assert_ne!(lib, dir.path());
    }

    #[test]
    fn file_candidate_is_used_verbatim() {
        let lib = library_file(Path::new("/opt/pdfium/lib/libpdfium.so"));
        assert_eq!(lib, PathBuf::from("/opt/pdfium/lib/libpdfium.so"));
    }
}
