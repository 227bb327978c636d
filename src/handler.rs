//! The conversion endpoint handler.
//!
//! ## Validation sequence
//!
//! ```text
//! normalise ─▶ allow-list ─▶ exists? ─▶ regular file? ─▶ symlink target allowed?
//!    │            403           404          400                  403
//!    ▼
//! convert (spawn_blocking) ─▶ persist (best effort) ─▶ result
//!    404 / 500
//! ```
//!
//! Each step short-circuits. The response echoes the caller's `file_path`
//! byte-for-byte, never the normalised form.

use crate::allow_list::normalize;
use crate::config::ServiceConfig;
use crate::converter::Converter;
use crate::error::{ConvertError, ServiceError};
use crate::persist::{self, PersistOutcome};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Body of `POST /extract_markdown`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionRequest {
    pub file_path: String,
}

/// Successful response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionResult {
    pub markdown_content: String,
    pub file_path: String,
}

/// Validates requests and drives the converter.
#[derive(Clone)]
pub struct ConversionHandler {
    config: Arc<ServiceConfig>,
    converter: Arc<dyn Converter>,
}

impl std::fmt::Debug for ConversionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionHandler")
            .field("config", &self.config)
            .field("converter", &"<dyn Converter>")
            .finish()
    }
}

impl ConversionHandler {
    pub fn new(config: Arc<ServiceConfig>, converter: Arc<dyn Converter>) -> Self {
        Self { config, converter }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Handle one request.
    pub async fn handle(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionResult, ServiceError> {
        let start = Instant::now();
        let requested = request.file_path;
        info!("Received request for: {}", requested);

        let result = self.process(&requested).await;
        match &result {
            Ok(r) => info!(
                "Completed {} ({} chars) in {}ms",
                requested,
                r.markdown_content.len(),
                start.elapsed().as_millis()
            ),
            Err(e) => error!("Request for {} failed: {}", requested, e),
        }
        result
    }

    async fn process(&self, requested: &str) -> Result<ConversionResult, ServiceError> {
        let path = self.validate(requested).await?;

        let converter = Arc::clone(&self.converter);
        let convert_path = path.clone();
        let markdown = tokio::task::spawn_blocking(move || converter.convert(&convert_path))
            .await
            .map_err(|e| {
                ConvertError::Internal(format!("conversion task panicked: {e}"))
                    .into_service_error(requested)
            })?
            .map_err(|e| e.into_service_error(requested))?;
        debug!("Markdown length: {} chars", markdown.len());

        if let PersistOutcome::Written(target) =
            persist::persist(&self.config, &path, &markdown).await
        {
            debug!("Output file: {}", target.display());
        }

        Ok(ConversionResult {
            markdown_content: markdown,
            file_path: requested.to_string(),
        })
    }

    /// Steps 1–4 of the sequence, plus the symlink-target check.
    ///
    /// Returns the normalised path to hand to the converter.
    pub async fn validate(&self, requested: &str) -> Result<PathBuf, ServiceError> {
        let normalized = normalize(Path::new(requested), &self.config.working_dir);
        debug!("Normalised path: {}", normalized.display());

        if !self.config.allowed.permits(&normalized) {
            return Err(ServiceError::Forbidden {
                path: requested.to_string(),
            });
        }

        // Existence is judged on the path as written, so a trailing separator
        // after a file name does not resolve.
        if requested.is_empty() {
            return Err(ServiceError::NotFound {
                path: requested.to_string(),
            });
        }
        let as_written = self.config.working_dir.join(requested);
        let metadata = match tokio::fs::metadata(&as_written).await {
            Ok(m) => m,
            Err(e) => {
                debug!("metadata({}) failed: {}", as_written.display(), e);
                return Err(ServiceError::NotFound {
                    path: requested.to_string(),
                });
            }
        };

        if !metadata.is_file() {
            return Err(ServiceError::InvalidInput {
                path: requested.to_string(),
            });
        }

        let canonical = tokio::fs::canonicalize(&normalized).await.map_err(|_| {
            ServiceError::NotFound {
                path: requested.to_string(),
            }
        })?;
        if !self.config.allowed.permits_resolved(&canonical) {
            return Err(ServiceError::Forbidden {
                path: requested.to_string(),
            });
        }

        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn handler_for(base: &Path, converter: Arc<dyn Converter>) -> ConversionHandler {
        let config = ServiceConfig::builder()
            .working_dir(base)
            .allowed_bases([base])
            .shared_data_root(None)
            .legacy_input_root(None)
            .build()
            .unwrap();
        ConversionHandler::new(Arc::new(config), converter)
    }

    fn echo_converter() -> Arc<dyn Converter> {
        Arc::new(|p: &Path| -> Result<String, ConvertError> {
            Ok(format!("# {}\n", p.file_name().unwrap().to_string_lossy()))
        })
    }

    #[tokio::test]
    async fn relative_path_is_resolved_against_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/report.pdf"), b"%PDF").unwrap();
        let handler = handler_for(dir.path(), echo_converter());

        let result = handler
            .handle(ConversionRequest {
                file_path: "./data/report.pdf".into(),
            })
            .await
            .unwrap();

        assert_eq!(result.markdown_content, "# report.pdf\n");
        assert_eq!(result.file_path, "./data/report.pdf");
    }

    #[tokio::test]
    async fn forbidden_is_checked_before_existence() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let converter: Arc<dyn Converter> =
            Arc::new(move |_: &Path| -> Result<String, ConvertError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(String::new())
            });
        let handler = handler_for(dir.path(), converter);

        for path in ["/etc/passwd", "/definitely/not/here.pdf", "../escape.pdf"] {
            let err = handler
                .handle(ConversionRequest {
                    file_path: path.into(),
                })
                .await
                .unwrap_err();
            assert!(
                matches!(err, ServiceError::Forbidden { .. }),
                "{path}: {err:?}"
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn directory_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let handler = handler_for(dir.path(), echo_converter());

        let err = handler.validate("sub").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn trailing_separator_after_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.pdf"), b"%PDF").unwrap();
        let handler = handler_for(dir.path(), echo_converter());

        let err = handler.validate("report.pdf/").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }), "{err:?}");
        assert!(handler.validate("report.pdf").await.is_ok());
    }

    #[tokio::test]
    async fn empty_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_for(dir.path(), echo_converter());

        let err = handler.validate("").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn converter_not_found_maps_to_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF").unwrap();
        let converter: Arc<dyn Converter> =
            Arc::new(|p: &Path| -> Result<String, ConvertError> {
                Err(ConvertError::FileNotFound {
                    path: p.to_path_buf(),
                })
            });
        let handler = handler_for(dir.path(), converter);

        let err = handler
            .handle(ConversionRequest {
                file_path: "a.pdf".into(),
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err, ServiceError::VanishedDuringConversion { .. }),
            "{err:?}"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_escaping_allow_list_is_forbidden() {
        let allowed = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let secret = outside.path().join("secret.pdf");
        std::fs::write(&secret, b"%PDF").unwrap();
        std::os::unix::fs::symlink(&secret, allowed.path().join("link.pdf")).unwrap();
        let handler = handler_for(allowed.path(), echo_converter());

        let err = handler.validate("link.pdf").await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden { .. }), "{err:?}");
    }
}
