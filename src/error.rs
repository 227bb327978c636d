//! Error types for the pdf2md service.
//!
//! Two distinct error types reflect two distinct layers:
//!
//! * [`ServiceError`] (**request level**): the outcome a caller of
//!   `POST /extract_markdown` sees. Each variant maps to exactly one HTTP
//!   status code and carries the human-readable `detail` string returned in
//!   the JSON body.
//!
//! * [`ConvertError`] (**converter level**): why a [`crate::Converter`]
//!   could not turn a file into Markdown (not a PDF, corrupt, encrypted,
//!   PDFium unavailable). The handler folds these into
//!   [`ServiceError::VanishedDuringConversion`] or [`ServiceError::Internal`].
//!
//! * [`ConfigError`] (**startup**): an invalid [`crate::ServiceConfig`] or
//!   [`crate::ConversionConfig`], reported by the builders before anything
//!   is served.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Every way a conversion request can fail.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The normalised path is outside every allowed base directory.
    #[error("Access to the requested path is forbidden.")]
    Forbidden { path: String },

    /// Nothing exists at the requested path.
    #[error("File not found at path: {path}")]
    NotFound { path: String },

    /// The file disappeared between the existence check and the conversion.
    #[error("File not found during processing: {path}")]
    VanishedDuringConversion { path: String },

    /// The path exists but is not a regular file.
    #[error("The provided path is not a regular file.")]
    InvalidInput { path: String },

    /// The converter failed for any other reason.
    #[error("Internal server error while processing the file: {message}")]
    Internal { message: String },
}

impl ServiceError {
    /// HTTP status code reported for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ServiceError::NotFound { .. } | ServiceError::VanishedDuringConversion { .. } => {
                StatusCode::NOT_FOUND
            }
            ServiceError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}

/// Errors raised by a [`crate::Converter`].
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The file could not be opened because it no longer exists.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}' (first bytes: {magic:?})")]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was configured.
    #[error("PDF '{path}' is encrypted and requires a password")]
    PasswordRequired { path: PathBuf },

    /// A password was configured but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Text extraction failed for a specific page.
    #[error("Text extraction failed for page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Invalid configuration, rejected by a builder's `build()`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `std::env::current_dir()` failed and no working directory was given.
    #[error("Cannot determine working directory: {0}")]
    WorkingDirUnavailable(#[source] std::io::Error),

    /// The working directory must be absolute so relative requests resolve
    /// to a stable location.
    #[error("Working directory must be absolute, got '{path}'")]
    RelativeWorkingDir { path: PathBuf },

    /// A custom page separator consisting only of whitespace.
    #[error("Custom page separator must not be blank")]
    BlankPageSeparator,
}

impl ConvertError {
    /// Fold a converter failure into the request-level taxonomy.
    ///
    /// `requested` is the caller's original path string, echoed in the
    /// `detail` message.
    pub fn into_service_error(self, requested: &str) -> ServiceError {
        match self {
            ConvertError::FileNotFound { .. } => ServiceError::VanishedDuringConversion {
                path: requested.to_string(),
            },
            other => ServiceError::Internal {
                message: other.to_string(),
            },
        }
    }
}
