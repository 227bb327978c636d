//! # pdf2md-service
//!
//! An HTTP service that converts PDF files already present on the server's
//! filesystem into Markdown.
//!
//! A caller posts a path; the service checks the path against an allow-list
//! of base directories, verifies it names a regular file, runs the converter
//! and answers with the Markdown. Inputs under the shared data root also get
//! a sibling `.md` file written next to them.
//!
//! ## Request Flow
//!
//! ```text
//! POST /extract_markdown {"file_path": "..."}
//!  │
//!  ├─ 1. Normalise   lexical, relative to the configured working directory
//!  ├─ 2. Allow-list  segment-wise containment            → 403
//!  ├─ 3. Exists?                                          → 404
//!  ├─ 4. Regular file?                                    → 400
//!  ├─ 5. Convert     pdfium text layer (spawn_blocking)   → 404 / 500
//!  ├─ 6. Persist     sibling or legacy output, best effort
//!  └─ 7. Respond     {"markdown_content", "file_path"}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2md_service::{ConversionHandler, PdfiumConverter, ServiceConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Working directory + /app/data + /app/input + $ALLOWED_BASE_PATH
//!     let config = Arc::new(ServiceConfig::from_env()?);
//!     let converter = Arc::new(PdfiumConverter::new(config.conversion.clone()));
//!     let handler = Arc::new(ConversionHandler::new(Arc::clone(&config), converter));
//!     pdf2md_service::serve(config.bind_addr, handler).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2md-service` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod allow_list;
pub mod config;
pub mod converter;
pub mod error;
pub mod handler;
pub mod output;
pub mod persist;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use allow_list::AllowedBaseSet;
pub use config::{
    ConversionConfig, ConversionConfigBuilder, PageSeparator, ServiceConfig, ServiceConfigBuilder,
};
pub use converter::{Converter, PdfiumConverter};
pub use error::{ConfigError, ConvertError, ServiceError};
pub use handler::{ConversionHandler, ConversionRequest, ConversionResult};
pub use output::{ConversionOutput, DocumentMetadata};
pub use persist::PersistOutcome;
pub use server::{build_router, serve};
