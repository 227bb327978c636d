//! Stages of the default PDFium converter.
//!
//! ## Data Flow
//!
//! ```text
//! bind ──▶ extract ──▶ structure ──▶ postprocess
//! (pdfium)  (text layer)  (markdown)   (cleanup)
//! ```
//!
//! 1. [`bind`]: locate and load the pdfium shared library
//! 2. [`extract`]: open the document, read metadata and each page's
//!    text layer; blocking, so callers run it in `spawn_blocking`
//! 3. [`structure`]: turn raw page text into Markdown blocks (bullets,
//!    headings, hyphenated line breaks)
//! 4. [`postprocess`]: deterministic whitespace and character cleanup

pub mod bind;
pub mod extract;
pub mod postprocess;
pub mod structure;
