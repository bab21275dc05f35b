//! Document renderers for lesson exports.
//!
//! Both adapters implement the `DocumentRenderer` port and emit small,
//! dependency-light files: a Helvetica-only PDF and a stored-entry DOCX.

mod docx;
mod pdf;

pub use docx::DocxRenderer;
pub use pdf::PlainPdfRenderer;
