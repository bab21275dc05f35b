//! Port abstraction for turning an export document into file bytes.

use crate::domain::ExportDocument;

use super::define_port_error;

define_port_error! {
    /// Errors raised while rendering a document.
    pub enum DocumentRenderError {
        /// The output container could not be written.
        Write { message: String } => "document rendering failed: {message}",
    }
}

/// Synchronous renderer for one file format.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentRenderer: Send + Sync {
    /// Render `document` into the bytes of a complete file.
    fn render(&self, document: &ExportDocument) -> Result<Vec<u8>, DocumentRenderError>;
}
