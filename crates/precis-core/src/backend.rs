use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open document: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    /// The backend's external engine could not be started at all.
    #[error("extraction engine unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// True when the failure is attributable to the uploaded document
    /// rather than to the host (missing binary, IO trouble).
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            BackendError::OpenError(_) | BackendError::ExtractionError(_)
        )
    }
}

/// Trait for PDF text extraction backends.
///
/// Implementors return the text of every page concatenated in page order,
/// with no separator inserted between pages.
pub trait PdfBackend: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;
}

/// Trait for OCR engines that read the text of a whole image.
pub trait OcrBackend: Send + Sync {
    fn image_to_string(&self, path: &Path) -> Result<String, BackendError>;
}
