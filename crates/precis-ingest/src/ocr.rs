use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use precis_core::{BackendError, OcrBackend};

/// OCR through the `tesseract` command-line tool.
///
/// Runs `tesseract <image> stdout` over the whole image with the engine's
/// default language and page segmentation.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// True when the binary can be started (`tesseract --version` exits 0).
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl OcrBackend for TesseractOcr {
    fn image_to_string(&self, path: &Path) -> Result<String, BackendError> {
        let output = Command::new(&self.binary)
            .arg(path)
            .arg("stdout")
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => BackendError::Unavailable(
                    format!("failed to run '{}': {}", self.binary, e),
                ),
                _ => BackendError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::ExtractionError(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        tracing::debug!(path = %path.display(), chars = text.len(), "ocr complete");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_unavailable() {
        let ocr = TesseractOcr::new("/nonexistent/bin/tesseract-precis");
        let err = ocr.image_to_string(Path::new("scan.png")).unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
        assert!(!err.is_document_error());
        assert!(!ocr.is_available());
    }

    #[cfg(unix)]
    #[test]
    fn passes_image_then_stdout() {
        // `echo` stands in for tesseract and reflects the arguments it was given
        let ocr = TesseractOcr::new("echo");
        let text = ocr.image_to_string(Path::new("scan.png")).unwrap();
        assert_eq!(text, "scan.png stdout\n");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_an_extraction_error() {
        let ocr = TesseractOcr::new("false");
        let err = ocr.image_to_string(Path::new("scan.png")).unwrap_err();
        assert!(matches!(err, BackendError::ExtractionError(_)));
        assert!(err.is_document_error());
    }
}
