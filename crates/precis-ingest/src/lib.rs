use std::path::{Path, PathBuf};

use thiserror::Error;

use precis_core::{BackendError, FileType, ModelError, OcrBackend, PdfBackend, Pipeline, SummaryReport};

pub mod docx;
pub mod ocr;

pub use docx::DocxError;
pub use ocr::TesseractOcr;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Unsupported file format")]
    UnsupportedFormat { extension: Option<String> },
    #[error("PDF extraction error: {0}")]
    Pdf(#[source] BackendError),
    #[error("DOCX extraction error: {0}")]
    Docx(#[from] DocxError),
    #[error("OCR error: {0}")]
    Ocr(#[source] BackendError),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    /// True when the error is caused by the uploaded file itself (a corrupt
    /// or unreadable document) rather than by the host.
    pub fn is_client_error(&self) -> bool {
        match self {
            IngestError::UnsupportedFormat { .. } => true,
            IngestError::Pdf(e) | IngestError::Ocr(e) => e.is_document_error(),
            IngestError::Docx(DocxError::Io(_)) => false,
            IngestError::Docx(_) => true,
            IngestError::Io { .. } => false,
        }
    }
}

/// Backend used when the crate is built without the `pdf` feature.
#[cfg(not(feature = "pdf"))]
struct NoPdfSupport;

#[cfg(not(feature = "pdf"))]
impl PdfBackend for NoPdfSupport {
    fn extract_text(&self, _path: &Path) -> Result<String, BackendError> {
        Err(BackendError::Unavailable(
            "PDF support not compiled in (enable the `pdf` feature of precis-ingest)".into(),
        ))
    }
}

#[cfg(feature = "pdf")]
fn default_pdf_backend() -> Box<dyn PdfBackend> {
    Box::new(precis_pdf_mupdf::MupdfBackend::new())
}

#[cfg(not(feature = "pdf"))]
fn default_pdf_backend() -> Box<dyn PdfBackend> {
    Box::new(NoPdfSupport)
}

/// Routes a stored file to the extraction routine for its extension.
///
/// PDF and OCR engines are pluggable; DOCX and plain text are read in-crate.
pub struct Extractor {
    pdf: Box<dyn PdfBackend>,
    ocr: Box<dyn OcrBackend>,
}

impl Extractor {
    pub fn new(pdf: Box<dyn PdfBackend>, ocr: Box<dyn OcrBackend>) -> Self {
        Self { pdf, ocr }
    }

    /// The default PDF backend with the given OCR engine.
    pub fn with_ocr(ocr: Box<dyn OcrBackend>) -> Self {
        Self::new(default_pdf_backend(), ocr)
    }

    /// The default PDF backend plus Tesseract at `tesseract_path`.
    pub fn with_tesseract(tesseract_path: impl Into<String>) -> Self {
        Self::with_ocr(Box::new(TesseractOcr::new(tesseract_path)))
    }

    /// Extract the text of `path`, dispatching on its extension:
    /// - `.pdf` → PDF backend, pages concatenated
    /// - `.docx` → body paragraphs, each followed by `\n`
    /// - `.txt` → file contents
    /// - `.png`, `.jpg`, `.jpeg` → OCR
    pub fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        match FileType::from_path(path) {
            Some(file_type) => self.extract_as(path, file_type),
            None => Err(IngestError::UnsupportedFormat {
                extension: path
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase()),
            }),
        }
    }

    pub fn extract_as(&self, path: &Path, file_type: FileType) -> Result<String, IngestError> {
        tracing::debug!(path = %path.display(), ?file_type, "extracting text");
        match file_type {
            FileType::Pdf => self.pdf.extract_text(path).map_err(IngestError::Pdf),
            FileType::Docx => Ok(docx::extract_text(path)?),
            FileType::Text => read_text_file(path),
            FileType::Image => self.ocr.image_to_string(path).map_err(IngestError::Ocr),
        }
    }
}

/// Read a text file. Invalid UTF-8 is replaced rather than rejected.
fn read_text_file(path: &Path) -> Result<String, IngestError> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            tracing::warn!(path = %path.display(), "text file is not valid UTF-8, decoding lossily");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Summarize a file or a literal piece of text.
///
/// When `input` names an existing file it is extracted through `extractor`;
/// otherwise `input` itself is the text to summarize.
pub fn summarize_input(
    extractor: &Extractor,
    pipeline: &Pipeline,
    input: &str,
    num_sentences: usize,
) -> Result<SummaryReport, SummarizeError> {
    let path = Path::new(input);
    let text = if path.is_file() {
        extractor.extract_text(path)?
    } else {
        input.to_string()
    };
    Ok(pipeline.report(&text, num_sentences)?)
}
