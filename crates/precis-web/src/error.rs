use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use precis_core::ModelError;
use precis_ingest::IngestError;

/// Every error the upload endpoint can answer with. The message is sent to
/// the client as `{"error": "<message>"}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request or the uploaded document is at fault.
    #[error("{0}")]
    Input(String),
    /// The request body exceeds the upload limit.
    #[error("{0}")]
    TooLarge(String),
    /// No extractor exists for the file's extension.
    #[error("{0}")]
    Unsupported(String),
    /// Model, OCR engine, disk or worker failure.
    #[error("{0}")]
    Processing(String),
}

impl ApiError {
    pub fn input(message: impl Into<String>) -> Self {
        ApiError::Input(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Input(_) => StatusCode::BAD_REQUEST,
            ApiError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Unsupported(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::UnsupportedFormat { .. } => ApiError::Unsupported(e.to_string()),
            _ if e.is_client_error() => ApiError::Input(e.to_string()),
            _ => ApiError::Processing(e.to_string()),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        ApiError::Processing(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Processing(format!("worker task failed: {e}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Processing(_) => tracing::error!("request failed: {}", self),
            ApiError::Input(_) | ApiError::TooLarge(_) | ApiError::Unsupported(_) => {
                tracing::debug!("rejected request: {}", self)
            }
        }
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use precis_core::BackendError;

    #[test]
    fn ingest_errors_map_to_statuses() {
        let unsupported: ApiError = IngestError::UnsupportedFormat {
            extension: Some("exe".into()),
        }
        .into();
        assert_eq!(unsupported.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(unsupported.to_string(), "Unsupported file format");

        let corrupt: ApiError = IngestError::Pdf(BackendError::OpenError("bad xref".into())).into();
        assert_eq!(corrupt.status_code(), StatusCode::BAD_REQUEST);

        let no_tesseract: ApiError =
            IngestError::Ocr(BackendError::Unavailable("tesseract".into())).into();
        assert_eq!(no_tesseract.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn model_errors_are_processing_failures() {
        let err: ApiError = ModelError::Inference("oom".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
