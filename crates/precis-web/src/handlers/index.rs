use axum::Json;

use crate::models::MessageResponse;

pub async fn index() -> &'static str {
    "Welcome to Text Summarization"
}

/// `GET /upload` only acknowledges the request.
pub async fn upload_info() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "GET request received",
    })
}
