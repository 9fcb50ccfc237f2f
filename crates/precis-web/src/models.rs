use serde::{Deserialize, Serialize};

use precis_core::{Reduction, SummaryReport};

/// Query parameters of `POST /upload`. Numbers arrive as strings so a bad
/// value produces our own error body rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    #[serde(rename = "type")]
    pub mode: Option<String>,
    pub sent_number: Option<String>,
    pub selected_keyword: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `type=paragraph`: the summary and its counts.
#[derive(Debug, Serialize)]
pub struct ParagraphResponse {
    pub text: String,
    #[serde(rename = "Rnum_word")]
    pub rnum_word: usize,
    #[serde(rename = "Rnum_sent")]
    pub rnum_sent: usize,
    pub statistics: Reduction,
}

/// `type=keywords`: the full summary report plus the caller's keywords.
#[derive(Debug, Serialize)]
pub struct KeywordSummaryResponse {
    pub keyword_summary: SummaryReport,
    pub num_word: usize,
    pub num_sent: usize,
    pub selected_keywords: Vec<String>,
    pub statistics: Reduction,
}

/// No `type`: the extracted text, its counts and its top keywords.
#[derive(Debug, Serialize)]
pub struct ExtractedTextResponse {
    pub text: String,
    #[serde(rename = "Lnum_word")]
    pub lnum_word: usize,
    #[serde(rename = "Lnum_sent")]
    pub lnum_sent: usize,
    /// Comma-joined, most frequent first.
    pub keywords: String,
}
