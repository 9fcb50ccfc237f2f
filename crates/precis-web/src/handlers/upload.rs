use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Query, State};
use axum::response::{IntoResponse, Response};

use precis_core::{DEFAULT_KEYWORD_COUNT, DEFAULT_SENTENCE_COUNT, Reduction, TextStats, allowed_file};

use crate::error::ApiError;
use crate::models::{ExtractedTextResponse, KeywordSummaryResponse, ParagraphResponse, UploadParams};
use crate::state::AppState;
use crate::upload::{self, secure_filename};

/// `POST /upload`: store the file, extract its text, then answer according
/// to `type` (`paragraph`, `keywords`, or anything else for the raw text).
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|_| ApiError::input("No file part"))?;
    let file = upload::parse_multipart(multipart).await?;

    if !allowed_file(&file.filename) {
        return Err(ApiError::input("Invalid file type"));
    }
    let safe_name = secure_filename(&file.filename);
    if safe_name.is_empty() {
        return Err(ApiError::input("Invalid file name"));
    }

    let path = state.upload_dir.join(&safe_name);
    tokio::fs::write(&path, &file.data)
        .await
        .map_err(|e| ApiError::Processing(format!("Failed to save upload: {}", e)))?;
    tracing::info!(filename = %safe_name, bytes = file.data.len(), "upload saved");

    let extractor = state.extractor.clone();
    let text = run_blocking(move || Ok(extractor.extract_text(&path)?)).await?;

    let sent_number = parse_sent_number(params.sent_number.as_deref())?;
    let original = TextStats::of(&text);
    let pipeline = state.pipeline.clone();

    match params.mode.as_deref() {
        Some("paragraph") => {
            let summary = run_blocking(move || Ok(pipeline.summarize(&text, sent_number)?)).await?;
            let summarized = TextStats::of(&summary);
            tracing::info!(
                filename = %safe_name,
                original_words = original.words,
                summary_words = summarized.words,
                "paragraph summary"
            );
            Ok(Json(ParagraphResponse {
                text: summary,
                rnum_word: summarized.words,
                rnum_sent: summarized.sentences,
                statistics: Reduction::between(&original, &summarized),
            })
            .into_response())
        }
        Some("keywords") => {
            let Some(selected) = params.selected_keyword else {
                return Err(ApiError::input("Invalid keywords"));
            };
            let selected_keywords: Vec<String> = selected
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();

            let report = run_blocking(move || Ok(pipeline.report(&text, sent_number)?)).await?;
            tracing::info!(
                filename = %safe_name,
                selected = selected_keywords.len(),
                summary_words = report.summarized_words,
                "keyword summary"
            );
            Ok(Json(KeywordSummaryResponse {
                num_word: report.summarized_words,
                num_sent: report.summarized_sentences,
                selected_keywords,
                statistics: report.reduction(),
                keyword_summary: report,
            })
            .into_response())
        }
        _ => {
            let (text, keywords) = run_blocking(move || {
                let keywords = pipeline.keywords(&text, DEFAULT_KEYWORD_COUNT)?;
                Ok((text, keywords))
            })
            .await?;
            tracing::info!(filename = %safe_name, words = original.words, "text extracted");
            Ok(Json(ExtractedTextResponse {
                text,
                lnum_word: original.words,
                lnum_sent: original.sentences,
                keywords: keywords.join(","),
            })
            .into_response())
        }
    }
}

fn parse_sent_number(raw: Option<&str>) -> Result<usize, ApiError> {
    match raw {
        None => Ok(DEFAULT_SENTENCE_COUNT),
        Some(s) => s
            .trim()
            .parse()
            .map_err(|_| ApiError::input(format!("Invalid sent_number: {s}"))),
    }
}

/// Run extraction or inference on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use axum_test::multipart::{MultipartForm, Part};
    use docx_rs::{Docx, Paragraph, Run};
    use serde_json::Value;

    use precis_core::{
        BackendError, ModelError, OcrBackend, PartOfSpeech, PdfBackend, Pipeline, PosTagger,
        Summarizer, TaggedToken,
    };
    use precis_ingest::Extractor;

    use super::*;
    use crate::routes::build_router;

    const TEXT: &str =
        "Rust makes systems programming safe. It has no garbage collector. Cargo builds it.";

    struct FirstSentence;

    impl Summarizer for FirstSentence {
        fn summarize(&self, text: &str, _target: usize) -> Result<String, ModelError> {
            Ok(text.split_inclusive('.').next().unwrap_or("").trim().to_string())
        }
    }

    struct Broken;

    impl Summarizer for Broken {
        fn summarize(&self, _text: &str, _target: usize) -> Result<String, ModelError> {
            Err(ModelError::Inference("session crashed".into()))
        }
    }

    /// Words longer than three letters are nouns.
    struct LongWordsAreNouns;

    impl PosTagger for LongWordsAreNouns {
        fn tag(&self, text: &str) -> Result<Vec<TaggedToken>, ModelError> {
            Ok(text
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(|w| {
                    let pos = if w.len() > 3 {
                        PartOfSpeech::Noun
                    } else {
                        PartOfSpeech::Det
                    };
                    TaggedToken::new(w, pos)
                })
                .collect())
        }
    }

    struct NoPdf;

    impl PdfBackend for NoPdf {
        fn extract_text(&self, _path: &Path) -> Result<String, BackendError> {
            Err(BackendError::OpenError("not a PDF".into()))
        }
    }

    struct FixedOcr;

    impl OcrBackend for FixedOcr {
        fn image_to_string(&self, _path: &Path) -> Result<String, BackendError> {
            Ok(TEXT.to_string())
        }
    }

    fn server_with(summarizer: Arc<dyn Summarizer>, upload_dir: &Path) -> TestServer {
        server_limited(summarizer, upload_dir, 1024 * 1024)
    }

    fn server_limited(
        summarizer: Arc<dyn Summarizer>,
        upload_dir: &Path,
        max_upload_bytes: usize,
    ) -> TestServer {
        let state = Arc::new(AppState {
            pipeline: Pipeline::new(summarizer, Arc::new(LongWordsAreNouns)),
            extractor: Arc::new(Extractor::new(Box::new(NoPdf), Box::new(FixedOcr))),
            upload_dir: upload_dir.to_path_buf(),
        });
        TestServer::new(build_router(state, max_upload_bytes)).unwrap()
    }

    fn server(upload_dir: &Path) -> TestServer {
        server_with(Arc::new(FirstSentence), upload_dir)
    }

    fn file_form(name: &str, contents: &[u8]) -> MultipartForm {
        MultipartForm::new().add_part("file", Part::bytes(contents.to_vec()).file_name(name))
    }

    fn approx(value: &Value, expected: f64) {
        let actual = value.as_f64().unwrap();
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[tokio::test]
    async fn index_and_upload_info() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let response = server.get("/").await;
        response.assert_status_ok();
        response.assert_text("Welcome to Text Summarization");

        let response = server.get("/upload").await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            serde_json::json!({"message": "GET request received"})
        );
    }

    #[tokio::test]
    async fn paragraph_summary_reports_reduction() {
        let dir = tempfile::tempdir().unwrap();
        let response = server(dir.path())
            .post("/upload")
            .add_query_param("type", "paragraph")
            .add_query_param("sent_number", "2")
            .multipart(file_form("notes.txt", TEXT.as_bytes()))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["text"], "Rust makes systems programming safe.");
        assert_eq!(body["Rnum_word"], 5);
        assert_eq!(body["Rnum_sent"], 1);
        approx(&body["statistics"]["reduction_word"], (13.0 - 5.0) / 13.0 * 100.0);
        approx(&body["statistics"]["reduction_sentence"], (3.0 - 1.0) / 3.0 * 100.0);
    }

    #[tokio::test]
    async fn keywords_mode_requires_selection() {
        let dir = tempfile::tempdir().unwrap();
        let response = server(dir.path())
            .post("/upload")
            .add_query_param("type", "keywords")
            .multipart(file_form("notes.txt", TEXT.as_bytes()))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Invalid keywords");
    }

    #[tokio::test]
    async fn keywords_mode_returns_report() {
        let dir = tempfile::tempdir().unwrap();
        let response = server(dir.path())
            .post("/upload")
            .add_query_param("type", "keywords")
            .add_query_param("selected_keyword", " rust , safety,")
            .multipart(file_form("notes.txt", TEXT.as_bytes()))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let report = &body["keyword_summary"];
        assert_eq!(report["summary"], "Rust makes systems programming safe.");
        assert_eq!(report["original_sentences"], 3);
        assert_eq!(report["original_words"], 13);
        assert_eq!(report["summarized_sentences"], 1);
        assert_eq!(report["summarized_words"], 5);
        assert_eq!(
            report["keywords"],
            serde_json::json!(["Rust", "makes", "systems", "programming", "safe"])
        );
        assert_eq!(body["num_word"], 5);
        assert_eq!(body["num_sent"], 1);
        assert_eq!(body["selected_keywords"], serde_json::json!(["rust", "safety"]));
        approx(&body["statistics"]["reduction_word"], (13.0 - 5.0) / 13.0 * 100.0);
    }

    #[tokio::test]
    async fn default_mode_returns_text_and_keywords() {
        let dir = tempfile::tempdir().unwrap();
        let response = server(dir.path())
            .post("/upload")
            .multipart(file_form("scan.PNG", b"\x89PNG"))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["text"], TEXT);
        assert_eq!(body["Lnum_word"], 13);
        assert_eq!(body["Lnum_sent"], 3);
        assert_eq!(body["keywords"], "Rust,makes,systems,programming,safe");
    }

    #[tokio::test]
    async fn upload_is_saved_under_sanitized_name() {
        let dir = tempfile::tempdir().unwrap();
        server(dir.path())
            .post("/upload")
            .multipart(file_form("../my notes.txt", TEXT.as_bytes()))
            .await
            .assert_status_ok();

        let saved = std::fs::read_to_string(dir.path().join("my_notes.txt")).unwrap();
        assert_eq!(saved, TEXT);
    }

    #[tokio::test]
    async fn rejects_disallowed_extension() {
        let dir = tempfile::tempdir().unwrap();
        let response = server(dir.path())
            .post("/upload")
            .multipart(file_form("setup.exe", b"MZ"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Invalid file type");
        assert!(!dir.path().join("setup.exe").exists());
    }

    #[tokio::test]
    async fn missing_file_part() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let response = server
            .post("/upload")
            .multipart(MultipartForm::new().add_text("note", "no file here"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "No file part");

        let response = server.post("/upload").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "No file part");
    }

    #[tokio::test]
    async fn empty_filename_means_nothing_selected() {
        let dir = tempfile::tempdir().unwrap();
        let response = server(dir.path())
            .post("/upload")
            .multipart(file_form("", b""))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>(),
            serde_json::json!({ "error": "No selected file" })
        );
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let big = "word ".repeat(1000);
        let response = server_limited(Arc::new(FirstSentence), dir.path(), 256)
            .post("/upload")
            .multipart(file_form("big.txt", big.as_bytes()))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.json::<Value>()["error"], "File too large");
        assert!(!dir.path().join("big.txt").exists());
    }

    #[tokio::test]
    async fn name_losing_its_extension_is_unsupported() {
        // passes the allow-list, but sanitizing strips the leading dots
        let dir = tempfile::tempdir().unwrap();
        let response = server(dir.path())
            .post("/upload")
            .multipart(file_form("..txt", TEXT.as_bytes()))
            .await;

        response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(response.json::<Value>()["error"], "Unsupported file format");
    }

    #[tokio::test]
    async fn bad_sent_number_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let response = server(dir.path())
            .post("/upload")
            .add_query_param("type", "paragraph")
            .add_query_param("sent_number", "lots")
            .multipart(file_form("notes.txt", TEXT.as_bytes()))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Invalid sent_number: lots");
    }

    #[tokio::test]
    async fn corrupt_documents_are_client_errors() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let response = server
            .post("/upload")
            .multipart(file_form("paper.pdf", b"garbage"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .post("/upload")
            .multipart(file_form("letter.docx", b"not a zip"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error = response.json::<Value>()["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("DOCX extraction error"), "{error}");
    }

    #[tokio::test]
    async fn docx_upload_is_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let mut docx = std::io::Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Owls hunt at night.")))
            .build()
            .pack(&mut docx)
            .unwrap();
        let docx = docx.into_inner();

        let response = server(dir.path())
            .post("/upload")
            .multipart(file_form("owls.docx", &docx))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["text"], "Owls hunt at night.\n");
        assert_eq!(body["Lnum_sent"], 1);
        assert_eq!(body["keywords"], "Owls,hunt,night");
    }

    #[tokio::test]
    async fn model_failures_are_server_errors() {
        let dir = tempfile::tempdir().unwrap();
        let response = server_with(Arc::new(Broken), dir.path())
            .post("/upload")
            .add_query_param("type", "paragraph")
            .multipart(file_form("notes.txt", TEXT.as_bytes()))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json::<Value>()["error"],
            "inference failed: session crashed"
        );
    }
}
