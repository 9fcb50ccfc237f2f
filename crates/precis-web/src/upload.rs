use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::ApiError;

/// An uploaded file with its client-supplied name.
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Pull the `file` part out of a multipart upload. Other fields are ignored.
///
/// A `file` part without a filename is not a file upload; one with an empty
/// filename means the form was submitted with nothing selected.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_error("Failed to read form field", e))?
    {
        let name = field.name().unwrap_or("").to_string();
        let filename = field.file_name().map(str::to_string);

        match (name.as_str(), filename) {
            ("file", Some(filename)) if file.is_none() => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| read_error("Failed to read file data", e))?
                    .to_vec();
                file = Some(UploadedFile { filename, data });
            }
            _ => {
                // Ignore unknown fields
                let _ = field.bytes().await;
            }
        }
    }

    let file = file.ok_or_else(|| ApiError::input("No file part"))?;
    if file.filename.is_empty() {
        return Err(ApiError::input("No selected file"));
    }
    Ok(file)
}

/// Body limit overruns surface as multipart read errors.
fn read_error(context: &str, e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::TooLarge("File too large".into())
    } else {
        ApiError::input(format!("{}: {}", context, e))
    }
}

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM0", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
    "COM8", "COM9", "LPT0", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8",
    "LPT9",
];

/// Reduce a client filename to a safe ASCII name for the upload directory.
///
/// Compatibility-decomposes and drops non-ASCII characters, turns path
/// separators and whitespace runs into `_`, strips everything outside
/// `[A-Za-z0-9_.-]` and trims leading and trailing `.`/`_`. Windows device
/// names gain a `_` prefix. The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename.nfkd().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let stripped = UNSAFE_CHARS.replace_all(&joined, "");
    let name = stripped.trim_matches(|c: char| c == '.' || c == '_').to_string();

    let stem = name.split('.').next().unwrap_or("").to_ascii_uppercase();
    if !name.is_empty() && WINDOWS_DEVICE_NAMES.contains(&stem.as_str()) {
        return format!("_{name}");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_ordinary_names() {
        assert_eq!(secure_filename("report.pdf"), "report.pdf");
        assert_eq!(secure_filename("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(secure_filename("scan-01_final.JPEG"), "scan-01_final.JPEG");
    }

    #[test]
    fn removes_path_components() {
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("C:\\Users\\me\\notes.txt"), "C_Users_me_notes.txt");
    }

    #[test]
    fn folds_unicode_to_ascii() {
        assert_eq!(
            secure_filename("i contain cool \u{fc}ml\u{e4}uts.txt"),
            "i_contain_cool_umlauts.txt"
        );
        assert_eq!(secure_filename("résumé.docx"), "resume.docx");
    }

    #[test]
    fn guards_device_names_and_empty_results() {
        assert_eq!(secure_filename("CON.txt"), "_CON.txt");
        assert_eq!(secure_filename("lpt1"), "_lpt1");
        assert_eq!(secure_filename("...."), "");
        assert_eq!(secure_filename("文件.pdf"), "pdf");
    }
}
