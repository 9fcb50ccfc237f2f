use std::path::Path;

/// Extensions accepted for upload, lowercase and without the dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt", "png", "jpg", "jpeg"];

/// The extraction route a file takes, decided by extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Docx,
    Text,
    Image,
}

impl FileType {
    /// Map an extension (without the dot, any case) to a file type.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(FileType::Pdf),
            "docx" => Some(FileType::Docx),
            "txt" => Some(FileType::Text),
            "png" | "jpg" | "jpeg" => Some(FileType::Image),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Returns true if the filename has a dot and the text after the last dot
/// is in [`ALLOWED_EXTENSIONS`], compared case-insensitively.
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_file_is_case_insensitive() {
        assert!(allowed_file("a.pdf"));
        assert!(allowed_file("a.PDF"));
        assert!(allowed_file("scan.JpEg"));
        assert!(allowed_file("notes.v2.txt"));
    }

    #[test]
    fn allowed_file_rejects_others() {
        assert!(!allowed_file("a.exe"));
        assert!(!allowed_file("pdf"));
        assert!(!allowed_file("archive.tar.gz"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn file_type_routes_images_together() {
        assert_eq!(FileType::from_extension("png"), Some(FileType::Image));
        assert_eq!(FileType::from_extension("JPG"), Some(FileType::Image));
        assert_eq!(FileType::from_extension("jpeg"), Some(FileType::Image));
        assert_eq!(FileType::from_extension("gif"), None);
    }

    #[test]
    fn file_type_from_path() {
        assert_eq!(
            FileType::from_path(Path::new("uploads/report.DOCX")),
            Some(FileType::Docx)
        );
        assert_eq!(FileType::from_path(Path::new("uploads/README")), None);
    }
}
