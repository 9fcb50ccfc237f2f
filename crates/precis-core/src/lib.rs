use serde::Serialize;

pub mod backend;
pub mod config_file;
pub mod format;
pub mod keywords;
pub mod model;
pub mod pipeline;
pub mod retention;
pub mod stats;

// Re-export for convenience
pub use backend::{BackendError, OcrBackend, PdfBackend};
pub use format::{ALLOWED_EXTENSIONS, FileType, allowed_file};
pub use keywords::{DEFAULT_KEYWORD_COUNT, rank_keywords};
pub use model::{ModelError, PartOfSpeech, PosTagger, Summarizer, TaggedToken};
pub use pipeline::Pipeline;
pub use retention::purge_expired;
pub use stats::{Reduction, TextStats, count_sentences_words, reduction_percent};

/// Number of sentences requested when the caller does not say otherwise.
pub const DEFAULT_SENTENCE_COUNT: usize = 5;

/// The outcome of summarizing a piece of text, with before/after counts.
///
/// Keywords are ranked over the summary, not the original text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub summary: String,
    pub original_sentences: usize,
    pub original_words: usize,
    pub summarized_sentences: usize,
    pub summarized_words: usize,
    pub keywords: Vec<String>,
}

impl SummaryReport {
    pub fn original_stats(&self) -> TextStats {
        TextStats {
            sentences: self.original_sentences,
            words: self.original_words,
        }
    }

    pub fn summary_stats(&self) -> TextStats {
        TextStats {
            sentences: self.summarized_sentences,
            words: self.summarized_words,
        }
    }

    /// Reduction of the summary relative to the original text.
    pub fn reduction(&self) -> Reduction {
        Reduction::between(&self.original_stats(), &self.summary_stats())
    }
}
