use std::sync::Arc;

use crate::keywords::{DEFAULT_KEYWORD_COUNT, rank_keywords};
use crate::model::{ModelError, PosTagger, Summarizer};
use crate::stats::TextStats;
use crate::SummaryReport;

/// The summarizer and tagger shared by every request.
///
/// Both handles are built once at startup and passed in; cloning a
/// `Pipeline` only clones the `Arc`s.
#[derive(Clone)]
pub struct Pipeline {
    summarizer: Arc<dyn Summarizer>,
    tagger: Arc<dyn PosTagger>,
}

impl Pipeline {
    pub fn new(summarizer: Arc<dyn Summarizer>, tagger: Arc<dyn PosTagger>) -> Self {
        Self { summarizer, tagger }
    }

    pub fn summarize(&self, text: &str, target_sentences: usize) -> Result<String, ModelError> {
        self.summarizer.summarize(text, target_sentences)
    }

    /// The `num_keywords` most frequent nouns, adjectives and verbs in `text`.
    pub fn keywords(&self, text: &str, num_keywords: usize) -> Result<Vec<String>, ModelError> {
        let tokens = self.tagger.tag(text)?;
        Ok(rank_keywords(&tokens, num_keywords))
    }

    /// Summarize `text` and collect before/after counts plus the summary's
    /// top keywords.
    pub fn report(&self, text: &str, target_sentences: usize) -> Result<SummaryReport, ModelError> {
        let original = TextStats::of(text);
        let summary = self.summarize(text, target_sentences)?;
        let summarized = TextStats::of(&summary);
        let keywords = self.keywords(&summary, DEFAULT_KEYWORD_COUNT)?;

        tracing::debug!(
            original_words = original.words,
            summarized_words = summarized.words,
            keywords = keywords.len(),
            "summary report built"
        );

        Ok(SummaryReport {
            summary,
            original_sentences: original.sentences,
            original_words: original.words,
            summarized_sentences: summarized.sentences,
            summarized_words: summarized.words,
            keywords,
        })
    }
}
