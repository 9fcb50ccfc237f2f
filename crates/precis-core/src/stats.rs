use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

/// Sentence and word counts for a piece of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    pub sentences: usize,
    pub words: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        let (sentences, words) = count_sentences_words(text);
        Self { sentences, words }
    }
}

/// Count sentences and words using Unicode (UAX #29) segmentation.
///
/// Only segments containing alphanumeric characters count, so punctuation
/// and whitespace are never words and blank text has no sentences.
pub fn count_sentences_words(text: &str) -> (usize, usize) {
    let sentences = text.unicode_sentences().count();
    let words = text.unicode_words().count();
    (sentences, words)
}

/// Percentage by which `summary` is smaller than `original`.
///
/// Undefined, and therefore `None`, when `original` is zero. Negative when
/// the summary is longer than the original.
pub fn reduction_percent(original: usize, summary: usize) -> Option<f64> {
    if original == 0 {
        return None;
    }
    let original = original as f64;
    Some((original - summary as f64) / original * 100.0)
}

/// Word and sentence reduction, serialized as the `statistics` object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reduction {
    pub reduction_word: Option<f64>,
    pub reduction_sentence: Option<f64>,
}

impl Reduction {
    pub fn between(original: &TextStats, summary: &TextStats) -> Self {
        Self {
            reduction_word: reduction_percent(original.words, summary.words),
            reduction_sentence: reduction_percent(original.sentences, summary.sentences),
        }
    }
}
