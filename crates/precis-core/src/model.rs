use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to load model from {path}: {message}")]
    Load { path: String, message: String },
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model produced unexpected output: {0}")]
    Output(String),
}

/// Universal POS tags, as emitted by token-classification taggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
}

impl PartOfSpeech {
    /// Nouns, adjectives and verbs are the only classes kept as keywords.
    /// Proper nouns are a separate class and are not included.
    pub fn is_keyword_class(self) -> bool {
        matches!(self, PartOfSpeech::Noun | PartOfSpeech::Adj | PartOfSpeech::Verb)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PartOfSpeech::Adj => "ADJ",
            PartOfSpeech::Adp => "ADP",
            PartOfSpeech::Adv => "ADV",
            PartOfSpeech::Aux => "AUX",
            PartOfSpeech::Cconj => "CCONJ",
            PartOfSpeech::Det => "DET",
            PartOfSpeech::Intj => "INTJ",
            PartOfSpeech::Noun => "NOUN",
            PartOfSpeech::Num => "NUM",
            PartOfSpeech::Part => "PART",
            PartOfSpeech::Pron => "PRON",
            PartOfSpeech::Propn => "PROPN",
            PartOfSpeech::Punct => "PUNCT",
            PartOfSpeech::Sconj => "SCONJ",
            PartOfSpeech::Sym => "SYM",
            PartOfSpeech::Verb => "VERB",
            PartOfSpeech::X => "X",
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartOfSpeech {
    type Err = String;

    /// Accepts Universal tags in any case, with or without a `B-`/`I-` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s
            .strip_prefix("B-")
            .or_else(|| s.strip_prefix("I-"))
            .unwrap_or(s)
            .to_ascii_uppercase();

        let pos = match tag.as_str() {
            "ADJ" => PartOfSpeech::Adj,
            "ADP" => PartOfSpeech::Adp,
            "ADV" => PartOfSpeech::Adv,
            "AUX" => PartOfSpeech::Aux,
            "CCONJ" | "CONJ" => PartOfSpeech::Cconj,
            "DET" => PartOfSpeech::Det,
            "INTJ" => PartOfSpeech::Intj,
            "NOUN" => PartOfSpeech::Noun,
            "NUM" => PartOfSpeech::Num,
            "PART" => PartOfSpeech::Part,
            "PRON" => PartOfSpeech::Pron,
            "PROPN" => PartOfSpeech::Propn,
            "PUNCT" => PartOfSpeech::Punct,
            "SCONJ" => PartOfSpeech::Sconj,
            "SYM" => PartOfSpeech::Sym,
            "VERB" => PartOfSpeech::Verb,
            "X" => PartOfSpeech::X,
            _ => return Err(format!("unknown part-of-speech tag: {s}")),
        };
        Ok(pos)
    }
}

/// A token with the surface form it had in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub text: String,
    pub pos: PartOfSpeech,
}

impl TaggedToken {
    pub fn new(text: impl Into<String>, pos: PartOfSpeech) -> Self {
        Self {
            text: text.into(),
            pos,
        }
    }
}

/// Abstractive summarizer backed by a pretrained sequence-to-sequence model.
pub trait Summarizer: Send + Sync {
    /// Summarize `text`.
    ///
    /// `target_sentences` records the caller's intent; implementations
    /// bound output length by their generation settings, not by it.
    fn summarize(&self, text: &str, target_sentences: usize) -> Result<String, ModelError>;
}

/// Part-of-speech tagger producing tokens in source order.
pub trait PosTagger: Send + Sync {
    fn tag(&self, text: &str) -> Result<Vec<TaggedToken>, ModelError>;
}
