//! Part-of-speech tagging with an ONNX token-classification model.
//!
//! The model directory holds `model.onnx`, `tokenizer.json` and a
//! `config.json` whose `id2label` names each output class. Labels are
//! Universal POS tags; Penn Treebank labels are mapped onto them.
//!
//! Text is tagged one sentence at a time. Sentences longer than the
//! model's input window are halved at word boundaries until they fit.

use std::path::Path;
use std::sync::Mutex;

use ort::inputs;
use ort::session::Session;
use ort::value::Value;
use tokenizers::{Encoding, Tokenizer};
use unicode_segmentation::UnicodeSegmentation;

use precis_core::{ModelError, PartOfSpeech, PosTagger, TaggedToken};

use crate::onnx::{inference_err, load_session, load_tokenizer, lock, read_model_config};

/// Input window of BERT-style encoders, special tokens included.
pub const DEFAULT_MAX_TOKENS: usize = 512;

pub struct OnnxPosTagger {
    tokenizer: Tokenizer,
    session: Mutex<Session>,
    labels: Vec<PartOfSpeech>,
    uses_token_type_ids: bool,
    max_tokens: usize,
}

impl OnnxPosTagger {
    pub fn load(dir: &Path, intra_threads: usize) -> Result<Self, ModelError> {
        let mut tokenizer = load_tokenizer(&dir.join("tokenizer.json"))?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(None)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))?;

        let config = read_model_config(dir)?.ok_or_else(|| ModelError::Load {
            path: dir.join("config.json").display().to_string(),
            message: "file not found".to_string(),
        })?;
        let labels = parse_labels(&config)?;

        let session = load_session(&dir.join("model.onnx"), intra_threads)?;
        let uses_token_type_ids = session.inputs.iter().any(|i| i.name == "token_type_ids");
        let max_tokens = config
            .get("max_position_embeddings")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_MAX_TOKENS)
            .min(DEFAULT_MAX_TOKENS);

        tracing::info!(
            dir = %dir.display(),
            labels = labels.len(),
            uses_token_type_ids,
            "POS tagger loaded"
        );

        Ok(Self {
            tokenizer,
            session: Mutex::new(session),
            labels,
            uses_token_type_ids,
            max_tokens,
        })
    }

    fn encode(&self, text: &str) -> Result<Encoding, ModelError> {
        self.tokenizer
            .encode(text, true)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))
    }

    fn tag_chunk(&self, chunk: &str) -> Result<Vec<TaggedToken>, ModelError> {
        let encoding = self.encode(chunk)?;
        let len = encoding.len();
        if len == 0 {
            return Ok(Vec::new());
        }

        let to_i64 = |v: &[u32]| -> Vec<i64> { v.iter().map(|&x| i64::from(x)).collect() };
        let ids = Value::from_array(([1_usize, len], to_i64(encoding.get_ids()).into_boxed_slice()))
            .map_err(inference_err)?;
        let mask = Value::from_array((
            [1_usize, len],
            to_i64(encoding.get_attention_mask()).into_boxed_slice(),
        ))
        .map_err(inference_err)?;

        let predicted = {
            let mut session = lock(&self.session)?;
            let outputs = if self.uses_token_type_ids {
                let type_ids = Value::from_array((
                    [1_usize, len],
                    to_i64(encoding.get_type_ids()).into_boxed_slice(),
                ))
                .map_err(inference_err)?;
                session.run(inputs![
                    "input_ids" => ids,
                    "attention_mask" => mask,
                    "token_type_ids" => type_ids
                ])
            } else {
                session.run(inputs!["input_ids" => ids, "attention_mask" => mask])
            }
            .map_err(inference_err)?;

            let (shape, logits) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(inference_err)?;
            if shape.len() != 3 || shape[1] as usize != len {
                return Err(ModelError::Output(format!(
                    "token classification logits have shape {:?}",
                    &shape[..]
                )));
            }
            argmax_rows(logits, shape[2] as usize)
        };

        Ok(group_words(
            chunk,
            encoding.get_word_ids(),
            encoding.get_offsets(),
            encoding.get_special_tokens_mask(),
            &predicted,
            &self.labels,
        ))
    }
}

impl PosTagger for OnnxPosTagger {
    fn tag(&self, text: &str) -> Result<Vec<TaggedToken>, ModelError> {
        let mut tokens = Vec::new();
        for sentence in text.unicode_sentences() {
            if sentence.trim().is_empty() {
                continue;
            }
            let pieces = split_to_fit(sentence, &|piece: &str| {
                self.encode(piece)
                    .map(|e| e.len() <= self.max_tokens)
                    .unwrap_or(true)
            });
            for piece in pieces {
                tokens.extend(self.tag_chunk(piece)?);
            }
        }
        tracing::debug!(tokens = tokens.len(), "tagged text");
        Ok(tokens)
    }
}

/// Read `id2label` from a model config into a table indexed by class id.
pub fn parse_labels(config: &serde_json::Value) -> Result<Vec<PartOfSpeech>, ModelError> {
    let map = config
        .get("id2label")
        .and_then(|v| v.as_object())
        .ok_or_else(|| ModelError::Output("config.json has no id2label table".to_string()))?;

    let mut labels = vec![PartOfSpeech::X; map.len()];
    for (id, label) in map {
        let idx: usize = id
            .parse()
            .map_err(|_| ModelError::Output(format!("non-numeric label id '{id}'")))?;
        let name = label
            .as_str()
            .ok_or_else(|| ModelError::Output(format!("label {id} is not a string")))?;
        if idx >= labels.len() {
            labels.resize(idx + 1, PartOfSpeech::X);
        }
        labels[idx] = label_to_pos(name);
    }
    Ok(labels)
}

/// Map a model label to a Universal POS tag. Unknown labels become `X`.
pub fn label_to_pos(label: &str) -> PartOfSpeech {
    if let Ok(pos) = label.parse() {
        return pos;
    }
    match label {
        "NN" | "NNS" => PartOfSpeech::Noun,
        "NNP" | "NNPS" => PartOfSpeech::Propn,
        "JJ" | "JJR" | "JJS" => PartOfSpeech::Adj,
        "VB" | "VBD" | "VBG" | "VBN" | "VBP" | "VBZ" => PartOfSpeech::Verb,
        "MD" => PartOfSpeech::Aux,
        "RB" | "RBR" | "RBS" | "WRB" => PartOfSpeech::Adv,
        "PRP" | "PRP$" | "WP" | "WP$" => PartOfSpeech::Pron,
        "DT" | "PDT" | "WDT" => PartOfSpeech::Det,
        "IN" => PartOfSpeech::Adp,
        "CC" => PartOfSpeech::Cconj,
        "CD" => PartOfSpeech::Num,
        "RP" | "TO" | "POS" => PartOfSpeech::Part,
        "UH" => PartOfSpeech::Intj,
        "SYM" | "$" | "#" => PartOfSpeech::Sym,
        "." | "," | ":" | "``" | "''" | "-LRB-" | "-RRB-" | "HYPH" | "NFP" => PartOfSpeech::Punct,
        _ => {
            tracing::warn!(label, "unrecognised POS label, treating as X");
            PartOfSpeech::X
        }
    }
}

fn argmax_rows(logits: &[f32], width: usize) -> Vec<usize> {
    if width == 0 {
        return Vec::new();
    }
    logits
        .chunks(width)
        .map(|row| {
            row.iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1).then(b.0.cmp(&a.0)))
                .map(|(i, _)| i)
                .unwrap_or(0)
        })
        .collect()
}

/// Merge subword predictions into one tagged token per word.
///
/// The word takes the label predicted for its first subword; its surface
/// form is the source text spanned by all its subwords.
fn group_words(
    text: &str,
    word_ids: &[Option<u32>],
    offsets: &[(usize, usize)],
    special: &[u32],
    predicted: &[usize],
    labels: &[PartOfSpeech],
) -> Vec<TaggedToken> {
    let mut out = Vec::new();
    // (word id, start, end, label index)
    let mut current: Option<(u32, usize, usize, usize)> = None;

    let flush = |word: Option<(u32, usize, usize, usize)>, out: &mut Vec<TaggedToken>| {
        if let Some((_, start, end, label)) = word {
            if let Some(surface) = text.get(start..end) {
                let pos = labels.get(label).copied().unwrap_or(PartOfSpeech::X);
                out.push(TaggedToken::new(surface, pos));
            }
        }
    };

    for (i, word_id) in word_ids.iter().enumerate() {
        if special.get(i).copied().unwrap_or(0) == 1 {
            continue;
        }
        let Some(word_id) = *word_id else { continue };
        let (start, end) = offsets.get(i).copied().unwrap_or((0, 0));
        match current.as_mut() {
            Some((id, _, cur_end, _)) if *id == word_id => *cur_end = end.max(*cur_end),
            _ => {
                flush(current.take(), &mut out);
                current = Some((word_id, start, end, predicted.get(i).copied().unwrap_or(0)));
            }
        }
    }
    flush(current, &mut out);
    out
}

/// Split `piece` at word boundaries, halving until every part satisfies
/// `fits`. A part with a single word is returned as-is.
fn split_to_fit<'a>(piece: &'a str, fits: &dyn Fn(&str) -> bool) -> Vec<&'a str> {
    if fits(piece) {
        return vec![piece];
    }
    let mid = piece.len() / 2;
    let split = piece
        .split_word_bound_indices()
        .map(|(i, _)| i)
        .filter(|&i| i > 0)
        .min_by_key(|&i| i.abs_diff(mid));
    match split {
        Some(at) => {
            let (left, right) = piece.split_at(at);
            let mut parts = split_to_fit(left, fits);
            parts.extend(split_to_fit(right, fits));
            parts
        }
        None => vec![piece],
    }
}
