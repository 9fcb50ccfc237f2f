//! T5 abstractive summarizer on ONNX Runtime.
//!
//! Expects a directory holding an encoder/decoder export of a T5 checkpoint:
//! `encoder_model.onnx`, `decoder_model.onnx` (no past key values) and
//! `tokenizer.json`. An optional `config.json` supplies the decoder start
//! and end-of-sequence token ids.

use std::path::Path;
use std::sync::Mutex;

use ort::inputs;
use ort::session::Session;
use ort::value::Value;
use tokenizers::{Tokenizer, TruncationParams};

use precis_core::config_file::GenerationConfig;
use precis_core::{ModelError, Summarizer};

use crate::beam::{self, BeamSearchConfig};
use crate::onnx::{inference_err, load_session, load_tokenizer, lock, read_model_config};

/// Prepended to every input; selects T5's summarization task.
pub const TASK_PREFIX: &str = "summarize: ";

pub const DEFAULT_MAX_INPUT_TOKENS: usize = 512;

const T5_PAD_ID: u32 = 0;
const T5_EOS_ID: u32 = 1;

/// Encoder output for one input, copied out of the session.
struct Encoded {
    seq_len: usize,
    hidden_size: usize,
    hidden: Vec<f32>,
}

pub struct T5Summarizer {
    tokenizer: Tokenizer,
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
    search: BeamSearchConfig,
    decoder_start_id: u32,
    eos_id: u32,
}

impl T5Summarizer {
    /// Load the tokenizer and both sessions from `dir`.
    pub fn load(
        dir: &Path,
        generation: &GenerationConfig,
        intra_threads: usize,
    ) -> Result<Self, ModelError> {
        let mut tokenizer = load_tokenizer(&dir.join("tokenizer.json"))?;
        let max_input_tokens = generation
            .max_input_tokens
            .unwrap_or(DEFAULT_MAX_INPUT_TOKENS);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_input_tokens,
                ..Default::default()
            }))
            .map_err(|e| ModelError::Tokenizer(e.to_string()))?;
        tokenizer.with_padding(None);

        let encoder = load_session(&dir.join("encoder_model.onnx"), intra_threads)?;
        let decoder = load_session(&dir.join("decoder_model.onnx"), intra_threads)?;

        let config = read_model_config(dir)?;
        let token_id = |key: &str, default: u32| {
            config
                .as_ref()
                .and_then(|c| c.get(key))
                .and_then(|v| v.as_u64())
                .map(|v| v as u32)
                .unwrap_or(default)
        };
        let decoder_start_id = token_id("decoder_start_token_id", T5_PAD_ID);
        let eos_id = token_id("eos_token_id", T5_EOS_ID);

        let search = BeamSearchConfig::with_overrides(generation);
        tracing::info!(
            dir = %dir.display(),
            num_beams = search.num_beams,
            min_length = search.min_length,
            max_length = search.max_length,
            max_input_tokens,
            "summarizer loaded"
        );

        Ok(Self {
            tokenizer,
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
            search,
            decoder_start_id,
            eos_id,
        })
    }

    fn encode(&self, input_ids: &[i64]) -> Result<Encoded, ModelError> {
        let seq_len = input_ids.len();
        let ids = Value::from_array(([1_usize, seq_len], input_ids.to_vec().into_boxed_slice()))
            .map_err(inference_err)?;
        let mask = Value::from_array(([1_usize, seq_len], vec![1_i64; seq_len].into_boxed_slice()))
            .map_err(inference_err)?;

        let mut session = lock(&self.encoder)?;
        let outputs = session
            .run(inputs!["input_ids" => ids, "attention_mask" => mask])
            .map_err(inference_err)?;
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(inference_err)?;

        if shape.len() != 3 || shape[1] as usize != seq_len {
            return Err(ModelError::Output(format!(
                "encoder hidden states have shape {:?}",
                &shape[..]
            )));
        }
        Ok(Encoded {
            seq_len,
            hidden_size: shape[2] as usize,
            hidden: data.to_vec(),
        })
    }

    /// Next-token logits for every beam, run as one batch.
    fn decode_step(&self, encoded: &Encoded, beams: &[Vec<u32>]) -> Result<Vec<Vec<f32>>, ModelError> {
        let batch = beams.len();
        let cur_len = beams.first().map(Vec::len).unwrap_or(0);

        let input_ids: Vec<i64> = beams
            .iter()
            .flat_map(|b| b.iter().map(|&t| i64::from(t)))
            .collect();
        let mut hidden = Vec::with_capacity(batch * encoded.hidden.len());
        for _ in 0..batch {
            hidden.extend_from_slice(&encoded.hidden);
        }

        let ids = Value::from_array(([batch, cur_len], input_ids.into_boxed_slice()))
            .map_err(inference_err)?;
        let mask = Value::from_array((
            [batch, encoded.seq_len],
            vec![1_i64; batch * encoded.seq_len].into_boxed_slice(),
        ))
        .map_err(inference_err)?;
        let states = Value::from_array((
            [batch, encoded.seq_len, encoded.hidden_size],
            hidden.into_boxed_slice(),
        ))
        .map_err(inference_err)?;

        let mut session = lock(&self.decoder)?;
        let outputs = session
            .run(inputs![
                "input_ids" => ids,
                "encoder_attention_mask" => mask,
                "encoder_hidden_states" => states
            ])
            .map_err(inference_err)?;
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(inference_err)?;

        if shape.len() != 3 || shape[0] as usize != batch || shape[1] as usize != cur_len {
            return Err(ModelError::Output(format!(
                "decoder logits have shape {:?}",
                &shape[..]
            )));
        }
        let vocab = shape[2] as usize;
        let row_stride = cur_len * vocab;
        let last = (cur_len - 1) * vocab;

        Ok((0..batch)
            .map(|b| {
                let start = b * row_stride + last;
                data[start..start + vocab].to_vec()
            })
            .collect())
    }
}

impl Summarizer for T5Summarizer {
    /// `target_sentences` is accepted for interface compatibility; output
    /// length is bounded by the generation token limits only.
    fn summarize(&self, text: &str, _target_sentences: usize) -> Result<String, ModelError> {
        let prompt = format!("{TASK_PREFIX}{text}");
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))?;
        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        if input_ids.is_empty() {
            return Ok(String::new());
        }

        let encoded = self.encode(&input_ids)?;
        tracing::debug!(input_tokens = input_ids.len(), "encoder finished");

        let output_ids = beam::generate(&self.search, self.decoder_start_id, self.eos_id, |beams| {
            self.decode_step(&encoded, beams)
        })?;

        let summary = self
            .tokenizer
            .decode(&output_ids, true)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))?;
        tracing::debug!(
            output_tokens = output_ids.len(),
            chars = summary.len(),
            "summary generated"
        );
        Ok(summary.trim().to_string())
    }
}
