//! Beam search over a token-level scoring function.
//!
//! The model is abstracted as a step function: given the running beams
//! (each starting with the decoder start token) it returns next-token
//! logits for every beam. The search itself is pure and deterministic.
//!
//! Semantics follow the usual encoder-decoder `generate` conventions:
//! lengths count the decoder start token, end-of-sequence is masked until
//! `min_length` is reached, finished hypotheses are scored as
//! `sum_logprobs / len^length_penalty`, and each step keeps the best
//! `2 * num_beams` candidates so that finished beams can be replaced.

use std::cmp::Ordering;

use precis_core::config_file::GenerationConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct BeamSearchConfig {
    pub num_beams: usize,
    pub length_penalty: f32,
    pub early_stopping: bool,
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for BeamSearchConfig {
    fn default() -> Self {
        Self {
            num_beams: 4,
            length_penalty: 2.0,
            early_stopping: true,
            min_length: 40,
            max_length: 150,
        }
    }
}

impl BeamSearchConfig {
    /// Defaults with any values set in a `[generation]` config section applied.
    pub fn with_overrides(generation: &GenerationConfig) -> Self {
        let d = Self::default();
        Self {
            num_beams: generation.num_beams.unwrap_or(d.num_beams).max(1),
            length_penalty: generation.length_penalty.unwrap_or(d.length_penalty),
            early_stopping: generation.early_stopping.unwrap_or(d.early_stopping),
            min_length: generation.min_length.unwrap_or(d.min_length),
            max_length: generation.max_length.unwrap_or(d.max_length),
        }
    }
}

/// `x - logsumexp(x)`, computed stably.
pub fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![f32::NEG_INFINITY; logits.len()];
    }
    let sum: f32 = logits.iter().map(|&x| (x - max).exp()).sum();
    let log_sum = sum.ln() + max;
    logits.iter().map(|&x| x - log_sum).collect()
}

#[derive(Debug, Clone)]
struct Beam {
    tokens: Vec<u32>,
    score: f32,
}

/// The best `num_beams` finished sequences seen so far.
struct Hypotheses {
    capacity: usize,
    length_penalty: f32,
    early_stopping: bool,
    items: Vec<(f32, Vec<u32>)>,
    worst: f32,
}

impl Hypotheses {
    fn new(config: &BeamSearchConfig) -> Self {
        Self {
            capacity: config.num_beams,
            length_penalty: config.length_penalty,
            early_stopping: config.early_stopping,
            items: Vec::with_capacity(config.num_beams + 1),
            worst: 1e9,
        }
    }

    fn normalized(&self, sum_logprobs: f32, len: usize) -> f32 {
        sum_logprobs / (len as f32).powf(self.length_penalty)
    }

    fn add(&mut self, tokens: Vec<u32>, sum_logprobs: f32) {
        let score = self.normalized(sum_logprobs, tokens.len());
        if self.items.len() < self.capacity || score > self.worst {
            self.items.push((score, tokens));
            if self.items.len() > self.capacity {
                let worst_idx = self
                    .items
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.0.total_cmp(&b.1.0))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                self.items.remove(worst_idx);
                self.worst = self
                    .items
                    .iter()
                    .map(|(s, _)| *s)
                    .fold(f32::INFINITY, f32::min);
            } else {
                self.worst = self.worst.min(score);
            }
        }
    }

    /// No running beam can still beat the worst kept hypothesis.
    fn is_done(&self, best_running: f32, cur_len: usize) -> bool {
        if self.items.len() < self.capacity {
            return false;
        }
        if self.early_stopping {
            return true;
        }
        self.worst >= self.normalized(best_running, cur_len)
    }

    fn best(self) -> Option<Vec<u32>> {
        self.items
            .into_iter()
            .enumerate()
            // prefer the earliest-added hypothesis on exact ties
            .max_by(|(ia, a), (ib, b)| a.0.total_cmp(&b.0).then(ib.cmp(ia)))
            .map(|(_, (_, tokens))| tokens)
    }
}

/// Run beam search and return the best sequence without the decoder start
/// token or the trailing end-of-sequence token.
///
/// `step` receives the running beams and must return one row of logits per
/// beam, each covering the full vocabulary.
pub fn generate<E, F>(
    config: &BeamSearchConfig,
    decoder_start: u32,
    eos: u32,
    mut step: F,
) -> Result<Vec<u32>, E>
where
    F: FnMut(&[Vec<u32>]) -> Result<Vec<Vec<f32>>, E>,
{
    let num_beams = config.num_beams.max(1);
    let mut hyps = Hypotheses::new(config);
    let mut beams = vec![Beam {
        tokens: vec![decoder_start],
        score: 0.0,
    }];
    let mut cur_len = 1;
    let mut done = false;

    while cur_len < config.max_length {
        let sequences: Vec<Vec<u32>> = beams.iter().map(|b| b.tokens.clone()).collect();
        let logits = step(&sequences)?;

        // (total score, beam index, token)
        let mut candidates: Vec<(f32, usize, u32)> = Vec::new();
        for (beam_idx, (beam, row)) in beams.iter().zip(logits.iter()).enumerate() {
            let mut scores = log_softmax(row);
            if cur_len < config.min_length {
                if let Some(s) = scores.get_mut(eos as usize) {
                    *s = f32::NEG_INFINITY;
                }
            }
            candidates.extend(
                scores
                    .iter()
                    .enumerate()
                    .map(|(tok, &s)| (beam.score + s, beam_idx, tok as u32)),
            );
        }

        let keep = (2 * num_beams).min(candidates.len());
        let by_score = |a: &(f32, usize, u32), b: &(f32, usize, u32)| -> Ordering {
            b.0.total_cmp(&a.0)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        };
        if keep < candidates.len() {
            candidates.select_nth_unstable_by(keep, by_score);
            candidates.truncate(keep);
        }
        candidates.sort_by(by_score);

        let mut next = Vec::with_capacity(num_beams);
        for (rank, &(score, beam_idx, token)) in candidates.iter().enumerate() {
            if !score.is_finite() {
                continue;
            }
            if token == eos {
                // only an EOS among the top num_beams candidates ends a hypothesis
                if rank < num_beams {
                    hyps.add(beams[beam_idx].tokens.clone(), score);
                }
            } else {
                let mut tokens = beams[beam_idx].tokens.clone();
                tokens.push(token);
                next.push(Beam { tokens, score });
            }
            if next.len() == num_beams {
                break;
            }
        }

        let best_candidate = candidates.first().map(|c| c.0).unwrap_or(f32::NEG_INFINITY);
        done = hyps.is_done(best_candidate, cur_len);

        if next.is_empty() {
            break;
        }
        beams = next;
        cur_len += 1;

        if done {
            break;
        }
    }

    tracing::debug!(steps = cur_len, finished = hyps.items.len(), done, "beam search finished");

    if !done {
        for beam in &beams {
            hyps.add(beam.tokens.clone(), beam.score);
        }
    }

    let mut best = hyps.best().unwrap_or_default();
    if best.first() == Some(&decoder_start) {
        best.remove(0);
    }
    Ok(best)
}
