//! ONNX Runtime implementations of the summarizer and POS tagger.

pub mod beam;
mod onnx;
pub mod pos;
pub mod t5;

pub use beam::{BeamSearchConfig, generate};
pub use pos::OnnxPosTagger;
pub use t5::T5Summarizer;
