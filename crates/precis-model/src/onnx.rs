use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use tokenizers::Tokenizer;

use precis_core::ModelError;

pub(crate) fn load_session(path: &Path, intra_threads: usize) -> Result<Session, ModelError> {
    if !path.is_file() {
        return Err(ModelError::Load {
            path: path.display().to_string(),
            message: "file not found".to_string(),
        });
    }
    tracing::info!(path = %path.display(), "loading ONNX model");
    Session::builder()
        .map_err(|e| load_error(path, e))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| load_error(path, e))?
        .with_intra_threads(intra_threads.max(1))
        .map_err(|e| load_error(path, e))?
        .commit_from_file(path)
        .map_err(|e| load_error(path, e))
}

fn load_error(path: &Path, e: impl fmt::Display) -> ModelError {
    ModelError::Load {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

pub(crate) fn load_tokenizer(path: &Path) -> Result<Tokenizer, ModelError> {
    Tokenizer::from_file(path).map_err(|e| load_error(path, e))
}

/// Lock a session for one run. ONNX Runtime sessions take `&mut self` to run.
pub(crate) fn lock(session: &Mutex<Session>) -> Result<MutexGuard<'_, Session>, ModelError> {
    session
        .lock()
        .map_err(|_| ModelError::Inference("model session lock poisoned".to_string()))
}

pub(crate) fn inference_err(e: impl fmt::Display) -> ModelError {
    ModelError::Inference(e.to_string())
}

/// Read an optional `config.json` next to the model.
pub(crate) fn read_model_config(dir: &Path) -> Result<Option<serde_json::Value>, ModelError> {
    let path = dir.join("config.json");
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|e| load_error(&path, e))?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| load_error(&path, e))
}
