use std::path::PathBuf;
use std::sync::Arc;

use precis_core::Pipeline;
use precis_ingest::Extractor;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub pipeline: Pipeline,
    pub extractor: Arc<Extractor>,
    pub upload_dir: PathBuf,
}
