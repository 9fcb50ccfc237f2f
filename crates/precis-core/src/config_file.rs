use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub server: Option<ServerConfig>,
    pub models: Option<ModelsConfig>,
    pub ocr: Option<OcrConfig>,
    pub generation: Option<GenerationConfig>,
    pub retention: Option<RetentionConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub upload_dir: Option<String>,
    pub max_upload_mb: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub summarizer_dir: Option<String>,
    pub pos_tagger_dir: Option<String>,
    pub intra_threads: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    pub tesseract_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_input_tokens: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub num_beams: Option<usize>,
    pub length_penalty: Option<f32>,
    pub early_stopping: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub max_age_hours: Option<u64>,
    pub sweep_interval_mins: Option<u64>,
}

/// Platform config directory path: `<config_dir>/precis/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("precis").join("config.toml"))
}

/// Load config by cascading CWD `.precis.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".precis.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Pick `overlay`'s value for a field, falling back to `base`'s.
fn pick<S, T: Clone>(base: &Option<S>, overlay: &Option<S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        server: Some(ServerConfig {
            host: pick(&base.server, &overlay.server, |s| s.host.clone()),
            port: pick(&base.server, &overlay.server, |s| s.port),
            upload_dir: pick(&base.server, &overlay.server, |s| s.upload_dir.clone()),
            max_upload_mb: pick(&base.server, &overlay.server, |s| s.max_upload_mb),
        }),
        models: Some(ModelsConfig {
            summarizer_dir: pick(&base.models, &overlay.models, |m| m.summarizer_dir.clone()),
            pos_tagger_dir: pick(&base.models, &overlay.models, |m| m.pos_tagger_dir.clone()),
            intra_threads: pick(&base.models, &overlay.models, |m| m.intra_threads),
        }),
        ocr: Some(OcrConfig {
            tesseract_path: pick(&base.ocr, &overlay.ocr, |o| o.tesseract_path.clone()),
        }),
        generation: Some(GenerationConfig {
            max_input_tokens: pick(&base.generation, &overlay.generation, |g| g.max_input_tokens),
            min_length: pick(&base.generation, &overlay.generation, |g| g.min_length),
            max_length: pick(&base.generation, &overlay.generation, |g| g.max_length),
            num_beams: pick(&base.generation, &overlay.generation, |g| g.num_beams),
            length_penalty: pick(&base.generation, &overlay.generation, |g| g.length_penalty),
            early_stopping: pick(&base.generation, &overlay.generation, |g| g.early_stopping),
        }),
        retention: Some(RetentionConfig {
            max_age_hours: pick(&base.retention, &overlay.retention, |r| r.max_age_hours),
            sweep_interval_mins: pick(&base.retention, &overlay.retention, |r| {
                r.sweep_interval_mins
            }),
        }),
    }
}

/// Fully resolved runtime settings: config file values, then environment
/// overrides, then built-in defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub summarizer_dir: PathBuf,
    pub pos_tagger_dir: PathBuf,
    pub intra_threads: usize,
    pub tesseract_path: String,
    pub generation: GenerationConfig,
    pub retention_max_age_hours: Option<u64>,
    pub retention_sweep_mins: u64,
}

impl Settings {
    /// Resolve settings from a config file and the process environment.
    pub fn resolve(config: &ConfigFile) -> Self {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    /// Resolve settings with an explicit environment lookup.
    pub fn resolve_with(config: &ConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let server = config.server.clone().unwrap_or_default();
        let models = config.models.clone().unwrap_or_default();
        let ocr = config.ocr.clone().unwrap_or_default();
        let retention = config.retention.clone().unwrap_or_default();

        let port = env("PRECIS_PORT")
            .and_then(|v| v.parse().ok())
            .or(server.port)
            .unwrap_or(8080);

        Settings {
            host: env("PRECIS_HOST")
                .or(server.host)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            upload_dir: PathBuf::from(
                env("PRECIS_UPLOAD_DIR")
                    .or(server.upload_dir)
                    .unwrap_or_else(|| "uploads".to_string()),
            ),
            max_upload_bytes: server.max_upload_mb.unwrap_or(500) as usize * 1024 * 1024,
            summarizer_dir: PathBuf::from(
                env("PRECIS_SUMMARIZER_DIR")
                    .or(models.summarizer_dir)
                    .unwrap_or_else(|| "models/t5-base".to_string()),
            ),
            pos_tagger_dir: PathBuf::from(
                env("PRECIS_POS_TAGGER_DIR")
                    .or(models.pos_tagger_dir)
                    .unwrap_or_else(|| "models/pos-tagger".to_string()),
            ),
            intra_threads: models.intra_threads.unwrap_or(4),
            tesseract_path: env("TESSERACT_PATH")
                .or(ocr.tesseract_path)
                .unwrap_or_else(|| "tesseract".to_string()),
            generation: config.generation.clone().unwrap_or_default(),
            retention_max_age_hours: retention.max_age_hours,
            retention_sweep_mins: retention.sweep_interval_mins.unwrap_or(60),
        }
    }
}
