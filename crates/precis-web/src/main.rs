use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use precis_core::Pipeline;
use precis_core::config_file::{self, Settings};
use precis_ingest::{Extractor, TesseractOcr};
use precis_model::{OnnxPosTagger, T5Summarizer};

mod error;
mod handlers;
mod models;
mod retention;
mod routes;
mod state;
mod upload;

use state::AppState;

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    let settings = Settings::resolve(&config_file::load_config());

    // Models are loaded once; a missing model is fatal
    let summarizer = T5Summarizer::load(
        &settings.summarizer_dir,
        &settings.generation,
        settings.intra_threads,
    )
    .with_context(|| {
        format!(
            "loading summarizer from {}",
            settings.summarizer_dir.display()
        )
    })?;
    let tagger = OnnxPosTagger::load(&settings.pos_tagger_dir, settings.intra_threads)
        .with_context(|| {
            format!(
                "loading POS tagger from {}",
                settings.pos_tagger_dir.display()
            )
        })?;

    let ocr = TesseractOcr::new(settings.tesseract_path.clone());
    if !ocr.is_available() {
        tracing::warn!(
            binary = ocr.binary(),
            "tesseract not found; image uploads will fail"
        );
    }

    tokio::fs::create_dir_all(&settings.upload_dir)
        .await
        .with_context(|| format!("creating {}", settings.upload_dir.display()))?;

    if let Some(hours) = settings.retention_max_age_hours {
        retention::spawn_sweeper(
            settings.upload_dir.clone(),
            precis_core::retention::hours(hours),
            Duration::from_secs(settings.retention_sweep_mins.max(1).saturating_mul(60)),
        );
        tracing::info!(max_age_hours = hours, "upload retention enabled");
    }

    let state = Arc::new(AppState {
        pipeline: Pipeline::new(Arc::new(summarizer), Arc::new(tagger)),
        extractor: Arc::new(Extractor::with_ocr(Box::new(ocr))),
        upload_dir: settings.upload_dir.clone(),
    });

    let app = routes::build_router(state, settings.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", settings.host, settings.port))?;
    tracing::info!(%addr, upload_dir = %settings.upload_dir.display(), "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
