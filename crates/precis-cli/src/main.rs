use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use precis_core::config_file::{self, Settings};
use precis_core::retention;
use precis_core::{DEFAULT_SENTENCE_COUNT, Pipeline};
use precis_ingest::Extractor;
use precis_model::{OnnxPosTagger, T5Summarizer};

mod output;

use output::ColorMode;

/// Summarize documents and images with a pretrained T5 model
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a file (pdf, docx, txt, png, jpg, jpeg) or a piece of text
    Summarize {
        /// Path to a file, or the text itself
        input: String,

        /// Number of sentences wanted (informational; output length is
        /// bounded by the generation settings)
        #[arg(short, long, default_value_t = DEFAULT_SENTENCE_COUNT)]
        sentences: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Directory holding the summarizer's ONNX export
        #[arg(long)]
        summarizer_dir: Option<PathBuf>,

        /// Directory holding the POS tagger's ONNX export
        #[arg(long)]
        pos_tagger_dir: Option<PathBuf>,

        /// Path to the tesseract binary
        #[arg(long)]
        tesseract: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Print the text extracted from a file, with sentence and word counts
    Extract {
        /// Path to the file
        file_path: PathBuf,

        /// Path to the tesseract binary
        #[arg(long)]
        tesseract: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Delete stored uploads older than a given age
    PurgeUploads {
        /// Upload directory (default: the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Remove files last modified more than this many hours ago
        #[arg(long)]
        max_age_hours: u64,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays clean for --json
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::resolve(&config_file::load_config());

    match cli.command {
        Command::Summarize {
            input,
            sentences,
            json,
            summarizer_dir,
            pos_tagger_dir,
            tesseract,
            no_color,
        } => {
            let summarizer_dir = summarizer_dir.unwrap_or_else(|| settings.summarizer_dir.clone());
            let pos_tagger_dir = pos_tagger_dir.unwrap_or_else(|| settings.pos_tagger_dir.clone());
            let summarizer =
                T5Summarizer::load(&summarizer_dir, &settings.generation, settings.intra_threads)
                    .with_context(|| {
                        format!("loading summarizer from {}", summarizer_dir.display())
                    })?;
            let tagger = OnnxPosTagger::load(&pos_tagger_dir, settings.intra_threads)
                .with_context(|| format!("loading POS tagger from {}", pos_tagger_dir.display()))?;

            let pipeline = Pipeline::new(Arc::new(summarizer), Arc::new(tagger));
            let extractor =
                Extractor::with_tesseract(tesseract.unwrap_or(settings.tesseract_path));
            let report = precis_ingest::summarize_input(&extractor, &pipeline, &input, sentences)?;

            let mut stdout = std::io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut stdout, &report)?;
                writeln!(stdout)?;
            } else {
                output::print_report(&mut stdout, &report, ColorMode(!no_color))?;
            }
            Ok(())
        }
        Command::Extract {
            file_path,
            tesseract,
            no_color,
        } => {
            let extractor =
                Extractor::with_tesseract(tesseract.unwrap_or(settings.tesseract_path));
            let text = extractor
                .extract_text(&file_path)
                .with_context(|| format!("extracting {}", file_path.display()))?;
            let mut stdout = std::io::stdout().lock();
            output::print_extraction(&mut stdout, &file_path, &text, ColorMode(!no_color))?;
            Ok(())
        }
        Command::PurgeUploads { dir, max_age_hours } => {
            let dir = dir.unwrap_or(settings.upload_dir);
            let removed =
                precis_core::purge_expired(&dir, retention::hours(max_age_hours))
                    .with_context(|| format!("purging {}", dir.display()))?;
            println!("Removed {} expired upload(s) from {}", removed, dir.display());
            Ok(())
        }
    }
}
