use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voice_suite::audio::{AudioNormalizer, FfmpegNormalizer, NativeNormalizer};
use voice_suite::jobs::{ExportFlavor, TrainingFlavor};
use voice_suite::tools::{PathLocator, Toolbox};
use voice_suite::{
    create_router, export_voice, train_voice, validate, AppState, AudioEngine, Config,
    DatasetBuilder, ExportJob, Studio, TrainingJob,
};

#[derive(Parser)]
#[command(name = "voice-suite")]
#[command(about = "Record, prepare, train and export a single-speaker TTS voice")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, global = true, default_value = "config/voice-suite")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the recording studio
    Studio,

    /// Build or check the training corpus
    Dataset {
        #[command(subcommand)]
        action: DatasetAction,
    },

    /// Train a voice on the built dataset
    Train,

    /// Export a trained checkpoint to ONNX
    Export {
        /// Checkpoint directory (defaults to the one training writes)
        #[arg(long)]
        checkpoint_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum DatasetAction {
    /// Normalize recorded takes into wavs/ + metadata.csv
    Build,
    /// Check that every manifest row has its audio file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Voice Suite v{}", env!("CARGO_PKG_VERSION"));
    info!("Voice: {} ({})", cfg.voice_id, cfg.language);

    match cli.command {
        Command::Studio => run_studio(&cfg).await,
        Command::Dataset {
            action: DatasetAction::Build,
        } => build_dataset(&cfg).await,
        Command::Dataset {
            action: DatasetAction::Validate,
        } => {
            let report = validate(&cfg.paths.dataset_dir)?;
            info!(
                "Dataset OK: {} rows checked ({} total)",
                report.scanned_rows, report.total_rows
            );
            Ok(())
        }
        Command::Train => {
            let flavor: TrainingFlavor = cfg.training.flavor.parse()?;
            let tools = resolve_tools(&[flavor.interpreter()])?;
            let job = TrainingJob::from_config(&cfg)?;
            train_voice(&job, &tools).await?;
            Ok(())
        }
        Command::Export { checkpoint_dir } => {
            let flavor: ExportFlavor = cfg.export.flavor.parse()?;
            let tools = resolve_tools(&[flavor.interpreter()])?;
            let checkpoint_dir = checkpoint_dir.unwrap_or_else(|| cfg.checkpoint_dir());
            let job = ExportJob::from_config(&cfg, checkpoint_dir)?;
            export_voice(&job, &tools).await?;
            Ok(())
        }
    }
}

fn resolve_tools(required: &[&str]) -> Result<Toolbox> {
    Ok(Toolbox::resolve(&PathLocator::from_env(), required)?)
}

async fn run_studio(cfg: &Config) -> Result<()> {
    let studio = Studio::open(cfg)?;
    let state = AppState::new(studio, cfg.studio.max_upload_mb * 1024 * 1024);
    let app = create_router(state);

    let addr = cfg.studio_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Studio listening on http://{}", addr);
    axum::serve(listener, app).await.context("Studio server failed")?;

    Ok(())
}

async fn build_dataset(cfg: &Config) -> Result<()> {
    let normalizer: Arc<dyn AudioNormalizer> = match cfg.audio.engine {
        AudioEngine::Ffmpeg => {
            let tools = resolve_tools(&["ffmpeg"])?;
            Arc::new(FfmpegNormalizer::new(tools.path("ffmpeg")?, cfg.audio.timeout()))
        }
        AudioEngine::Native => Arc::new(NativeNormalizer::new()),
    };

    let mut builder = DatasetBuilder::new(normalizer);
    if cfg.audio.workers > 0 {
        builder = builder.with_workers(cfg.audio.workers);
    }

    let dataset = builder
        .build(
            &cfg.paths.recordings_dir,
            &cfg.paths.dataset_dir,
            &cfg.audio.settings(),
        )
        .await?;

    info!(
        "Dataset ready: {} entries, manifest {}",
        dataset.len(),
        dataset.manifest.display()
    );
    Ok(())
}
