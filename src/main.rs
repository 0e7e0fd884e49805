//! Sound Annotator - console front end
//!
//! Loads config, opens the processing log and runs the annotation REPL.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sound_annotator::annotation::Annotator;
use sound_annotator::app::App;
use sound_annotator::cli;
use sound_annotator::config::AppConfig;
use sound_annotator::paths::AppPaths;
use sound_annotator::queue::QueueWalker;
use sound_annotator::sink::LabelFileSink;
use sound_annotator::state::{LogStatus, SledLogStore};
use sound_annotator::transport::{ConsoleGain, ConsoleTransport};

/// Sound Annotator - mark entire/point regions across a folder of audio files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to the application data directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Folder to open on startup
    #[arg(short, long)]
    folder: Option<PathBuf>,

    /// Print the processing log and exit
    #[arg(long)]
    list_logs: bool,

    /// Delete every processing log record and exit
    #[arg(long, conflicts_with = "list_logs")]
    clear_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let detected = AppPaths::detect();
    let config_path = args.config.clone().unwrap_or_else(|| detected.config.clone());
    let config = AppConfig::load(&config_path).await?;
    let paths = detected.with_overrides(&config);
    paths.ensure_directories()?;

    let _log_guard = init_logging(&args.log_level, &paths)?;

    info!("🎧 Starting Sound Annotator v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {} (portable: {})", paths.base_dir().display(), paths.is_portable);
    info!("Configuration file: {}", config_path.display());

    let store = Arc::new(SledLogStore::new(paths.log_db_path(&config)));

    if args.list_logs {
        return list_logs(&store).await;
    }

    if args.clear_logs {
        let removed = store.clear().await?;
        println!(
            "{} Removed {} record(s) from {}",
            "✓".green(),
            removed,
            store.path().display()
        );
        return Ok(());
    }

    let sink = Arc::new(LabelFileSink::new(&paths.labels_dir));
    info!("Labels will be written to {}", sink.labels_path().display());

    let annotator = Annotator::new(
        Box::new(ConsoleTransport::new()),
        Box::new(ConsoleGain::new()),
        config.playback.autoplay_on_load,
    );
    let walker = QueueWalker::new(store, sink);
    let mut app = App::new(config, annotator, walker);

    println!("{}", "Sound Annotator - type 'help' for commands".bold().cyan());

    if let Some(folder) = &args.folder {
        cli::execute(&mut app, cli::Command::Folder(folder.clone()), &paths.labels_dir).await?;
    }

    cli::run_repl(&mut app, &paths.labels_dir).await?;

    info!("Sound Annotator shutdown complete");
    Ok(())
}

/// Console output plus a daily rolling file in the logs directory
fn init_logging(level: &str, paths: &AppPaths) -> Result<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::daily(&paths.logs_dir, "sound-annotator.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

async fn list_logs(store: &SledLogStore) -> Result<()> {
    let records = store.records().await?;

    println!("\n{}", "=== Processing Log ===".bold().cyan());
    println!("  Database: {}", store.path().display());
    println!("  Records: {}\n", records.len().to_string().green());

    for record in records {
        let when = chrono::DateTime::from_timestamp_millis(record.created_at)
            .map(|t| {
                t.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|| record.created_at.to_string());
        let status = match record.status {
            LogStatus::Processed => record.status.as_str().green(),
            LogStatus::Skipped => record.status.as_str().yellow(),
        };
        println!("  {}  {:<9}  {}", when.dimmed(), status, record.file);
    }

    Ok(())
}
