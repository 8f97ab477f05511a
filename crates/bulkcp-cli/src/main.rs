//! bulkcp - concurrent bulk-copy task manager
//!
//! Submits a copy task to the engine and renders its live progress until
//! it reaches a terminal state.

use anyhow::{bail, Context, Result};
use bulkcp_config::{Config, ConfigLoader};
use bulkcp_engine::{CopyRequest, ManagerConfig, TaskEvent, TaskManager};
use bulkcp_types::{ChunkSize, TaskStatus};
use clap::Parser;
use console::style;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

mod progress;

use progress::ProgressRenderer;

/// Concurrent bulk-copy task manager
#[derive(Parser)]
#[command(
    name = "bulkcp",
    version = env!("CARGO_PKG_VERSION"),
    about = "Concurrent bulk-copy task manager",
    long_about = "bulkcp copies files and directory trees as managed tasks with\n\
                  live progress, pause/resume and cooperative cancellation."
)]
struct Cli {
    /// Source paths (files or directories) followed by the destination
    #[arg(required = true, num_args = 2.., value_name = "SOURCES... DEST")]
    paths: Vec<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of simultaneously running tasks
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Chunk size in bytes for copy I/O
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Do not preserve timestamps and permissions
    #[arg(long)]
    no_preserve_metadata: bool,

    /// Write a task-log JSON export when the task finishes
    #[arg(long)]
    export_log: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Quiet mode - no progress display
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_logging(&config, cli.debug)?;

    info!("bulkcp v{} starting", env!("CARGO_PKG_VERSION"));

    let manager_config = manager_config(&cli, &config)?;
    let manager = TaskManager::new(manager_config);
    let mut events = manager.subscribe();

    let mut paths = cli.paths.clone();
    let destination = paths.pop().context("Missing destination path")?;
    let request = CopyRequest::new(paths, destination);
    let task_id = manager
        .create_task(request)
        .await
        .context("Failed to create copy task")?;

    let mut renderer = ProgressRenderer::new(cli.quiet);

    // Follow the event stream until the task is terminal. The stream is
    // lossy, so the registry record is re-read for the final word.
    loop {
        match events.recv().await {
            Ok(event) if event.task_id() == task_id => match event {
                TaskEvent::Started { record, .. } => renderer.start(&record),
                TaskEvent::Progress { progress, .. } => renderer.update(&progress),
                TaskEvent::StatusChanged { record, .. } => {
                    if record.status.is_terminal() {
                        break;
                    }
                    renderer.status(record.status);
                }
                TaskEvent::Completed { .. } => break,
            },
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                info!("Progress display skipped {} event(s)", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }

    let record = manager
        .get_task(task_id)
        .await
        .context("Task vanished from the registry")?;
    renderer.finish(&record);

    if !cli.quiet {
        print_summary(&record);
    }

    if cli.export_log {
        let path = manager.export_log().await.context("Failed to export task log")?;
        println!("Task log written to {}", path.display());
    }

    if record.status == TaskStatus::Failed {
        bail!(
            "Copy failed: {}",
            record.last_error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ConfigLoader::load_default().context("Failed to load configuration")?,
    };
    Ok(config)
}

fn manager_config(cli: &Cli, config: &Config) -> Result<ManagerConfig> {
    let mut manager_config = ManagerConfig::from_config(config);

    if let Some(limit) = cli.max_concurrent {
        manager_config.max_concurrent_tasks = if limit == 0 { None } else { Some(limit) };
    }
    if let Some(chunk_size) = cli.chunk_size {
        ChunkSize::new(chunk_size).map_err(|message| anyhow::anyhow!(message))?;
        manager_config.chunk_size = chunk_size;
    }
    if cli.no_preserve_metadata {
        manager_config.preserve_metadata = false;
    }

    Ok(manager_config)
}

fn init_logging(config: &Config, debug: bool) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let default_level = if debug { "debug" } else { &config.logging.level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

fn print_summary(record: &bulkcp_types::TaskRecord) {
    let status = match record.status {
        TaskStatus::Completed => style(record.status.to_string()).green(),
        TaskStatus::Failed => style(record.status.to_string()).red(),
        TaskStatus::Cancelled => style(record.status.to_string()).yellow(),
        _ => style(record.status.to_string()).dim(),
    };

    println!(
        "{} {} - {} file(s), {}",
        style("Task").bold(),
        status,
        record.copied_items,
        progress::human_bytes(record.copied_bytes)
    );

    if let Some(error) = &record.last_error {
        println!("  {}: {}", style("error").red(), error);
    }
}
