//! Task-log export

use bulkcp_types::{Error, Result, TaskRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// The exported task-log document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskLogExport {
    /// When the export was taken
    pub export_time: DateTime<Utc>,
    /// All task records at export time
    pub tasks: Vec<TaskRecord>,
}

/// Serializes registry snapshots into durable task-log artifacts
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    directory: Option<PathBuf>,
}

impl Exporter {
    /// Create an exporter writing into `directory`, or the system temp
    /// directory when `None`
    pub fn new(directory: Option<PathBuf>) -> Self {
        Self { directory }
    }

    /// Write a snapshot to a timestamped JSON file and return its path.
    ///
    /// The export is self-contained; disposing of the file afterwards is
    /// the caller's responsibility.
    pub async fn export(&self, tasks: Vec<TaskRecord>) -> Result<PathBuf> {
        let now = Utc::now();
        let export = TaskLogExport {
            export_time: now,
            tasks,
        };

        let json = serde_json::to_string_pretty(&export)
            .map_err(|e| Error::other(format!("Failed to serialize task log: {}", e)))?;

        let directory = self
            .directory
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|e| Error::Io {
                message: format!(
                    "Failed to create export directory '{}': {}",
                    directory.display(),
                    e
                ),
            })?;

        let file_name = format!("task-log-{}.json", now.format("%Y-%m-%d-%H-%M-%S"));
        let path = directory.join(file_name);

        tokio::fs::write(&path, json).await.map_err(|e| Error::Io {
            message: format!("Failed to write task log '{}': {}", path.display(), e),
        })?;

        info!("Exported task log to {}", path.display());
        Ok(path)
    }
}
