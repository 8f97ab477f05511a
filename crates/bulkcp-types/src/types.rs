//! Core data types for bulkcp
//!
//! This module provides task identity, the status state machine, the
//! serializable record snapshot and the progress payload pushed to
//! notification consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// File size in bytes
pub type FileSize = u64;

/// Transfer rate in bytes per second
pub type TransferRate = u64;

/// Unique identifier for a copy task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a new task ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a copy task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Task is computing totals or waiting for a worker slot
    Preparing,
    /// Task is currently copying
    Running,
    /// Task is paused
    Paused,
    /// Task completed successfully
    Completed,
    /// Task failed with an error
    Failed,
    /// Task was cancelled
    Cancelled,
}

impl TaskStatus {
    /// Check if the task is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if the task is active (running or paused)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Check whether `next` is a legal successor of this status.
    ///
    /// The lifecycle is `Preparing -> Running -> {Paused <-> Running} ->
    /// {Completed | Failed | Cancelled}`; any non-terminal state may move
    /// to `Cancelled`. Terminal states have no successors.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match self {
            Self::Preparing => matches!(next, Self::Running | Self::Cancelled),
            Self::Running => matches!(
                next,
                Self::Paused | Self::Completed | Self::Failed | Self::Cancelled
            ),
            Self::Paused => matches!(next, Self::Running | Self::Cancelled),
            Self::Completed | Self::Failed | Self::Cancelled => false,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Preparing => "Preparing",
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
        };
        write!(f, "{}", name)
    }
}

/// Point-in-time snapshot of a copy task.
///
/// Records are detached copies: mutating the live task never changes a
/// snapshot a caller already holds. This is also the row format of the
/// exported task log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task identifier
    pub id: TaskId,
    /// Current status
    pub status: TaskStatus,
    /// Ordered source paths (files or directories)
    pub source_items: Vec<PathBuf>,
    /// Destination path
    pub destination: PathBuf,
    /// Path currently being copied
    pub current_item: Option<PathBuf>,
    /// Overall progress percentage (0-100)
    pub progress: f64,
    /// Current transfer rate in bytes per second
    pub speed_bps: TransferRate,
    /// Estimated seconds remaining, when the rate is known
    pub eta_seconds: Option<u64>,
    /// Number of files copied so far
    pub copied_items: u64,
    /// Total number of files to copy
    pub total_items: u64,
    /// Bytes copied so far
    pub copied_bytes: u64,
    /// Total bytes to copy
    pub total_bytes: u64,
    /// When the task was created
    pub started_at: DateTime<Utc>,
    /// When the task reached a terminal state
    pub ended_at: Option<DateTime<Utc>>,
    /// Error message, set when the task failed
    pub last_error: Option<String>,
}

impl TaskRecord {
    /// Check if the task has reached a terminal state
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Calculate the item-count progress percentage
    pub fn item_progress(&self) -> f64 {
        if self.total_items > 0 {
            (self.copied_items as f64 / self.total_items as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Progress payload pushed through the notification channel on every tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskProgress {
    /// Task identifier
    pub task_id: TaskId,
    /// Overall progress percentage (0-100)
    pub progress: f64,
    /// Current transfer rate in bytes per second
    pub speed_bps: TransferRate,
    /// Estimated seconds remaining, when the rate is known
    pub eta_seconds: Option<u64>,
    /// Number of files copied so far
    pub copied_items: u64,
    /// Total number of files to copy
    pub total_items: u64,
    /// Bytes copied so far
    pub copied_bytes: u64,
    /// Total bytes to copy
    pub total_bytes: u64,
    /// Path currently being copied
    pub current_item: Option<PathBuf>,
}

impl TaskProgress {
    /// Calculate the byte progress percentage
    pub fn byte_progress(&self) -> f64 {
        if self.total_bytes > 0 {
            (self.copied_bytes as f64 / self.total_bytes as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Calculate the item-count progress percentage
    pub fn item_progress(&self) -> f64 {
        if self.total_items > 0 {
            (self.copied_items as f64 / self.total_items as f64) * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [TaskStatus; 6] = [
        TaskStatus::Preparing,
        TaskStatus::Running,
        TaskStatus::Paused,
        TaskStatus::Completed,
        TaskStatus::Failed,
        TaskStatus::Cancelled,
    ];

    #[test]
    fn test_task_status_classification() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Preparing.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());

        assert!(TaskStatus::Running.is_active());
        assert!(TaskStatus::Paused.is_active());
        assert!(!TaskStatus::Preparing.is_active());
    }

    #[test]
    fn test_no_transition_out_of_terminal_states() {
        for terminal in [
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::Cancelled,
        ] {
            for next in ALL_STATUSES {
                assert!(
                    !terminal.can_transition_to(next),
                    "{terminal} must not transition to {next}"
                );
            }
        }
    }

    #[test]
    fn test_lifecycle_edges() {
        assert!(TaskStatus::Preparing.can_transition_to(TaskStatus::Running));
        assert!(TaskStatus::Preparing.can_transition_to(TaskStatus::Cancelled));
        assert!(!TaskStatus::Preparing.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Preparing.can_transition_to(TaskStatus::Paused));

        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Paused));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Failed));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Cancelled));

        assert!(TaskStatus::Paused.can_transition_to(TaskStatus::Running));
        assert!(TaskStatus::Paused.can_transition_to(TaskStatus::Cancelled));
        assert!(!TaskStatus::Paused.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Paused.can_transition_to(TaskStatus::Failed));
    }

    #[test]
    fn test_task_id_roundtrip() {
        let id = TaskId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_progress_percentages() {
        let progress = TaskProgress {
            task_id: TaskId::new(),
            progress: 50.0,
            speed_bps: 1024,
            eta_seconds: Some(10),
            copied_items: 2,
            total_items: 10,
            copied_bytes: 500,
            total_bytes: 1000,
            current_item: None,
        };

        assert_eq!(progress.byte_progress(), 50.0);
        assert_eq!(progress.item_progress(), 20.0);
    }

    #[test]
    fn test_progress_with_zero_totals() {
        let progress = TaskProgress {
            task_id: TaskId::new(),
            progress: 0.0,
            speed_bps: 0,
            eta_seconds: None,
            copied_items: 0,
            total_items: 0,
            copied_bytes: 0,
            total_bytes: 0,
            current_item: None,
        };

        assert_eq!(progress.byte_progress(), 0.0);
        assert_eq!(progress.item_progress(), 0.0);
    }
}
