//! The copy task manager
//!
//! Creates tasks, dispatches their workers, and serves control and query
//! operations without ever blocking on copy I/O.

use crate::export::Exporter;
use crate::notify::{BroadcastSink, NotificationSink, Notifier, TaskEvent};
use crate::registry::TaskRegistry;
use crate::task::{CopyRequest, TaskHandle};
use crate::worker::{self, WorkerContext};
use bulkcp_config::Config;
use bulkcp_io::CopyOptions;
use bulkcp_types::{Result, TaskId, TaskRecord, TaskStatus};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, info};

/// Configuration for the task manager
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Maximum number of simultaneously running tasks (None = unlimited)
    pub max_concurrent_tasks: Option<usize>,
    /// Chunk size for copy I/O
    pub chunk_size: usize,
    /// Preserve timestamps and permissions on copied files
    pub preserve_metadata: bool,
    /// Interval at which paused workers re-check their flags
    pub pause_poll_interval: Duration,
    /// Directory for exported task logs (system temp dir when None)
    pub export_directory: Option<PathBuf>,
}

impl ManagerConfig {
    /// Create manager config from the main configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrent_tasks: config.scheduler.max_concurrent_tasks.cap(),
            chunk_size: config.copy.chunk_size.get(),
            preserve_metadata: config.copy.preserve_metadata,
            pause_poll_interval: config.scheduler.pause_poll_interval,
            export_directory: config.export.directory.clone(),
        }
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Concurrent copy task manager.
///
/// Each created task gets exactly one worker; control calls
/// (pause/resume/cancel) only flip flags the worker observes
/// cooperatively, so queries stay responsive while copies run.
#[derive(Debug, Clone)]
pub struct TaskManager {
    config: ManagerConfig,
    registry: Arc<TaskRegistry>,
    notifier: Notifier,
    semaphore: Option<Arc<Semaphore>>,
    exporter: Exporter,
}

impl TaskManager {
    /// Create a new task manager
    pub fn new(config: ManagerConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a new task manager that also forwards events to an
    /// external sink
    pub fn with_sink(config: ManagerConfig, sink: Arc<dyn NotificationSink>) -> Self {
        Self::build(config, Some(sink))
    }

    fn build(config: ManagerConfig, extra: Option<Arc<dyn NotificationSink>>) -> Self {
        let semaphore = config
            .max_concurrent_tasks
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));
        let exporter = Exporter::new(config.export_directory.clone());

        Self {
            config,
            registry: Arc::new(TaskRegistry::new()),
            notifier: Notifier::new(BroadcastSink::default(), extra),
            semaphore,
            exporter,
        }
    }

    /// Subscribe to the in-process event stream.
    ///
    /// The stream is lossy; `get_task` remains the source of truth.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.notifier.subscribe()
    }

    /// Create a new copy task and dispatch its worker.
    ///
    /// Returns the task id immediately; the worker computes the totals,
    /// waits for a free slot when a concurrency cap is set, and then
    /// starts copying.
    pub async fn create_task(&self, request: CopyRequest) -> Result<TaskId> {
        request.validate()?;

        let handle = Arc::new(TaskHandle::new(request));
        let task_id = handle.id();
        self.registry.insert(Arc::clone(&handle)).await;

        worker::spawn(WorkerContext {
            handle,
            notifier: self.notifier.clone(),
            options: CopyOptions {
                chunk_size: self.config.chunk_size,
                preserve_metadata: self.config.preserve_metadata,
            },
            pause_poll: self.config.pause_poll_interval,
            semaphore: self.semaphore.clone(),
        });

        info!("Created copy task {}", task_id);
        Ok(task_id)
    }

    /// Get a snapshot of one task
    pub async fn get_task(&self, id: TaskId) -> Option<TaskRecord> {
        self.registry.get(id).await.map(|handle| handle.snapshot())
    }

    /// Get snapshots of all tasks
    pub async fn list_tasks(&self) -> Vec<TaskRecord> {
        self.registry.snapshot().await
    }

    /// Pause a running task. Returns `false` when the task is unknown or
    /// not `Running`.
    pub async fn pause(&self, id: TaskId) -> bool {
        let Some(handle) = self.registry.get(id).await else {
            return false;
        };

        handle.pause_flag().store(true, std::sync::atomic::Ordering::Release);
        if handle.try_transition(TaskStatus::Paused) {
            info!("Paused task {}", id);
            self.notifier.publish(TaskEvent::StatusChanged {
                task_id: id,
                record: handle.snapshot(),
            });
            true
        } else {
            // The task was not running after all; leave it untouched.
            handle.pause_flag().store(false, std::sync::atomic::Ordering::Release);
            false
        }
    }

    /// Resume a paused task. Returns `false` when the task is unknown or
    /// not `Paused`.
    pub async fn resume(&self, id: TaskId) -> bool {
        let Some(handle) = self.registry.get(id).await else {
            return false;
        };

        if handle.try_transition(TaskStatus::Running) {
            handle.pause_flag().store(false, std::sync::atomic::Ordering::Release);
            info!("Resumed task {}", id);
            self.notifier.publish(TaskEvent::StatusChanged {
                task_id: id,
                record: handle.snapshot(),
            });
            true
        } else {
            false
        }
    }

    /// Cancel a task from any non-terminal state. Idempotent: returns
    /// `false` on an already-terminal or unknown task and never raises.
    pub async fn cancel(&self, id: TaskId) -> bool {
        let Some(handle) = self.registry.get(id).await else {
            return false;
        };

        if handle.is_terminal() {
            return false;
        }

        handle.cancel_token().cancel();
        if handle.try_transition(TaskStatus::Cancelled) {
            info!("Cancelled task {}", id);
            self.notifier.publish(TaskEvent::StatusChanged {
                task_id: id,
                record: handle.snapshot(),
            });
            true
        } else {
            // The worker finished in between; the task is already
            // terminal and the signal had nothing left to stop.
            false
        }
    }

    /// Remove a task regardless of state, cancelling it first when still
    /// active
    pub async fn remove(&self, id: TaskId) -> bool {
        let removed = self.registry.remove(id).await;
        if removed {
            info!("Removed task {}", id);
        }
        removed
    }

    /// Pause every running task, returning how many were paused
    pub async fn pause_all(&self) -> usize {
        let mut paused = 0;
        for handle in self.registry.handles().await {
            if handle.status() == TaskStatus::Running && self.pause(handle.id()).await {
                paused += 1;
            }
        }
        paused
    }

    /// Resume every paused task, returning how many were resumed
    pub async fn resume_all(&self) -> usize {
        let mut resumed = 0;
        for handle in self.registry.handles().await {
            if handle.status() == TaskStatus::Paused && self.resume(handle.id()).await {
                resumed += 1;
            }
        }
        resumed
    }

    /// Cancel every non-terminal task, returning how many were cancelled
    pub async fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        for handle in self.registry.handles().await {
            if !handle.is_terminal() && self.cancel(handle.id()).await {
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Remove all terminal tasks, returning how many were cleared
    pub async fn clear_completed(&self) -> usize {
        let cleared = self.registry.remove_terminal().await;
        if cleared > 0 {
            debug!("Cleared {} finished task(s)", cleared);
        }
        cleared
    }

    /// Export the current registry snapshot to a task-log file and
    /// return its path
    pub async fn export_log(&self) -> Result<PathBuf> {
        let snapshot = self.registry.snapshot().await;
        self.exporter.export(snapshot).await
    }

    /// Access the underlying registry
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }
}
