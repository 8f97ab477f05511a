//! Copy requests and live task state

use bulkcp_types::{Error, Result, TaskId, TaskProgress, TaskRecord, TaskStatus};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;

/// Sentinel stored in the ETA atomic when no estimate is available
const ETA_UNKNOWN: u64 = u64::MAX;

/// Copy request containing the inputs for one task
#[derive(Debug, Clone)]
pub struct CopyRequest {
    /// Ordered source paths, files or directories
    pub source_items: Vec<PathBuf>,
    /// Destination path
    pub destination: PathBuf,
}

impl CopyRequest {
    /// Create a new copy request
    pub fn new<I, P, D>(source_items: I, destination: D) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
        D: Into<PathBuf>,
    {
        Self {
            source_items: source_items.into_iter().map(Into::into).collect(),
            destination: destination.into(),
        }
    }

    /// Create a request for a single source item
    pub fn single<P: Into<PathBuf>, D: Into<PathBuf>>(source: P, destination: D) -> Self {
        Self::new([source.into()], destination)
    }

    /// Validate the request before a task is created
    pub fn validate(&self) -> Result<()> {
        if self.source_items.is_empty() {
            return Err(Error::invalid_request("Source list is empty"));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(Error::invalid_request("Destination is empty"));
        }
        Ok(())
    }
}

/// Mutable task fields guarded by the handle's state lock.
///
/// The lock is held only for field reads and writes, never across I/O.
#[derive(Debug)]
struct TaskState {
    status: TaskStatus,
    current_item: Option<PathBuf>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Live state of one copy task.
///
/// Progress counters are atomics mutated only by the task's single
/// worker; the cancellation token and pause flag are the only fields
/// external callers mutate. Status moves exclusively through the
/// transition guards, so readers observe transitions in a total order.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    source_items: Vec<PathBuf>,
    destination: PathBuf,
    copied_bytes: AtomicU64,
    total_bytes: AtomicU64,
    copied_items: AtomicU64,
    total_items: AtomicU64,
    speed_bps: AtomicU64,
    eta_seconds: AtomicU64,
    paused: Arc<AtomicBool>,
    cancel: CancellationToken,
    state: RwLock<TaskState>,
}

impl TaskHandle {
    /// Create a new handle in the `Preparing` state
    pub fn new(request: CopyRequest) -> Self {
        Self {
            id: TaskId::new(),
            source_items: request.source_items,
            destination: request.destination,
            copied_bytes: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            copied_items: AtomicU64::new(0),
            total_items: AtomicU64::new(0),
            speed_bps: AtomicU64::new(0),
            eta_seconds: AtomicU64::new(ETA_UNKNOWN),
            paused: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            state: RwLock::new(TaskState {
                status: TaskStatus::Preparing,
                current_item: None,
                started_at: Utc::now(),
                ended_at: None,
                last_error: None,
            }),
        }
    }

    /// Get the task id
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Get the ordered source items
    pub fn source_items(&self) -> &[PathBuf] {
        &self.source_items
    }

    /// Get the destination path
    pub fn destination(&self) -> &PathBuf {
        &self.destination
    }

    /// Get the cancellation token
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Get the shared pause flag
    pub fn pause_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.paused)
    }

    /// Get the current status
    pub fn status(&self) -> TaskStatus {
        self.state_read().status
    }

    /// Check if the task has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Attempt a status transition, stamping `ended_at` on terminal
    /// states. Returns `false` when the edge is not part of the
    /// lifecycle, leaving the state untouched.
    pub fn try_transition(&self, next: TaskStatus) -> bool {
        let mut state = self.state_write();
        if !state.status.can_transition_to(next) {
            return false;
        }
        state.status = next;
        if next.is_terminal() && state.ended_at.is_none() {
            state.ended_at = Some(Utc::now());
        }
        true
    }

    /// Transition to `Failed` and record the error message
    pub fn fail<S: Into<String>>(&self, message: S) -> bool {
        let mut state = self.state_write();
        if !state.status.can_transition_to(TaskStatus::Failed) {
            return false;
        }
        state.status = TaskStatus::Failed;
        state.last_error = Some(message.into());
        if state.ended_at.is_none() {
            state.ended_at = Some(Utc::now());
        }
        true
    }

    /// Set the item currently being copied
    pub fn set_current_item(&self, item: Option<PathBuf>) {
        self.state_write().current_item = item;
    }

    /// Fix the task totals. Called once by the worker before the first
    /// byte is copied; totals never change afterwards.
    pub fn set_totals(&self, total_bytes: u64, total_items: u64) {
        self.total_bytes.store(total_bytes, Ordering::Release);
        self.total_items.store(total_items, Ordering::Release);
    }

    /// Add a progress delta, clamping so copied bytes never exceed the
    /// totals snapshot even if a source file grew mid-copy.
    pub fn add_copied_bytes(&self, delta: u64) -> u64 {
        let total = self.total_bytes.load(Ordering::Acquire);
        let copied = self.copied_bytes.fetch_add(delta, Ordering::AcqRel) + delta;
        if total > 0 && copied > total {
            self.copied_bytes.store(total, Ordering::Release);
            total
        } else {
            copied
        }
    }

    /// Add completed items to the item counter
    pub fn add_copied_items(&self, count: u64) {
        self.copied_items.fetch_add(count, Ordering::AcqRel);
    }

    /// Update the derived transfer metrics
    pub fn update_rates(&self, speed_bps: u64, eta_seconds: Option<u64>) {
        self.speed_bps.store(speed_bps, Ordering::Release);
        self.eta_seconds
            .store(eta_seconds.unwrap_or(ETA_UNKNOWN), Ordering::Release);
    }

    /// Get the totals snapshot
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Acquire)
    }

    /// Get the bytes copied so far
    pub fn copied_bytes(&self) -> u64 {
        self.copied_bytes.load(Ordering::Acquire)
    }

    /// Produce a detached point-in-time record of this task
    pub fn snapshot(&self) -> TaskRecord {
        let state = self.state_read();
        let copied_bytes = self.copied_bytes.load(Ordering::Acquire);
        let total_bytes = self.total_bytes.load(Ordering::Acquire);
        let eta = self.eta_seconds.load(Ordering::Acquire);

        TaskRecord {
            id: self.id,
            status: state.status,
            source_items: self.source_items.clone(),
            destination: self.destination.clone(),
            current_item: state.current_item.clone(),
            progress: percent(state.status, copied_bytes, total_bytes),
            speed_bps: self.speed_bps.load(Ordering::Acquire),
            eta_seconds: if eta == ETA_UNKNOWN { None } else { Some(eta) },
            copied_items: self.copied_items.load(Ordering::Acquire),
            total_items: self.total_items.load(Ordering::Acquire),
            copied_bytes,
            total_bytes,
            started_at: state.started_at,
            ended_at: state.ended_at,
            last_error: state.last_error.clone(),
        }
    }

    /// Produce the progress payload pushed on every tick
    pub fn progress(&self) -> TaskProgress {
        let state = self.state_read();
        let copied_bytes = self.copied_bytes.load(Ordering::Acquire);
        let total_bytes = self.total_bytes.load(Ordering::Acquire);
        let eta = self.eta_seconds.load(Ordering::Acquire);

        TaskProgress {
            task_id: self.id,
            progress: percent(state.status, copied_bytes, total_bytes),
            speed_bps: self.speed_bps.load(Ordering::Acquire),
            eta_seconds: if eta == ETA_UNKNOWN { None } else { Some(eta) },
            copied_items: self.copied_items.load(Ordering::Acquire),
            total_items: self.total_items.load(Ordering::Acquire),
            copied_bytes,
            total_bytes,
            current_item: state.current_item.clone(),
        }
    }

    fn state_read(&self) -> RwLockReadGuard<'_, TaskState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_write(&self) -> RwLockWriteGuard<'_, TaskState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn percent(status: TaskStatus, copied_bytes: u64, total_bytes: u64) -> f64 {
    if status == TaskStatus::Completed {
        100.0
    } else if total_bytes > 0 {
        (copied_bytes as f64 / total_bytes as f64) * 100.0
    } else {
        0.0
    }
}
