//! Push notifications for task lifecycle and progress

use bulkcp_types::{TaskId, TaskProgress, TaskRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event pushed through the notification channel.
///
/// Delivery is best-effort and at-least-once: consumers must tolerate
/// dropped, duplicated or out-of-order events and treat the task record
/// as the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TaskEvent {
    /// A task transitioned to `Running` and its worker started copying
    Started {
        /// Task identifier
        task_id: TaskId,
        /// Record at start time
        record: TaskRecord,
    },
    /// Chunk-level progress tick
    Progress {
        /// Task identifier
        task_id: TaskId,
        /// Current progress payload
        progress: TaskProgress,
    },
    /// A task changed status (paused, resumed, failed, cancelled)
    StatusChanged {
        /// Task identifier
        task_id: TaskId,
        /// Record after the change
        record: TaskRecord,
    },
    /// A task finished all of its items successfully
    Completed {
        /// Task identifier
        task_id: TaskId,
    },
}

impl TaskEvent {
    /// Get the id of the task this event concerns
    pub fn task_id(&self) -> TaskId {
        match self {
            Self::Started { task_id, .. }
            | Self::Progress { task_id, .. }
            | Self::StatusChanged { task_id, .. }
            | Self::Completed { task_id } => *task_id,
        }
    }

    /// Get the event kind name used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Progress { .. } => "progress",
            Self::StatusChanged { .. } => "status_changed",
            Self::Completed { .. } => "completed",
        }
    }
}

/// Sink the engine pushes events into, fire-and-forget.
///
/// Implementations must never block: a slow or unavailable transport
/// must not hold up copy throughput.
pub trait NotificationSink: Send + Sync {
    /// Publish an event. No delivery guarantee is implied.
    fn publish(&self, event: TaskEvent);
}

/// Broadcast-channel sink for in-process consumers.
///
/// Lagging receivers lose the oldest events rather than slowing the
/// sender down.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<TaskEvent>,
}

impl BroadcastSink {
    /// Default channel capacity
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Create a new sink with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl NotificationSink for BroadcastSink {
    fn publish(&self, event: TaskEvent) {
        // A send error only means there are no subscribers right now.
        let _ = self.tx.send(event);
    }
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn publish(&self, _event: TaskEvent) {}
}

/// Fan-out used by the engine: always feeds the in-process broadcast
/// channel, plus an optional external sink.
#[derive(Clone)]
pub(crate) struct Notifier {
    events: BroadcastSink,
    extra: Option<Arc<dyn NotificationSink>>,
}

impl Notifier {
    pub(crate) fn new(events: BroadcastSink, extra: Option<Arc<dyn NotificationSink>>) -> Self {
        Self { events, extra }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: TaskEvent) {
        if let Some(extra) = &self.extra {
            extra.publish(event.clone());
        }
        self.events.publish(event);
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("events", &self.events)
            .field("extra", &self.extra.as_ref().map(|_| "dyn NotificationSink"))
            .finish()
    }
}
