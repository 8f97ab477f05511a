//! Concurrent copy task engine for bulkcp
//!
//! This crate provides the task manager that creates, tracks, pauses,
//! resumes, cancels and reports live progress for long-running bulk-copy
//! operations.
//!
//! # Features
//!
//! - **Task management**: one worker per task, driven through an explicit
//!   lifecycle state machine
//! - **Live progress**: chunk-level counters with speed and ETA, readable
//!   at any time without blocking copies
//! - **Cooperative control**: pause, resume and cancel observed at chunk
//!   boundaries
//! - **Notifications**: best-effort push events over a broadcast channel
//! - **Export**: durable JSON snapshots of the whole registry
//!
//! # Examples
//!
//! ```rust,no_run
//! use bulkcp_engine::{CopyRequest, ManagerConfig, TaskManager};
//!
//! # async fn example() -> bulkcp_types::Result<()> {
//! let manager = TaskManager::new(ManagerConfig::default());
//! let task_id = manager
//!     .create_task(CopyRequest::single("/data/photos", "/backup"))
//!     .await?;
//!
//! let record = manager.get_task(task_id).await;
//! println!("{:?}", record.map(|r| r.progress));
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod export;
pub mod manager;
pub mod notify;
pub mod registry;
pub mod task;

mod worker;

pub use export::{Exporter, TaskLogExport};
pub use manager::{ManagerConfig, TaskManager};
pub use notify::{BroadcastSink, NotificationSink, NullSink, TaskEvent};
pub use registry::TaskRegistry;
pub use task::{CopyRequest, TaskHandle};
