//! Core type system and error handling for bulkcp
//!
//! This crate provides the foundational types shared across the bulkcp
//! workspace:
//!
//! - **Error handling**: the task-manager error taxonomy with kinds and
//!   constructor helpers
//! - **Core types**: task identity, status state machine, record snapshots
//!   and progress payloads
//! - **Configuration**: validated configuration value types
//!
//! # Examples
//!
//! ```rust
//! use bulkcp_types::{TaskId, TaskStatus};
//!
//! let id = TaskId::new();
//! assert!(TaskStatus::Running.can_transition_to(TaskStatus::Paused));
//! assert!(!TaskStatus::Completed.is_active());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod types;

// Re-export commonly used types
pub use config::{ChunkSize, ConcurrencyLimit};
pub use error::{Error, ErrorKind};
pub use result::Result;
pub use types::*;
