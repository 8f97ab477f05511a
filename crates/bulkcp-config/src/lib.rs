//! Configuration management for bulkcp
//!
//! This crate provides the configuration layer for the copy task manager,
//! supporting YAML and TOML configuration files, validation, and
//! environment variable overrides.
//!
//! # Examples
//!
//! ```rust
//! use bulkcp_config::{Config, ConfigBuilder};
//!
//! let config = ConfigBuilder::new()
//!     .add_defaults()
//!     .add_env_prefix("BULKCP")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Chunk size: {}", config.copy.chunk_size.get());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use bulkcp_types::{ChunkSize, ConcurrencyLimit};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Main configuration structure for bulkcp
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Copy behavior configuration
    pub copy: CopyConfig,
    /// Scheduling configuration
    pub scheduler: SchedulerConfig,
    /// Task-log export configuration
    pub export: ExportConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Copy behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    /// Chunk size for I/O operations
    pub chunk_size: ChunkSize,
    /// Preserve timestamps and permissions on copied files
    pub preserve_metadata: bool,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            chunk_size: ChunkSize::default(),
            preserve_metadata: true,
        }
    }
}

/// Scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of simultaneously running tasks (0 = unlimited)
    pub max_concurrent_tasks: ConcurrencyLimit,
    /// Interval at which a paused worker re-checks its flags
    pub pause_poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: ConcurrencyLimit::unlimited(),
            pause_poll_interval: Duration::from_millis(100),
        }
    }
}

/// Task-log export configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory for exported task logs (system temp dir when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Emit logs as JSON
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
