//! Result type alias for bulkcp operations

use crate::Error;

/// Result type alias for bulkcp operations
pub type Result<T> = std::result::Result<T, Error>;
