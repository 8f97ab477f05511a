//! Configuration value types for bulkcp
//!
//! Validated newtypes used by the configuration layer.

use serde::{Deserialize, Serialize};

/// I/O chunk size with validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSize(usize);

impl ChunkSize {
    /// Minimum chunk size (4KB)
    pub const MIN: usize = 4 * 1024;
    /// Maximum chunk size (64MB)
    pub const MAX: usize = 64 * 1024 * 1024;
    /// Default chunk size (1MB)
    pub const DEFAULT: usize = 1024 * 1024;

    /// Create a new chunk size with validation
    pub fn new(size: usize) -> Result<Self, String> {
        if size < Self::MIN {
            Err(format!("Chunk size {} is below minimum {}", size, Self::MIN))
        } else if size > Self::MAX {
            Err(format!("Chunk size {} exceeds maximum {}", size, Self::MAX))
        } else if !size.is_power_of_two() {
            Err(format!("Chunk size {} must be a power of two", size))
        } else {
            Ok(Self(size))
        }
    }

    /// Get the chunk size value
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Limit on simultaneously running copy workers.
///
/// Zero means unlimited: every created task gets a worker immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyLimit(usize);

impl ConcurrencyLimit {
    /// Maximum worker count
    pub const MAX: usize = 256;

    /// Create a new concurrency limit with validation
    pub fn new(limit: usize) -> Result<Self, String> {
        if limit > Self::MAX {
            Err(format!(
                "Concurrency limit {} exceeds maximum {}",
                limit,
                Self::MAX
            ))
        } else {
            Ok(Self(limit))
        }
    }

    /// An unlimited concurrency setting
    pub fn unlimited() -> Self {
        Self(0)
    }

    /// Get the raw limit value (0 = unlimited)
    pub fn get(self) -> usize {
        self.0
    }

    /// Get the limit as an optional worker cap
    pub fn cap(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0)
        }
    }
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        Self::unlimited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ChunkSize::MIN, true)]
    #[case(ChunkSize::MAX, true)]
    #[case(ChunkSize::DEFAULT, true)]
    #[case(ChunkSize::MIN / 2, false)]
    #[case(ChunkSize::MAX * 2, false)]
    #[case(ChunkSize::MIN + 1, false)] // not a power of two
    fn test_chunk_size_bounds(#[case] size: usize, #[case] valid: bool) {
        assert_eq!(ChunkSize::new(size).is_ok(), valid);
    }

    #[test]
    fn test_chunk_size_default() {
        assert_eq!(ChunkSize::default().get(), 1024 * 1024);
    }

    #[test]
    fn test_concurrency_limit() {
        assert_eq!(ConcurrencyLimit::unlimited().cap(), None);
        assert_eq!(ConcurrencyLimit::new(4).unwrap().cap(), Some(4));
        assert!(ConcurrencyLimit::new(ConcurrencyLimit::MAX + 1).is_err());
        assert_eq!(ConcurrencyLimit::default().get(), 0);
    }
}
