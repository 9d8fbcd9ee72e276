//! Error types for the TTL cache
//!
//! Cache operations never fail; only configuration does. Missing and expired
//! keys are ordinary outcomes reported through `Option`/`Lookup`, not errors.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction and reconfiguration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A duration setting was given a negative value
    #[error("{field} must not be negative (got {value} ms)")]
    NegativeDuration { field: &'static str, value: i64 },

    /// A duration setting does not fit in u64 nanoseconds
    #[error("{field} is too large to be represented in nanoseconds")]
    DurationOverflow { field: &'static str },

    /// Any other rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
