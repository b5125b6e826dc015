//! Error types for radix-map

use thiserror::Error;

/// Result type alias for fallible map operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by fallible [`RadixMap`](crate::RadixMap) operations.
///
/// Lookups never fail: a missing key is reported as `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("node arena is full: cannot address more than {limit} nodes")]
    CapacityExceeded { limit: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
