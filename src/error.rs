#![forbid(unsafe_code)]

//! Error types for store read operations.

use std::fmt;

/// Errors surfaced by the failing read accessors.
///
/// Always a caller-input error: nothing here is transient, so callers should
/// not retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// A `require()` lookup found no entry for the requested key.
    KeyNotFound,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyNotFound => write!(f, "key not found in store"),
        }
    }
}

impl std::error::Error for StoreError {}
