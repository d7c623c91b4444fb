//! Error types for lineage-store

use lineage_core::{HashAlgorithm, HashKey};
use thiserror::Error;

/// Errors that can occur in content store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Content is larger than the store accepts
    #[error("Content too large: {size} bytes exceeds limit of {max} bytes")]
    CapacityExceeded { size: u64, max: u64 },

    /// Bytes do not reproduce the key they are stored under
    #[error("Hash mismatch for {expected}: content hashes to {actual}")]
    HashMismatch { expected: HashKey, actual: HashKey },

    /// The store cannot compute keys of this algorithm
    #[error("Cannot compute {0} keys locally")]
    UncomputableAlgorithm(HashAlgorithm),

    /// Container could not be read
    #[error("Container error: {0}")]
    Container(String),

    /// Blocking task failed to complete
    #[error("Task error: {0}")]
    Task(String),
}

impl StoreError {
    /// Create a new container error
    pub fn container(message: impl Into<String>) -> Self {
        Self::Container(message.into())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message() {
        let err = StoreError::CapacityExceeded { size: 10, max: 5 };
        assert_eq!(
            err.to_string(),
            "Content too large: 10 bytes exceeds limit of 5 bytes"
        );
    }

    #[test]
    fn test_mismatch_message() {
        let expected = HashKey::sha256(b"a");
        let actual = HashKey::sha256(b"b");
        let err = StoreError::HashMismatch {
            expected: expected.clone(),
            actual,
        };
        assert!(err.to_string().contains(&expected.to_string()));
    }
}
