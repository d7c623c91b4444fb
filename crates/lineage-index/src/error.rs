//! Error types for lineage-index
//!
//! This module defines the error types used throughout the index crate.

use thiserror::Error;

/// Errors that can occur in index and log operations
#[derive(Debug, Error)]
pub enum IndexError {
    /// I/O error while reading or appending the statement log
    #[error("I/O error: {0}")]
    Io(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Error during serialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error during deserialization
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl IndexError {
    /// Create a new I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    /// Create a new Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(err: std::io::Error) -> Self {
        IndexError::Io(err.to_string())
    }
}

/// Convert from postcard Error to IndexError
impl From<postcard::Error> for IndexError {
    fn from(err: postcard::Error) -> Self {
        IndexError::Deserialization(err.to_string())
    }
}

macro_rules! database_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for IndexError {
                fn from(err: $ty) -> Self {
                    IndexError::Database(err.to_string())
                }
            }
        )*
    };
}

database_error!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
