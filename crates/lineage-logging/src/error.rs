//! Logging setup errors

use thiserror::Error;

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Log directory or file could not be created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rolling file appender could not be created
    #[error("File appender error: {0}")]
    Appender(String),

    /// Level directive could not be parsed
    #[error("Invalid filter '{directive}': {reason}")]
    Filter { directive: String, reason: String },

    /// A global subscriber is already installed
    #[error("Subscriber already initialized: {0}")]
    Init(String),
}
