//! Error types for lineage

use thiserror::Error;

/// Top-level error type for the core crate
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Hash key error: {0}")]
    HashKey(#[from] HashKeyError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Import failed: {0}")]
    Import(String),
}

/// Reasons a string is not a content hash key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashKeyError {
    #[error("missing hash:// scheme in {0:?}")]
    MissingScheme(String),

    #[error("unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid {algorithm} digest length: expected {expected}, got {actual}")]
    InvalidDigestLength {
        algorithm: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid character {found:?} in {algorithm} digest")]
    InvalidDigestCharacter { algorithm: &'static str, found: char },
}

/// Errors raised while reading a quad line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("unexpected end of line at column {0}")]
    UnexpectedEnd(usize),

    #[error("invalid term at column {column}: {reason}")]
    InvalidTerm { column: usize, reason: String },

    #[error("predicate must be an IRI")]
    PredicateNotIri,

    #[error("missing ' .' statement terminator")]
    MissingTerminator,
}

impl ParseError {
    /// Create a new InvalidTerm error
    pub fn invalid_term(column: usize, reason: impl Into<String>) -> Self {
        Self::InvalidTerm {
            column,
            reason: reason.into(),
        }
    }
}
