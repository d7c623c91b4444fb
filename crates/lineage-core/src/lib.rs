//! # Lineage Core
//!
//! Core types for tracking dataset provenance as an append-only log of
//! statements whose content nodes are content-addressed.
//!
//! ## Key Types
//!
//! - [`HashKey`]: `hash://<algorithm>/<digest>` identifier, validated on parse
//! - [`Node`]: hash key, IRI, blank node or literal
//! - [`Statement`]: subject–predicate–object quad, written one per line
//! - [`VersionPredicate`]: the version-edge vocabulary and its direction table
//!
//! ## Collaborators
//!
//! - [`StatementListener`]: receives statements discovered during a walk
//! - [`CopySink`]: receives resolved content, selected by [`OutputFormat`]
//! - [`ContentImporter`]: extracts statements from resolved content

pub mod collab;
pub mod error;
pub mod hash;
pub mod node;
pub mod nquads;
pub mod statement;
pub mod vocab;

pub use collab::{
    ContentImporter, CopySink, ImportOutcome, NQuadsSink, OutputFormat, StatementListener,
    TsvSink,
};
pub use error::{CoreError, HashKeyError, ParseError};
pub use hash::{HashAlgorithm, HashKey};
pub use node::{Literal, Node};
pub use statement::Statement;
pub use vocab::{NewerSide, VersionPredicate};
