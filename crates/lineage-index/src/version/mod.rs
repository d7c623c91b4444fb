//! Version resolution
//!
//! Given an anchor, find its most recent content version by walking typed
//! version edges through a [`StatementIndex`](crate::StatementIndex):
//!
//! ```text
//! anchor --hasVersion--> v1 <--previousVersion-- v2 <--previousVersion-- v3
//! ```
//!
//! Also provides fast paths that classify raw log lines without building
//! an index.

mod classifier;
mod fast_path;
mod resolver;
mod tracer;

pub use classifier::{LineClassifier, LineClassifiers, ObjectNewer, SubjectNewer};
pub use fast_path::{
    maybe_not_quad, most_recent_content_id, most_recent_used_by_from_line,
    most_recent_version_from_line, most_recent_version_from_statement,
    parse_as_version_statement,
};
pub use resolver::{MostRecentVersion, VersionError, VersionResolver};
pub use tracer::{ProvenanceTracer, TraceSummary};
