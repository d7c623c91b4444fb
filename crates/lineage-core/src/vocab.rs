//! Version-edge vocabulary
//!
//! Each version predicate has exactly one side that is semantically newer.

use serde::{Deserialize, Serialize};

/// `anchor hasVersion content`
pub const HAS_VERSION: &str = "http://purl.org/pav/hasVersion";
/// `newer hasPreviousVersion older`
pub const HAS_PREVIOUS_VERSION: &str = "http://purl.org/pav/previousVersion";
/// `derived wasDerivedFrom source`
pub const WAS_DERIVED_FROM: &str = "http://www.w3.org/ns/prov#wasDerivedFrom";
/// `user usedBy used`
pub const USED_BY: &str = "http://www.w3.org/ns/prov#usedBy";

/// Which side of a statement holds the newer node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewerSide {
    Subject,
    Object,
}

/// Predicates that link versions of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionPredicate {
    HasVersion,
    HasPreviousVersion,
    WasDerivedFrom,
    UsedBy,
}

impl VersionPredicate {
    /// All version predicates
    pub const ALL: [VersionPredicate; 4] = [
        Self::HasVersion,
        Self::HasPreviousVersion,
        Self::WasDerivedFrom,
        Self::UsedBy,
    ];

    /// Full predicate IRI
    pub fn iri(&self) -> &'static str {
        match self {
            Self::HasVersion => HAS_VERSION,
            Self::HasPreviousVersion => HAS_PREVIOUS_VERSION,
            Self::WasDerivedFrom => WAS_DERIVED_FROM,
            Self::UsedBy => USED_BY,
        }
    }

    /// Side of the statement that is the newer version
    pub fn newer_side(&self) -> NewerSide {
        match self {
            Self::HasVersion => NewerSide::Object,
            Self::HasPreviousVersion | Self::WasDerivedFrom | Self::UsedBy => NewerSide::Subject,
        }
    }

    /// Look up a version predicate by IRI
    pub fn from_iri(iri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.iri() == iri)
    }
}
