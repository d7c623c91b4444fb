//! Line classifiers
//!
//! Each classifier recognizes one predicate shape in a raw quad line and
//! extracts the IRI text on the newer side of the edge.

use std::sync::LazyLock;

use lineage_core::vocab::{HAS_PREVIOUS_VERSION, HAS_VERSION, USED_BY, WAS_DERIVED_FROM};
use regex::Regex;
use tracing::warn;

/// IRI text inside angle brackets
const VERSION_PATTERN: &str = "[^<>]*";

/// Extracts the newer node from a raw quad line
pub trait LineClassifier: Send + Sync {
    /// IRI text of the newer node, if the line has this classifier's shape
    fn newer_version<'a>(&self, line: &'a str) -> Option<&'a str>;
}

fn predicate_alternation(predicates: &[&str]) -> String {
    predicates
        .iter()
        .map(|p| format!("<{}>", regex::escape(p)))
        .collect::<Vec<_>>()
        .join("|")
}

/// Lines of the form `<newer> <predicate> ... .`
#[derive(Debug, Clone)]
pub struct SubjectNewer {
    pattern: Regex,
}

impl SubjectNewer {
    /// Match any of the given predicates
    pub fn new(predicates: &[&str]) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"^<(?P<subj>{})> ({}) (.*) [.]$",
            VERSION_PATTERN,
            predicate_alternation(predicates)
        ))?;
        Ok(Self { pattern })
    }
}

impl LineClassifier for SubjectNewer {
    fn newer_version<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(line)
            .and_then(|c| c.name("subj"))
            .map(|m| m.as_str())
    }
}

/// Lines of the form `... <predicate> <newer> ... .`
#[derive(Debug, Clone)]
pub struct ObjectNewer {
    pattern: Regex,
}

impl ObjectNewer {
    /// Match the given predicate
    pub fn new(predicate: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"^.* ({}) <(?P<obj>{})>(.*) [.]$",
            predicate_alternation(&[predicate]),
            VERSION_PATTERN
        ))?;
        Ok(Self { pattern })
    }
}

impl LineClassifier for ObjectNewer {
    fn newer_version<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(line)
            .and_then(|c| c.name("obj"))
            .map(|m| m.as_str())
    }
}

/// An ordered set of classifiers; the first match wins
pub struct LineClassifiers {
    classifiers: Vec<Box<dyn LineClassifier>>,
}

static DEFAULT_CLASSIFIERS: LazyLock<LineClassifiers> = LazyLock::new(|| {
    LineClassifiers::from_patterns(vec![
        SubjectNewer::new(&[HAS_PREVIOUS_VERSION, WAS_DERIVED_FROM, USED_BY]).map(boxed),
        ObjectNewer::new(HAS_VERSION).map(boxed),
    ])
});

static USED_BY_CLASSIFIERS: LazyLock<LineClassifiers> =
    LazyLock::new(|| LineClassifiers::from_patterns(vec![SubjectNewer::new(&[USED_BY]).map(boxed)]));

fn boxed<C: LineClassifier + 'static>(classifier: C) -> Box<dyn LineClassifier> {
    Box::new(classifier)
}

impl LineClassifiers {
    /// Build a set from explicit classifiers
    pub fn new(classifiers: Vec<Box<dyn LineClassifier>>) -> Self {
        Self { classifiers }
    }

    fn from_patterns(patterns: Vec<Result<Box<dyn LineClassifier>, regex::Error>>) -> Self {
        let classifiers = patterns
            .into_iter()
            .filter_map(|pattern| {
                pattern
                    .inspect_err(|e| warn!(error = %e, "Dropping classifier with invalid pattern"))
                    .ok()
            })
            .collect();
        Self::new(classifiers)
    }

    /// Subject-newer predicates, then `hasVersion`
    pub fn standard() -> &'static Self {
        &DEFAULT_CLASSIFIERS
    }

    /// `usedBy` only
    pub fn used_by_only() -> &'static Self {
        &USED_BY_CLASSIFIERS
    }

    /// IRI text of the newer node from the first matching classifier
    pub fn newer_version<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.classifiers
            .iter()
            .find_map(|classifier| classifier.newer_version(line))
    }
}
