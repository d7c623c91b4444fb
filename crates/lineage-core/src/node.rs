//! Graph nodes
//!
//! Subjects and objects of statements. Only [`Node::Hash`] refers to
//! dereferenceable content; every other variant is a name or a value.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::HashKey;

/// Path segment marking an IRI minted in place of a blank node
pub const SKOLEM_GENID: &str = "/.well-known/genid/";

/// A literal value with its optional language tag or datatype
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    /// Lexical value (unescaped)
    pub value: String,
    /// Language tag, without the leading `@`
    pub language: Option<String>,
    /// Datatype IRI
    pub datatype: Option<String>,
}

impl Literal {
    /// Create a plain literal
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    /// Set the language tag
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the datatype IRI
    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }
}

/// A subject or object in a statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Node {
    /// Content-addressed IRI
    Hash(HashKey),
    /// Any other IRI
    Iri(String),
    /// Blank node label, without the leading `_:`
    Blank(String),
    /// Literal value
    Literal(Literal),
}

impl Node {
    /// Create a node from IRI text, recognizing hash keys
    pub fn iri(iri: impl AsRef<str>) -> Self {
        let iri = iri.as_ref();
        match HashKey::parse(iri) {
            Ok(key) => Self::Hash(key),
            Err(_) => Self::Iri(iri.to_string()),
        }
    }

    /// Create a blank node with the given label
    pub fn blank(label: impl Into<String>) -> Self {
        Self::Blank(label.into())
    }

    /// Create a blank node with a fresh random label
    pub fn fresh_blank() -> Self {
        Self::Blank(Uuid::new_v4().to_string())
    }

    /// Create a plain literal node
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(Literal::new(value))
    }

    /// The hash key, if this node is content-addressed
    pub fn as_hash_key(&self) -> Option<&HashKey> {
        match self {
            Self::Hash(key) => Some(key),
            _ => None,
        }
    }

    /// IRI text of `Hash` and `Iri` nodes
    pub fn iri_text(&self) -> Option<String> {
        match self {
            Self::Hash(key) => Some(key.to_string()),
            Self::Iri(iri) => Some(iri.clone()),
            Self::Blank(_) | Self::Literal(_) => None,
        }
    }

    /// True for blank nodes and IRIs minted to stand in for them
    pub fn is_blank_or_skolemized(&self) -> bool {
        match self {
            Self::Blank(_) => true,
            Self::Iri(iri) => iri.contains(SKOLEM_GENID),
            Self::Hash(_) | Self::Literal(_) => false,
        }
    }

    /// True for IRI-like nodes that are not blank or skolemized
    pub fn is_named(&self) -> bool {
        matches!(self, Self::Hash(_) | Self::Iri(_)) && !self.is_blank_or_skolemized()
    }

    /// Plain text of the node: IRI without brackets, label, or literal value
    pub fn plain_text(&self) -> String {
        match self {
            Self::Hash(key) => key.to_string(),
            Self::Iri(iri) => iri.clone(),
            Self::Blank(label) => format!("_:{}", label),
            Self::Literal(literal) => literal.value.clone(),
        }
    }
}

impl From<HashKey> for Node {
    fn from(key: HashKey) -> Self {
        Self::Hash(key)
    }
}

impl fmt::Display for Node {
    /// Formats the node as a quad-line term
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash(key) => write!(f, "<{}>", key),
            Self::Iri(iri) => write!(f, "<{}>", iri),
            Self::Blank(label) => write!(f, "_:{}", label),
            Self::Literal(literal) => {
                write!(f, "\"{}\"", escape_literal(&literal.value))?;
                if let Some(language) = &literal.language {
                    write!(f, "@{}", language)
                } else if let Some(datatype) = &literal.datatype {
                    write!(f, "^^<{}>", datatype)
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Escape a literal value for the quad line format
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}
