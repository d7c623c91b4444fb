//! Collaborator capabilities
//!
//! Interfaces through which the core hands its results to the outside:
//! statement listeners (version walks), copy sinks (resolved content) and
//! content importers (format-specific statement extraction).

use std::io::{self, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::hash::HashKey;
use crate::nquads;
use crate::statement::Statement;

/// Receives statements as they are discovered
pub trait StatementListener {
    fn on_statement(&mut self, statement: &Statement);
}

impl<F> StatementListener for F
where
    F: FnMut(&Statement),
{
    fn on_statement(&mut self, statement: &Statement) {
        self(statement)
    }
}

impl StatementListener for Vec<Statement> {
    fn on_statement(&mut self, statement: &Statement) {
        self.push(statement.clone());
    }
}

/// Output formats for copied content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Raw bytes, unchanged
    #[default]
    NQuads,
    /// One tab-separated row per quad line
    Tsv,
}

impl OutputFormat {
    /// Build the sink for this format
    pub fn sink<'w, W: Write + 'w>(self, writer: W) -> Box<dyn CopySink + 'w> {
        match self {
            Self::NQuads => Box::new(NQuadsSink::new(writer)),
            Self::Tsv => Box::new(TsvSink::new(writer)),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nquads" | "nq" => Ok(Self::NQuads),
            "tsv" => Ok(Self::Tsv),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// Receives resolved content
pub trait CopySink {
    fn copy(&mut self, key: &HashKey, content: &[u8]) -> io::Result<()>;
}

/// Copies content bytes verbatim
pub struct NQuadsSink<W> {
    writer: W,
}

impl<W: Write> NQuadsSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> CopySink for NQuadsSink<W> {
    fn copy(&mut self, _key: &HashKey, content: &[u8]) -> io::Result<()> {
        self.writer.write_all(content)?;
        self.writer.flush()
    }
}

/// Rewrites quad lines as `subject<TAB>predicate<TAB>object<TAB>graph`
///
/// Lines that are not quads are dropped.
pub struct TsvSink<W> {
    writer: W,
}

impl<W: Write> TsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> CopySink for TsvSink<W> {
    fn copy(&mut self, _key: &HashKey, content: &[u8]) -> io::Result<()> {
        let text = String::from_utf8_lossy(content);
        for statement in nquads::statements(&text) {
            writeln!(
                self.writer,
                "{}\t{}\t{}\t{}",
                statement.subject.plain_text(),
                statement.predicate,
                tsv_escape(&statement.object.plain_text()),
                statement
                    .graph
                    .as_ref()
                    .map(|g| g.plain_text())
                    .unwrap_or_default()
            )?;
        }
        self.writer.flush()
    }
}

fn tsv_escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\n', "\\n")
}

/// What an importer extracted from one content version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Whether any structured records were found
    pub extracted: bool,
    /// Statements derived from the content
    pub statements: Vec<Statement>,
}

/// Extracts statements from the content of one version
pub trait ContentImporter: Send + Sync {
    fn import(&self, version: &HashKey, content: &[u8]) -> Result<ImportOutcome, CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::vocab::VersionPredicate;

    #[test]
    fn test_closure_listener() {
        let mut seen = 0;
        let mut listener = |_: &Statement| seen += 1;
        let statement = Statement::new(Node::iri("urn:a"), "urn:p", Node::iri("urn:b"));
        listener.on_statement(&statement);
        listener.on_statement(&statement);
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_nquads_sink_copies_verbatim() {
        let mut out = Vec::new();
        let key = HashKey::sha256(b"raw");
        OutputFormat::NQuads
            .sink(&mut out)
            .copy(&key, b"raw bytes\n")
            .unwrap();
        assert_eq!(out, b"raw bytes\n");
    }

    #[test]
    fn test_tsv_sink() {
        let key = HashKey::sha256(b"v1");
        let statement = Statement::version_edge(
            Node::iri("urn:dataset:1"),
            VersionPredicate::HasVersion,
            Node::Hash(key.clone()),
        );
        let content = format!("{}\nnot a quad\n", statement);

        let mut out = Vec::new();
        OutputFormat::Tsv
            .sink(&mut out)
            .copy(&key, content.as_bytes())
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            format!(
                "urn:dataset:1\thttp://purl.org/pav/hasVersion\t{}\t\n",
                key
            )
        );
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("TSV".parse::<OutputFormat>(), Ok(OutputFormat::Tsv));
        assert_eq!("nq".parse::<OutputFormat>(), Ok(OutputFormat::NQuads));
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
