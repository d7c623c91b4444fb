//! Command implementations
//!
//! Commands write content to the given writer and log progress through
//! `tracing`, so stdout carries nothing but content.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use lineage_core::{ContentImporter, HashKey, Node, OutputFormat, Statement};
use lineage_index::{
    HashListImporter, MostRecentVersion, ProvenanceTracer, ReplaySummary, StatementStore,
    VersionError, VersionResolver, parse_as_version_statement,
};
use lineage_logging::{fields, spans};
use lineage_remote::RemoteResolver;
use lineage_store::ContentStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{Instrument, Span, field, info, info_span, warn};

use crate::config::LineageConfig;

/// Outcome of `append`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendSummary {
    pub appended: usize,
    pub skipped: usize,
}

/// Outcome of `ls` and `get`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopySummary {
    pub copied: usize,
    pub failed: usize,
}

/// Print one version statement per line of `reader` that yields one
///
/// Needs no local state.
pub async fn scan_versions<R, W>(reader: R, writer: &mut W) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    async move {
        let mut found = 0;
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(statement) = parse_as_version_statement(&line) {
                writeln!(writer, "{}", statement)?;
                found += 1;
            }
        }
        Span::current().record(fields::VERSIONS, found);
        Ok(found)
    }
    .instrument(info_span!(spans::SCAN_VERSIONS, versions = field::Empty))
    .await
}

/// Local state plus remote resolution
pub struct Lineage {
    statements: StatementStore,
    resolver: Arc<RemoteResolver>,
}

impl Lineage {
    /// Open the statement store and content store described by `config`
    pub async fn open(config: &LineageConfig) -> anyhow::Result<Self> {
        let statements = StatementStore::open(config.statement_store_config())
            .await
            .context("Failed to open statement store")?;
        let content = ContentStore::new(config.store_config())
            .await
            .context("Failed to open content store")?;
        let resolver = RemoteResolver::new(config.remote.clone(), Arc::new(content))?;

        Ok(Self {
            statements,
            resolver: Arc::new(resolver),
        })
    }

    /// Local content store
    pub fn content(&self) -> &Arc<ContentStore> {
        self.resolver.store()
    }

    /// Append quad lines; unparseable lines are skipped and counted
    pub async fn append<R>(&self, reader: R) -> anyhow::Result<AppendSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        async move {
            let mut summary = AppendSummary::default();
            let mut lines = reader.lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                if self.statements.append_line(&line).await? {
                    summary.appended += 1;
                } else {
                    summary.skipped += 1;
                }
            }

            let span = Span::current();
            span.record(fields::STATEMENTS, summary.appended);
            span.record(fields::SKIPPED, summary.skipped);
            info!(
                appended = summary.appended,
                skipped = summary.skipped,
                "Appended statements"
            );
            Ok(summary)
        }
        .instrument(info_span!(
            spans::APPEND,
            statements = field::Empty,
            skipped = field::Empty
        ))
        .await
    }

    /// Rebuild the index from the statement log
    pub async fn rebuild(&self) -> anyhow::Result<ReplaySummary> {
        let summary = self
            .statements
            .rebuild()
            .instrument(info_span!(spans::REBUILD))
            .await?;
        if summary.skipped > 0 {
            warn!(skipped = summary.skipped, "Skipped unparseable log lines");
        }
        Ok(summary)
    }

    /// Most recent version of `anchor`, or `None` without history
    pub fn head(&self, anchor: &Node) -> anyhow::Result<Option<MostRecentVersion>> {
        let _span = info_span!(spans::HEAD, anchor = %anchor).entered();
        let index = self.statements.index();
        let mut ignore = |_: &Statement| {};

        match VersionResolver::new(index.as_ref()).find_most_recent_version(anchor, &mut ignore) {
            Ok(latest) => Ok(Some(latest)),
            Err(VersionError::NoHistoryFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Trace `anchor` and copy every version's content through `format`
    ///
    /// Versions that cannot be resolved are logged and skipped.
    pub async fn list<W: Write>(
        &self,
        anchor: &Node,
        format: OutputFormat,
        writer: W,
    ) -> anyhow::Result<CopySummary> {
        let span = info_span!(
            spans::LIST,
            anchor = %anchor,
            versions = field::Empty,
            failed = field::Empty
        );

        let versions = {
            let _entered = span.enter();
            let index = self.statements.index();
            let mut ignore = |_: &Statement| {};
            match ProvenanceTracer::new(index.as_ref()).trace(anchor, &mut ignore) {
                Ok(trace) => trace.versions,
                Err(VersionError::NoHistoryFound { .. }) => {
                    warn!("No provenance found");
                    return Ok(CopySummary::default());
                }
                Err(e) => return Err(e.into()),
            }
        };
        span.record(fields::VERSIONS, versions.len());

        let mut sink = format.sink(writer);
        let mut summary = CopySummary::default();
        for version in &versions {
            match self.resolver.resolve(version).instrument(span.clone()).await {
                Ok(bytes) => {
                    sink.copy(version, &bytes)?;
                    summary.copied += 1;
                }
                Err(e) => {
                    warn!(parent: &span, key = %version, error = %e, "Failed to resolve version");
                    summary.failed += 1;
                }
            }
        }

        span.record(fields::FAILED, summary.failed);
        Ok(summary)
    }

    /// Resolve `keys` concurrently and write their bytes in input order
    pub async fn get<W: Write>(
        &self,
        keys: Vec<HashKey>,
        writer: &mut W,
    ) -> anyhow::Result<CopySummary> {
        let span = info_span!(spans::GET, failed = field::Empty);
        let results = self.resolver.resolve_many(keys).instrument(span.clone()).await;

        let mut summary = CopySummary::default();
        for (key, result) in results {
            match result {
                Ok(bytes) => {
                    writer.write_all(&bytes)?;
                    summary.copied += 1;
                }
                Err(e) => {
                    warn!(parent: &span, key = %key, error = %e, "Failed to resolve");
                    summary.failed += 1;
                }
            }
        }

        span.record(fields::FAILED, summary.failed);
        Ok(summary)
    }

    /// Resolve a hash list and append the version statements it implies
    pub async fn import(&self, key: &HashKey) -> anyhow::Result<usize> {
        async move {
            let content = self.resolver.resolve(key).await?;
            let outcome = HashListImporter::new().import(key, &content)?;
            for statement in &outcome.statements {
                self.statements.append(statement).await?;
            }

            Span::current().record(fields::STATEMENTS, outcome.statements.len());
            info!(statements = outcome.statements.len(), "Imported hash list");
            Ok(outcome.statements.len())
        }
        .instrument(info_span!(spans::IMPORT, key = %key, statements = field::Empty))
        .await
    }
}
