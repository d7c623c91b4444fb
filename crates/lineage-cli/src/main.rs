use std::io::{BufWriter, Write};
use std::path::Path;

use clap::Parser;
use lineage_cli::{Cli, Command, Lineage, LineageConfig, scan_versions};
use lineage_core::Node;
use lineage_logging::LineageSubscriberBuilder;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn};

/// Buffered reader over `path`, or stdin when absent
async fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = LineageConfig::load(cli.config.as_deref())?.apply(&cli);

    let _guard = LineageSubscriberBuilder::new()
        .with_config(config.logging.clone())
        .init()?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    // `versions` needs no local state
    let open = || Lineage::open(&config);

    match cli.command {
        Command::Versions { file } => {
            scan_versions(open_input(file.as_deref()).await?, &mut out).await?;
        }

        Command::Append { file } => {
            open().await?.append(open_input(file.as_deref()).await?).await?;
        }

        Command::Rebuild => {
            let summary = open().await?.rebuild().await?;
            info!(statements = summary.statements, "Index rebuilt");
        }

        Command::Head { anchor } => match open().await?.head(&Node::iri(&anchor))? {
            Some(latest) => writeln!(out, "{}", latest.version)?,
            None => warn!(anchor = %anchor, "No provenance found"),
        },

        Command::Ls { anchor, format } => {
            let summary = open().await?.list(&Node::iri(&anchor), format, &mut out).await?;
            if summary.failed > 0 {
                warn!(failed = summary.failed, "Some versions could not be resolved");
            }
        }

        Command::Get { keys } => {
            let summary = open().await?.get(keys, &mut out).await?;
            out.flush()?;
            if summary.failed > 0 {
                anyhow::bail!("{} of the requested keys could not be resolved", summary.failed);
            }
        }

        Command::Import { key } => {
            open().await?.import(&key).await?;
        }
    }

    out.flush()?;
    Ok(())
}
