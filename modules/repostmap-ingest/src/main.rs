use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use repostmap_common::{Config, RawRepost, RepostMapError};
use repostmap_graph::{migrate, GraphClient, GraphWriter};

#[derive(Parser)]
#[command(name = "repostmap-ingest", about = "Load a repost export into the graph store")]
struct Cli {
    /// Path to the JSON-Lines repost export. Falls back to SOURCE_DATA_PATH.
    #[arg(long)]
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting data ingestion");

    let cli = Cli::parse();
    let config = Config::ingest_from_env();

    let path = cli
        .file
        .or_else(|| config.source_data_path.clone().map(PathBuf::from))
        .context("No source file: pass --file or set SOURCE_DATA_PATH")?;

    let records = load_records(&path)
        .with_context(|| format!("Failed to load repost export from {}", path.display()))?;
    info!(records = records.len(), file = %path.display(), "Loaded repost export");

    let client = GraphClient::connect(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password)
        .await
        .context("Failed to connect to graph store")?;

    migrate::migrate(&client)
        .await
        .context("Schema migration failed")?;

    let writer = GraphWriter::with_batch_size(client, config.ingest_batch_size);
    let total = records.len();
    let report = writer.ingest(&records).await?;

    info!(
        accepted = report.accepted,
        skipped = report.skipped,
        batches = report.batches,
        "Ingestion complete"
    );

    if report.accepted == 0 && report.skipped > 0 {
        return Err(RepostMapError::Validation(format!(
            "no valid rows in {total} input records ({} skipped)",
            report.skipped
        ))
        .into());
    }
    if report.accepted == 0 {
        warn!("Input file contained no rows");
    }

    Ok(())
}

/// Read the export as JSON Lines. A line that is not valid JSON aborts the
/// load (corrupt file); per-field validation happens later, in the
/// pipeline, where bad rows are skipped and counted.
fn load_records(path: &Path) -> Result<Vec<RawRepost>> {
    let file = File::open(path)?;
    let mut records = Vec::new();

    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: RawRepost = serde_json::from_str(&line)
            .with_context(|| format!("Malformed JSON on line {}", lineno + 1))?;
        records.push(record);
    }

    Ok(records)
}
