use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use neo4rs::query;
use thiserror::Error;
use tracing::info;

use repostmap_common::{PreparedRepost, RawRepost};

use crate::GraphClient;

/// Default rows per write transaction.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("write batch {index} failed: {source}")]
    Batch {
        index: usize,
        #[source]
        source: neo4rs::Error,
    },
}

/// Outcome of one ingestion run. accepted + skipped equals the input count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub accepted: usize,
    pub skipped: usize,
    pub batches: usize,
}

/// Write-side wrapper for the graph. Used by the ingest binary only.
///
/// Nodes are merged by identity (idempotent); edges are always created, so
/// re-running the same export duplicates edges. That asymmetry is the
/// contract, not an accident.
pub struct GraphWriter {
    client: GraphClient,
    batch_size: usize,
}

impl GraphWriter {
    pub fn new(client: GraphClient) -> Self {
        Self {
            client,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(client: GraphClient, batch_size: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
        }
    }

    /// Validate, normalize, and write a full export.
    ///
    /// Invalid records are skipped and counted, never fatal. A failed write
    /// batch aborts the rest of the run with its index attached.
    pub async fn ingest(&self, records: &[RawRepost]) -> Result<IngestReport, IngestError> {
        let mut prepared = Vec::with_capacity(records.len());
        let mut skipped = 0usize;

        for raw in records {
            match prepare_record(raw) {
                Some(p) => prepared.push(p),
                None => skipped += 1,
            }
        }

        info!(
            accepted = prepared.len(),
            skipped, "Prepared repost records"
        );

        let mut batches = 0usize;
        for (index, chunk) in prepared.chunks(self.batch_size).enumerate() {
            self.write_batch(chunk)
                .await
                .map_err(|source| IngestError::Batch { index, source })?;
            batches += 1;
            info!(batch = index, rows = chunk.len(), "Batch written");
        }

        Ok(IngestReport {
            accepted: prepared.len(),
            skipped,
            batches,
        })
    }

    /// Write one batch in a single transaction: merge both endpoints, then
    /// create the edge. Merge-before-create keeps every edge's endpoints
    /// present in the node set.
    async fn write_batch(&self, batch: &[PreparedRepost]) -> Result<(), neo4rs::Error> {
        let rows: Vec<neo4rs::BoltType> = batch.iter().map(bolt_row).collect();

        let q = query(
            "UNWIND $batch AS row
             MERGE (source:Channel {channel_id: row.source_id})
             MERGE (target:Channel {channel_id: row.target_id})
             CREATE (source)-[:REPOSTED {timestamp: row.timestamp_ms}]->(target)",
        )
        .param("batch", rows);

        self.client.graph.run(q).await
    }
}

fn bolt_row(p: &PreparedRepost) -> neo4rs::BoltType {
    neo4rs::BoltType::Map(neo4rs::BoltMap::from_iter(vec![
        (
            neo4rs::BoltString::from("source_id"),
            neo4rs::BoltType::String(neo4rs::BoltString::from(p.source_id.as_str())),
        ),
        (
            neo4rs::BoltString::from("target_id"),
            neo4rs::BoltType::String(neo4rs::BoltString::from(p.target_id.as_str())),
        ),
        (
            neo4rs::BoltString::from("timestamp_ms"),
            neo4rs::BoltType::Integer(neo4rs::BoltInteger::new(p.timestamp_ms)),
        ),
    ]))
}

/// Validate one raw record. None means skip: missing id, missing datetime,
/// or a datetime that does not parse.
pub fn prepare_record(raw: &RawRepost) -> Option<PreparedRepost> {
    let source_id = coerce_id(raw.channel_from_id.as_ref()?)?;
    let target_id = coerce_id(raw.channel_id.as_ref()?)?;
    let timestamp_ms = to_epoch_ms(raw.publish_datetime.as_deref()?)?;
    Some(PreparedRepost {
        source_id,
        target_id,
        timestamp_ms,
    })
}

/// Coerce a raw id to canonical string form, once, at the ingestion
/// boundary. Integer-valued numbers render without a fraction so `42`,
/// `42.0`, and `"42"` all land on the same node.
pub fn coerce_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
                    Some(format!("{}", f as i64))
                } else {
                    None
                }
            }
        }
        _ => None,
    }
}

/// Parse a datetime string to UTC epoch milliseconds.
///
/// Accepts RFC 3339 with an offset, or a naive datetime (`T` or space
/// separated, optional fractional seconds). Naive values are treated as
/// UTC, never the local system timezone.
pub fn to_epoch_ms(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).timestamp_millis());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }

    None
}
