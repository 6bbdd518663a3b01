use serde::{Deserialize, Serialize};

/// One row of the raw repost export, as it appears on disk.
///
/// Field names follow the export's columns. Ids arrive as either JSON
/// strings or numbers depending on how the export was produced, so they are
/// kept as raw values until coercion at the ingestion boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRepost {
    #[serde(default)]
    pub channel_from_id: Option<serde_json::Value>,
    #[serde(default)]
    pub channel_id: Option<serde_json::Value>,
    #[serde(default)]
    pub publish_datetime: Option<String>,
}

/// A validated repost ready for the graph: canonical string ids and a
/// UTC epoch-millisecond timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRepost {
    pub source_id: String,
    pub target_id: String,
    pub timestamp_ms: i64,
}

/// A channel as returned by a windowed query. Degree is computed from the
/// edges inside the queried window only; it is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelNode {
    pub id: String,
    pub degree: u32,
}

/// A repost edge as returned by a windowed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepostEdge {
    pub source: String,
    pub target: String,
    pub timestamp: i64,
}

/// The induced subgraph for one time window: every edge with a timestamp in
/// the window, every node touched by such an edge, nothing else.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WindowedView {
    pub nodes: Vec<ChannelNode>,
    pub edges: Vec<RepostEdge>,
}

/// Minimum and maximum edge timestamp across the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub min_ts: i64,
    pub max_ts: i64,
}
