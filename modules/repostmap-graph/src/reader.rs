use std::collections::HashMap;

use chrono::Utc;
use neo4rs::query;
use tracing::debug;

use repostmap_common::{ChannelNode, RepostEdge, TimeRange, WindowedView};

use crate::GraphClient;

/// Read-only wrapper for the graph. Used by the web server.
///
/// Does NOT expose raw Cypher or general traversals; the only queries are
/// the overall timestamp range and the windowed subgraph.
pub struct GraphReader {
    client: GraphClient,
}

impl GraphReader {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Minimum and maximum repost timestamp across the store.
    ///
    /// An empty store yields `(0, now)`. Callers must treat that pair as
    /// "no data", not as a real range.
    pub async fn overall_range(&self) -> Result<TimeRange, neo4rs::Error> {
        let q = query(
            "MATCH ()-[r:REPOSTED]->()
             WHERE r.timestamp IS NOT NULL
             RETURN min(r.timestamp) AS min_ts, max(r.timestamp) AS max_ts",
        );

        let mut stream = self.client.graph.execute(q).await?;
        if let Some(row) = stream.next().await? {
            // min()/max() come back null when no edges matched
            let min_ts: Result<i64, _> = row.get("min_ts");
            let max_ts: Result<i64, _> = row.get("max_ts");
            if let (Ok(min_ts), Ok(max_ts)) = (min_ts, max_ts) {
                return Ok(TimeRange { min_ts, max_ts });
            }
        }

        Ok(TimeRange {
            min_ts: 0,
            max_ts: Utc::now().timestamp_millis(),
        })
    }

    /// Induced subgraph for the closed window `[start, end]`.
    ///
    /// Inverted bounds are swapped rather than rejected. A window that
    /// matches nothing returns an empty view, not an error. The timestamp
    /// filter rides the `repost_timestamp_idx` index, so narrow windows do
    /// not scan the full edge set.
    pub async fn windowed_view(
        &self,
        start: i64,
        end: i64,
    ) -> Result<WindowedView, neo4rs::Error> {
        let (start, end) = normalize_window(start, end);

        let q = query(
            "MATCH (s:Channel)-[r:REPOSTED]->(t:Channel)
             WHERE r.timestamp >= $start AND r.timestamp <= $end
             RETURN s.channel_id AS source, t.channel_id AS target,
                    r.timestamp AS timestamp",
        )
        .param("start", start)
        .param("end", end);

        let mut edges = Vec::new();
        let mut stream = self.client.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            let source: String = row.get("source").unwrap_or_default();
            let target: String = row.get("target").unwrap_or_default();
            let timestamp: i64 = row.get("timestamp").unwrap_or_default();
            if !source.is_empty() && !target.is_empty() {
                edges.push(RepostEdge {
                    source,
                    target,
                    timestamp,
                });
            }
        }

        debug!(start, end, edges = edges.len(), "Windowed edge scan");
        Ok(view_from_edges(edges))
    }
}

/// Swap inverted bounds so the window is always well-ordered.
pub fn normalize_window(start: i64, end: i64) -> (i64, i64) {
    if start <= end {
        (start, end)
    } else {
        (end, start)
    }
}

/// Assemble the view from an already-filtered edge list.
///
/// Node set and degrees both derive from the same edges: a node appears iff
/// it touches an in-window edge, and its degree counts exactly those
/// incidences (both directions; a self-loop counts twice). Degree can never
/// leak edges from outside the window because nothing outside the list
/// exists here.
pub fn view_from_edges(edges: Vec<RepostEdge>) -> WindowedView {
    let mut degrees: HashMap<String, u32> = HashMap::new();
    for e in &edges {
        *degrees.entry(e.source.clone()).or_insert(0) += 1;
        *degrees.entry(e.target.clone()).or_insert(0) += 1;
    }

    let mut nodes: Vec<ChannelNode> = degrees
        .into_iter()
        .map(|(id, degree)| ChannelNode { id, degree })
        .collect();
    // Deterministic order for callers and tests
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    WindowedView { nodes, edges }
}
