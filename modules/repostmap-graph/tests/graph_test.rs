//! Integration tests for ingestion and windowed queries against a real
//! Neo4j instance. Requires Docker; run with `--features test-utils`.

#![cfg(feature = "test-utils")]

use anyhow::Result;
use chrono::{DateTime, Utc};
use neo4rs::query;
use serde_json::json;

use repostmap_graph::reader::GraphReader;
use repostmap_graph::testutil::neo4j_container;
use repostmap_graph::writer::GraphWriter;
use repostmap_graph::{migrate, GraphClient};
use repostmap_common::RawRepost;

fn record(source: &str, target: &str, timestamp_ms: i64) -> RawRepost {
    let dt: DateTime<Utc> =
        DateTime::from_timestamp_millis(timestamp_ms).expect("valid test timestamp");
    RawRepost {
        channel_from_id: Some(json!(source)),
        channel_id: Some(json!(target)),
        publish_datetime: Some(dt.to_rfc3339()),
    }
}

async fn count(client: &GraphClient, cypher: &str) -> Result<i64> {
    let mut stream = client.inner().execute(query(cypher)).await?;
    let row = stream.next().await?.expect("count query returns one row");
    Ok(row.get("n")?)
}

async fn node_count(client: &GraphClient) -> Result<i64> {
    count(client, "MATCH (c:Channel) RETURN count(c) AS n").await
}

async fn edge_count(client: &GraphClient) -> Result<i64> {
    count(client, "MATCH ()-[r:REPOSTED]->() RETURN count(r) AS n").await
}

#[tokio::test]
async fn windowed_view_excludes_out_of_window_nodes() -> Result<()> {
    let (_container, client) = neo4j_container().await;
    migrate::migrate(&client).await?;

    let writer = GraphWriter::new(client.clone());
    let records = vec![
        record("A", "B", 100),
        record("B", "C", 200),
        record("A", "C", 150),
    ];
    let report = writer.ingest(&records).await?;
    assert_eq!(report.accepted, 3);
    assert_eq!(report.skipped, 0);

    let reader = GraphReader::new(client.clone());
    let view = reader.windowed_view(120, 200).await?;

    // A's only edge is at t=100, outside the window; it must not appear.
    let ids: Vec<&str> = view.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "C"]);
    for node in &view.nodes {
        assert_eq!(node.degree, 2, "windowed degree of {}", node.id);
    }

    let mut edges: Vec<(String, String, i64)> = view
        .edges
        .iter()
        .map(|e| (e.source.clone(), e.target.clone(), e.timestamp))
        .collect();
    edges.sort();
    assert_eq!(
        edges,
        vec![
            ("A".to_string(), "C".to_string(), 150),
            ("B".to_string(), "C".to_string(), 200),
        ]
    );

    // Inverted bounds behave identically.
    let inverted = reader.windowed_view(200, 120).await?;
    assert_eq!(inverted.edges.len(), view.edges.len());
    assert_eq!(inverted.nodes.len(), view.nodes.len());

    Ok(())
}

#[tokio::test]
async fn overall_range_covers_every_edge() -> Result<()> {
    let (_container, client) = neo4j_container().await;
    migrate::migrate(&client).await?;

    let writer = GraphWriter::new(client.clone());
    writer
        .ingest(&[
            record("A", "B", 100),
            record("B", "C", 200),
            record("C", "A", 350),
        ])
        .await?;

    let reader = GraphReader::new(client.clone());
    let range = reader.overall_range().await?;
    assert_eq!(range.min_ts, 100);
    assert_eq!(range.max_ts, 350);

    let view = reader.windowed_view(range.min_ts, range.max_ts).await?;
    assert_eq!(view.edges.len(), 3);
    assert_eq!(view.nodes.len(), 3);

    Ok(())
}

#[tokio::test]
async fn reingest_duplicates_edges_but_not_nodes() -> Result<()> {
    let (_container, client) = neo4j_container().await;
    migrate::migrate(&client).await?;

    let writer = GraphWriter::new(client.clone());
    let records = vec![record("A", "B", 100), record("B", "C", 200)];

    writer.ingest(&records).await?;
    assert_eq!(node_count(&client).await?, 3);
    assert_eq!(edge_count(&client).await?, 2);

    writer.ingest(&records).await?;
    assert_eq!(node_count(&client).await?, 3, "nodes merge by identity");
    assert_eq!(edge_count(&client).await?, 4, "edges always create");

    Ok(())
}

#[tokio::test]
async fn invalid_records_skip_and_count() -> Result<()> {
    let (_container, client) = neo4j_container().await;
    migrate::migrate(&client).await?;

    let records = vec![
        record("A", "B", 100),
        RawRepost {
            channel_from_id: None,
            channel_id: Some(json!("B")),
            publish_datetime: Some("2021-01-01T00:00:00Z".to_string()),
        },
        RawRepost {
            channel_from_id: Some(json!("A")),
            channel_id: Some(json!("B")),
            publish_datetime: Some("not a datetime".to_string()),
        },
    ];

    let writer = GraphWriter::new(client.clone());
    let report = writer.ingest(&records).await?;

    assert_eq!(report.accepted, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.accepted + report.skipped, records.len());
    assert_eq!(edge_count(&client).await?, 1);

    Ok(())
}

#[tokio::test]
async fn empty_store_defaults_instead_of_failing() -> Result<()> {
    let (_container, client) = neo4j_container().await;
    migrate::migrate(&client).await?;

    let reader = GraphReader::new(client.clone());

    let before = Utc::now().timestamp_millis();
    let range = reader.overall_range().await?;
    assert_eq!(range.min_ts, 0);
    assert!(range.max_ts >= before, "empty-store max defaults to now");

    let view = reader.windowed_view(0, i64::MAX).await?;
    assert!(view.nodes.is_empty());
    assert!(view.edges.is_empty());

    Ok(())
}

#[tokio::test]
async fn parallel_reposts_between_same_pair_are_retained() -> Result<()> {
    let (_container, client) = neo4j_container().await;
    migrate::migrate(&client).await?;

    // Same pair, distinct timestamps, plus a tie at the same millisecond.
    let writer = GraphWriter::new(client.clone());
    writer
        .ingest(&[
            record("A", "B", 100),
            record("A", "B", 200),
            record("A", "B", 200),
        ])
        .await?;

    let reader = GraphReader::new(client.clone());
    let view = reader.windowed_view(0, 300).await?;

    assert_eq!(view.edges.len(), 3, "multigraph keeps every repost");
    assert_eq!(view.nodes.len(), 2);
    for node in &view.nodes {
        assert_eq!(node.degree, 3);
    }

    Ok(())
}
