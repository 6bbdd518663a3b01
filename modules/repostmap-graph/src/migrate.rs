use neo4rs::query;
use tracing::{info, warn};

use crate::GraphClient;

/// Run idempotent schema migrations: constraints, indexes.
///
/// Safe to call on every process start. `IF NOT EXISTS` covers Neo4j;
/// stores that lack it surface an "already exists" error instead, which we
/// ignore. Any other failure is fatal for startup.
pub async fn migrate(client: &GraphClient) -> Result<(), neo4rs::Error> {
    let g = &client.graph;

    info!("Running schema migrations...");

    let statements = [
        // Node identity is store-enforced, not merely application-checked.
        "CREATE CONSTRAINT channel_id_unique IF NOT EXISTS \
         FOR (c:Channel) REQUIRE c.channel_id IS UNIQUE",
        // Range-filtered edge scans must not walk the whole edge set.
        "CREATE INDEX repost_timestamp_idx IF NOT EXISTS \
         FOR ()-[r:REPOSTED]-() ON (r.timestamp)",
    ];

    for s in &statements {
        run_ignoring_exists(g, s).await?;
    }

    info!("Schema migration complete");
    Ok(())
}

/// Run a Cypher statement, ignoring errors that indicate the constraint/index already exists.
async fn run_ignoring_exists(g: &neo4rs::Graph, cypher: &str) -> Result<(), neo4rs::Error> {
    match g.run(query(cypher)).await {
        Ok(_) => Ok(()),
        Err(e) => {
            let msg = e.to_string().to_lowercase();
            if msg.contains("already exists") || msg.contains("equivalent") {
                warn!(
                    "Already exists (skipped): {}",
                    cypher.chars().take(80).collect::<String>()
                );
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}
