use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,

    // Ingestion
    pub source_data_path: Option<String>,
    pub ingest_batch_size: usize,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration for the ingestion binary.
    /// Panics with a clear message if required vars are missing.
    pub fn ingest_from_env() -> Self {
        Self {
            neo4j_uri: required_env("NEO4J_URI"),
            neo4j_user: required_env("NEO4J_USER"),
            neo4j_password: required_env("NEO4J_PASSWORD"),
            source_data_path: env::var("SOURCE_DATA_PATH").ok(),
            ingest_batch_size: env::var("INGEST_BATCH_SIZE")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .expect("INGEST_BATCH_SIZE must be a number"),
            web_host: String::new(),
            web_port: 0,
        }
    }

    /// Load a minimal config for the web server (read-only, no ingestion vars needed).
    pub fn web_from_env() -> Self {
        Self {
            neo4j_uri: required_env("NEO4J_URI"),
            neo4j_user: required_env("NEO4J_USER"),
            neo4j_password: required_env("NEO4J_PASSWORD"),
            source_data_path: None,
            ingest_batch_size: 0,
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
