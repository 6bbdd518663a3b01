use neo4rs::{query, ConfigBuilder, Graph};

/// Thin wrapper around neo4rs::Graph providing connection setup.
///
/// The pool is created once at process start and the handle is passed into
/// every component that talks to the store. Connections are checked out per
/// query and returned when the result stream drops, so request-scoped work
/// never holds one across an await point it does not own.
#[derive(Clone)]
pub struct GraphClient {
    pub(crate) graph: Graph,
}

impl GraphClient {
    /// Connect to the graph store with the given credentials.
    ///
    /// Verifies connectivity with a round-trip before returning, so an
    /// unreachable store fails here rather than on the first real query.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, neo4rs::Error> {
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .fetch_size(500)
            .max_connections(10)
            .build()?;
        let graph = Graph::connect(config).await?;
        graph.run(query("RETURN 1")).await?;
        Ok(Self { graph })
    }

    /// Get a reference to the underlying neo4rs Graph.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}
