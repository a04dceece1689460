use neo4rs::{ConfigBuilder, Graph, Query, Row, Txn};
use tracing::warn;

use crate::SocialError;

/// Thin wrapper around neo4rs::Graph providing connection setup and
/// transaction scoping. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct GraphClient {
    pub(crate) graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given credentials.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, neo4rs::Error> {
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .fetch_size(500)
            .max_connections(10)
            .build()?;
        let graph = Graph::connect(config).await?;
        Ok(Self { graph })
    }

    /// Get a reference to the underlying neo4rs Graph.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }

    /// Run a single auto-commit read query and collect every row.
    pub(crate) async fn fetch(&self, q: Query) -> Result<Vec<Row>, neo4rs::Error> {
        let mut stream = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    pub(crate) async fn begin(&self) -> Result<Txn, neo4rs::Error> {
        self.graph.start_txn().await
    }
}

/// Run a query inside an explicit transaction and collect every row.
pub(crate) async fn fetch_in(txn: &mut Txn, q: Query) -> Result<Vec<Row>, neo4rs::Error> {
    let mut stream = txn.execute(q).await?;
    let mut rows = Vec::new();
    while let Some(row) = stream.next(txn.handle()).await? {
        rows.push(row);
    }
    Ok(rows)
}

/// Commit on success, roll back on failure. Nothing from a failed unit of
/// work becomes visible.
pub(crate) async fn finish<T>(txn: Txn, outcome: Result<T, SocialError>) -> Result<T, SocialError> {
    match outcome {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = txn.rollback().await {
                warn!(error = %rollback, "Transaction rollback failed");
            }
            Err(e)
        }
    }
}
