use neo4rs::query;
use tracing::{debug, info};

use crate::GraphClient;

/// Run idempotent schema migrations: constraints, indexes.
/// Every MERGE in the writer keys on one of these unique properties, so
/// migrations must run before the first write.
pub async fn migrate(client: &GraphClient) -> Result<(), neo4rs::Error> {
    let g = &client.graph;

    info!("Running schema migrations...");

    // --- Uniqueness constraints (also back the MERGE lookups) ---
    let constraints = [
        "CREATE CONSTRAINT user_id IF NOT EXISTS FOR (n:User) REQUIRE n.id IS UNIQUE",
        "CREATE CONSTRAINT user_email IF NOT EXISTS FOR (n:User) REQUIRE n.email IS UNIQUE",
        "CREATE CONSTRAINT post_id IF NOT EXISTS FOR (n:Post) REQUIRE n.id IS UNIQUE",
        "CREATE CONSTRAINT reply_id IF NOT EXISTS FOR (n:Reply) REQUIRE n.id IS UNIQUE",
        "CREATE CONSTRAINT emotion_type IF NOT EXISTS FOR (n:Emotion) REQUIRE n.type IS UNIQUE",
    ];

    for c in &constraints {
        run_ignoring_exists(g, c).await?;
    }
    info!("Uniqueness constraints created");

    // --- Recency indexes (feed ordering) ---
    let indexes = [
        "CREATE INDEX post_created_at IF NOT EXISTS FOR (n:Post) ON (n.createdAt)",
        "CREATE INDEX reply_created_at IF NOT EXISTS FOR (n:Reply) ON (n.createdAt)",
    ];

    for idx in &indexes {
        run_ignoring_exists(g, idx).await?;
    }
    info!("Property indexes created");

    info!("Schema migrations complete");
    Ok(())
}

async fn run_ignoring_exists(g: &neo4rs::Graph, cypher: &str) -> Result<(), neo4rs::Error> {
    match g.run(query(cypher)).await {
        Ok(_) => Ok(()),
        Err(e) => {
            let msg = e.to_string().to_lowercase();
            if msg.contains("already exists") || msg.contains("equivalent") {
                debug!(statement = cypher, "Schema object already present");
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}
