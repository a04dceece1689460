use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,

    // Emotion / topic analysis service
    pub emotion_api_url: String,
    pub emotion_api_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. `from_env` delegates here.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| panic!("{key} environment variable is required"))
        };

        let timeout_secs: u64 = lookup("EMOTION_API_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .expect("EMOTION_API_TIMEOUT_SECS must be a number");

        Self {
            neo4j_uri: required("NEO4J_URI"),
            neo4j_user: lookup("NEO4J_USER").unwrap_or_else(|| "neo4j".to_string()),
            neo4j_password: required("NEO4J_PASSWORD"),
            emotion_api_url: required("EMOTION_API").trim_end_matches('/').to_string(),
            emotion_api_timeout: Duration::from_secs(timeout_secs),
        }
    }
}
