#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use emosns_graph::{migrate, query, GraphClient};
use emotion_client::{AnalyzerError, EmotionAnalyzer, EmotionScore, TopicVerdict};

pub async fn setup() -> (impl std::any::Any, GraphClient) {
    let (container, client) = emosns_graph::testutil::neo4j_container().await;
    migrate(&client).await.expect("migrate");
    (container, client)
}

pub fn score(emotion: &str, score: f64) -> EmotionScore {
    EmotionScore {
        emotion: emotion.to_string(),
        score,
        error: None,
    }
}

/// Scripted analyzer. Every call returns the configured answer; `offline`
/// makes every call fail with a network error.
pub struct MockAnalyzer {
    pub post_emotions: Vec<EmotionScore>,
    pub reply_emotions: Vec<EmotionScore>,
    pub verdict: TopicVerdict,
    pub offline: bool,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self {
            post_emotions: vec![score("joy", 0.8)],
            reply_emotions: vec![score("joy", 0.6)],
            verdict: TopicVerdict {
                is_same_topic: false,
                confidence: 0.0,
            },
            offline: false,
        }
    }

    pub fn same_topic(mut self, is_same_topic: bool, confidence: f64) -> Self {
        self.verdict = TopicVerdict {
            is_same_topic,
            confidence,
        };
        self
    }

    pub fn reply_emotions(mut self, emotions: Vec<EmotionScore>) -> Self {
        self.reply_emotions = emotions;
        self
    }

    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::new()
        }
    }

    pub fn into_arc(self) -> Arc<dyn EmotionAnalyzer> {
        Arc::new(self)
    }

    fn check(&self) -> emotion_client::Result<()> {
        if self.offline {
            return Err(AnalyzerError::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EmotionAnalyzer for MockAnalyzer {
    async fn analyze_post(&self, _content: &str) -> emotion_client::Result<Vec<EmotionScore>> {
        self.check()?;
        Ok(self.post_emotions.clone())
    }

    async fn analyze_reply(&self, _post: &str, _reply: &str) -> emotion_client::Result<Vec<EmotionScore>> {
        self.check()?;
        Ok(self.reply_emotions.clone())
    }

    async fn analyze_topic_similarity(&self, _post1: &str, _post2: &str) -> emotion_client::Result<TopicVerdict> {
        self.check()?;
        Ok(self.verdict)
    }
}

/// Run a read query that returns a single integer column named `n`.
pub async fn count(client: &GraphClient, q: neo4rs::Query) -> i64 {
    let mut stream = client.inner().execute(q).await.expect("query failed");
    let row = stream
        .next()
        .await
        .expect("stream failed")
        .expect("no rows");
    row.get::<i64>("n").expect("missing n")
}

pub async fn node_count(client: &GraphClient, label: &str, id: &str) -> i64 {
    count(
        client,
        query(&format!("MATCH (x:{label} {{id: $id}}) RETURN count(x) AS n")).param("id", id),
    )
    .await
}

pub async fn set_prop(client: &GraphClient, cypher: &str, id: &str, value: &str) {
    client
        .inner()
        .run(query(cypher).param("id", id).param("value", value))
        .await
        .expect("update failed");
}
