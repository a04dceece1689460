pub mod error;
pub mod types;

pub use error::{AnalyzerError, Result};
pub use types::{EmotionScore, TopicVerdict};

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use types::{AnalyzePostInput, AnalyzeReplyInput, TopicSimilarityInput};

/// Emotion and topic classification, consumed as a black box.
#[async_trait]
pub trait EmotionAnalyzer: Send + Sync {
    /// Emotions expressed by a standalone post.
    async fn analyze_post(&self, content: &str) -> Result<Vec<EmotionScore>>;

    /// Emotions a reply expresses toward the post it answers.
    async fn analyze_reply(&self, post: &str, reply: &str) -> Result<Vec<EmotionScore>>;

    /// Whether two posts discuss the same topic.
    async fn analyze_topic_similarity(&self, post1: &str, post2: &str) -> Result<TopicVerdict>;
}

/// JSON-over-HTTP client for the analysis service.
pub struct EmotionClient {
    client: reqwest::Client,
    base_url: String,
}

impl EmotionClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<I: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        input: &I,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).json(input).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalyzerError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl EmotionAnalyzer for EmotionClient {
    async fn analyze_post(&self, content: &str) -> Result<Vec<EmotionScore>> {
        let emotions: Vec<EmotionScore> = self
            .post_json("/analyze_post", &AnalyzePostInput { content })
            .await?;
        tracing::debug!(count = emotions.len(), "Analyzed post emotions");
        Ok(emotions)
    }

    async fn analyze_reply(&self, post: &str, reply: &str) -> Result<Vec<EmotionScore>> {
        let emotions: Vec<EmotionScore> = self
            .post_json("/analyze_reply", &AnalyzeReplyInput { post, reply })
            .await?;
        tracing::debug!(count = emotions.len(), "Analyzed reply emotions");
        Ok(emotions)
    }

    async fn analyze_topic_similarity(&self, post1: &str, post2: &str) -> Result<TopicVerdict> {
        let verdict: TopicVerdict = self
            .post_json(
                "/analyze_topic_similarity",
                &TopicSimilarityInput { post1, post2 },
            )
            .await?;
        tracing::debug!(
            is_same_topic = verdict.is_same_topic,
            confidence = verdict.confidence,
            "Analyzed topic similarity"
        );
        Ok(verdict)
    }
}
