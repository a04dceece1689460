use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use emosns_common::{EmotionTag, INFLUENCE_WINDOW_HOURS, SAME_TOPIC_CONFIDENCE_THRESHOLD};
use emotion_client::{EmotionAnalyzer, EmotionScore};

use crate::error::{require_non_empty, Result};
use crate::{GraphClient, GraphReader, GraphWriter};

/// Result of publishing a post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcome {
    pub post_id: String,
    pub emotions: Vec<EmotionTag>,
    /// Earlier posts the new post was linked to with SAME_TOPIC.
    pub same_topic_post_ids: Vec<String>,
}

/// Creates posts, tags them with emotions and links them to earlier posts on
/// the same topic that the author was recently influenced by.
pub struct PostIngestor {
    writer: GraphWriter,
    reader: GraphReader,
    analyzer: Arc<dyn EmotionAnalyzer>,
}

impl PostIngestor {
    pub fn new(client: GraphClient, analyzer: Arc<dyn EmotionAnalyzer>) -> Self {
        Self {
            writer: GraphWriter::new(client.clone()),
            reader: GraphReader::new(client),
            analyzer,
        }
    }

    /// Classify `content` with the analysis service, then create the post.
    /// An unreachable analyzer fails the whole call; nothing is written.
    pub async fn publish(&self, user_id: &str, content: &str) -> Result<PublishOutcome> {
        require_non_empty("userId", user_id)?;
        require_non_empty("content", content)?;

        let scores = self.analyzer.analyze_post(content).await?;
        let emotions = sanitize_scores(scores);
        info!(user_id, emotions = emotions.len(), "Post emotions analyzed");

        self.create_post(user_id, content, emotions).await
    }

    /// Create a post with known emotions, then link same-topic posts.
    /// Linking is best-effort and never undoes the post.
    pub async fn create_post(
        &self,
        user_id: &str,
        content: &str,
        emotions: Vec<EmotionTag>,
    ) -> Result<PublishOutcome> {
        let post_id = self
            .writer
            .create_post_with_emotions(user_id, content, &emotions)
            .await?;

        let same_topic_post_ids = self.link_same_topic(user_id, &post_id, content).await;

        Ok(PublishOutcome {
            post_id,
            emotions,
            same_topic_post_ids,
        })
    }

    async fn link_same_topic(&self, user_id: &str, post_id: &str, content: &str) -> Vec<String> {
        let since = Utc::now() - Duration::hours(INFLUENCE_WINDOW_HOURS);
        let candidates = match self.reader.influenced_posts_since(user_id, since, post_id).await {
            Ok(c) => c,
            Err(e) => {
                warn!(user_id, post_id, error = %e, "Failed to load influenced posts");
                return Vec::new();
            }
        };

        let mut linked = Vec::new();
        for candidate in candidates {
            let verdict = match self
                .analyzer
                .analyze_topic_similarity(content, &candidate.content)
                .await
            {
                Ok(v) => v,
                Err(e) => {
                    warn!(post_id, candidate = %candidate.post_id, error = %e, "Topic similarity failed");
                    continue;
                }
            };

            if !verdict.accepts(SAME_TOPIC_CONFIDENCE_THRESHOLD) {
                continue;
            }

            match self
                .writer
                .add_same_topic_relation(post_id, &candidate.post_id)
                .await
            {
                Ok(()) => linked.push(candidate.post_id),
                Err(e) => {
                    warn!(post_id, candidate = %candidate.post_id, error = %e, "Failed to add SAME_TOPIC relation")
                }
            }
        }

        if !linked.is_empty() {
            info!(post_id, linked = linked.len(), "Linked same-topic posts");
        }
        linked
    }
}

/// Drop placeholder entries the analyzer emits on its own failures and blank
/// labels; clamp scores into 0..1.
pub(crate) fn sanitize_scores(scores: Vec<EmotionScore>) -> Vec<EmotionTag> {
    scores
        .into_iter()
        .filter(|s| s.error.is_none())
        .filter_map(|s| {
            let label = s.emotion.trim();
            if label.is_empty() || !s.score.is_finite() {
                return None;
            }
            Some(EmotionTag::new(label, s.score.clamp(0.0, 1.0)))
        })
        .collect()
}
