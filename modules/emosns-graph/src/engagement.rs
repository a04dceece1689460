use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use emosns_common::{EmotionTag, ReactionType};
use emotion_client::EmotionAnalyzer;

use crate::error::{require_non_empty, Result, SocialError};
use crate::ingest::sanitize_scores;
use crate::{GraphClient, GraphReader, GraphWriter};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyOutcome {
    pub reply_id: String,
    pub emotions: Vec<EmotionTag>,
}

/// Records reactions and replies. Each one is also an influence event;
/// registering the influence is best-effort and runs after the primary write.
pub struct EngagementEngine {
    writer: GraphWriter,
    reader: GraphReader,
    analyzer: Arc<dyn EmotionAnalyzer>,
}

impl EngagementEngine {
    pub fn new(client: GraphClient, analyzer: Arc<dyn EmotionAnalyzer>) -> Self {
        Self {
            writer: GraphWriter::new(client.clone()),
            reader: GraphReader::new(client),
            analyzer,
        }
    }

    /// React to a post. `reaction` must be one of like/love/cry/angry/wow.
    pub async fn react(&self, post_id: &str, user_id: &str, reaction: &str) -> Result<ReactionType> {
        let reaction: ReactionType = reaction
            .parse()
            .map_err(|e: emosns_common::InvalidReactionType| SocialError::Validation(e.to_string()))?;

        self.writer.add_reaction(post_id, user_id, reaction).await?;

        if let Err(e) = self
            .writer
            .add_influence(user_id, post_id, reaction.as_str())
            .await
        {
            warn!(post_id, user_id, error = %e, "Failed to register influence");
        }

        Ok(reaction)
    }

    /// Reply to a post. The reply is classified against the post it answers;
    /// each distinct detected emotion becomes an influence event.
    pub async fn reply(&self, post_id: &str, user_id: &str, content: &str) -> Result<ReplyOutcome> {
        require_non_empty("userId", user_id)?;
        require_non_empty("content", content)?;

        let post_content = self.reader.get_post_content(post_id).await?;
        let scores = self.analyzer.analyze_reply(&post_content, content).await?;
        let emotions = sanitize_scores(scores);

        let reply_id = self
            .writer
            .add_reply_with_emotions(post_id, user_id, content, &emotions)
            .await?;

        let influence_types: BTreeSet<&str> = emotions.iter().map(|e| e.emotion.as_str()).collect();
        for influence_type in influence_types {
            if let Err(e) = self.writer.add_influence(user_id, post_id, influence_type).await {
                warn!(post_id, user_id, influence_type, error = %e, "Failed to register influence");
            }
        }

        info!(reply_id = %reply_id, post_id, emotions = emotions.len(), "Reply recorded");
        Ok(ReplyOutcome { reply_id, emotions })
    }
}
