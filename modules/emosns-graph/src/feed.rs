use std::collections::{BTreeMap, BTreeSet};

use neo4rs::query;
use serde::Deserialize;
use tracing::debug;

use emosns_common::{EmotionTag, FeedPost};

use crate::error::Result;
use crate::GraphClient;

/// Pattern comprehensions keep the three one-to-many aggregations
/// (tags, reactions, replies) independent, so none multiplies the others.
const FEED_PROJECTION: &str = "
    RETURN p.id AS post_id,
           u.id AS user_id,
           p.content AS content,
           p.createdAt AS created_at,
           [(e:Emotion)-[t:TAGGED]->(p) | {emotion: e.type, score: t.score}] AS emotions,
           [(:User)-[r:REACTED]->(p) | coalesce(r.type, '')] AS reactions,
           [(:User)-[:REPLIED]->(reply:Reply)-[:REPLY_TO]->(p) | reply.id] AS reply_ids
    ORDER BY p.createdAt DESC, p.id DESC";

/// Assembles denormalized post views for the home feed and profile pages.
#[derive(Clone)]
pub struct FeedAggregator {
    client: GraphClient,
}

/// Raw feed row as returned by the store.
#[derive(Debug, Deserialize)]
pub(crate) struct FeedRow {
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
    #[serde(default)]
    pub emotions: Vec<EmotionTag>,
    #[serde(default)]
    pub reactions: Vec<String>,
    #[serde(default)]
    pub reply_ids: Vec<String>,
}

impl From<FeedRow> for FeedPost {
    fn from(row: FeedRow) -> Self {
        let mut emotion_tags = row.emotions;
        sort_tags(&mut emotion_tags);
        let reply_count = row.reply_ids.iter().collect::<BTreeSet<_>>().len() as u64;

        FeedPost {
            reactions: tally_reactions(&row.reactions),
            post_id: row.post_id,
            user_id: row.user_id,
            content: row.content,
            created_at: row.created_at,
            emotion_tags,
            reply_count,
        }
    }
}

impl FeedAggregator {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// All posts, most recent first. A non-blank `emotion_filter` keeps only
    /// posts tagged with that emotion.
    pub async fn get_feed(&self, emotion_filter: Option<&str>) -> Result<Vec<FeedPost>> {
        let filter = emotion_filter.map(str::trim).filter(|f| !f.is_empty());

        let q = match filter {
            Some(emotion) => query(&format!(
                "MATCH (u:User)-[:POSTED]->(p:Post)
                 WHERE (:Emotion {{type: $emotion}})-[:TAGGED]->(p)
                 {FEED_PROJECTION}"
            ))
            .param("emotion", emotion),
            None => query(&format!(
                "MATCH (u:User)-[:POSTED]->(p:Post)
                 {FEED_PROJECTION}"
            )),
        };

        let posts = self.load(q).await?;
        debug!(count = posts.len(), filter = ?filter, "Feed assembled");
        Ok(posts)
    }

    /// Posts authored by one user, most recent first. Unknown users have no posts.
    pub async fn get_user_posts(&self, user_id: &str) -> Result<Vec<FeedPost>> {
        let q = query(&format!(
            "MATCH (u:User {{id: $user_id}})-[:POSTED]->(p:Post)
             {FEED_PROJECTION}"
        ))
        .param("user_id", user_id);

        self.load(q).await
    }

    async fn load(&self, q: neo4rs::Query) -> Result<Vec<FeedPost>> {
        let mut posts = Vec::new();
        for row in self.client.fetch(q).await? {
            let raw: FeedRow = row.to()?;
            posts.push(FeedPost::from(raw));
        }
        Ok(posts)
    }
}

/// Count reactions per type. Blank entries come from missing `type`
/// properties and are not reactions.
pub(crate) fn tally_reactions(types: &[String]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for t in types.iter().filter(|t| !t.is_empty()) {
        *counts.entry(t.clone()).or_insert(0) += 1;
    }
    counts
}

/// Highest score first; ties by label.
pub(crate) fn sort_tags(tags: &mut [EmotionTag]) {
    tags.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.emotion.cmp(&b.emotion))
    });
}
