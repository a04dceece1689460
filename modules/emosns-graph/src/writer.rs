use chrono::Utc;
use neo4rs::{query, Txn};
use tracing::{debug, info};
use uuid::Uuid;

use emosns_common::{format_timestamp, EmotionTag, ReactionType};

use crate::client::{fetch_in, finish};
use crate::error::{conflict_on_constraint, require_non_empty, Result, SocialError};
use crate::GraphClient;

/// Write-side wrapper for the graph. Every public method is one transaction:
/// either all of its nodes and edges become visible or none do.
#[derive(Clone)]
pub struct GraphWriter {
    client: GraphClient,
}

impl GraphWriter {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Create a post authored by `user_id` and tag it with each emotion.
    /// The author is get-or-create; the post is always new. Returns the post id.
    pub async fn create_post_with_emotions(
        &self,
        user_id: &str,
        content: &str,
        emotions: &[EmotionTag],
    ) -> Result<String> {
        require_non_empty("userId", user_id)?;
        validate_tags(emotions)?;

        let post_id = Uuid::new_v4().to_string();
        let created_at = format_timestamp(&Utc::now());

        let mut txn = self.client.begin().await?;
        let outcome = create_post_in(&mut txn, user_id, &post_id, content, &created_at, emotions).await;
        finish(txn, outcome).await?;

        info!(post_id = %post_id, user_id, emotions = emotions.len(), "Post created");
        Ok(post_id)
    }

    /// Record `user_id`'s reaction to a post. One REACTED edge per
    /// (user, post); a later reaction replaces the type of an earlier one.
    pub async fn add_reaction(
        &self,
        post_id: &str,
        user_id: &str,
        reaction: ReactionType,
    ) -> Result<()> {
        require_non_empty("userId", user_id)?;
        let created_at = format_timestamp(&Utc::now());

        let mut txn = self.client.begin().await?;
        let outcome = async {
            require_node(&mut txn, "Post", post_id).await?;
            let q = query(
                "MATCH (p:Post {id: $post_id})
                 MERGE (u:User {id: $user_id})
                 ON CREATE SET u.createdAt = $created_at
                 MERGE (u)-[r:REACTED]->(p)
                 SET r.type = $type, r.createdAt = $created_at",
            )
            .param("post_id", post_id)
            .param("user_id", user_id)
            .param("type", reaction.as_str())
            .param("created_at", created_at.as_str());
            txn.run(q).await?;
            Ok::<_, SocialError>(())
        }
        .await;
        finish(txn, outcome).await?;

        debug!(post_id, user_id, reaction = %reaction, "Reaction recorded");
        Ok(())
    }

    /// Create a reply to `post_id`, tagged with the emotions detected in it.
    /// Returns the reply id.
    pub async fn add_reply_with_emotions(
        &self,
        post_id: &str,
        user_id: &str,
        content: &str,
        emotions: &[EmotionTag],
    ) -> Result<String> {
        require_non_empty("userId", user_id)?;
        require_non_empty("content", content)?;
        validate_tags(emotions)?;

        let reply_id = Uuid::new_v4().to_string();
        let created_at = format_timestamp(&Utc::now());

        let mut txn = self.client.begin().await?;
        let outcome = async {
            require_node(&mut txn, "Post", post_id).await?;
            let q = query(
                "MATCH (p:Post {id: $post_id})
                 MERGE (u:User {id: $user_id})
                 ON CREATE SET u.createdAt = $created_at
                 CREATE (r:Reply {id: $reply_id, content: $content, createdAt: $created_at})
                 MERGE (u)-[:REPLIED]->(r)
                 MERGE (r)-[:REPLY_TO]->(p)",
            )
            .param("post_id", post_id)
            .param("user_id", user_id)
            .param("reply_id", reply_id.as_str())
            .param("content", content)
            .param("created_at", created_at.as_str());
            txn.run(q).await?;

            for tag in emotions {
                tag_node(&mut txn, "Reply", &reply_id, tag).await?;
            }
            Ok::<_, SocialError>(())
        }
        .await;
        finish(txn, outcome).await?;

        info!(reply_id = %reply_id, post_id, user_id, "Reply created");
        Ok(reply_id)
    }

    /// Register that `user_id` was influenced by `post_id` in the given way.
    /// Keyed on (user, post, type); re-registration refreshes `lastInfluencedAt`.
    pub async fn add_influence(&self, user_id: &str, post_id: &str, influence_type: &str) -> Result<()> {
        require_non_empty("influence type", influence_type)?;
        let now = format_timestamp(&Utc::now());

        let mut txn = self.client.begin().await?;
        let outcome = async {
            require_node(&mut txn, "User", user_id).await?;
            require_node(&mut txn, "Post", post_id).await?;
            let q = query(
                "MATCH (u:User {id: $user_id})
                 MATCH (p:Post {id: $post_id})
                 MERGE (u)-[i:INFLUENCED {type: $type}]->(p)
                 ON CREATE SET i.createdAt = $now
                 SET i.lastInfluencedAt = $now",
            )
            .param("user_id", user_id)
            .param("post_id", post_id)
            .param("type", influence_type)
            .param("now", now.as_str());
            txn.run(q).await?;
            Ok::<_, SocialError>(())
        }
        .await;
        finish(txn, outcome).await?;

        debug!(user_id, post_id, influence_type, "Influence registered");
        Ok(())
    }

    /// Link `from_post_id` to an earlier post it shares a topic with.
    pub async fn add_same_topic_relation(&self, from_post_id: &str, to_post_id: &str) -> Result<()> {
        if from_post_id == to_post_id {
            return Err(SocialError::Validation(
                "a post cannot share a topic with itself".to_string(),
            ));
        }

        let mut txn = self.client.begin().await?;
        let outcome = async {
            require_node(&mut txn, "Post", from_post_id).await?;
            require_node(&mut txn, "Post", to_post_id).await?;
            let q = query(
                "MATCH (p1:Post {id: $from})
                 MATCH (p2:Post {id: $to})
                 MERGE (p1)-[:SAME_TOPIC]->(p2)",
            )
            .param("from", from_post_id)
            .param("to", to_post_id);
            txn.run(q).await?;
            Ok::<_, SocialError>(())
        }
        .await;
        finish(txn, outcome).await?;

        info!(from = from_post_id, to = to_post_id, "SAME_TOPIC edge written");
        Ok(())
    }

    /// Create a registered user. Fails with `Conflict` if the email is taken.
    /// `password_hash` must already be hashed.
    pub async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<String> {
        let user_id = Uuid::new_v4().to_string();
        let created_at = format_timestamp(&Utc::now());

        let mut txn = self.client.begin().await?;
        let outcome = async {
            let rows = fetch_in(
                &mut txn,
                query("MATCH (u:User {email: $email}) RETURN count(u) AS count").param("email", email),
            )
            .await?;
            let existing: i64 = match rows.first() {
                Some(row) => row.get("count")?,
                None => 0,
            };
            if existing > 0 {
                return Err(SocialError::Conflict(format!("email already exists: {email}")));
            }

            let q = query(
                "CREATE (u:User {
                    id: $id,
                    username: $username,
                    email: $email,
                    passwordHash: $password_hash,
                    createdAt: $created_at
                })",
            )
            .param("id", user_id.as_str())
            .param("username", username)
            .param("email", email)
            .param("password_hash", password_hash)
            .param("created_at", created_at.as_str());
            // A concurrent registration can pass the check above; the
            // User.email constraint catches it here.
            txn.run(q)
                .await
                .map_err(|e| conflict_on_constraint(e, || format!("email already exists: {email}")))?;
            Ok::<_, SocialError>(())
        }
        .await;
        finish(txn, outcome).await?;

        info!(user_id = %user_id, username, "User registered");
        Ok(user_id)
    }

    /// `user_id` follows `target_user_id`. Both users are get-or-create and
    /// repeating the call leaves a single edge.
    pub async fn follow_user(&self, user_id: &str, target_user_id: &str) -> Result<()> {
        require_non_empty("userId", user_id)?;
        require_non_empty("targetUserId", target_user_id)?;
        if user_id == target_user_id {
            return Err(SocialError::Validation("users cannot follow themselves".to_string()));
        }
        let created_at = format_timestamp(&Utc::now());

        let q = query(
            "MERGE (u1:User {id: $user_id})
             ON CREATE SET u1.createdAt = $created_at
             MERGE (u2:User {id: $target_id})
             ON CREATE SET u2.createdAt = $created_at
             MERGE (u1)-[:FOLLOWS]->(u2)",
        )
        .param("user_id", user_id)
        .param("target_id", target_user_id)
        .param("created_at", created_at.as_str());

        let mut txn = self.client.begin().await?;
        let outcome = txn.run(q).await.map_err(SocialError::from);
        finish(txn, outcome).await?;

        debug!(user_id, target_user_id, "Follow recorded");
        Ok(())
    }

    /// Remove the FOLLOWS edge if present. Returns whether an edge was removed.
    pub async fn unfollow_user(&self, user_id: &str, target_user_id: &str) -> Result<bool> {
        let q = query(
            "MATCH (:User {id: $user_id})-[f:FOLLOWS]->(:User {id: $target_id})
             DELETE f
             RETURN count(f) AS removed",
        )
        .param("user_id", user_id)
        .param("target_id", target_user_id);

        let mut txn = self.client.begin().await?;
        let outcome = async {
            let rows = fetch_in(&mut txn, q).await?;
            let removed: i64 = match rows.first() {
                Some(row) => row.get("removed")?,
                None => 0,
            };
            Ok::<_, SocialError>(removed > 0)
        }
        .await;
        let removed = finish(txn, outcome).await?;

        debug!(user_id, target_user_id, removed, "Unfollow processed");
        Ok(removed)
    }
}

async fn create_post_in(
    txn: &mut Txn,
    user_id: &str,
    post_id: &str,
    content: &str,
    created_at: &str,
    emotions: &[EmotionTag],
) -> Result<()> {
    let q = query(
        "MERGE (u:User {id: $user_id})
         ON CREATE SET u.createdAt = $created_at
         CREATE (p:Post {id: $post_id, content: $content, createdAt: $created_at})
         MERGE (u)-[:POSTED]->(p)",
    )
    .param("user_id", user_id)
    .param("post_id", post_id)
    .param("content", content)
    .param("created_at", created_at);
    txn.run(q).await?;

    for tag in emotions {
        tag_node(txn, "Post", post_id, tag).await?;
    }
    Ok(())
}

/// Upsert the Emotion node and its TAGGED edge onto a Post or Reply.
/// The score is overwritten, so repeating a label keeps only the last score.
async fn tag_node(txn: &mut Txn, label: &'static str, id: &str, tag: &EmotionTag) -> Result<()> {
    let cypher = format!(
        "MERGE (em:Emotion {{type: $type}})
         WITH em
         MATCH (n:{label} {{id: $id}})
         MERGE (em)-[t:TAGGED]->(n)
         SET t.score = $score"
    );
    let q = query(&cypher)
        .param("type", tag.emotion.as_str())
        .param("id", id)
        .param("score", tag.score);
    txn.run(q).await?;
    Ok(())
}

/// Fail closed when an edge endpoint is missing.
async fn require_node(txn: &mut Txn, label: &'static str, id: &str) -> Result<()> {
    let cypher = format!("MATCH (n:{label} {{id: $id}}) RETURN n.id AS id");
    let rows = fetch_in(txn, query(&cypher).param("id", id)).await?;
    if rows.is_empty() {
        return Err(SocialError::not_found(label, id));
    }
    Ok(())
}

fn validate_tags(emotions: &[EmotionTag]) -> Result<()> {
    for tag in emotions {
        if tag.emotion.trim().is_empty() {
            return Err(SocialError::Validation("emotion type is required".to_string()));
        }
        if !(0.0..=1.0).contains(&tag.score) {
            return Err(SocialError::Validation(format!(
                "emotion score for {} must be within 0..1, got {}",
                tag.emotion, tag.score
            )));
        }
    }
    Ok(())
}
