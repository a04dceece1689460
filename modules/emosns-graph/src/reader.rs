use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use neo4rs::query;
use serde::Deserialize;

use emosns_common::{
    format_timestamp, AuthUser, InfluencedPost, PostDetail, ReplyItem, UserDetails,
    UserSummary,
};

use crate::error::{Result, SocialError};
use crate::feed::{sort_tags, tally_reactions};
use crate::GraphClient;

const AVATAR_BASE_URL: &str = "https://ui-avatars.com/api/?name=";

/// Read-only queries over posts, replies, emotions and users.
/// Every row is decoded into a typed struct before it leaves this module.
#[derive(Clone)]
pub struct GraphReader {
    client: GraphClient,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReactionsRow {
    reactions: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDetailsRow {
    id: String,
    username: String,
    email: String,
    followers: i64,
    following: i64,
}

impl GraphReader {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// A post with its author and emotion tags.
    pub async fn get_post_with_emotions(&self, post_id: &str) -> Result<PostDetail> {
        let q = query(
            "MATCH (u:User)-[:POSTED]->(p:Post {id: $post_id})
             RETURN p.id AS postId,
                    u.id AS userId,
                    p.content AS content,
                    p.createdAt AS createdAt,
                    [(e:Emotion)-[t:TAGGED]->(p) | {emotion: e.type, score: t.score}] AS emotionTags",
        )
        .param("post_id", post_id);

        let rows = self.client.fetch(q).await?;
        let row = rows
            .first()
            .ok_or_else(|| SocialError::not_found("Post", post_id))?;
        let mut post: PostDetail = row.to()?;
        sort_tags(&mut post.emotion_tags);
        Ok(post)
    }

    pub async fn get_post_content(&self, post_id: &str) -> Result<String> {
        let q = query("MATCH (p:Post {id: $post_id}) RETURN p.content AS content")
            .param("post_id", post_id);
        let rows = self.client.fetch(q).await?;
        let row = rows
            .first()
            .ok_or_else(|| SocialError::not_found("Post", post_id))?;
        Ok(row.get("content")?)
    }

    /// Reaction counts for a post, grouped by reaction type.
    pub async fn get_reactions(&self, post_id: &str) -> Result<BTreeMap<String, u64>> {
        let q = query(
            "MATCH (p:Post {id: $post_id})
             RETURN [(:User)-[r:REACTED]->(p) | coalesce(r.type, '')] AS reactions",
        )
        .param("post_id", post_id);
        let rows = self.client.fetch(q).await?;
        let row = rows
            .first()
            .ok_or_else(|| SocialError::not_found("Post", post_id))?;
        let decoded: ReactionsRow = row.to()?;
        Ok(tally_reactions(&decoded.reactions))
    }

    /// Replies to a post, ordered by reply id (not by creation time).
    pub async fn get_replies(&self, post_id: &str) -> Result<Vec<ReplyItem>> {
        self.get_post_content(post_id).await?;

        let q = query(
            "MATCH (u:User)-[:REPLIED]->(r:Reply)-[:REPLY_TO]->(:Post {id: $post_id})
             RETURN r.id AS replyId,
                    u.id AS userId,
                    r.content AS content,
                    r.createdAt AS createdAt,
                    [(e:Emotion)-[t:TAGGED]->(r) | {emotion: e.type, score: t.score}] AS emotions
             ORDER BY r.id",
        )
        .param("post_id", post_id);

        let mut replies = Vec::new();
        for row in self.client.fetch(q).await? {
            let mut reply: ReplyItem = row.to()?;
            sort_tags(&mut reply.emotions);
            replies.push(reply);
        }
        Ok(replies)
    }

    /// Every emotion label ever tagged, sorted.
    pub async fn get_all_emotion_tags(&self) -> Result<Vec<String>> {
        let q = query("MATCH (e:Emotion) RETURN DISTINCT e.type AS type ORDER BY type");
        let mut tags = Vec::new();
        for row in self.client.fetch(q).await? {
            let tag: Option<String> = row.get("type")?;
            if let Some(tag) = tag {
                tags.push(tag);
            }
        }
        Ok(tags)
    }

    /// Posts `user_id` was influenced by at or after `since`, excluding
    /// `exclude_post_id` and the user's own posts.
    pub async fn influenced_posts_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        exclude_post_id: &str,
    ) -> Result<Vec<InfluencedPost>> {
        let q = query(
            "MATCH (u:User {id: $user_id})-[i:INFLUENCED]->(p:Post)
             WHERE i.lastInfluencedAt >= $since
               AND p.id <> $exclude
               AND NOT (u)-[:POSTED]->(p)
             RETURN DISTINCT p.id AS postId, p.content AS content
             ORDER BY postId",
        )
        .param("user_id", user_id)
        .param("since", format_timestamp(&since))
        .param("exclude", exclude_post_id);

        let mut posts = Vec::new();
        for row in self.client.fetch(q).await? {
            posts.push(row.to::<InfluencedPost>()?);
        }
        Ok(posts)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<AuthUser> {
        self.get_auth_user("email", email).await
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<AuthUser> {
        self.get_auth_user("id", user_id).await
    }

    async fn get_auth_user(&self, key: &'static str, value: &str) -> Result<AuthUser> {
        let cypher = format!(
            "MATCH (u:User {{{key}: $value}})
             RETURN u.id AS id,
                    coalesce(u.username, '') AS username,
                    coalesce(u.email, '') AS email,
                    coalesce(u.passwordHash, '') AS passwordHash"
        );
        let rows = self.client.fetch(query(&cypher).param("value", value)).await?;
        let row = rows
            .first()
            .ok_or_else(|| SocialError::not_found("User", value))?;
        Ok(row.to()?)
    }

    /// Profile view with follower and following counts.
    pub async fn get_user_with_details(&self, user_id: &str) -> Result<UserDetails> {
        let q = query(
            "MATCH (u:User {id: $user_id})
             RETURN u.id AS id,
                    coalesce(u.username, '') AS username,
                    coalesce(u.email, '') AS email,
                    size([(f:User)-[:FOLLOWS]->(u) | f.id]) AS followers,
                    size([(u)-[:FOLLOWS]->(g:User) | g.id]) AS following",
        )
        .param("user_id", user_id);
        let rows = self.client.fetch(q).await?;
        let row = rows
            .first()
            .ok_or_else(|| SocialError::not_found("User", user_id))?;
        let r: UserDetailsRow = row.to()?;

        Ok(UserDetails {
            avatar_url: format!("{AVATAR_BASE_URL}{}", urlencoding::encode(&r.username)),
            display_name: r.username.clone(),
            bio: String::new(),
            followers_count: r.followers.max(0) as u64,
            following_count: r.following.max(0) as u64,
            id: r.id,
            username: r.username,
            email: r.email,
        })
    }

    pub async fn count_followers(&self, user_id: &str) -> Result<u64> {
        let q = query("MATCH (f:User)-[:FOLLOWS]->(:User {id: $user_id}) RETURN count(f) AS count")
            .param("user_id", user_id);
        self.count(q).await
    }

    pub async fn count_following(&self, user_id: &str) -> Result<u64> {
        let q = query("MATCH (:User {id: $user_id})-[:FOLLOWS]->(f:User) RETURN count(f) AS count")
            .param("user_id", user_id);
        self.count(q).await
    }

    pub async fn list_followers(&self, user_id: &str) -> Result<Vec<UserSummary>> {
        let q = query(
            "MATCH (f:User)-[:FOLLOWS]->(:User {id: $user_id})
             RETURN f.id AS id, coalesce(f.username, '') AS username
             ORDER BY username, id",
        )
        .param("user_id", user_id);
        self.summaries(q).await
    }

    pub async fn list_following(&self, user_id: &str) -> Result<Vec<UserSummary>> {
        let q = query(
            "MATCH (:User {id: $user_id})-[:FOLLOWS]->(f:User)
             RETURN f.id AS id, coalesce(f.username, '') AS username
             ORDER BY username, id",
        )
        .param("user_id", user_id);
        self.summaries(q).await
    }

    async fn count(&self, q: neo4rs::Query) -> Result<u64> {
        let rows = self.client.fetch(q).await?;
        let count: i64 = match rows.first() {
            Some(row) => row.get("count")?,
            None => 0,
        };
        Ok(count.max(0) as u64)
    }

    async fn summaries(&self, q: neo4rs::Query) -> Result<Vec<UserSummary>> {
        let mut users = Vec::new();
        for row in self.client.fetch(q).await? {
            users.push(row.to::<UserSummary>()?);
        }
        Ok(users)
    }
}
