use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// --- Constants ---

/// Minimum classifier confidence for linking two posts with SAME_TOPIC.
pub const SAME_TOPIC_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// How far back a user's influences are considered when linking a new post.
pub const INFLUENCE_WINDOW_HOURS: i64 = 24;

/// PBKDF2 iteration count for stored password hashes.
pub const PASSWORD_HASH_ITERATIONS: u32 = 100_000;

/// Timestamps are stored as fixed-width RFC3339 UTC strings with millisecond
/// precision, so string comparison in Cypher matches chronological order.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// --- Emotions ---

/// An emotion label with its classifier score (0..1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionTag {
    pub emotion: String,
    pub score: f64,
}

impl EmotionTag {
    pub fn new(emotion: impl Into<String>, score: f64) -> Self {
        Self {
            emotion: emotion.into(),
            score,
        }
    }
}

// --- Reactions ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionType {
    Like,
    Love,
    Cry,
    Angry,
    Wow,
}

impl ReactionType {
    pub const ALL: [ReactionType; 5] = [
        ReactionType::Like,
        ReactionType::Love,
        ReactionType::Cry,
        ReactionType::Angry,
        ReactionType::Wow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::Like => "like",
            ReactionType::Love => "love",
            ReactionType::Cry => "cry",
            ReactionType::Angry => "angry",
            ReactionType::Wow => "wow",
        }
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid reaction type: {0}")]
pub struct InvalidReactionType(pub String);

impl FromStr for ReactionType {
    type Err = InvalidReactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReactionType::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| InvalidReactionType(s.to_string()))
    }
}

// --- Posts & feed ---

/// A single post with its emotion tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
    pub emotion_tags: Vec<EmotionTag>,
}

/// Denormalized feed entry: content, emotions, reaction tally and reply count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
    pub emotion_tags: Vec<EmotionTag>,
    pub reactions: BTreeMap<String, u64>,
    pub reply_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyItem {
    pub reply_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
    pub emotions: Vec<EmotionTag>,
}

/// A post the user was influenced by, used as a same-topic candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluencedPost {
    pub post_id: String,
    pub content: String,
}

// --- Influence ---

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluenceUser {
    pub user_id: String,
    #[serde(rename = "type")]
    pub influence_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub through_post_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluenceSummary {
    pub total_users: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_degree: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInfluence {
    pub post_id: String,
    pub first_degree: Vec<InfluenceUser>,
    pub second_degree: Vec<InfluenceUser>,
    pub third_degree: Vec<InfluenceUser>,
    pub summary: InfluenceSummary,
}

// --- Users ---

/// Stored account record. The password hash never leaves the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: String,
    pub bio: String,
    pub followers_count: u64,
    pub following_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reaction_type_parses_closed_set() {
        for r in ReactionType::ALL {
            assert_eq!(r.as_str().parse::<ReactionType>().unwrap(), r);
        }
        assert_eq!(
            "laugh".parse::<ReactionType>(),
            Err(InvalidReactionType("laugh".to_string()))
        );
        assert!("Like".parse::<ReactionType>().is_err());
    }

    #[test]
    fn timestamps_sort_chronologically_as_strings() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(&earlier), "2024-03-09T23:59:59.000Z");
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
    }

    #[test]
    fn timestamps_within_one_second_stay_ordered() {
        let base = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let a = format_timestamp(&(base + chrono::Duration::milliseconds(100)));
        let b = format_timestamp(&(base + chrono::Duration::milliseconds(800)));
        assert_eq!(a, "2024-03-09T12:00:00.100Z");
        assert!(a < b);
    }

    #[test]
    fn influence_user_omits_missing_through_post() {
        let first = InfluenceUser {
            user_id: "u1".into(),
            influence_type: "joy".into(),
            through_post_id: None,
        };
        let json = serde_json::to_value(&first).unwrap();
        assert_eq!(json, serde_json::json!({"userId": "u1", "type": "joy"}));
    }

    #[test]
    fn auth_user_never_serializes_password_hash() {
        let user = AuthUser {
            id: "u1".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "pbkdf2$...".into(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("pbkdf2"));
    }
}
