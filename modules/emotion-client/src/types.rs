use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzePostInput<'a> {
    pub content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeReplyInput<'a> {
    pub post: &'a str,
    pub reply: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicSimilarityInput<'a> {
    pub post1: &'a str,
    pub post2: &'a str,
}

/// One detected emotion. The service may attach an `error` field when its
/// classifier failed and it fell back to a placeholder label.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmotionScore {
    pub emotion: String,
    pub score: f64,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TopicVerdict {
    pub is_same_topic: bool,
    pub confidence: f64,
}

impl TopicVerdict {
    /// A verdict links two posts only when the classifier says "same topic"
    /// with at least `threshold` confidence.
    pub fn accepts(&self, threshold: f64) -> bool {
        self.is_same_topic && self.confidence >= threshold
    }
}
