use emotion_client::AnalyzerError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SocialError>;

#[derive(Debug, Error)]
pub enum SocialError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Store(String),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] AnalyzerError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SocialError {
    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        SocialError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SocialError::NotFound { .. })
    }
}

impl From<neo4rs::Error> for SocialError {
    fn from(err: neo4rs::Error) -> Self {
        SocialError::Store(err.to_string())
    }
}

impl From<neo4rs::DeError> for SocialError {
    fn from(err: neo4rs::DeError) -> Self {
        SocialError::Store(format!("row decode failed: {err}"))
    }
}

const CONSTRAINT_VIOLATION: &str = "Neo.ClientError.Schema.ConstraintValidationFailed";

/// A write that lost a race on a uniqueness constraint is a `Conflict`;
/// every other store failure stays a `Store` error.
pub(crate) fn conflict_on_constraint(err: neo4rs::Error, conflict: impl FnOnce() -> String) -> SocialError {
    match &err {
        neo4rs::Error::Neo4j(e) if is_constraint_violation(e.code()) => SocialError::Conflict(conflict()),
        _ => SocialError::from(err),
    }
}

fn is_constraint_violation(code: &str) -> bool {
    code == CONSTRAINT_VIOLATION
}

/// Reject blank required input before it reaches the store.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SocialError::Validation(format!("{field} is required")));
    }
    Ok(())
}
