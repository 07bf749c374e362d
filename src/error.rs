use thiserror::Error;

/// Errors surfaced by the coach core and its SQLite-backed caller.
#[derive(Error, Debug)]
pub enum CoachError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A prerequisite chain loops back on itself.
    #[error("prerequisite cycle detected at topic '{topic_id}'")]
    CycleDetected { topic_id: String },

    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoachError {
    pub fn topic_not_found(id: impl Into<String>) -> Self {
        CoachError::NotFound {
            kind: "topic",
            id: id.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        CoachError::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CoachError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_kind_and_id() {
        let err = CoachError::topic_not_found("rust-basics");
        assert_eq!(err.to_string(), "topic not found: rust-basics");
    }

    #[test]
    fn cycle_message_names_topic() {
        let err = CoachError::CycleDetected {
            topic_id: "a".to_string(),
        };
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn invalid_input_wraps_message() {
        let err = CoachError::invalid("quality must be between 0 and 5, got 7");
        assert!(matches!(err, CoachError::InvalidInput(_)));
        assert!(err.to_string().starts_with("invalid input:"));
    }

    #[test]
    fn json_errors_convert() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: CoachError = parse.unwrap_err().into();
        assert!(matches!(err, CoachError::Json(_)));
    }
}
