//! Error types for cerberus.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using cerberus' Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cerberus operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Program not found
    #[error("Program not found: {0}")]
    ProgramNotFound(Uuid),

    /// Merge group not found
    #[error("Merge group not found: {0}")]
    MergeGroupNotFound(Uuid),

    /// Person mention not found
    #[error("Person not found: {0}")]
    MentionNotFound(Uuid),

    /// Stakeholder not found
    #[error("Stakeholder not found: {0}")]
    StakeholderNotFound(Uuid),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Merge group is not in a state that allows the requested transition
    #[error("Merge group {group_id} is {from}; cannot {to}")]
    InvalidTransition {
        group_id: Uuid,
        from: String,
        to: String,
    },

    /// Operation was cancelled before completion
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for every "does not exist" flavour of error.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::ProgramNotFound(_)
                | Error::MergeGroupNotFound(_)
                | Error::MentionNotFound(_)
                | Error::StakeholderNotFound(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("stakeholder suggestion".to_string());
        assert_eq!(err.to_string(), "Not found: stakeholder suggestion");
    }

    #[test]
    fn test_error_display_merge_group_not_found() {
        let id = Uuid::nil();
        let err = Error::MergeGroupNotFound(id);
        assert_eq!(
            err.to_string(),
            "Merge group not found: 00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_error_display_mention_not_found() {
        let err = Error::MentionNotFound(Uuid::nil());
        assert!(err.to_string().starts_with("Person not found: "));
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("selected_name is required".to_string());
        assert_eq!(err.to_string(), "Invalid input: selected_name is required");
    }

    #[test]
    fn test_error_display_invalid_transition() {
        let err = Error::InvalidTransition {
            group_id: Uuid::nil(),
            from: "merged".to_string(),
            to: "confirm".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Merge group 00000000-0000-0000-0000-000000000000 is merged; cannot confirm"
        );
    }

    #[test]
    fn test_error_display_cancelled() {
        let err = Error::Cancelled("refresh grouping".to_string());
        assert_eq!(err.to_string(), "Cancelled: refresh grouping");
    }

    #[test]
    fn test_is_not_found_covers_entity_variants() {
        assert!(Error::NotFound("x".into()).is_not_found());
        assert!(Error::ProgramNotFound(Uuid::nil()).is_not_found());
        assert!(Error::MergeGroupNotFound(Uuid::nil()).is_not_found());
        assert!(Error::MentionNotFound(Uuid::nil()).is_not_found());
        assert!(Error::StakeholderNotFound(Uuid::nil()).is_not_found());
        assert!(!Error::InvalidInput("x".into()).is_not_found());
        assert!(!Error::Internal("x".into()).is_not_found());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error:"));
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }

    #[test]
    fn test_result_alias() {
        fn returns_err() -> Result<()> {
            Err(Error::Config("GROUPING_MAX_MENTIONS must be positive".into()))
        }
        assert!(returns_err().is_err());
    }
}
