//! Core error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_not_found() {
        let err = CoreError::NotFound("audit entry 42".into());
        assert_eq!(err.to_string(), "not found: audit entry 42");
    }

    #[test]
    fn test_from_db_error() {
        let db_err = sea_orm::DbErr::Custom("connection reset".into());
        let err: CoreError = db_err.into();
        assert!(matches!(err, CoreError::Database(_)));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<String>("{{{").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::Serialization(_)));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;
        let err: CoreError = sea_orm::DbErr::Custom("x".into()).into();
        assert!(err.source().is_some());
        assert!(CoreError::NotFound("y".into()).source().is_none());
    }
}
