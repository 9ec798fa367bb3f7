use crate::metrics;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Compliance(#[from] fueleu_core::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Validation(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResponseError for EngineError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_type = self.error_type();

        metrics::COMPLIANCE_ERRORS.with_label_values(&[error_type]).inc();

        HttpResponse::build(status_code).json(json!({
            "error": self.to_string(),
            "code": status_code.as_u16(),
            "type": error_type
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::Compliance(fueleu_core::Error::Validation(_)) => StatusCode::BAD_REQUEST,
            EngineError::Compliance(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl EngineError {
    fn error_type(&self) -> &'static str {
        match self {
            EngineError::Compliance(e) => e.error_type(),
            EngineError::Database(_) => "database_error",
            EngineError::Migration(_) => "migration_error",
            EngineError::Validation(_) => "validation_error",
            EngineError::Config(_) => "config_error",
        }
    }
}

/// Maps sqlx failures into the core error so store implementations can
/// satisfy the port signatures.
pub trait StorageResultExt<T> {
    fn storage(self) -> fueleu_core::Result<T>;
}

impl<T> StorageResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn storage(self) -> fueleu_core::Result<T> {
        self.map_err(|e| fueleu_core::Error::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validation_is_bad_request() {
        let err = EngineError::Validation("shipId and year are required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "shipId and year are required");

        let err: EngineError = fueleu_core::Error::Validation("amount must be greater than zero").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_domain_errors_are_internal_with_raw_message() {
        let err: EngineError = fueleu_core::Error::InsufficientBanked {
            available: dec!(20),
            requested: dec!(30),
        }
        .into();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "Insufficient banked amount. Available: 20, Requested: 30"
        );
        assert_eq!(err.error_type(), "insufficient_banked");
    }

    #[test]
    fn test_storage_ext_keeps_message() {
        let result: std::result::Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err = result.storage().unwrap_err();
        assert!(matches!(err, fueleu_core::Error::Storage(_)));
        assert_eq!(err.to_string(), sqlx::Error::RowNotFound.to_string());
    }
}
