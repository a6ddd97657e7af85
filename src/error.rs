//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::studies::responses::ErrorResponse;
use crate::tariffs::models::EnergyType;

/// Broad category of an engine failure, used to pick the API status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Ineligible,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::NotFound => "not_found_error",
            ErrorKind::Conflict => "conflict_error",
            ErrorKind::Ineligible => "ineligible_error",
        }
    }
}

/// Errors raised by the tariff catalog and the saving-study engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid {field} range on {entity}: [{min}, {max}] must be non-negative with min <= max")]
    InvalidRange {
        entity: &'static str,
        field: &'static str,
        min: Decimal,
        max: Decimal,
    },

    #[error("Period mismatch for {what}: expected {expected}, got {actual}")]
    PeriodMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid consumption: {reason}")]
    InvalidConsumptionRange { reason: String },

    #[error("Analyzed days must be positive, got {0}")]
    NonPositiveAnalyzedDays(i64),

    #[error("Invalid CUPS '{cups}': {reason}")]
    InvalidCups { cups: String, reason: &'static str },

    #[error("Rate type {rate_type_id} does not define a power range")]
    PowerRangeMissing { rate_type_id: i64 },

    #[error("Invalid amount on {entity} {id}: {reason}")]
    InvalidAmount {
        entity: &'static str,
        id: i64,
        reason: String,
    },

    #[error("Unknown {field} value '{value}'")]
    UnknownValue { field: &'static str, value: String },

    #[error("No margin found for {}", scope_label(.rate_type_id))]
    MarginNotFound { rate_type_id: Option<i64> },

    #[error("Rate type {0} not found")]
    RateTypeNotFound(i64),

    #[error("Rate {0} not found")]
    RateNotFound(i64),

    #[error("Saving study {0} not found")]
    StudyNotFound(Uuid),

    #[error("Suggested rate {suggested_rate_id} does not belong to study {study_id}")]
    SuggestedRateNotFound {
        study_id: Uuid,
        suggested_rate_id: Uuid,
    },

    #[error("{entity} {new_id} overlaps the range of {entity} {existing_id}")]
    RangeOverlapDetected {
        entity: &'static str,
        existing_id: i64,
        new_id: i64,
    },

    #[error("Rate type '{name}' already exists for {energy_type}")]
    DuplicateRateType { name: String, energy_type: EnergyType },

    #[error("Already exists other margin with different type for {}", scope_label(.rate_type_id))]
    MarginTypeConflict { rate_type_id: Option<i64> },

    #[error("Saving study {0} is already finished")]
    AlreadyFinished(Uuid),

    #[error("Saving study {study_id} changed concurrently (expected version {expected}, found {found})")]
    StaleStudy {
        study_id: Uuid,
        expected: u64,
        found: u64,
    },

    #[error("No {energy_type} rate is eligible for saving study {study_id}")]
    StudyNotEligible {
        study_id: Uuid,
        energy_type: EnergyType,
    },
}

fn scope_label(rate_type_id: &Option<i64>) -> String {
    match rate_type_id {
        Some(id) => format!("rate type {}", id),
        None => "global scope".to_string(),
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidRange { .. }
            | EngineError::PeriodMismatch { .. }
            | EngineError::InvalidConsumptionRange { .. }
            | EngineError::NonPositiveAnalyzedDays(_)
            | EngineError::InvalidCups { .. }
            | EngineError::PowerRangeMissing { .. }
            | EngineError::InvalidAmount { .. }
            | EngineError::UnknownValue { .. } => ErrorKind::Validation,
            EngineError::MarginNotFound { .. }
            | EngineError::RateTypeNotFound(_)
            | EngineError::RateNotFound(_)
            | EngineError::StudyNotFound(_)
            | EngineError::SuggestedRateNotFound { .. } => ErrorKind::NotFound,
            EngineError::RangeOverlapDetected { .. }
            | EngineError::DuplicateRateType { .. }
            | EngineError::MarginTypeConflict { .. }
            | EngineError::AlreadyFinished(_)
            | EngineError::StaleStudy { .. } => ErrorKind::Conflict,
            EngineError::StudyNotEligible { .. } => ErrorKind::Ineligible,
        }
    }
}

/// Engine result type
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::Engine(e) => {
                let kind = e.kind();
                let status = match kind {
                    ErrorKind::Validation | ErrorKind::Ineligible => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::Conflict => StatusCode::CONFLICT,
                };
                tracing::debug!("Engine error ({}): {}", kind.as_str(), e);
                (status, kind.as_str(), e.to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Database error".to_string(),
                )
            }
            AppError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    "Configuration error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error_type: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            EngineError::NonPositiveAnalyzedDays(0).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EngineError::MarginNotFound { rate_type_id: None }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::AlreadyFinished(Uuid::nil()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            EngineError::StudyNotEligible {
                study_id: Uuid::nil(),
                energy_type: EnergyType::Gas,
            }
            .kind(),
            ErrorKind::Ineligible
        );
    }

    #[test]
    fn test_error_display_carries_context() {
        let err = EngineError::MarginNotFound {
            rate_type_id: Some(7),
        };
        assert!(err.to_string().contains("rate type 7"));

        let err = EngineError::MarginTypeConflict { rate_type_id: None };
        assert!(err.to_string().contains("global scope"));

        let err = EngineError::RangeOverlapDetected {
            entity: "commission",
            existing_id: 1,
            new_id: 2,
        };
        assert_eq!(err.to_string(), "commission 2 overlaps the range of commission 1");
    }

    #[test]
    fn test_engine_error_status_codes() {
        let response = AppError::from(EngineError::StudyNotFound(Uuid::nil())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::from(EngineError::AlreadyFinished(Uuid::nil())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
