use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::experiment::ExperimentValidationError;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Evaluator error: {message}")]
    Evaluator { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidStateTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn evaluator(message: impl Into<String>) -> Self {
        Self::Evaluator {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<ExperimentValidationError> for DomainError {
    fn from(error: ExperimentValidationError) -> Self {
        match error {
            ExperimentValidationError::InvalidStatusTransition(from, to) => {
                Self::InvalidStateTransition { from, to }
            }
            ExperimentValidationError::ResultsClosed(_) => Self::InvalidState {
                message: error.to_string(),
            },
            other => Self::Validation {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(error: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON error: {}", error),
        }
    }
}

/// Structured error value returned by read-only test queries
///
/// Query callers render these instead of failing, so the value is
/// serializable with a stable `error` tag.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum QueryError {
    #[error("Test '{test_id}' not found")]
    NotFound { test_id: String },

    #[error("Insufficient data: {available} observations available, {required} required")]
    InsufficientData { available: usize, required: usize },
}

impl QueryError {
    pub fn not_found(test_id: impl Into<String>) -> Self {
        Self::NotFound {
            test_id: test_id.into(),
        }
    }

    pub fn insufficient_data(available: usize, required: usize) -> Self {
        Self::InsufficientData {
            available,
            required,
        }
    }
}

impl From<QueryError> for DomainError {
    fn from(error: QueryError) -> Self {
        match error {
            QueryError::NotFound { .. } => Self::NotFound {
                message: error.to_string(),
            },
            QueryError::InsufficientData { .. } => Self::InvalidState {
                message: error.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Test 'abc' not found");
        assert_eq!(error.to_string(), "Not found: Test 'abc' not found");
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Invalid input");
        assert_eq!(error.to_string(), "Validation error: Invalid input");
    }

    #[test]
    fn test_conflict_error() {
        let error = DomainError::conflict("Test already exists");
        assert_eq!(error.to_string(), "Conflict: Test already exists");
    }

    #[test]
    fn test_from_validation_error() {
        let error: DomainError = ExperimentValidationError::InvalidStatusTransition(
            "completed".to_string(),
            "running".to_string(),
        )
        .into();
        assert!(matches!(
            error,
            DomainError::InvalidStateTransition { ref from, ref to }
                if from == "completed" && to == "running"
        ));

        let error: DomainError = ExperimentValidationError::EmptyContent.into();
        assert!(matches!(error, DomainError::Validation { .. }));

        let error: DomainError =
            ExperimentValidationError::ResultsClosed("draft".to_string()).into();
        assert!(matches!(error, DomainError::InvalidState { .. }));
    }

    #[test]
    fn test_query_error_serialization() {
        let json = serde_json::to_value(QueryError::not_found("t-1")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "not_found", "test_id": "t-1"}));

        let json = serde_json::to_value(QueryError::insufficient_data(1, 2)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "insufficient_data", "available": 1, "required": 2})
        );
    }
}
