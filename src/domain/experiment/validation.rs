//! Experiment validation utilities

use thiserror::Error;

/// Maximum length for experiment IDs
pub const MAX_EXPERIMENT_ID_LENGTH: usize = 128;

/// Maximum length for variant IDs
pub const MAX_VARIANT_ID_LENGTH: usize = 128;

/// Marker written in place of a winner's ID when no variant won
pub const INCONCLUSIVE_MARKER: &str = "inconclusive";

/// Validation errors for experiments, variants and results
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExperimentValidationError {
    #[error("Test ID cannot be empty")]
    EmptyId,

    #[error("Test ID exceeds maximum length of {0} characters")]
    IdTooLong(usize),

    #[error("Test ID contains invalid character: {0:?}")]
    InvalidIdCharacter(char),

    #[error("Variant ID cannot be empty")]
    EmptyVariantId,

    #[error("Variant ID exceeds maximum length of {0} characters")]
    VariantIdTooLong(usize),

    #[error("Variant ID contains invalid character: {0:?}")]
    InvalidVariantIdCharacter(char),

    #[error("Variant ID '{0}' is reserved")]
    ReservedVariantId(String),

    #[error("Variant content cannot be empty")]
    EmptyContent,

    #[error("Variants must have different IDs, both are '{0}'")]
    IdenticalVariants(String),

    #[error("Variant '{0}' is not part of this test")]
    UnknownVariant(String),

    #[error("Score must be between 0.0 and 1.0, got {0}")]
    ScoreOutOfRange(f64),

    #[error("Execution time cannot be negative, got {0}")]
    NegativeExecutionTime(f64),

    #[error("Invalid test status transition from {0} to {1}")]
    InvalidStatusTransition(String, String),

    #[error("Test in status {0} does not accept new results")]
    ResultsClosed(String),
}

/// Validate a test ID
pub fn validate_experiment_id(id: &str) -> Result<(), ExperimentValidationError> {
    if id.trim().is_empty() {
        return Err(ExperimentValidationError::EmptyId);
    }

    if id.len() > MAX_EXPERIMENT_ID_LENGTH {
        return Err(ExperimentValidationError::IdTooLong(MAX_EXPERIMENT_ID_LENGTH));
    }

    if let Some(ch) = id.chars().find(|c| !is_id_char(*c)) {
        return Err(ExperimentValidationError::InvalidIdCharacter(ch));
    }

    Ok(())
}

/// Validate a variant ID
pub fn validate_variant_id(id: &str) -> Result<(), ExperimentValidationError> {
    if id.trim().is_empty() {
        return Err(ExperimentValidationError::EmptyVariantId);
    }

    if id.len() > MAX_VARIANT_ID_LENGTH {
        return Err(ExperimentValidationError::VariantIdTooLong(
            MAX_VARIANT_ID_LENGTH,
        ));
    }

    if let Some(ch) = id.chars().find(|c| !is_id_char(*c)) {
        return Err(ExperimentValidationError::InvalidVariantIdCharacter(ch));
    }

    if id.eq_ignore_ascii_case(INCONCLUSIVE_MARKER) {
        return Err(ExperimentValidationError::ReservedVariantId(id.to_string()));
    }

    Ok(())
}

/// Validate a result score
pub fn validate_score(score: f64) -> Result<(), ExperimentValidationError> {
    if !(0.0..=1.0).contains(&score) {
        return Err(ExperimentValidationError::ScoreOutOfRange(score));
    }

    Ok(())
}

/// Validate an execution time in seconds
pub fn validate_execution_time(seconds: f64) -> Result<(), ExperimentValidationError> {
    if seconds.is_nan() || seconds < 0.0 {
        return Err(ExperimentValidationError::NegativeExecutionTime(seconds));
    }

    Ok(())
}

// IDs end up as file names in the JSON storage backend.
fn is_id_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')
}
