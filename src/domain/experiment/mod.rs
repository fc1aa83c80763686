//! Experiment domain module for A/B testing
//!
//! Types for comparing two variants of a textual artifact by repeated scored
//! evaluation: variants, tests with their lifecycle, individual results, and
//! the statistical summary computed over them.

mod entity;
mod evaluator;
mod metrics;
mod record;
mod statistical;
mod template;
mod validation;
mod variant;

// Re-export all public types
pub use entity::{EvaluationMethod, ExperimentId, ExperimentStatus, ExperimentTest, TestParameters};
#[cfg(test)]
pub use evaluator::MockEvaluator;
pub use evaluator::{Evaluation, Evaluator, EvaluatorError};
pub use metrics::{
    EffectSizeCategory, Interpretation, TestMetrics, Winner, DEFAULT_SIGNIFICANCE_LEVEL,
};
pub use record::{TestResult, TestResultId};
pub use statistical::{
    calculate_power, calculate_sample_size, cohens_d, confidence_interval, mean, pooled_std_dev,
    std_dev, t_test, variance, MIN_SAMPLE_SIZE,
};
pub use template::{TemplateLoadFailure, TemplateLoadReport, TestTemplate};
pub use validation::{
    validate_execution_time, validate_experiment_id, validate_score, validate_variant_id,
    ExperimentValidationError,
};
pub use variant::{TemplateValues, Variant, VariantId};
