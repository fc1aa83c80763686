//! Domain layer - Core business logic and entities

pub mod error;
pub mod experiment;
pub mod storage;

pub use error::{DomainError, QueryError};
pub use experiment::{
    Evaluation, Evaluator, EvaluatorError, ExperimentId, ExperimentStatus, ExperimentTest,
    TestMetrics, TestParameters, TestResult, Variant, VariantId, Winner,
};
pub use storage::{Storage, StorageEntity, StorageKey};
