//! Infrastructure services

mod experiment_service;

pub use experiment_service::{
    CreateTestRequest, EvaluationReport, ExperimentRunner, ExportReport, ExportSummary,
    RunnerOptions, TestStatusReport, VariantPerformance,
};
