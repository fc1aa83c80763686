//! Evaluator capability used to score rendered variants

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::variant::TemplateValues;

#[cfg(test)]
use mockall::automock;

/// Outcome of scoring one rendered variant on one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Quality score in [0, 1]
    pub score: f64,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub output: String,
}

fn default_success() -> bool {
    true
}

impl Evaluation {
    /// Create a successful evaluation with the given score
    pub fn new(score: f64) -> Self {
        Self {
            score,
            metrics: BTreeMap::new(),
            success: true,
            output: String::new(),
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Mark the evaluation as unsuccessful
    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }
}

/// Errors raised by an evaluator invocation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluatorError {
    #[error("Evaluation failed: {0}")]
    Failed(String),

    #[error("Evaluator unavailable: {0}")]
    Unavailable(String),
}

/// Scores a rendered variant against one input
///
/// Implementations may call a model, run heuristics or ask a human. They must
/// not rely on being invoked in any particular order.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        rendered_content: &str,
        input: &TemplateValues,
    ) -> Result<Evaluation, EvaluatorError>;
}
