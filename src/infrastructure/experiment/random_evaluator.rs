//! Random-score evaluator used as a default test double

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::experiment::{Evaluation, Evaluator, EvaluatorError, TemplateValues};

/// Metric names and the uniform range each one is drawn from
const METRIC_RANGES: [(&str, Range<f64>); 4] = [
    ("accuracy", 0.6..0.95),
    ("completeness", 0.5..0.9),
    ("relevance", 0.7..0.95),
    ("coherence", 0.6..0.9),
];

/// Evaluator drawing every metric uniformly at random
///
/// The overall score is the mean of the drawn metrics. A seeded instance
/// produces the same sequence of evaluations on every run.
pub struct RandomEvaluator {
    rng: Mutex<StdRng>,
}

impl fmt::Debug for RandomEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomEvaluator").finish_non_exhaustive()
    }
}

impl Default for RandomEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomEvaluator {
    /// Creates an evaluator seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a reproducible evaluator
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Creates a seeded evaluator when a seed is given
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map(Self::with_seed).unwrap_or_default()
    }

    fn draw_metrics(&self) -> Result<BTreeMap<String, f64>, EvaluatorError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| EvaluatorError::Unavailable(format!("RNG lock poisoned: {}", e)))?;

        Ok(METRIC_RANGES
            .iter()
            .map(|(name, range)| (name.to_string(), rng.gen_range(range.clone())))
            .collect())
    }
}

#[async_trait]
impl Evaluator for RandomEvaluator {
    async fn evaluate(
        &self,
        rendered_content: &str,
        _input: &TemplateValues,
    ) -> Result<Evaluation, EvaluatorError> {
        let metrics = self.draw_metrics()?;
        let score = metrics.values().sum::<f64>() / metrics.len() as f64;

        Ok(Evaluation {
            score,
            metrics,
            success: true,
            output: rendered_content.to_string(),
        })
    }
}
