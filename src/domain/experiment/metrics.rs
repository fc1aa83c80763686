//! Aggregate statistics over the scores of both variants of a test

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entity::{ExperimentId, ExperimentTest};
use super::record::TestResult;
use super::statistical::{
    calculate_power, cohens_d, confidence_interval, mean, std_dev, t_test,
};
use super::validation::{ExperimentValidationError, INCONCLUSIVE_MARKER};
use super::variant::VariantId;

/// Default significance level (alpha)
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;


// ============================================================================
// Winner
// ============================================================================

/// Outcome of a comparison
///
/// Serialized as the winning variant ID, or `"inconclusive"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Winner {
    Variant(VariantId),
    Inconclusive,
}

impl Winner {
    pub fn variant_id(&self) -> Option<&VariantId> {
        match self {
            Self::Variant(id) => Some(id),
            Self::Inconclusive => None,
        }
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self, Self::Inconclusive)
    }
}

impl TryFrom<String> for Winner {
    type Error = ExperimentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == INCONCLUSIVE_MARKER {
            return Ok(Self::Inconclusive);
        }

        VariantId::new(value).map(Self::Variant)
    }
}

impl From<Winner> for String {
    fn from(winner: Winner) -> Self {
        winner.to_string()
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variant(id) => write!(f, "{}", id),
            Self::Inconclusive => write!(f, "{}", INCONCLUSIVE_MARKER),
        }
    }
}

// ============================================================================
// EffectSizeCategory
// ============================================================================

/// Conventional bucket for the magnitude of Cohen's d
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectSizeCategory {
    #[serde(rename = "small")]
    Small,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "large")]
    Large,
    #[serde(rename = "very large")]
    VeryLarge,
}

impl EffectSizeCategory {
    /// Bucket an effect size by its absolute value
    pub fn from_effect_size(effect_size: f64) -> Self {
        match effect_size.abs() {
            d if d < 0.2 => Self::Small,
            d if d < 0.5 => Self::Medium,
            d if d < 0.8 => Self::Large,
            _ => Self::VeryLarge,
        }
    }
}

impl fmt::Display for EffectSizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
            Self::VeryLarge => write!(f, "very large"),
        }
    }
}

// ============================================================================
// Interpretation
// ============================================================================

/// Human-readable summary of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub winner: Winner,
    /// Confidence level as a percentage string, e.g. "95%"
    pub confidence: String,
    pub effect_size_interpretation: EffectSizeCategory,
    pub statistical_significance: bool,
    pub p_value: f64,
    pub recommendation: String,
}

// ============================================================================
// TestMetrics
// ============================================================================

/// Statistical summary of the scores collected for both variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestMetrics {
    pub test_id: ExperimentId,
    pub variant_a_id: VariantId,
    pub variant_b_id: VariantId,
    pub variant_a_results: Vec<f64>,
    pub variant_b_results: Vec<f64>,
    pub sample_size_a: usize,
    pub sample_size_b: usize,
    pub mean_a: f64,
    pub mean_b: f64,
    pub std_a: f64,
    pub std_b: f64,
    pub t_statistic: f64,
    /// Cohen's d, positive when variant A scores higher
    pub effect_size: f64,
    /// Interval for `mean_a - mean_b`
    pub confidence_interval: (f64, f64),
    pub p_value: f64,
    pub significance_level: f64,
    pub statistical_power: f64,
    pub is_significant: bool,
    pub winner: Winner,
}

impl TestMetrics {
    /// Create metrics from raw score sequences and compute every derived field
    pub fn new(
        test_id: ExperimentId,
        variant_a_id: VariantId,
        variant_b_id: VariantId,
        variant_a_results: Vec<f64>,
        variant_b_results: Vec<f64>,
    ) -> Self {
        let mut metrics = Self {
            test_id,
            variant_a_id,
            variant_b_id,
            variant_a_results,
            variant_b_results,
            sample_size_a: 0,
            sample_size_b: 0,
            mean_a: 0.0,
            mean_b: 0.0,
            std_a: 0.0,
            std_b: 0.0,
            t_statistic: 0.0,
            effect_size: 0.0,
            confidence_interval: (0.0, 0.0),
            p_value: 1.0,
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            statistical_power: 0.0,
            is_significant: false,
            winner: Winner::Inconclusive,
        };
        metrics.calculate_statistics();
        metrics
    }

    /// Build metrics from the scored results of a test
    ///
    /// Errored results carry no meaningful score and are left out. Results
    /// the evaluator judged unsuccessful keep their score.
    pub fn from_test(test: &ExperimentTest) -> Self {
        Self::new(
            test.id().clone(),
            test.variant_a().id().clone(),
            test.variant_b().id().clone(),
            scored(test.results_a()),
            scored(test.results_b()),
        )
        .with_significance_level(test.parameters().significance_level())
    }

    /// Set the significance level and recompute
    pub fn with_significance_level(mut self, significance_level: f64) -> Self {
        self.significance_level = significance_level;
        self.calculate_statistics();
        self
    }

    /// Recompute every derived field from the raw score sequences
    pub fn calculate_statistics(&mut self) {
        let a = &self.variant_a_results;
        let b = &self.variant_b_results;

        self.sample_size_a = a.len();
        self.sample_size_b = b.len();
        self.mean_a = mean(a);
        self.mean_b = mean(b);
        self.std_a = std_dev(a);
        self.std_b = std_dev(b);

        let (t_statistic, p_value) = t_test(a, b);
        self.t_statistic = t_statistic;
        self.p_value = p_value;
        self.effect_size = cohens_d(a, b);
        self.confidence_interval = confidence_interval(a, b, 1.0 - self.significance_level);
        self.statistical_power = calculate_power(
            self.effect_size,
            self.sample_size_a.min(self.sample_size_b),
            self.significance_level,
        );

        self.is_significant = self.p_value < self.significance_level;
        self.winner = if !self.is_significant || self.mean_a == self.mean_b {
            Winner::Inconclusive
        } else if self.mean_a > self.mean_b {
            Winner::Variant(self.variant_a_id.clone())
        } else {
            Winner::Variant(self.variant_b_id.clone())
        };
    }

    /// Effect size bucket
    pub fn effect_size_category(&self) -> EffectSizeCategory {
        EffectSizeCategory::from_effect_size(self.effect_size)
    }

    /// Confidence level as a whole percentage, e.g. "95%"
    pub fn confidence_label(&self) -> String {
        format!("{:.0}%", (1.0 - self.significance_level) * 100.0)
    }

    /// One-sentence description of how confident the result is
    pub fn confidence_description(&self) -> String {
        match (&self.winner, self.is_significant) {
            (Winner::Variant(id), true) => format!(
                "We can be {} confident that {} is better.",
                self.confidence_label(),
                id
            ),
            _ => "No statistically significant difference found.".to_string(),
        }
    }

    /// Deployment recommendation keyed on significance and effect size
    pub fn recommendation(&self) -> String {
        let Winner::Variant(id) = &self.winner else {
            return "Continue testing or collect more data. No significant difference found."
                .to_string();
        };

        match self.effect_size_category() {
            category @ (EffectSizeCategory::Large | EffectSizeCategory::VeryLarge) => format!(
                "Strong recommendation: Deploy {}. Effect size is {}.",
                id, category
            ),
            category @ EffectSizeCategory::Medium => format!(
                "Moderate recommendation: Consider deploying {}. Effect size is {}.",
                id, category
            ),
            category @ EffectSizeCategory::Small => format!(
                "Weak recommendation: {} shows improvement but effect size is {}.",
                id, category
            ),
        }
    }

    /// Human-readable summary
    pub fn get_interpretation(&self) -> Interpretation {
        Interpretation {
            winner: self.winner.clone(),
            confidence: self.confidence_label(),
            effect_size_interpretation: self.effect_size_category(),
            statistical_significance: self.is_significant,
            p_value: self.p_value,
            recommendation: self.recommendation(),
        }
    }
}

fn scored(results: &[TestResult]) -> Vec<f64> {
    results
        .iter()
        .filter(|r| !r.is_error())
        .map(|r| r.score())
        .collect()
}
