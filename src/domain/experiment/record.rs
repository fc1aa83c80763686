//! Test result records for individual scored observations

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::entity::ExperimentId;
use super::validation::{validate_execution_time, validate_score, ExperimentValidationError};
use super::variant::{TemplateValues, VariantId};

/// Unique identifier for a test result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestResultId(String);

impl TestResultId {
    /// Create a result ID from an existing value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TestResultId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for TestResultId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One scored observation of one variant on one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TestResultRecord")]
pub struct TestResult {
    result_id: TestResultId,
    test_id: ExperimentId,
    variant_id: VariantId,
    timestamp: DateTime<Utc>,
    /// Wall-clock evaluation time in seconds
    execution_time: f64,
    success: bool,
    score: f64,
    metrics: BTreeMap<String, f64>,
    output: String,
    error_details: Option<String>,
    context: TemplateValues,
    metadata: BTreeMap<String, Value>,
}

impl TestResult {
    /// Create a successful result, validating score and execution time
    pub fn new(
        test_id: ExperimentId,
        variant_id: VariantId,
        score: f64,
        execution_time: f64,
    ) -> Result<Self, ExperimentValidationError> {
        validate_score(score)?;
        validate_execution_time(execution_time)?;

        Ok(Self {
            result_id: TestResultId::generate(),
            test_id,
            variant_id,
            timestamp: Utc::now(),
            execution_time,
            success: true,
            score,
            metrics: BTreeMap::new(),
            output: String::new(),
            error_details: None,
            context: TemplateValues::new(),
            metadata: BTreeMap::new(),
        })
    }

    /// Create a failed result with a zero score
    pub fn failure(
        test_id: ExperimentId,
        variant_id: VariantId,
        execution_time: f64,
        error: impl Into<String>,
    ) -> Result<Self, ExperimentValidationError> {
        let mut result = Self::new(test_id, variant_id, 0.0, execution_time)?;
        result.success = false;
        result.error_details = Some(error.into());
        Ok(result)
    }

    /// Set the result ID
    pub fn with_result_id(mut self, id: impl Into<TestResultId>) -> Self {
        self.result_id = id.into();
        self
    }

    /// Set the metric values
    pub fn with_metrics(mut self, metrics: BTreeMap<String, f64>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set the produced output
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Set the input context the variant was evaluated with
    pub fn with_context(mut self, context: TemplateValues) -> Self {
        self.context = context;
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Mark as failed while keeping the evaluator-reported score
    pub fn with_failure(mut self, error: Option<String>) -> Self {
        self.success = false;
        self.error_details = error;
        self
    }

    pub fn id(&self) -> &TestResultId {
        &self.result_id
    }

    pub fn test_id(&self) -> &ExperimentId {
        &self.test_id
    }

    pub fn variant_id(&self) -> &VariantId {
        &self.variant_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn execution_time(&self) -> f64 {
        self.execution_time
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// True when no usable score was produced (evaluator error, timeout, invalid score)
    pub fn is_error(&self) -> bool {
        self.error_details.is_some()
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn error_details(&self) -> Option<&str> {
        self.error_details.as_deref()
    }

    pub fn context(&self) -> &TemplateValues {
        &self.context
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Mean of all metric values, 0.0 when there are none
    pub fn average_metric(&self) -> f64 {
        if self.metrics.is_empty() {
            return 0.0;
        }

        self.metrics.values().sum::<f64>() / self.metrics.len() as f64
    }

    /// Blend of score (60%) and average metric (40%), zero for failures
    pub fn quality_score(&self) -> f64 {
        if !self.success {
            return 0.0;
        }

        let mut quality = self.score * 0.6;

        if !self.metrics.is_empty() {
            quality += self.average_metric() * 0.4;
        }

        quality.min(1.0)
    }

    /// Bucketed score for how quickly the evaluation finished
    pub fn performance_score(&self) -> f64 {
        match self.execution_time {
            t if t <= 1.0 => 1.0,
            t if t <= 2.0 => 0.8,
            t if t <= 5.0 => 0.6,
            t if t <= 10.0 => 0.4,
            _ => 0.2,
        }
    }
}

/// Unvalidated wire form of a test result
#[derive(Debug, Deserialize)]
struct TestResultRecord {
    result_id: TestResultId,
    test_id: ExperimentId,
    variant_id: VariantId,
    timestamp: DateTime<Utc>,
    execution_time: f64,
    success: bool,
    score: f64,
    #[serde(default)]
    metrics: BTreeMap<String, f64>,
    #[serde(default)]
    output: String,
    #[serde(default)]
    error_details: Option<String>,
    #[serde(default)]
    context: TemplateValues,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

impl TryFrom<TestResultRecord> for TestResult {
    type Error = ExperimentValidationError;

    fn try_from(record: TestResultRecord) -> Result<Self, Self::Error> {
        validate_score(record.score)?;
        validate_execution_time(record.execution_time)?;

        Ok(Self {
            result_id: record.result_id,
            test_id: record.test_id,
            variant_id: record.variant_id,
            timestamp: record.timestamp,
            execution_time: record.execution_time,
            success: record.success,
            score: record.score,
            metrics: record.metrics,
            output: record.output,
            error_details: record.error_details,
            context: record.context,
            metadata: record.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (ExperimentId, VariantId) {
        (
            ExperimentId::new("test_456").unwrap(),
            VariantId::new("variant_a").unwrap(),
        )
    }

    fn sample_metrics() -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("accuracy".to_string(), 0.9),
            ("completeness".to_string(), 0.8),
            ("relevance".to_string(), 0.85),
        ])
    }

    #[test]
    fn test_result_creation() {
        let (test_id, variant_id) = ids();
        let result = TestResult::new(test_id, variant_id, 0.85, 2.5)
            .unwrap()
            .with_result_id("result_123")
            .with_metrics(sample_metrics())
            .with_output("Test output content");

        assert_eq!(result.id().as_str(), "result_123");
        assert_eq!(result.test_id().as_str(), "test_456");
        assert_eq!(result.variant_id().as_str(), "variant_a");
        assert_eq!(result.execution_time(), 2.5);
        assert!(result.is_success());
        assert_eq!(result.score(), 0.85);
        assert_eq!(result.metrics().len(), 3);
        assert_eq!(result.output(), "Test output content");
        assert!(result.error_details().is_none());
    }

    #[test]
    fn test_unsuccessful_verdict_is_not_an_error() {
        let (test_id, variant_id) = ids();
        let verdict = TestResult::new(test_id.clone(), variant_id.clone(), 0.3, 1.0)
            .unwrap()
            .with_failure(None);
        assert!(!verdict.is_success());
        assert!(!verdict.is_error());
        assert_eq!(verdict.score(), 0.3);

        let errored = TestResult::failure(test_id, variant_id, 1.0, "timed out").unwrap();
        assert!(!errored.is_success());
        assert!(errored.is_error());
    }

    #[test]
    fn test_score_out_of_range_rejected() {
        let (test_id, variant_id) = ids();
        let result = TestResult::new(test_id.clone(), variant_id.clone(), 1.5, 1.0);
        assert_eq!(result, Err(ExperimentValidationError::ScoreOutOfRange(1.5)));

        let result = TestResult::new(test_id, variant_id, -0.5, 1.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_execution_time_rejected() {
        let (test_id, variant_id) = ids();
        let result = TestResult::new(test_id, variant_id, 0.5, -1.0);
        assert_eq!(
            result,
            Err(ExperimentValidationError::NegativeExecutionTime(-1.0))
        );
    }

    #[test]
    fn test_failure_result() {
        let (test_id, variant_id) = ids();
        let result = TestResult::failure(test_id, variant_id, 0.2, "evaluator timed out").unwrap();

        assert!(!result.is_success());
        assert_eq!(result.score(), 0.0);
        assert_eq!(result.error_details(), Some("evaluator timed out"));
        assert_eq!(result.quality_score(), 0.0);
    }

    #[test]
    fn test_average_and_quality_scores() {
        let (test_id, variant_id) = ids();
        let result = TestResult::new(test_id, variant_id, 0.85, 0.5)
            .unwrap()
            .with_metrics(sample_metrics());

        let expected_avg = (0.9 + 0.8 + 0.85) / 3.0;
        assert!((result.average_metric() - expected_avg).abs() < 1e-9);

        let expected_quality = 0.85 * 0.6 + expected_avg * 0.4;
        assert!((result.quality_score() - expected_quality).abs() < 1e-9);
    }

    #[test]
    fn test_quality_score_without_metrics() {
        let (test_id, variant_id) = ids();
        let result = TestResult::new(test_id, variant_id, 0.5, 0.5).unwrap();

        assert_eq!(result.average_metric(), 0.0);
        assert!((result.quality_score() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_performance_score_buckets() {
        let (test_id, variant_id) = ids();
        let at = |secs: f64| {
            TestResult::new(test_id.clone(), variant_id.clone(), 0.5, secs)
                .unwrap()
                .performance_score()
        };

        assert_eq!(at(0.5), 1.0);
        assert_eq!(at(1.5), 0.8);
        assert_eq!(at(4.0), 0.6);
        assert_eq!(at(9.9), 0.4);
        assert_eq!(at(30.0), 0.2);
    }

    #[test]
    fn test_deserialization_validates_score() {
        let (test_id, variant_id) = ids();
        let result = TestResult::new(test_id, variant_id, 0.7, 1.0).unwrap();

        let mut value = serde_json::to_value(&result).unwrap();
        let restored: TestResult = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(restored, result);

        value["score"] = serde_json::json!(3.0);
        assert!(serde_json::from_value::<TestResult>(value).is_err());
    }
}
