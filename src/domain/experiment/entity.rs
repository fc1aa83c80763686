//! Experiment domain entities

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{TestResult, TestResultId};
use super::validation::{validate_experiment_id, ExperimentValidationError};
use super::variant::{Variant, VariantId};
use crate::domain::storage::{StorageEntity, StorageKey};

// ============================================================================
// ExperimentId
// ============================================================================

/// Unique identifier for a test
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExperimentId(String);

impl ExperimentId {
    /// Create a new test ID with validation
    pub fn new(id: impl Into<String>) -> Result<Self, ExperimentValidationError> {
        let id = id.into();
        validate_experiment_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a new UUID-based test ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ExperimentId {
    type Error = ExperimentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExperimentId> for String {
    fn from(id: ExperimentId) -> Self {
        id.0
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ExperimentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl StorageKey for ExperimentId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// ExperimentStatus
// ============================================================================

/// Lifecycle state of a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    /// Test is being configured, not yet running
    #[default]
    Draft,
    /// Test is collecting results
    Running,
    /// Test is temporarily paused
    Paused,
    /// Test has finished
    Completed,
    /// Test was abandoned before completion
    Cancelled,
}

impl ExperimentStatus {
    /// Check if the test is currently collecting results
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Check if results may still be appended
    ///
    /// Paused tests accept results so evaluations dispatched before the pause
    /// can land.
    pub fn accepts_results(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Check if a transition to the target status is valid
    pub fn can_transition_to(&self, target: ExperimentStatus) -> bool {
        match (self, target) {
            // Draft -> Running (start)
            (Self::Draft, Self::Running) => true,
            // Running -> Paused (pause)
            (Self::Running, Self::Paused) => true,
            // Running -> Completed (complete)
            (Self::Running, Self::Completed) => true,
            // Paused -> Running (resume)
            (Self::Paused, Self::Running) => true,
            // Paused -> Completed (complete)
            (Self::Paused, Self::Completed) => true,
            // Draft/Running/Paused -> Cancelled (cancel)
            (Self::Draft | Self::Running | Self::Paused, Self::Cancelled) => true,
            // All other transitions are invalid
            _ => false,
        }
    }
}

impl fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ============================================================================
// TestParameters
// ============================================================================

/// How variant quality is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMethod {
    Manual,
    #[default]
    Automatic,
    Hybrid,
}

/// Statistical design parameters of a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestParameters {
    /// Target number of observations per variant
    #[serde(default)]
    pub sample_size: Option<usize>,
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    #[serde(default = "default_power")]
    pub power: f64,
    /// Minimum effect size (Cohen's d) the test should detect
    #[serde(default = "default_effect_size")]
    pub effect_size: f64,
    #[serde(default = "default_duration_days")]
    pub duration_days: u32,
    #[serde(default)]
    pub evaluation_method: EvaluationMethod,
}

fn default_confidence_level() -> f64 {
    0.95
}

fn default_power() -> f64 {
    0.8
}

fn default_effect_size() -> f64 {
    0.2
}

fn default_duration_days() -> u32 {
    7
}

impl Default for TestParameters {
    fn default() -> Self {
        Self {
            sample_size: None,
            confidence_level: default_confidence_level(),
            power: default_power(),
            effect_size: default_effect_size(),
            duration_days: default_duration_days(),
            evaluation_method: EvaluationMethod::default(),
        }
    }
}

impl TestParameters {
    /// Set the target sample size per variant
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = Some(sample_size);
        self
    }

    /// Set the confidence level
    pub fn with_confidence_level(mut self, confidence_level: f64) -> Self {
        self.confidence_level = confidence_level;
        self
    }

    /// Significance level (alpha) implied by the confidence level
    pub fn significance_level(&self) -> f64 {
        1.0 - self.confidence_level
    }
}

// ============================================================================
// ExperimentTest
// ============================================================================

/// A stateful comparison between exactly two variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ExperimentTestRecord")]
pub struct ExperimentTest {
    test_id: ExperimentId,
    test_name: String,
    description: String,
    variant_a: Variant,
    variant_b: Variant,
    test_parameters: TestParameters,
    test_context: BTreeMap<String, Value>,
    status: ExperimentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<DateTime<Utc>>,
    results_a: Vec<TestResult>,
    results_b: Vec<TestResult>,
    metadata: BTreeMap<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ExperimentTest {
    /// Create a new test in Draft status
    ///
    /// Fails when both variants share an ID.
    pub fn new(
        test_id: ExperimentId,
        test_name: impl Into<String>,
        variant_a: Variant,
        variant_b: Variant,
    ) -> Result<Self, ExperimentValidationError> {
        if variant_a.id() == variant_b.id() {
            return Err(ExperimentValidationError::IdenticalVariants(
                variant_a.id().to_string(),
            ));
        }

        let now = Utc::now();

        Ok(Self {
            test_id,
            test_name: test_name.into(),
            description: String::new(),
            variant_a,
            variant_b,
            test_parameters: TestParameters::default(),
            test_context: BTreeMap::new(),
            status: ExperimentStatus::Draft,
            start_time: None,
            end_time: None,
            results_a: Vec::new(),
            results_b: Vec::new(),
            metadata: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    // Builder methods

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the statistical parameters
    pub fn with_parameters(mut self, parameters: TestParameters) -> Self {
        self.test_parameters = parameters;
        self
    }

    /// Set the free-form context
    pub fn with_context(mut self, context: BTreeMap<String, Value>) -> Self {
        self.test_context = context;
        self
    }

    /// Set the metadata
    pub fn with_metadata(mut self, metadata: BTreeMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    // Getters

    pub fn id(&self) -> &ExperimentId {
        &self.test_id
    }

    pub fn name(&self) -> &str {
        &self.test_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn variant_a(&self) -> &Variant {
        &self.variant_a
    }

    pub fn variant_b(&self) -> &Variant {
        &self.variant_b
    }

    pub fn parameters(&self) -> &TestParameters {
        &self.test_parameters
    }

    pub fn context(&self) -> &BTreeMap<String, Value> {
        &self.test_context
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn status(&self) -> ExperimentStatus {
        self.status
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Planned end of the test, derived from start time and duration
    pub fn planned_end(&self) -> Option<DateTime<Utc>> {
        self.start_time
            .map(|start| start + Duration::days(i64::from(self.test_parameters.duration_days)))
    }

    /// Results collected for variant A, in arrival order
    pub fn results_a(&self) -> &[TestResult] {
        &self.results_a
    }

    /// Results collected for variant B, in arrival order
    pub fn results_b(&self) -> &[TestResult] {
        &self.results_b
    }

    /// Results for the given variant, if it belongs to this test
    pub fn results_for(&self, variant_id: &VariantId) -> Option<&[TestResult]> {
        if variant_id == self.variant_a.id() {
            Some(&self.results_a)
        } else if variant_id == self.variant_b.id() {
            Some(&self.results_b)
        } else {
            None
        }
    }

    /// All results, variant A first
    pub fn all_results(&self) -> impl Iterator<Item = &TestResult> {
        self.results_a.iter().chain(self.results_b.iter())
    }

    /// Total number of results across both variants
    pub fn results_count(&self) -> usize {
        self.results_a.len() + self.results_b.len()
    }

    // Status transitions

    /// Start the test (Draft -> Running)
    pub fn start_test(&mut self) -> Result<(), ExperimentValidationError> {
        self.transition(ExperimentStatus::Running)?;
        self.start_time = Some(Utc::now());
        Ok(())
    }

    /// Pause the test (Running -> Paused)
    pub fn pause_test(&mut self) -> Result<(), ExperimentValidationError> {
        self.transition(ExperimentStatus::Paused)
    }

    /// Resume the test (Paused -> Running)
    pub fn resume_test(&mut self) -> Result<(), ExperimentValidationError> {
        if self.status != ExperimentStatus::Paused {
            return Err(ExperimentValidationError::InvalidStatusTransition(
                self.status.to_string(),
                ExperimentStatus::Running.to_string(),
            ));
        }

        self.transition(ExperimentStatus::Running)
    }

    /// Complete the test (Running/Paused -> Completed)
    pub fn complete_test(&mut self) -> Result<(), ExperimentValidationError> {
        self.transition(ExperimentStatus::Completed)?;
        self.end_time = Some(Utc::now());
        Ok(())
    }

    /// Cancel the test (Draft/Running/Paused -> Cancelled)
    ///
    /// Results collected so far are kept.
    pub fn cancel_test(&mut self) -> Result<(), ExperimentValidationError> {
        self.transition(ExperimentStatus::Cancelled)?;
        self.end_time = Some(Utc::now());
        Ok(())
    }

    // Results

    /// Record a score for one of the variants
    pub fn add_result(
        &mut self,
        variant_id: &VariantId,
        score: f64,
        metrics: BTreeMap<String, f64>,
    ) -> Result<&TestResult, ExperimentValidationError> {
        let result = TestResult::new(self.test_id.clone(), variant_id.clone(), score, 0.0)?
            .with_metrics(metrics);

        self.push_result(result)
    }

    /// Append a fully-formed result to the matching variant's sequence
    pub fn push_result(
        &mut self,
        result: TestResult,
    ) -> Result<&TestResult, ExperimentValidationError> {
        if !self.status.accepts_results() {
            return Err(ExperimentValidationError::ResultsClosed(
                self.status.to_string(),
            ));
        }

        let target = if result.variant_id() == self.variant_a.id() {
            &mut self.results_a
        } else if result.variant_id() == self.variant_b.id() {
            &mut self.results_b
        } else {
            return Err(ExperimentValidationError::UnknownVariant(
                result.variant_id().to_string(),
            ));
        };

        target.push(result);
        self.updated_at = Utc::now();

        Ok(&target[target.len() - 1])
    }

    /// Drop the results with the given IDs from both variants
    ///
    /// Returns how many results were removed.
    pub fn remove_results(&mut self, ids: &HashSet<TestResultId>) -> usize {
        let before = self.results_count();
        self.results_a.retain(|r| !ids.contains(r.id()));
        self.results_b.retain(|r| !ids.contains(r.id()));

        let removed = before - self.results_count();
        if removed > 0 {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Fraction of the target sample collected, in [0, 1]
    ///
    /// Both variants count towards a target of twice the configured sample
    /// size. Without a configured sample size the progress is 0.
    pub fn get_progress(&self) -> f64 {
        match self.test_parameters.sample_size {
            Some(sample_size) if sample_size > 0 => {
                let target = (2 * sample_size) as f64;
                (self.results_count() as f64 / target).min(1.0)
            }
            _ => 0.0,
        }
    }

    // Private helpers

    fn transition(&mut self, target: ExperimentStatus) -> Result<(), ExperimentValidationError> {
        if !self.status.can_transition_to(target) {
            return Err(ExperimentValidationError::InvalidStatusTransition(
                self.status.to_string(),
                target.to_string(),
            ));
        }

        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Unvalidated wire form of a test
#[derive(Debug, Deserialize)]
struct ExperimentTestRecord {
    test_id: ExperimentId,
    test_name: String,
    #[serde(default)]
    description: String,
    variant_a: Variant,
    variant_b: Variant,
    #[serde(default)]
    test_parameters: TestParameters,
    #[serde(default)]
    test_context: BTreeMap<String, Value>,
    status: ExperimentStatus,
    #[serde(default)]
    start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    results_a: Vec<TestResult>,
    #[serde(default)]
    results_b: Vec<TestResult>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExperimentTestRecord> for ExperimentTest {
    type Error = ExperimentValidationError;

    fn try_from(record: ExperimentTestRecord) -> Result<Self, Self::Error> {
        let mut test = Self::new(
            record.test_id,
            record.test_name,
            record.variant_a,
            record.variant_b,
        )?;

        test.description = record.description;
        test.test_parameters = record.test_parameters;
        test.test_context = record.test_context;
        test.status = record.status;
        test.start_time = record.start_time;
        test.end_time = record.end_time;
        test.results_a = record.results_a;
        test.results_b = record.results_b;
        test.metadata = record.metadata;
        test.created_at = record.created_at;
        test.updated_at = record.updated_at;

        Ok(test)
    }
}

impl StorageEntity for ExperimentTest {
    type Key = ExperimentId;

    fn key(&self) -> &Self::Key {
        &self.test_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: &str) -> Variant {
        Variant::new(id, format!("Variant {}", id), "Analyze {input}").unwrap()
    }

    fn create_test_experiment() -> ExperimentTest {
        ExperimentTest::new(
            ExperimentId::new("test_123").unwrap(),
            "Code Analysis A/B Test",
            variant("variant_a"),
            variant("variant_b"),
        )
        .unwrap()
        .with_description("Compare two code analysis prompts")
        .with_parameters(TestParameters::default().with_sample_size(10))
    }

    mod experiment_id_tests {
        use super::*;

        #[test]
        fn test_valid_experiment_id() {
            let id = ExperimentId::new("my-experiment").unwrap();
            assert_eq!(id.as_str(), "my-experiment");
        }

        #[test]
        fn test_generated_ids_are_unique() {
            let a = ExperimentId::generate();
            let b = ExperimentId::generate();
            assert_ne!(a, b);
            assert!(ExperimentId::new(a.as_str()).is_ok());
        }

        #[test]
        fn test_experiment_id_serialization() {
            let id = ExperimentId::new("test-exp").unwrap();
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, "\"test-exp\"");

            let parsed: ExperimentId = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, id);
        }

        #[test]
        fn test_invalid_experiment_id() {
            assert!(ExperimentId::new("").is_err());
            assert!(serde_json::from_str::<ExperimentId>("\"\"").is_err());
        }
    }

    mod experiment_status_tests {
        use super::*;

        #[test]
        fn test_default_status() {
            assert_eq!(ExperimentStatus::default(), ExperimentStatus::Draft);
        }

        #[test]
        fn test_status_transitions() {
            // Valid transitions
            assert!(ExperimentStatus::Draft.can_transition_to(ExperimentStatus::Running));
            assert!(ExperimentStatus::Running.can_transition_to(ExperimentStatus::Paused));
            assert!(ExperimentStatus::Running.can_transition_to(ExperimentStatus::Completed));
            assert!(ExperimentStatus::Paused.can_transition_to(ExperimentStatus::Running));
            assert!(ExperimentStatus::Paused.can_transition_to(ExperimentStatus::Completed));
            assert!(ExperimentStatus::Draft.can_transition_to(ExperimentStatus::Cancelled));
            assert!(ExperimentStatus::Running.can_transition_to(ExperimentStatus::Cancelled));
            assert!(ExperimentStatus::Paused.can_transition_to(ExperimentStatus::Cancelled));

            // Invalid transitions
            assert!(!ExperimentStatus::Draft.can_transition_to(ExperimentStatus::Paused));
            assert!(!ExperimentStatus::Draft.can_transition_to(ExperimentStatus::Completed));
            assert!(!ExperimentStatus::Running.can_transition_to(ExperimentStatus::Running));
            assert!(!ExperimentStatus::Completed.can_transition_to(ExperimentStatus::Running));
            assert!(!ExperimentStatus::Completed.can_transition_to(ExperimentStatus::Cancelled));
            assert!(!ExperimentStatus::Cancelled.can_transition_to(ExperimentStatus::Running));
            assert!(!ExperimentStatus::Cancelled.can_transition_to(ExperimentStatus::Draft));
        }

        #[test]
        fn test_status_display() {
            assert_eq!(ExperimentStatus::Draft.to_string(), "draft");
            assert_eq!(ExperimentStatus::Running.to_string(), "running");
            assert_eq!(ExperimentStatus::Paused.to_string(), "paused");
            assert_eq!(ExperimentStatus::Completed.to_string(), "completed");
            assert_eq!(ExperimentStatus::Cancelled.to_string(), "cancelled");
        }

        #[test]
        fn test_status_serialization() {
            let json = serde_json::to_string(&ExperimentStatus::Cancelled).unwrap();
            assert_eq!(json, "\"cancelled\"");
        }
    }

    mod test_parameters_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let params = TestParameters::default();
            assert_eq!(params.sample_size, None);
            assert_eq!(params.confidence_level, 0.95);
            assert_eq!(params.power, 0.8);
            assert_eq!(params.effect_size, 0.2);
            assert_eq!(params.duration_days, 7);
            assert_eq!(params.evaluation_method, EvaluationMethod::Automatic);
            assert!((params.significance_level() - 0.05).abs() < 1e-12);
        }

        #[test]
        fn test_deserialize_with_defaults() {
            let params: TestParameters =
                serde_json::from_str(r#"{"sample_size": 50, "evaluation_method": "hybrid"}"#)
                    .unwrap();
            assert_eq!(params.sample_size, Some(50));
            assert_eq!(params.confidence_level, 0.95);
            assert_eq!(params.evaluation_method, EvaluationMethod::Hybrid);
        }
    }

    mod experiment_tests {
        use super::*;

        #[test]
        fn test_experiment_creation() {
            let exp = create_test_experiment();
            assert_eq!(exp.id().as_str(), "test_123");
            assert_eq!(exp.name(), "Code Analysis A/B Test");
            assert_eq!(exp.status(), ExperimentStatus::Draft);
            assert_eq!(exp.variant_a().id().as_str(), "variant_a");
            assert_eq!(exp.variant_b().id().as_str(), "variant_b");
            assert!(exp.start_time().is_none());
            assert_eq!(exp.results_count(), 0);
        }

        #[test]
        fn test_identical_variant_ids_rejected() {
            let result = ExperimentTest::new(
                ExperimentId::new("test_123").unwrap(),
                "Self comparison",
                variant("same"),
                variant("same"),
            );

            assert!(matches!(
                result,
                Err(ExperimentValidationError::IdenticalVariants(id)) if id == "same"
            ));
        }

        #[test]
        fn test_full_lifecycle() {
            let mut exp = create_test_experiment();

            assert!(exp.start_test().is_ok());
            assert_eq!(exp.status(), ExperimentStatus::Running);
            assert!(exp.start_time().is_some());
            assert!(exp.planned_end().is_some());

            assert!(exp.pause_test().is_ok());
            assert_eq!(exp.status(), ExperimentStatus::Paused);

            assert!(exp.resume_test().is_ok());
            assert_eq!(exp.status(), ExperimentStatus::Running);

            assert!(exp.complete_test().is_ok());
            assert_eq!(exp.status(), ExperimentStatus::Completed);
            assert!(exp.end_time().is_some());
        }

        #[test]
        fn test_draft_only_allows_start() {
            let mut exp = create_test_experiment();

            assert!(exp.pause_test().is_err());
            assert!(exp.resume_test().is_err());
            assert!(exp.complete_test().is_err());
            assert_eq!(exp.status(), ExperimentStatus::Draft);

            assert!(exp.start_test().is_ok());
        }

        #[test]
        fn test_running_rejects_start_and_resume() {
            let mut exp = create_test_experiment();
            exp.start_test().unwrap();

            assert_eq!(
                exp.start_test(),
                Err(ExperimentValidationError::InvalidStatusTransition(
                    "running".to_string(),
                    "running".to_string()
                ))
            );
            assert!(exp.resume_test().is_err());
            assert_eq!(exp.status(), ExperimentStatus::Running);
        }

        #[test]
        fn test_completed_rejects_everything() {
            let mut exp = create_test_experiment();
            exp.start_test().unwrap();
            exp.complete_test().unwrap();

            assert!(exp.start_test().is_err());
            assert!(exp.pause_test().is_err());
            assert!(exp.resume_test().is_err());
            assert!(exp.complete_test().is_err());
            assert!(exp.cancel_test().is_err());
            assert_eq!(exp.status(), ExperimentStatus::Completed);
        }

        #[test]
        fn test_cancel_from_each_open_state() {
            let mut draft = create_test_experiment();
            assert!(draft.cancel_test().is_ok());
            assert_eq!(draft.status(), ExperimentStatus::Cancelled);
            assert!(draft.start_test().is_err());

            let mut running = create_test_experiment();
            running.start_test().unwrap();
            assert!(running.cancel_test().is_ok());

            let mut paused = create_test_experiment();
            paused.start_test().unwrap();
            paused.pause_test().unwrap();
            assert!(paused.cancel_test().is_ok());
            assert!(paused.resume_test().is_err());
        }

        #[test]
        fn test_add_result_routes_by_variant() {
            let mut exp = create_test_experiment();
            exp.start_test().unwrap();

            let a = exp.variant_a().id().clone();
            let b = exp.variant_b().id().clone();

            exp.add_result(&a, 0.9, BTreeMap::new()).unwrap();
            exp.add_result(&b, 0.6, BTreeMap::new()).unwrap();
            exp.add_result(&a, 0.8, BTreeMap::new()).unwrap();

            assert_eq!(exp.results_a().len(), 2);
            assert_eq!(exp.results_b().len(), 1);
            assert_eq!(exp.results_a()[0].score(), 0.9);
            assert_eq!(exp.results_a()[1].score(), 0.8);
            assert_eq!(exp.results_a()[0].test_id(), exp.id());
        }

        #[test]
        fn test_add_result_unknown_variant() {
            let mut exp = create_test_experiment();
            exp.start_test().unwrap();

            let unknown = VariantId::new("variant_c").unwrap();
            let result = exp.add_result(&unknown, 0.5, BTreeMap::new());

            assert!(matches!(
                result,
                Err(ExperimentValidationError::UnknownVariant(id)) if id == "variant_c"
            ));
            assert_eq!(exp.results_count(), 0);
        }

        #[test]
        fn test_add_result_invalid_score() {
            let mut exp = create_test_experiment();
            exp.start_test().unwrap();

            let a = exp.variant_a().id().clone();
            assert!(exp.add_result(&a, 1.2, BTreeMap::new()).is_err());
            assert_eq!(exp.results_count(), 0);
        }

        #[test]
        fn test_results_closed_after_cancel() {
            let mut exp = create_test_experiment();
            exp.start_test().unwrap();

            let a = exp.variant_a().id().clone();
            exp.add_result(&a, 0.7, BTreeMap::new()).unwrap();
            exp.cancel_test().unwrap();

            let result = exp.add_result(&a, 0.7, BTreeMap::new());
            assert_eq!(
                result.map(|_| ()),
                Err(ExperimentValidationError::ResultsClosed("cancelled".to_string()))
            );
            assert_eq!(exp.results_count(), 1);
        }

        #[test]
        fn test_progress() {
            let mut exp = create_test_experiment();
            assert_eq!(exp.get_progress(), 0.0);

            exp.start_test().unwrap();
            let a = exp.variant_a().id().clone();
            let b = exp.variant_b().id().clone();

            let mut last = 0.0;

            for i in 0..25 {
                let variant = if i % 2 == 0 { &a } else { &b };
                exp.add_result(variant, 0.5, BTreeMap::new()).unwrap();

                let progress = exp.get_progress();
                assert!(progress > 0.0 && progress <= 1.0);
                assert!(progress >= last);
                last = progress;
            }

            assert_eq!(exp.get_progress(), 1.0);
        }

        #[test]
        fn test_progress_without_sample_size() {
            let mut exp = create_test_experiment().with_parameters(TestParameters::default());
            exp.start_test().unwrap();

            let a = exp.variant_a().id().clone();
            exp.add_result(&a, 0.5, BTreeMap::new()).unwrap();

            assert_eq!(exp.get_progress(), 0.0);
        }

        #[test]
        fn test_serialization_round_trip() {
            let mut exp = create_test_experiment();
            exp.start_test().unwrap();
            let a = exp.variant_a().id().clone();
            exp.add_result(&a, 0.75, BTreeMap::from([("accuracy".to_string(), 0.8)]))
                .unwrap();

            let json = serde_json::to_string(&exp).unwrap();
            let restored: ExperimentTest = serde_json::from_str(&json).unwrap();

            assert_eq!(restored.id(), exp.id());
            assert_eq!(restored.status(), ExperimentStatus::Running);
            assert_eq!(restored.results_a(), exp.results_a());
            assert_eq!(restored.variant_b(), exp.variant_b());
        }

        #[test]
        fn test_deserialize_rejects_identical_variant_ids() {
            let exp = create_test_experiment();
            let mut value = serde_json::to_value(&exp).unwrap();
            value["variant_b"]["variant_id"] = value["variant_a"]["variant_id"].clone();

            let restored = serde_json::from_value::<ExperimentTest>(value);
            let err = restored.unwrap_err().to_string();
            assert!(err.contains("variant_a"), "unexpected error: {}", err);
        }

        #[test]
        fn test_remove_results() {
            let mut exp = create_test_experiment();
            exp.start_test().unwrap();
            let a = exp.variant_a().id().clone();
            let b = exp.variant_b().id().clone();

            let keep = exp.add_result(&a, 0.9, BTreeMap::new()).unwrap().id().clone();
            let drop_a = exp.add_result(&a, 0.8, BTreeMap::new()).unwrap().id().clone();
            let drop_b = exp.add_result(&b, 0.7, BTreeMap::new()).unwrap().id().clone();

            let removed = exp.remove_results(&HashSet::from([drop_a, drop_b]));

            assert_eq!(removed, 2);
            assert_eq!(exp.results_count(), 1);
            assert_eq!(exp.results_a()[0].id(), &keep);
            assert!(exp.results_b().is_empty());
        }
    }
}
