//! Experiment runner for A/B testing
//!
//! Orchestrates test creation, lifecycle control, batch execution against the
//! injected evaluator, statistical evaluation, status queries and export.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::experiment::{
    Evaluation, Evaluator, ExperimentId, ExperimentStatus, ExperimentTest,
    ExperimentValidationError, Interpretation, TemplateLoadReport, TemplateValues, TestMetrics,
    TestParameters, TestResult, TestResultId, TestTemplate, Variant, VariantId,
    calculate_sample_size, mean,
};
use crate::domain::storage::Storage;
use crate::domain::{DomainError, QueryError};
use crate::infrastructure::experiment::load_templates_file;
use crate::infrastructure::observability::{
    record_evaluation, record_evaluation_timeout, record_transition,
};

const DEFAULT_TEST_NAME: &str = "Unnamed Test";

// ============================================================================
// Options and Request Types
// ============================================================================

/// Tuning knobs for the runner
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Upper bound for a single evaluator invocation
    pub evaluation_timeout: Duration,
    /// Evaluations in flight at once during `run_test`
    pub max_concurrency: usize,
    /// Scored observations each variant needs before evaluation
    pub min_observations_per_variant: usize,
    /// Sample size used when a request does not set one
    pub default_sample_size: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            evaluation_timeout: Duration::from_secs(30),
            max_concurrency: 4,
            min_observations_per_variant: 2,
            default_sample_size: 100,
        }
    }
}

impl RunnerOptions {
    pub fn with_evaluation_timeout(mut self, evaluation_timeout: Duration) -> Self {
        self.evaluation_timeout = evaluation_timeout;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_min_observations(mut self, min_observations_per_variant: usize) -> Self {
        self.min_observations_per_variant = min_observations_per_variant;
        self
    }

    pub fn with_default_sample_size(mut self, default_sample_size: usize) -> Self {
        self.default_sample_size = default_sample_size;
        self
    }
}

/// Request to create a new A/B test
#[derive(Debug, Clone, Default)]
pub struct CreateTestRequest {
    /// Explicit test ID; a UUID is generated when absent
    pub test_id: Option<String>,
    pub test_name: Option<String>,
    pub description: Option<String>,
    pub parameters: Option<TestParameters>,
    pub context: BTreeMap<String, Value>,
    pub metadata: BTreeMap<String, Value>,
}

impl CreateTestRequest {
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: Some(test_name.into()),
            ..Default::default()
        }
    }

    pub fn with_test_id(mut self, test_id: impl Into<String>) -> Self {
        self.test_id = Some(test_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parameters(mut self, parameters: TestParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Report Types
// ============================================================================

/// Read-only view of a test's state and progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestStatusReport {
    pub test_id: String,
    pub test_name: String,
    pub status: ExperimentStatus,
    pub progress: f64,
    pub results_count: usize,
    pub target_sample_size: Option<usize>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    pub variant_a_id: String,
    pub variant_b_id: String,
}

impl From<&ExperimentTest> for TestStatusReport {
    fn from(test: &ExperimentTest) -> Self {
        Self {
            test_id: test.id().to_string(),
            test_name: test.name().to_string(),
            status: test.status(),
            progress: test.get_progress(),
            results_count: test.results_count(),
            target_sample_size: test.parameters().sample_size,
            start_time: test.start_time(),
            end_time: test.end_time(),
            planned_end: test.planned_end(),
            variant_a_id: test.variant_a().id().to_string(),
            variant_b_id: test.variant_b().id().to_string(),
        }
    }
}

/// Score summary for one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantPerformance {
    pub variant_id: String,
    pub mean: f64,
    pub std: f64,
    /// Scored observations used for the statistics
    pub sample_size: usize,
    /// Share of all results for this variant that succeeded
    pub success_rate: f64,
}

impl VariantPerformance {
    fn new(variant_id: &VariantId, results: &[TestResult], mean: f64, std: f64, n: usize) -> Self {
        let successes = results.iter().filter(|r| r.is_success()).count();

        Self {
            variant_id: variant_id.to_string(),
            mean,
            std,
            sample_size: n,
            success_rate: ratio(successes, results.len()),
        }
    }
}

/// Statistical evaluation of a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub test_id: String,
    pub variant_a_performance: VariantPerformance,
    pub variant_b_performance: VariantPerformance,
    pub interpretation: Interpretation,
    pub confidence_description: String,
    /// Observed power at the smaller of the two sample sizes
    pub statistical_power: f64,
    /// Per-variant sample size needed for the configured power and effect size
    pub recommended_sample_size: Option<usize>,
    pub metrics: TestMetrics,
}

/// Aggregate figures attached to an export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub total_results: usize,
    pub variant_a_results: usize,
    pub variant_b_results: usize,
    pub success_rate: f64,
    pub average_score: f64,
    /// Mean evaluation time in seconds
    pub average_execution_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_error: Option<QueryError>,
}

/// Full export of a test's results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportReport {
    pub test_id: String,
    pub test_name: String,
    pub status: ExperimentStatus,
    pub export_timestamp: DateTime<Utc>,
    pub results: Vec<TestResult>,
    pub summary: ExportSummary,
}

// ============================================================================
// Experiment Runner
// ============================================================================

type TestHandle = Arc<Mutex<ExperimentTest>>;

/// Orchestrates A/B tests against an injected evaluator
///
/// Every test sits behind its own lock; results are appended from a single
/// collection point in `run_test` so arrival order is preserved.
pub struct ExperimentRunner {
    tests: RwLock<HashMap<String, TestHandle>>,
    templates: RwLock<HashMap<String, TestTemplate>>,
    evaluator: Arc<dyn Evaluator>,
    storage: Arc<dyn Storage<ExperimentTest>>,
    options: RunnerOptions,
}

impl fmt::Debug for ExperimentRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExperimentRunner")
            .field("storage", &self.storage)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ExperimentRunner {
    /// Create a new runner
    pub fn new(
        evaluator: Arc<dyn Evaluator>,
        storage: Arc<dyn Storage<ExperimentTest>>,
        options: RunnerOptions,
    ) -> Self {
        Self {
            tests: RwLock::new(HashMap::new()),
            templates: RwLock::new(HashMap::new()),
            evaluator,
            storage,
            options,
        }
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Restore all tests held by the storage backend
    ///
    /// Tests already known to the runner are left untouched. Returns the
    /// number of tests loaded.
    pub async fn load_existing(&self) -> Result<usize, DomainError> {
        let stored = self.storage.list().await?;
        let mut tests = self.tests.write().await;
        let mut loaded = 0;

        for test in stored {
            let key = test.id().to_string();

            if tests.contains_key(&key) {
                continue;
            }

            tests.insert(key, Arc::new(Mutex::new(test)));
            loaded += 1;
        }

        info!(loaded, "Loaded stored A/B tests");
        Ok(loaded)
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create a new test in Draft status
    pub async fn create_ab_test(
        &self,
        variant_a: Variant,
        variant_b: Variant,
        request: CreateTestRequest,
    ) -> Result<ExperimentId, DomainError> {
        let test_id = match request.test_id.as_deref() {
            Some(id) => ExperimentId::new(id)?,
            None => ExperimentId::generate(),
        };

        debug!(test_id = %test_id, "Creating A/B test");

        let mut parameters = request.parameters.unwrap_or_default();

        if parameters.sample_size.is_none() {
            parameters.sample_size = Some(self.options.default_sample_size);
        }

        validate_parameters(&parameters)?;

        let test_name = request
            .test_name
            .unwrap_or_else(|| DEFAULT_TEST_NAME.to_string());

        let mut test = ExperimentTest::new(test_id.clone(), test_name, variant_a, variant_b)?
            .with_parameters(parameters)
            .with_context(request.context)
            .with_metadata(request.metadata);

        if let Some(description) = request.description {
            test = test.with_description(description);
        }

        let mut tests = self.tests.write().await;

        if tests.contains_key(test_id.as_str()) {
            return Err(DomainError::conflict(format!(
                "Test '{}' already exists",
                test_id
            )));
        }

        self.storage.create(test.clone()).await?;
        tests.insert(test_id.to_string(), Arc::new(Mutex::new(test)));

        info!(test_id = %test_id, "A/B test created");
        Ok(test_id)
    }

    /// Create a test from a loaded template
    ///
    /// Unset name and description are taken from the template.
    pub async fn create_test_from_template(
        &self,
        template_name: &str,
        mut request: CreateTestRequest,
    ) -> Result<ExperimentId, DomainError> {
        let template = self
            .templates
            .read()
            .await
            .get(template_name)
            .cloned()
            .ok_or_else(|| {
                DomainError::not_found(format!("Template '{}' not found", template_name))
            })?;

        let uuid = Uuid::new_v4().simple().to_string();
        let (variant_a, variant_b) = template.build_variants(&uuid[..8])?;

        request
            .test_name
            .get_or_insert_with(|| template.name.clone());

        if request.description.is_none() && !template.description.is_empty() {
            request.description = Some(template.description.clone());
        }

        request
            .metadata
            .entry("template".to_string())
            .or_insert_with(|| Value::from(template.name.clone()));

        self.create_ab_test(variant_a, variant_b, request).await
    }

    // ========================================================================
    // Lifecycle Operations
    // ========================================================================

    /// Start a test (Draft -> Running)
    pub async fn start_test(&self, test_id: &str) -> Result<(), DomainError> {
        self.transition(test_id, "start", ExperimentTest::start_test)
            .await
    }

    /// Pause a test (Running -> Paused)
    ///
    /// A batch in progress stops dispatching new evaluations.
    pub async fn pause_test(&self, test_id: &str) -> Result<(), DomainError> {
        self.transition(test_id, "pause", ExperimentTest::pause_test)
            .await
    }

    /// Resume a test (Paused -> Running)
    pub async fn resume_test(&self, test_id: &str) -> Result<(), DomainError> {
        self.transition(test_id, "resume", ExperimentTest::resume_test)
            .await
    }

    /// Complete a test (Running/Paused -> Completed)
    pub async fn complete_test(&self, test_id: &str) -> Result<(), DomainError> {
        self.transition(test_id, "complete", ExperimentTest::complete_test)
            .await
    }

    /// Cancel a test (Draft/Running/Paused -> Cancelled)
    ///
    /// Collected results are kept; new results are refused.
    pub async fn cancel_test(&self, test_id: &str) -> Result<(), DomainError> {
        self.transition(test_id, "cancel", ExperimentTest::cancel_test)
            .await
    }

    async fn transition(
        &self,
        test_id: &str,
        action: &str,
        apply: fn(&mut ExperimentTest) -> Result<(), ExperimentValidationError>,
    ) -> Result<(), DomainError> {
        debug!(test_id = %test_id, action, "Changing test status");

        let handle = self.handle(test_id).await?;
        let mut test = handle.lock().await;
        let mut updated = test.clone();

        if let Err(e) = apply(&mut updated) {
            warn!(
                test_id = %test_id,
                action,
                status = %test.status(),
                "Rejected status transition"
            );
            return Err(e.into());
        }

        self.storage.save(updated.clone()).await?;
        *test = updated;
        record_transition(test.status());

        info!(test_id = %test_id, status = %test.status(), "Test status changed");
        Ok(())
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Evaluate both variants on every input and record the results
    ///
    /// Produces one result per (input, variant) pair while the test keeps
    /// running. Evaluator errors and timeouts become failed results rather
    /// than aborting the batch. Pausing or cancelling the test stops new
    /// evaluations from being dispatched. When the final save fails, the
    /// results of this batch are taken back out of the test.
    pub async fn run_test(
        &self,
        test_id: &str,
        inputs: &[TemplateValues],
    ) -> Result<Vec<TestResult>, DomainError> {
        debug!(test_id = %test_id, inputs = inputs.len(), "Running A/B test");

        let handle = self.handle(test_id).await?;

        let (id, variant_a, variant_b) = {
            let test = handle.lock().await;

            if !test.status().is_running() {
                return Err(DomainError::invalid_state(format!(
                    "Test '{}' is not running (status: {})",
                    test_id,
                    test.status()
                )));
            }

            (
                test.id().clone(),
                test.variant_a().clone(),
                test.variant_b().clone(),
            )
        };

        let variant_a = Arc::new(variant_a);
        let variant_b = Arc::new(variant_b);

        let jobs: Vec<(Arc<Variant>, TemplateValues)> = inputs
            .iter()
            .flat_map(|input| {
                [
                    (Arc::clone(&variant_a), input.clone()),
                    (Arc::clone(&variant_b), input.clone()),
                ]
            })
            .collect();

        let job_handle = Arc::clone(&handle);
        let job_id = id.clone();

        let mut evaluations = stream::iter(jobs)
            .map(move |(variant, input)| {
                self.evaluate_variant(Arc::clone(&job_handle), job_id.clone(), variant, input)
            })
            .buffered(self.options.max_concurrency.max(1));

        let mut recorded = Vec::with_capacity(inputs.len() * 2);

        while let Some(outcome) = evaluations.next().await {
            let Some(result) = outcome? else {
                continue;
            };

            let mut test = handle.lock().await;

            match test.push_result(result.clone()) {
                Ok(_) => recorded.push(result),
                Err(ExperimentValidationError::ResultsClosed(status)) => {
                    warn!(test_id = %test_id, status = %status, "Dropping result for closed test");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut test = handle.lock().await;

        if let Err(e) = self.storage.save(test.clone()).await {
            let batch: HashSet<TestResultId> = recorded.iter().map(|r| r.id().clone()).collect();
            let removed = test.remove_results(&batch);
            warn!(
                test_id = %test_id,
                removed,
                error = %e,
                "Failed to persist batch, results rolled back"
            );
            return Err(e);
        }

        drop(test);

        info!(
            test_id = %test_id,
            results = recorded.len(),
            "A/B test batch finished"
        );

        Ok(recorded)
    }

    async fn evaluate_variant(
        &self,
        handle: TestHandle,
        test_id: ExperimentId,
        variant: Arc<Variant>,
        input: TemplateValues,
    ) -> Result<Option<TestResult>, DomainError> {
        let status = handle.lock().await.status();

        if !status.is_running() {
            debug!(
                test_id = %test_id,
                variant_id = %variant.id(),
                status = %status,
                "Skipping evaluation, test not running"
            );
            return Ok(None);
        }

        let rendered = variant.render(Some(&input));
        let started = Instant::now();
        let outcome = timeout(
            self.options.evaluation_timeout,
            self.evaluator.evaluate(&rendered, &input),
        )
        .await;
        let elapsed = started.elapsed();
        let execution_time = elapsed.as_secs_f64();

        let result = match outcome {
            Ok(Ok(evaluation)) => {
                result_from_evaluation(&test_id, variant.id(), execution_time, evaluation)?
            }
            Ok(Err(e)) => {
                warn!(
                    test_id = %test_id,
                    variant_id = %variant.id(),
                    error = %e,
                    "Evaluator failed"
                );
                TestResult::failure(
                    test_id.clone(),
                    variant.id().clone(),
                    execution_time,
                    e.to_string(),
                )?
            }
            Err(_) => {
                let timeout_ms = self.options.evaluation_timeout.as_millis() as u64;
                warn!(
                    test_id = %test_id,
                    variant_id = %variant.id(),
                    timeout_ms,
                    "Evaluation timed out"
                );
                record_evaluation_timeout(variant.id().as_str());
                TestResult::failure(
                    test_id.clone(),
                    variant.id().clone(),
                    execution_time,
                    format!("Evaluation timed out after {}ms", timeout_ms),
                )?
            }
        };

        record_evaluation(variant.id().as_str(), result.is_success(), elapsed);

        Ok(Some(result.with_context(input)))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Snapshot of a test
    pub async fn get_test(&self, test_id: &str) -> Option<ExperimentTest> {
        let handle = self.tests.read().await.get(test_id).cloned()?;
        let test = handle.lock().await;
        Some(test.clone())
    }

    /// Status, progress and result count of a test
    pub async fn get_test_status(&self, test_id: &str) -> Result<TestStatusReport, QueryError> {
        self.get_test(test_id)
            .await
            .map(|test| TestStatusReport::from(&test))
            .ok_or_else(|| QueryError::not_found(test_id))
    }

    /// Status reports of all known tests, ordered by test ID
    pub async fn list_tests(&self) -> Vec<TestStatusReport> {
        let handles: Vec<TestHandle> = self.tests.read().await.values().cloned().collect();
        let mut reports = Vec::with_capacity(handles.len());

        for handle in handles {
            let test = handle.lock().await;
            reports.push(TestStatusReport::from(&*test));
        }

        reports.sort_by(|a, b| a.test_id.cmp(&b.test_id));
        reports
    }

    /// Statistical evaluation of the results collected so far
    pub async fn evaluate_results(&self, test_id: &str) -> Result<EvaluationReport, QueryError> {
        let test = self
            .get_test(test_id)
            .await
            .ok_or_else(|| QueryError::not_found(test_id))?;

        self.build_evaluation(&test)
    }

    fn build_evaluation(&self, test: &ExperimentTest) -> Result<EvaluationReport, QueryError> {
        let metrics = TestMetrics::from_test(test);
        let required = self.options.min_observations_per_variant;
        let available = metrics.sample_size_a.min(metrics.sample_size_b);

        if available < required {
            debug!(
                test_id = %test.id(),
                available,
                required,
                "Not enough observations to evaluate"
            );
            return Err(QueryError::insufficient_data(available, required));
        }

        let parameters = test.parameters();
        let recommended_sample_size = calculate_sample_size(
            parameters.effect_size,
            parameters.power,
            parameters.significance_level(),
        )
        .ok();

        let variant_a_performance = VariantPerformance::new(
            test.variant_a().id(),
            test.results_a(),
            metrics.mean_a,
            metrics.std_a,
            metrics.sample_size_a,
        );
        let variant_b_performance = VariantPerformance::new(
            test.variant_b().id(),
            test.results_b(),
            metrics.mean_b,
            metrics.std_b,
            metrics.sample_size_b,
        );

        Ok(EvaluationReport {
            test_id: test.id().to_string(),
            variant_a_performance,
            variant_b_performance,
            interpretation: metrics.get_interpretation(),
            confidence_description: metrics.confidence_description(),
            statistical_power: metrics.statistical_power,
            recommended_sample_size,
            metrics,
        })
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// All results of a test with a summary and, when possible, an evaluation
    pub async fn export_test_results(&self, test_id: &str) -> Result<ExportReport, QueryError> {
        let test = self
            .get_test(test_id)
            .await
            .ok_or_else(|| QueryError::not_found(test_id))?;

        let results: Vec<TestResult> = test.all_results().cloned().collect();
        let scores: Vec<f64> = results.iter().map(|r| r.score()).collect();
        let times: Vec<f64> = results.iter().map(|r| r.execution_time()).collect();
        let successes = results.iter().filter(|r| r.is_success()).count();

        let (evaluation, evaluation_error) = match self.build_evaluation(&test) {
            Ok(report) => (Some(report), None),
            Err(e) => (None, Some(e)),
        };

        let summary = ExportSummary {
            total_results: results.len(),
            variant_a_results: test.results_a().len(),
            variant_b_results: test.results_b().len(),
            success_rate: ratio(successes, results.len()),
            average_score: mean(&scores),
            average_execution_time: mean(&times),
            evaluation,
            evaluation_error,
        };

        Ok(ExportReport {
            test_id: test.id().to_string(),
            test_name: test.name().to_string(),
            status: test.status(),
            export_timestamp: Utc::now(),
            results,
            summary,
        })
    }

    /// Export a test and write the report as pretty-printed JSON
    pub async fn export_to_file(
        &self,
        test_id: &str,
        path: &Path,
    ) -> Result<ExportReport, DomainError> {
        let report = self.export_test_results(test_id).await?;
        let json = serde_json::to_string_pretty(&report)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::storage(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tokio::fs::write(path, json).await.map_err(|e| {
            DomainError::storage(format!("Failed to write '{}': {}", path.display(), e))
        })?;

        info!(test_id = %test_id, path = %path.display(), "Exported test results");
        Ok(report)
    }

    // ========================================================================
    // Templates
    // ========================================================================

    /// Load templates from a JSON file
    ///
    /// Malformed entries are reported and skipped.
    pub async fn load_test_templates(&self, path: &Path) -> Result<TemplateLoadReport, DomainError> {
        let mut templates = self.templates.write().await;
        let report = load_templates_file(path, &mut templates).await?;

        info!(
            path = %path.display(),
            loaded = report.loaded.len(),
            failed = report.failures.len(),
            "Loaded test templates"
        );

        Ok(report)
    }

    /// Names of all loaded templates, sorted
    pub async fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.templates.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Sample inputs of a loaded template
    pub async fn template_inputs(&self, template_name: &str) -> Result<Vec<TemplateValues>, DomainError> {
        self.templates
            .read()
            .await
            .get(template_name)
            .map(|t| t.sample_inputs.clone())
            .ok_or_else(|| DomainError::not_found(format!("Template '{}' not found", template_name)))
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    async fn handle(&self, test_id: &str) -> Result<TestHandle, DomainError> {
        self.tests
            .read()
            .await
            .get(test_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("Test '{}' not found", test_id)))
    }
}

fn validate_parameters(parameters: &TestParameters) -> Result<(), DomainError> {
    if !(parameters.confidence_level > 0.0 && parameters.confidence_level < 1.0) {
        return Err(DomainError::validation(format!(
            "Confidence level must be between 0 and 1 (exclusive), got {}",
            parameters.confidence_level
        )));
    }

    if !(parameters.power > 0.0 && parameters.power < 1.0) {
        return Err(DomainError::validation(format!(
            "Power must be between 0 and 1 (exclusive), got {}",
            parameters.power
        )));
    }

    if !parameters.effect_size.is_finite() || parameters.effect_size <= 0.0 {
        return Err(DomainError::validation(format!(
            "Effect size must be positive, got {}",
            parameters.effect_size
        )));
    }

    if parameters.sample_size == Some(0) {
        return Err(DomainError::validation("Sample size must be positive"));
    }

    Ok(())
}

fn result_from_evaluation(
    test_id: &ExperimentId,
    variant_id: &VariantId,
    execution_time: f64,
    evaluation: Evaluation,
) -> Result<TestResult, DomainError> {
    let result = match TestResult::new(
        test_id.clone(),
        variant_id.clone(),
        evaluation.score,
        execution_time,
    ) {
        Ok(result) => result,
        Err(e) => {
            warn!(
                test_id = %test_id,
                variant_id = %variant_id,
                score = evaluation.score,
                "Evaluator returned an invalid score"
            );
            return Ok(TestResult::failure(
                test_id.clone(),
                variant_id.clone(),
                execution_time,
                e.to_string(),
            )?
            .with_output(evaluation.output));
        }
    };

    let result = result
        .with_metrics(evaluation.metrics)
        .with_output(evaluation.output);

    // An unsuccessful verdict is still a valid observation and keeps its score.
    if evaluation.success {
        Ok(result)
    } else {
        Ok(result.with_failure(None))
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64
}
