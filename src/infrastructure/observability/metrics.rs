//! Runtime metrics for A/B test execution
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! embedding application installs a recorder.

use std::time::Duration;

use metrics::{counter, histogram};

use crate::domain::experiment::ExperimentStatus;

/// Record one evaluator invocation
pub fn record_evaluation(variant: &str, success: bool, duration: Duration) {
    let labels = [
        ("variant", variant.to_string()),
        ("status", if success { "success" } else { "error" }.to_string()),
    ];

    counter!("ab_evaluations_total", &labels).increment(1);
    histogram!("ab_evaluation_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Record a test status transition
pub fn record_transition(to: ExperimentStatus) {
    counter!("ab_test_transitions_total", "to" => to.to_string()).increment(1);
}

/// Record evaluator invocations that exceeded the timeout
pub fn record_evaluation_timeout(variant: &str) {
    counter!("ab_evaluation_timeouts_total", "variant" => variant.to_string()).increment(1);
}
