//! PMP A/B Testing
//!
//! Statistical A/B testing of two textual variants (prompts, templates):
//! - Test lifecycle with validated state transitions
//! - Concurrent batch evaluation through a pluggable evaluator
//! - Welch t-test, Cohen's d, confidence intervals and power analysis
//! - JSON file persistence, templates and result export

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
