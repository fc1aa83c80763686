//! Infrastructure layer for experiment A/B testing
//!
//! Provides the default evaluator and template loading.

mod random_evaluator;
mod template_loader;

pub use random_evaluator::RandomEvaluator;
pub use template_loader::{load_templates_file, parse_templates};
