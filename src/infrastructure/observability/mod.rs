//! Observability infrastructure - Runtime metrics

mod metrics;

pub use self::metrics::{record_evaluation, record_evaluation_timeout, record_transition};
