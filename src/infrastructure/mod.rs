//! Infrastructure layer - Statistics, storage backends and the experiment runner

pub mod experiment;
pub mod logging;
pub mod observability;
pub mod services;
pub mod storage;
