//! CLI module for the A/B testing runner
//!
//! Subcommands:
//! - `run`: create a test from a template and run its sample inputs
//! - `sample-size`: required observations per variant
//! - `list`, `status`, `evaluate`, `export`: query stored tests

pub mod query;
pub mod run;
pub mod sample_size;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::domain::experiment::ExperimentTest;
use crate::domain::QueryError;
use crate::infrastructure::experiment::RandomEvaluator;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::services::ExperimentRunner;
use crate::infrastructure::storage::StorageFactory;

/// Storage collection holding experiment tests
const TESTS_COLLECTION: &str = "tests";

/// PMP A/B Testing - Statistical comparison of two prompt variants
#[derive(Parser)]
#[command(name = "pmp-ab-testing")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Extra configuration file layered above config/default and config/local
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a test from a template, run its sample inputs and export it
    Run(run::RunArgs),

    /// Compute the sample size per variant for a target power
    SampleSize(sample_size::SampleSizeArgs),

    /// List stored tests
    List,

    /// Show the status of a stored test
    Status {
        test_id: String,
    },

    /// Evaluate the results of a stored test
    Evaluate {
        test_id: String,
    },

    /// Export the results of a stored test
    Export {
        test_id: String,

        /// Write the report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Load configuration and install logging
///
/// An explicitly passed file must load; otherwise missing or broken config
/// files fall back to defaults.
pub fn init(config_file: Option<&Path>) -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = match config_file {
        Some(path) => AppConfig::load_from(Some(path))?,
        None => AppConfig::load().unwrap_or_default(),
    };

    init_logging(&config.logging);
    Ok(config)
}

/// Build a runner over the configured storage and restore stored tests
pub async fn build_runner(config: &AppConfig, seed: Option<u64>) -> anyhow::Result<ExperimentRunner> {
    let storage_config = config.storage.storage_config()?;
    let storage = StorageFactory::create::<ExperimentTest>(&storage_config, TESTS_COLLECTION).await?;

    debug!(storage = ?storage_config.storage_type(), seed = ?seed, "Building experiment runner");

    let runner = ExperimentRunner::new(
        Arc::new(RandomEvaluator::from_seed(seed)),
        storage,
        config.runner.options(),
    );
    runner.load_existing().await?;

    Ok(runner)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// JSON for a query outcome; a query error becomes its tagged object
pub(crate) fn query_output<T: Serialize>(result: Result<T, QueryError>) -> anyhow::Result<Value> {
    match result {
        Ok(value) => Ok(serde_json::to_value(value)?),
        Err(e) => {
            warn!(error = %e, "Query returned no data");
            Ok(serde_json::to_value(e)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "pmp-ab-testing",
            "run",
            "--templates",
            "templates.json",
            "--template",
            "review",
            "--seed",
            "7",
        ])
        .unwrap();

        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.templates, PathBuf::from("templates.json"));
                assert_eq!(args.template.as_deref(), Some("review"));
                assert_eq!(args.seed, Some(7));
                assert!(args.output.is_none());
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_export_with_global_config() {
        let cli = Cli::try_parse_from([
            "pmp-ab-testing",
            "export",
            "t-1",
            "-o",
            "out.json",
            "--config",
            "ab.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("ab.toml")));
        assert!(matches!(
            cli.command,
            Command::Export { ref test_id, output: Some(_) } if test_id == "t-1"
        ));
    }

    #[test]
    fn test_query_errors_render_as_tagged_json() {
        let value = query_output(Err::<(), _>(QueryError::not_found("t-9"))).unwrap();
        assert_eq!(value["error"], "not_found");
        assert_eq!(value["test_id"], "t-9");

        let value = query_output(Err::<(), _>(QueryError::insufficient_data(1, 2))).unwrap();
        assert_eq!(value["error"], "insufficient_data");
        assert_eq!(value["available"], 1);
        assert_eq!(value["required"], 2);

        let value = query_output(Ok::<_, QueryError>(vec![1, 2])).unwrap();
        assert_eq!(value, serde_json::json!([1, 2]));
    }

    #[tokio::test]
    async fn test_query_commands_on_unknown_test() {
        let config = AppConfig::default();
        let runner = build_runner(&config, None).await.unwrap();

        let value = query_output(runner.evaluate_results("missing").await).unwrap();
        assert_eq!(value["error"], "not_found");
        assert_eq!(value["test_id"], "missing");
    }

    #[tokio::test]
    async fn test_build_runner_with_json_storage() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.backend = "json".to_string();
        config.storage.path = dir.path().to_path_buf();

        let runner = build_runner(&config, Some(1)).await.unwrap();

        assert!(runner.list_tests().await.is_empty());
        assert!(dir.path().join(TESTS_COLLECTION).is_dir());
    }
}
