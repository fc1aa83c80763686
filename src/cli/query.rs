//! Query commands over stored tests

use std::path::Path;

use tracing::info;

use crate::config::AppConfig;
use crate::domain::QueryError;
use crate::infrastructure::services::ExportReport;

use super::{build_runner, print_json, query_output};

pub async fn list(config: &AppConfig) -> anyhow::Result<()> {
    let runner = build_runner(config, None).await?;
    print_json(&runner.list_tests().await)
}

pub async fn status(config: &AppConfig, test_id: &str) -> anyhow::Result<()> {
    let runner = build_runner(config, None).await?;
    print_json(&query_output(runner.get_test_status(test_id).await)?)
}

pub async fn evaluate(config: &AppConfig, test_id: &str) -> anyhow::Result<()> {
    let runner = build_runner(config, None).await?;
    print_json(&query_output(runner.evaluate_results(test_id).await)?)
}

pub async fn export(config: &AppConfig, test_id: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let runner = build_runner(config, None).await?;

    if output.is_some() && runner.get_test(test_id).await.is_none() {
        return print_json(&query_output(Err::<ExportReport, _>(QueryError::not_found(test_id)))?);
    }

    match output {
        Some(path) => {
            let report = runner.export_to_file(test_id, path).await?;
            info!(test_id, results = report.results.len(), "Export written");
            Ok(())
        }
        None => print_json(&query_output(runner.export_test_results(test_id).await)?),
    }
}
