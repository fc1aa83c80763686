//! Run command - executes a templated test end to end

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::services::CreateTestRequest;

use super::{build_runner, print_json};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON file with test templates
    #[arg(long)]
    pub templates: PathBuf,

    /// Template to run; the first one by name when omitted
    #[arg(long)]
    pub template: Option<String>,

    /// Seed for the random evaluator, overrides the configured seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the export report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Create, start, run and complete a test built from a template
pub async fn run(config: &AppConfig, args: RunArgs) -> anyhow::Result<()> {
    let seed = args.seed.or(config.runner.random_seed);
    let runner = build_runner(config, seed).await?;

    let report = runner.load_test_templates(&args.templates).await?;
    if !report.is_clean() {
        info!(
            skipped = report.failures.len(),
            "Some templates could not be loaded"
        );
    }

    let template = match args.template {
        Some(name) => name,
        None => runner
            .template_names()
            .await
            .into_iter()
            .next()
            .with_context(|| format!("No templates found in '{}'", args.templates.display()))?,
    };

    let test_id = runner
        .create_test_from_template(&template, CreateTestRequest::default())
        .await?;
    let test_id = test_id.as_str();

    runner.start_test(test_id).await?;

    let inputs = runner.template_inputs(&template).await?;
    let results = runner.run_test(test_id, &inputs).await?;

    runner.complete_test(test_id).await?;
    info!(test_id, template = %template, results = results.len(), "Templated test finished");

    match args.output {
        Some(path) => {
            runner.export_to_file(test_id, &path).await?;
        }
        None => print_json(&runner.export_test_results(test_id).await?)?,
    }

    Ok(())
}
