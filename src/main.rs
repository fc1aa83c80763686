use clap::Parser;
use pmp_ab_testing::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli::init(cli.config.as_deref())?;

    match cli.command {
        Command::Run(args) => cli::run::run(&config, args).await,
        Command::SampleSize(args) => cli::sample_size::run(&args),
        Command::List => cli::query::list(&config).await,
        Command::Status { test_id } => cli::query::status(&config, &test_id).await,
        Command::Evaluate { test_id } => cli::query::evaluate(&config, &test_id).await,
        Command::Export { test_id, output } => {
            cli::query::export(&config, &test_id, output.as_deref()).await
        }
    }
}
