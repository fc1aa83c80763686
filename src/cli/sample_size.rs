//! Sample-size command - power analysis without running a test

use clap::Args;
use serde_json::json;

use crate::domain::experiment::{calculate_power, calculate_sample_size};

#[derive(Args, Debug)]
pub struct SampleSizeArgs {
    /// Expected effect size (Cohen's d)
    #[arg(long)]
    pub effect_size: f64,

    /// Target statistical power
    #[arg(long, default_value_t = 0.8)]
    pub power: f64,

    /// Significance level
    #[arg(long, default_value_t = 0.05)]
    pub alpha: f64,
}

pub fn run(args: &SampleSizeArgs) -> anyhow::Result<()> {
    let sample_size = calculate_sample_size(args.effect_size, args.power, args.alpha)?;
    let achieved_power = calculate_power(args.effect_size, sample_size, args.alpha);

    super::print_json(&json!({
        "effect_size": args.effect_size,
        "power": args.power,
        "alpha": args.alpha,
        "sample_size_per_variant": sample_size,
        "achieved_power": achieved_power,
    }))
}
