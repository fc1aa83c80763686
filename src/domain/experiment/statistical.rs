//! Statistical analysis functions for A/B testing
//!
//! Two-sample comparison with Welch's t-test, Cohen's d, confidence intervals
//! for the difference of means, and power / sample size calculations. All
//! functions are pure. Degenerate input (fewer than two observations, zero
//! variance) yields defined sentinels instead of NaN.

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::domain::DomainError;

/// Smallest per-group sample size ever recommended
pub const MIN_SAMPLE_SIZE: usize = 10;

/// Calculate mean of a sample
pub fn mean(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    sample.iter().sum::<f64>() / sample.len() as f64
}

/// Calculate variance of a sample (sample variance, n-1 denominator)
pub fn variance(sample: &[f64]) -> f64 {
    if sample.len() < 2 {
        return 0.0;
    }

    let m = mean(sample);
    let n = sample.len() as f64;
    sample.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1.0)
}

/// Calculate standard deviation of a sample
pub fn std_dev(sample: &[f64]) -> f64 {
    variance(sample).sqrt()
}

/// Welch's two-sample t-test
///
/// Returns `(t_statistic, p_value)` with a two-tailed p-value. When either
/// group has fewer than two observations, or the standard error is zero,
/// returns `(0.0, 1.0)`.
pub fn t_test(group_a: &[f64], group_b: &[f64]) -> (f64, f64) {
    if group_a.len() < 2 || group_b.len() < 2 {
        return (0.0, 1.0);
    }

    let n_a = group_a.len() as f64;
    let n_b = group_b.len() as f64;
    let var_a = variance(group_a) / n_a;
    let var_b = variance(group_b) / n_b;

    let se = (var_a + var_b).sqrt();

    if se == 0.0 || !se.is_finite() {
        return (0.0, 1.0);
    }

    let t = (mean(group_a) - mean(group_b)) / se;

    // Welch-Satterthwaite degrees of freedom
    let df_num = (var_a + var_b).powi(2);
    let df_denom = var_a.powi(2) / (n_a - 1.0) + var_b.powi(2) / (n_b - 1.0);

    if df_denom == 0.0 {
        return (t, 1.0);
    }

    let df = df_num / df_denom;

    let Ok(dist) = StudentsT::new(0.0, 1.0, df) else {
        return (t, 1.0);
    };

    let p_value = 2.0 * (1.0 - dist.cdf(t.abs()));

    (t, p_value.clamp(0.0, 1.0))
}

/// Pooled standard deviation, weighted by degrees of freedom
pub fn pooled_std_dev(group_a: &[f64], group_b: &[f64]) -> f64 {
    if group_a.len() < 2 || group_b.len() < 2 {
        return 0.0;
    }

    let n_a = group_a.len() as f64;
    let n_b = group_b.len() as f64;

    let pooled_var =
        ((n_a - 1.0) * variance(group_a) + (n_b - 1.0) * variance(group_b)) / (n_a + n_b - 2.0);

    pooled_var.sqrt()
}

/// Cohen's d effect size
///
/// Signed as `(mean(a) - mean(b)) / pooled_sd`, so the value is positive when
/// group A scores higher. Returns 0.0 for degenerate input.
pub fn cohens_d(group_a: &[f64], group_b: &[f64]) -> f64 {
    let pooled = pooled_std_dev(group_a, group_b);

    if pooled == 0.0 || !pooled.is_finite() {
        return 0.0;
    }

    (mean(group_a) - mean(group_b)) / pooled
}

/// Confidence interval for `mean(a) - mean(b)`
///
/// Uses the Welch standard error with the critical value of a t distribution
/// on `n_a + n_b - 2` degrees of freedom. Collapses to the point estimate when
/// the interval cannot be computed.
pub fn confidence_interval(group_a: &[f64], group_b: &[f64], confidence: f64) -> (f64, f64) {
    let diff = mean(group_a) - mean(group_b);

    if group_a.len() < 2 || group_b.len() < 2 || !(0.0..1.0).contains(&confidence) {
        return (diff, diff);
    }

    let n_a = group_a.len() as f64;
    let n_b = group_b.len() as f64;
    let se = (variance(group_a) / n_a + variance(group_b) / n_b).sqrt();

    if se == 0.0 || !se.is_finite() {
        return (diff, diff);
    }

    let Ok(dist) = StudentsT::new(0.0, 1.0, n_a + n_b - 2.0) else {
        return (diff, diff);
    };

    let t_critical = dist.inverse_cdf(1.0 - (1.0 - confidence) / 2.0);
    let margin = (t_critical * se).abs();

    (diff - margin, diff + margin)
}

/// Post-hoc power of a two-sided two-sample test
///
/// `sample_size` is the number of observations per group. Uses the normal
/// approximation on `|effect_size|`, so the result grows with both sample
/// size and effect magnitude. Returns 0.0 for invalid parameters.
pub fn calculate_power(effect_size: f64, sample_size: usize, significance_level: f64) -> f64 {
    if sample_size == 0
        || !effect_size.is_finite()
        || !(significance_level > 0.0 && significance_level < 1.0)
    {
        return 0.0;
    }

    let Some(normal) = standard_normal() else {
        return 0.0;
    };

    let z_alpha = normal.inverse_cdf(1.0 - significance_level / 2.0);
    let z_beta = effect_size.abs() * (sample_size as f64 / 2.0).sqrt() - z_alpha;

    normal.cdf(z_beta).clamp(0.0, 1.0)
}

/// Required sample size per group to reach the requested power
///
/// Never returns less than [`MIN_SAMPLE_SIZE`].
pub fn calculate_sample_size(
    effect_size: f64,
    power: f64,
    significance_level: f64,
) -> Result<usize, DomainError> {
    if !effect_size.is_finite() || effect_size == 0.0 {
        return Err(DomainError::validation(format!(
            "Effect size must be a non-zero number, got {}",
            effect_size
        )));
    }

    if !(power > 0.0 && power < 1.0) {
        return Err(DomainError::validation(format!(
            "Power must be between 0 and 1 (exclusive), got {}",
            power
        )));
    }

    if !(significance_level > 0.0 && significance_level < 1.0) {
        return Err(DomainError::validation(format!(
            "Significance level must be between 0 and 1 (exclusive), got {}",
            significance_level
        )));
    }

    let normal = standard_normal()
        .ok_or_else(|| DomainError::internal("Failed to build standard normal distribution"))?;

    let z_alpha = normal.inverse_cdf(1.0 - significance_level / 2.0);
    let z_beta = normal.inverse_cdf(power);

    let n = 2.0 * ((z_alpha + z_beta) / effect_size.abs()).powi(2);

    Ok((n.ceil() as usize).max(MIN_SAMPLE_SIZE))
}

fn standard_normal() -> Option<Normal> {
    Normal::new(0.0, 1.0).ok()
}
