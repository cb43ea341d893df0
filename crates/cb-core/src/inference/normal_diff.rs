//! Posterior of the difference μ₁ − μ₂ between two Normal means.
//!
//! The two samples are independent, so their posteriors are updated
//! separately and combined: means subtract, variances add. With unknown
//! variances (Behrens-Fisher) the difference is approximated by a Student-t
//! with Satterthwaite's effective degrees of freedom.

use tracing::debug;

use super::normal_mu;
use super::types::{EstimatedSample, MeanPrior, NormalPosterior, SampleSummary, StudentPosterior};
use crate::error::{ensure_finite, ensure_positive, InferenceError, Result};

// ============================================================================
// Known variances
// ============================================================================

/// Normal posterior of μ₁ − μ₂ when σ₁ and σ₂ are known.
pub fn known_variance(
    sample1: &SampleSummary,
    sample2: &SampleSummary,
    sigma1: f64,
    sigma2: f64,
    prior1: &MeanPrior,
    prior2: &MeanPrior,
) -> Result<NormalPosterior> {
    let post1 = normal_mu::posterior(sample1, sigma1, prior1)?;
    let post2 = normal_mu::posterior(sample2, sigma2, prior2)?;
    let mean = post1.mean() - post2.mean();
    let std = (post1.variance() + post2.variance()).sqrt();
    debug!(mean, std, "difference posterior (known variances)");
    NormalPosterior::new(mean, std)
}

/// `(mean, std)` of the known-variance difference posterior.
pub fn moments(
    sample1: &SampleSummary,
    sample2: &SampleSummary,
    sigma1: f64,
    sigma2: f64,
    prior1: &MeanPrior,
    prior2: &MeanPrior,
) -> Result<(f64, f64)> {
    known_variance(sample1, sample2, sigma1, sigma2, prior1, prior2).map(|post| post.moments())
}

// ============================================================================
// Unknown variances
// ============================================================================

/// Unbiased sample variance (divisor `n - 1`).
pub fn sample_variance(observations: &[f64]) -> Result<f64> {
    if observations.len() < 2 {
        return Err(InferenceError::invalid(
            "observations",
            format!("need at least 2 values, got {}", observations.len()),
        ));
    }
    for &y in observations {
        ensure_finite(y, "observations")?;
    }
    let n = observations.len() as f64;
    let mean = observations.iter().sum::<f64>() / n;
    let ss: f64 = observations.iter().map(|y| (y - mean) * (y - mean)).sum();
    Ok(ss / (n - 1.0))
}

/// Satterthwaite's effective degrees of freedom before rounding.
///
/// The denominators use `n + 1` as in Bolstad (2007), p. 247.
pub fn effective_df(var1: f64, n1: u64, var2: f64, n2: u64) -> Result<f64> {
    ensure_positive(var1, "var1")?;
    ensure_positive(var2, "var2")?;
    if n1 == 0 || n2 == 0 {
        return Err(InferenceError::invalid("count", "sample sizes must be > 0"));
    }
    let a = var1 / n1 as f64;
    let b = var2 / n2 as f64;
    Ok((a + b) * (a + b) / (a * a / (n1 as f64 + 1.0) + b * b / (n2 as f64 + 1.0)))
}

/// [`effective_df`] rounded to the nearest integer, halves going up.
pub fn satterthwaite_df(var1: f64, n1: u64, var2: f64, n2: u64) -> Result<u64> {
    let nu = effective_df(var1, n1, var2, n2)?;
    let floor = nu.floor();
    let ceil = nu.ceil();
    let rounded = if nu - floor < ceil - nu { floor } else { ceil };
    Ok(rounded as u64)
}

/// Student-t posterior of μ₁ − μ₂ with Normal priors on both means, each
/// updated with its sample's estimated standard deviation.
pub fn unknown_variance_normal_priors(
    sample1: &EstimatedSample,
    sample2: &EstimatedSample,
    prior1: &MeanPrior,
    prior2: &MeanPrior,
) -> Result<StudentPosterior> {
    sample1.validate()?;
    sample2.validate()?;
    let post1 = normal_mu::posterior(&sample1.summary(), sample1.std, prior1)?;
    let post2 = normal_mu::posterior(&sample2.summary(), sample2.std, prior2)?;
    let df = satterthwaite_df(sample1.variance(), sample1.count, sample2.variance(), sample2.count)?;
    let location = post1.mean() - post2.mean();
    let scale = (post1.variance() + post2.variance()).sqrt();
    debug!(location, scale, df, "difference posterior (Behrens-Fisher)");
    StudentPosterior::new(location, scale, df as f64)
}

/// Student-t posterior of μ₁ − μ₂ under flat priors: centred on ȳ₁ − ȳ₂
/// with scale `sqrt(s₁²/n₁ + s₂²/n₂)`.
pub fn unknown_variance_flat_priors(
    sample1: &EstimatedSample,
    sample2: &EstimatedSample,
) -> Result<StudentPosterior> {
    unknown_variance_normal_priors(sample1, sample2, &MeanPrior::Flat, &MeanPrior::Flat)
}
