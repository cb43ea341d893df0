//! Posterior of an unknown Normal mean μ.
//!
//! The population standard deviation σ is known on every path here except
//! [`posterior_unknown_variance`], which substitutes the sample estimate and
//! widens intervals with a Student-t on `n - 1` degrees of freedom.

use cb_math::normalize_log_weights;
use tracing::{debug, trace};

use super::types::{
    CredibleInterval, DiscretePosterior, DiscretePrior, EstimatedSample, MeanPrior,
    NormalPosterior, NormalPrior, SampleSummary, StudentPosterior,
};
use crate::error::{ensure_finite, ensure_positive, InferenceError, Result};

// ============================================================================
// Discrete prior
// ============================================================================

/// Posterior masses after a single observation `y`.
///
/// The likelihood of candidate μᵢ is the standard normal density of
/// `(y - μᵢ)/σ`.
pub fn discrete_posterior_single(
    y: f64,
    sigma: f64,
    prior: &DiscretePrior,
) -> Result<DiscretePosterior> {
    ensure_finite(y, "y")?;
    ensure_positive(sigma, "sigma")?;
    let log_likelihood = |mu: f64| {
        let z = (y - mu) / sigma;
        -0.5 * z * z
    };
    update_discrete(prior, log_likelihood)
}

/// Posterior masses after a sample, through the sampling density of ȳ:
/// `exp(-n (ȳ - μᵢ)² / 2σ²)`.
pub fn discrete_posterior(
    sample: &SampleSummary,
    sigma: f64,
    prior: &DiscretePrior,
) -> Result<DiscretePosterior> {
    sample.validate()?;
    ensure_positive(sigma, "sigma")?;
    let precision = sample.n() / (sigma * sigma);
    let log_likelihood = |mu: f64| {
        let delta = sample.mean - mu;
        -0.5 * precision * delta * delta
    };
    update_discrete(prior, log_likelihood)
}

fn update_discrete(
    prior: &DiscretePrior,
    log_likelihood: impl Fn(f64) -> f64,
) -> Result<DiscretePosterior> {
    // Zero prior mass contributes ln 0 = -inf and stays at zero.
    let log_weights: Vec<f64> = prior
        .values()
        .iter()
        .zip(prior.masses())
        .map(|(&mu, &mass)| mass.ln() + log_likelihood(mu))
        .collect();

    let masses = normalize_log_weights(&log_weights).ok_or_else(|| {
        InferenceError::invalid("prior.masses", "posterior has no finite mass to normalize")
    })?;
    trace!(candidates = masses.len(), "discrete posterior normalized");
    Ok(DiscretePosterior::new(prior.values().to_vec(), masses))
}

// ============================================================================
// Normal and flat priors, known σ
// ============================================================================

/// Posterior after one observation `y`.
///
/// With a Normal prior this is Bolstad eq. 11.4:
/// mean `(σ²μ₀ + σ₀²y)/(σ² + σ₀²)`, variance `σ²σ₀²/(σ² + σ₀²)`.
pub fn posterior_single(y: f64, sigma: f64, prior: &MeanPrior) -> Result<NormalPosterior> {
    ensure_finite(y, "y")?;
    ensure_positive(sigma, "sigma")?;
    match prior.as_normal()? {
        None => NormalPosterior::new(y, sigma),
        Some(prior) => {
            let var = sigma * sigma;
            let prior_var = prior.std * prior.std;
            let mean = (var * prior.mean + prior_var * y) / (var + prior_var);
            let std = (var * prior_var / (var + prior_var)).sqrt();
            NormalPosterior::new(mean, std)
        }
    }
}

/// Posterior after a sample of `n` observations with mean ȳ.
///
/// The flat prior gives N(ȳ, σ²/n) directly.
pub fn posterior(sample: &SampleSummary, sigma: f64, prior: &MeanPrior) -> Result<NormalPosterior> {
    sample.validate()?;
    ensure_positive(sigma, "sigma")?;
    let post = match prior.as_normal()? {
        None => NormalPosterior::new(sample.mean, sigma / sample.n().sqrt())?,
        Some(prior) => NormalPosterior::new(
            posterior_mean(sample, sigma, &prior)?,
            posterior_std(sample, sigma, &prior)?,
        )?,
    };
    debug!(
        n = sample.count,
        mean = post.mean(),
        std = post.std(),
        "normal mean posterior"
    );
    Ok(post)
}

/// Precision-weighted average of the prior mean and ȳ (Bolstad eq. 11.6).
pub fn posterior_mean(sample: &SampleSummary, sigma: f64, prior: &NormalPrior) -> Result<f64> {
    sample.validate()?;
    ensure_positive(sigma, "sigma")?;
    prior.validate()?;
    let prior_precision = 1.0 / (prior.std * prior.std);
    let data_precision = sample.n() / (sigma * sigma);
    Ok((prior_precision * prior.mean + data_precision * sample.mean)
        / (prior_precision + data_precision))
}

/// `1 / sqrt(1/σ₀² + n/σ²)` (Bolstad eq. 11.5).
pub fn posterior_std(sample: &SampleSummary, sigma: f64, prior: &NormalPrior) -> Result<f64> {
    sample.validate()?;
    ensure_positive(sigma, "sigma")?;
    prior.validate()?;
    let precision = 1.0 / (prior.std * prior.std) + sample.n() / (sigma * sigma);
    Ok(precision.recip().sqrt())
}

// ============================================================================
// Unknown σ
// ============================================================================

/// Posterior using the sample standard deviation in place of σ.
///
/// Location and scale follow the known-σ update with `s` substituted; the
/// Student-t has `n - 1` degrees of freedom (Bolstad eq. 11.8).
pub fn posterior_unknown_variance(
    sample: &EstimatedSample,
    prior: &MeanPrior,
) -> Result<StudentPosterior> {
    sample.validate()?;
    let known = posterior(&sample.summary(), sample.std, prior)?;
    StudentPosterior::new(known.mean(), known.std(), (sample.count - 1) as f64)
}

pub fn credible_interval_unknown_variance(
    sample: &EstimatedSample,
    prior: &MeanPrior,
    alpha: f64,
) -> Result<CredibleInterval> {
    posterior_unknown_variance(sample, prior)?.credible_interval(alpha)
}

// ============================================================================
// Free-standing helpers over (mean, std)
// ============================================================================

pub fn quantile(p: f64, mean: f64, std: f64) -> Result<f64> {
    NormalPosterior::new(mean, std)?.quantile(p)
}

pub fn credible_interval(alpha: f64, mean: f64, std: f64) -> Result<CredibleInterval> {
    NormalPosterior::new(mean, std)?.credible_interval(alpha)
}
