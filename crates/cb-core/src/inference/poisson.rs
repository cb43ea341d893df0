//! Posterior of an unknown Poisson rate λ.
//!
//! Flat, Jeffreys and Gamma priors are all conjugate: after `sumK` events
//! in `n` intervals the posterior is Gamma(r + sumK, v + n) in shape/rate
//! form (Bolstad 2007, ch. 10).

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use super::types::{
    CredibleInterval, GammaPosterior, PoissonSample, RatePrior, TestDecision, TestEvidence,
};
use crate::error::{ensure_non_negative, ensure_open_unit, InferenceError, Result};

/// Probabilities reported in a posterior summary table.
pub const DEFAULT_PROBABILITIES: [f64; 9] =
    [0.005, 0.01, 0.025, 0.05, 0.5, 0.95, 0.975, 0.99, 0.995];

/// One row of a posterior summary table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantileRow {
    pub probability: f64,
    pub quantile: f64,
}

// ============================================================================
// Posterior
// ============================================================================

/// Gamma(r + sumK, v + n).
pub fn posterior(sample: &PoissonSample, prior: &RatePrior) -> Result<GammaPosterior> {
    sample.validate()?;
    let (r, v) = prior.validate()?;
    let shape = r + sample.total_events as f64;
    let rate = v + sample.intervals as f64;
    if shape <= 0.0 {
        return Err(InferenceError::invalid(
            "prior.shape",
            "a zero-shape prior needs at least one observed event",
        ));
    }
    debug!(
        events = sample.total_events,
        intervals = sample.intervals,
        shape,
        rate,
        "poisson rate posterior"
    );
    GammaPosterior::new(shape, rate)
}

/// Likelihood `λ^sumK e^{-nλ}` of the sample, up to the constant `1/∏kᵢ!`.
pub fn likelihood(sample: &PoissonSample, lambda: f64) -> Result<f64> {
    sample.validate()?;
    ensure_non_negative(lambda, "lambda")?;
    let k = sample.total_events as f64;
    let n = sample.intervals as f64;
    if lambda == 0.0 {
        return Ok(if sample.total_events == 0 { 1.0 } else { 0.0 });
    }
    Ok((k * lambda.ln() - n * lambda).exp())
}

/// Number of intervals the prior is worth: `floor(v)`.
pub fn equivalent_prior_sample_size(rate: f64) -> Result<u64> {
    ensure_non_negative(rate, "prior.rate")?;
    // u64::MAX rounds up to 2^64 as f64, so anything at or above it saturates.
    if rate >= u64::MAX as f64 {
        return Err(InferenceError::invalid(
            "prior.rate",
            format!("{rate} intervals does not fit in a count"),
        ));
    }
    Ok(rate.floor() as u64)
}

/// `(r + sumK) / (v + n)`.
pub fn posterior_mean(sample: &PoissonSample, prior: &RatePrior) -> Result<f64> {
    posterior(sample, prior).map(|post| post.mean())
}

// ============================================================================
// Frequentist properties of the posterior mean at a fixed λ
// ============================================================================

/// Bias `(r - vλ) / (v + n)` of the posterior mean as an estimator of λ.
pub fn posterior_mean_bias(shape: f64, rate: f64, intervals: u64, lambda: f64) -> Result<f64> {
    let denom = estimator_denominator(rate, intervals)?;
    ensure_non_negative(shape, "prior.shape")?;
    ensure_non_negative(lambda, "lambda")?;
    Ok((shape - rate * lambda) / denom)
}

/// Sampling variance `nλ / (v + n)²` of the posterior mean.
pub fn posterior_mean_variance(rate: f64, intervals: u64, lambda: f64) -> Result<f64> {
    let denom = estimator_denominator(rate, intervals)?;
    ensure_non_negative(lambda, "lambda")?;
    Ok(intervals as f64 * lambda / (denom * denom))
}

/// Bias² + variance.
pub fn mean_squared_error(shape: f64, rate: f64, intervals: u64, lambda: f64) -> Result<f64> {
    let bias = posterior_mean_bias(shape, rate, intervals, lambda)?;
    Ok(bias * bias + posterior_mean_variance(rate, intervals, lambda)?)
}

fn estimator_denominator(rate: f64, intervals: u64) -> Result<f64> {
    ensure_non_negative(rate, "prior.rate")?;
    if intervals == 0 {
        return Err(InferenceError::invalid("sample.intervals", "must be > 0"));
    }
    Ok(rate + intervals as f64)
}

// ============================================================================
// Derived products
// ============================================================================

pub fn interquartile_range(sample: &PoissonSample, prior: &RatePrior) -> Result<f64> {
    posterior(sample, prior).map(|post| post.interquartile_range())
}

pub fn credible_interval(
    sample: &PoissonSample,
    prior: &RatePrior,
    alpha: f64,
) -> Result<CredibleInterval> {
    posterior(sample, prior)?.credible_interval(alpha)
}

/// Test `H0: λ ≤ λ0` against `H1: λ > λ0`; rejects when P(λ ≤ λ0) < α.
pub fn one_sided_test(
    sample: &PoissonSample,
    prior: &RatePrior,
    alpha: f64,
    null_rate: f64,
) -> Result<TestDecision> {
    ensure_open_unit(alpha, "alpha")?;
    let (null_probability, odds) = null_odds(sample, prior, null_rate)?;
    Ok(TestDecision {
        reject: null_probability < alpha,
        alpha,
        evidence: TestEvidence::OneSided {
            null_probability,
            odds,
        },
    })
}

/// Posterior odds `P(λ ≤ λ0) / P(λ > λ0)`.
pub fn one_sided_odds(sample: &PoissonSample, prior: &RatePrior, null_rate: f64) -> Result<f64> {
    null_odds(sample, prior, null_rate).map(|(_, odds)| odds)
}

/// Test `H0: λ = λ0`; rejects when λ0 lies outside the equal-tail interval.
pub fn two_sided_test(
    sample: &PoissonSample,
    prior: &RatePrior,
    alpha: f64,
    null_rate: f64,
) -> Result<TestDecision> {
    ensure_non_negative(null_rate, "null_rate")?;
    let interval = credible_interval(sample, prior, alpha)?;
    Ok(TestDecision {
        reject: !interval.contains(null_rate),
        alpha,
        evidence: TestEvidence::TwoSided { interval },
    })
}

/// `P(λ ≤ λ0)` and the odds against the survival function, which keeps its
/// precision after the CDF has rounded to one.
fn null_odds(sample: &PoissonSample, prior: &RatePrior, null_rate: f64) -> Result<(f64, f64)> {
    ensure_non_negative(null_rate, "null_rate")?;
    let post = posterior(sample, prior)?;
    let below = post.cdf(null_rate);
    let above = post.survival(null_rate);
    if above <= 0.0 {
        return Err(InferenceError::invalid(
            "null_rate",
            format!("P(λ > {null_rate}) underflows to zero, so the odds are unbounded"),
        ));
    }
    Ok((below, below / above))
}

/// One draw of λ from the posterior.
pub fn sample_posterior<R: Rng + ?Sized>(
    sample: &PoissonSample,
    prior: &RatePrior,
    rng: &mut R,
) -> Result<f64> {
    posterior(sample, prior).map(|post| post.sample(rng))
}

/// Posterior quantiles at each probability.
pub fn quantile_table(post: &GammaPosterior, probabilities: &[f64]) -> Result<Vec<QuantileRow>> {
    probabilities
        .iter()
        .map(|&probability| -> Result<QuantileRow> {
            ensure_open_unit(probability, "probabilities")?;
            Ok(QuantileRow {
                probability,
                quantile: post.quantile(probability)?,
            })
        })
        .collect()
}
