//! Value types shared by the inference modules.
//!
//! Samples and priors validate on construction. Posteriors hold their
//! parameters plus the [`DistributionPrimitives`] used to evaluate them;
//! `with_primitives` swaps in another implementation.

use rand::Rng;
use serde::Serialize;

use crate::error::{
    ensure_finite, ensure_non_negative, ensure_open_unit, ensure_positive, InferenceError, Result,
};
use crate::primitives::{DistributionPrimitives, StandardPrimitives};

// ============================================================================
// Samples
// ============================================================================

/// Count and mean of a sample from a Normal population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleSummary {
    pub count: u64,
    pub mean: f64,
}

impl SampleSummary {
    pub fn new(count: u64, mean: f64) -> Result<Self> {
        if count == 0 {
            return Err(InferenceError::invalid("sample.count", "must be > 0"));
        }
        ensure_finite(mean, "sample.mean")?;
        Ok(Self { count, mean })
    }

    pub fn from_observations(observations: &[f64]) -> Result<Self> {
        if observations.is_empty() {
            return Err(InferenceError::invalid("observations", "need at least one value"));
        }
        let mean = observations.iter().sum::<f64>() / observations.len() as f64;
        Self::new(observations.len() as u64, mean)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        Self::new(self.count, self.mean).map(|_| ())
    }

    pub(crate) fn n(&self) -> f64 {
        self.count as f64
    }
}

/// Sample summary with an estimated standard deviation, for the
/// unknown-variance paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimatedSample {
    pub count: u64,
    pub mean: f64,
    pub std: f64,
}

impl EstimatedSample {
    pub fn new(count: u64, mean: f64, std: f64) -> Result<Self> {
        if count < 2 {
            return Err(InferenceError::invalid(
                "sample.count",
                format!("need at least 2 observations to estimate a variance, got {count}"),
            ));
        }
        ensure_finite(mean, "sample.mean")?;
        ensure_positive(std, "sample.std")?;
        Ok(Self { count, mean, std })
    }

    /// Mean and unbiased (`n - 1`) standard deviation of the observations.
    pub fn from_observations(observations: &[f64]) -> Result<Self> {
        let variance = crate::inference::normal_diff::sample_variance(observations)?;
        let mean = observations.iter().sum::<f64>() / observations.len() as f64;
        Self::new(observations.len() as u64, mean, variance.sqrt())
    }

    pub fn summary(&self) -> SampleSummary {
        SampleSummary {
            count: self.count,
            mean: self.mean,
        }
    }

    pub fn variance(&self) -> f64 {
        self.std * self.std
    }

    pub(crate) fn validate(&self) -> Result<()> {
        Self::new(self.count, self.mean, self.std).map(|_| ())
    }
}

/// Total events observed over a number of equal observation intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoissonSample {
    pub total_events: u64,
    pub intervals: u64,
}

impl PoissonSample {
    pub fn new(total_events: u64, intervals: u64) -> Result<Self> {
        if intervals == 0 {
            return Err(InferenceError::invalid("sample.intervals", "must be > 0"));
        }
        Ok(Self {
            total_events,
            intervals,
        })
    }

    pub(crate) fn validate(&self) -> Result<()> {
        Self::new(self.total_events, self.intervals).map(|_| ())
    }

    /// Sum the per-interval counts.
    pub fn from_counts(counts: &[u64]) -> Result<Self> {
        Self::new(counts.iter().sum(), counts.len() as u64)
    }
}

// ============================================================================
// Priors
// ============================================================================

/// Prior over a finite set of candidate means.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscretePrior {
    values: Vec<f64>,
    masses: Vec<f64>,
}

impl DiscretePrior {
    /// Masses need not sum to exactly one; only relative weight matters.
    pub fn new(values: Vec<f64>, masses: Vec<f64>) -> Result<Self> {
        if values.len() != masses.len() {
            return Err(InferenceError::LengthMismatch {
                values: values.len(),
                masses: masses.len(),
            });
        }
        if values.is_empty() {
            return Err(InferenceError::invalid("prior.values", "must not be empty"));
        }
        for &v in &values {
            ensure_finite(v, "prior.values")?;
        }
        for &m in &masses {
            ensure_non_negative(m, "prior.masses")?;
        }
        if masses.iter().sum::<f64>() <= 0.0 {
            return Err(InferenceError::invalid("prior.masses", "total mass must be > 0"));
        }
        Ok(Self { values, masses })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Normal prior on a mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalPrior {
    pub mean: f64,
    pub std: f64,
}

impl NormalPrior {
    pub fn new(mean: f64, std: f64) -> Result<Self> {
        ensure_finite(mean, "prior.mean")?;
        ensure_positive(std, "prior.std")?;
        Ok(Self { mean, std })
    }

    pub(crate) fn validate(&self) -> Result<()> {
        Self::new(self.mean, self.std).map(|_| ())
    }
}

/// Prior on a Normal mean with known variance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeanPrior {
    /// Flat (Jeffreys) prior.
    Flat,
    Normal { mean: f64, std: f64 },
}

impl From<NormalPrior> for MeanPrior {
    fn from(prior: NormalPrior) -> Self {
        MeanPrior::Normal {
            mean: prior.mean,
            std: prior.std,
        }
    }
}

impl MeanPrior {
    pub(crate) fn as_normal(&self) -> Result<Option<NormalPrior>> {
        match *self {
            MeanPrior::Flat => Ok(None),
            MeanPrior::Normal { mean, std } => NormalPrior::new(mean, std).map(Some),
        }
    }
}

/// Prior on a Poisson rate. All three are Gamma(shape, rate) in the limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RatePrior {
    /// Uniform on (0, ∞): Gamma(1, 0).
    Flat,
    /// Jeffreys' prior: Gamma(1/2, 0).
    Jeffreys,
    Gamma { shape: f64, rate: f64 },
}

impl RatePrior {
    /// Gamma prior summarizing a belief with the given mean and standard
    /// deviation: `r = m²/s²`, `v = m/s²`.
    pub fn from_mean_std(mean: f64, std: f64) -> Result<Self> {
        ensure_positive(mean, "prior.mean")?;
        ensure_positive(std, "prior.std")?;
        let var = std * std;
        Ok(RatePrior::Gamma {
            shape: mean * mean / var,
            rate: mean / var,
        })
    }

    /// `(shape, rate)` of the prior.
    pub fn parameters(&self) -> (f64, f64) {
        match *self {
            RatePrior::Flat => (1.0, 0.0),
            RatePrior::Jeffreys => (0.5, 0.0),
            RatePrior::Gamma { shape, rate } => (shape, rate),
        }
    }

    pub(crate) fn validate(&self) -> Result<(f64, f64)> {
        let (shape, rate) = self.parameters();
        ensure_non_negative(shape, "prior.shape")?;
        ensure_non_negative(rate, "prior.rate")?;
        Ok((shape, rate))
    }
}

// ============================================================================
// Results
// ============================================================================

/// Equal-tail credible interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CredibleInterval {
    pub low: f64,
    pub high: f64,
}

impl CredibleInterval {
    /// Rejects endpoints that overflowed or came back out of order.
    pub(crate) fn checked(low: f64, high: f64) -> Result<Self> {
        if low.is_finite() && high.is_finite() && low <= high {
            Ok(Self { low, high })
        } else {
            Err(InferenceError::invalid(
                "alpha",
                format!("interval [{low}, {high}] is not finite"),
            ))
        }
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Inclusive at both ends.
    pub fn contains(&self, x: f64) -> bool {
        self.low <= x && x <= self.high
    }
}

/// Posterior quantities behind a test decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestEvidence {
    /// `null_probability` is P(λ ≤ λ0 | data).
    OneSided { null_probability: f64, odds: f64 },
    TwoSided { interval: CredibleInterval },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestDecision {
    pub reject: bool,
    pub alpha: f64,
    pub evidence: TestEvidence,
}

// ============================================================================
// Posteriors
// ============================================================================

/// Posterior masses over the candidates of a [`DiscretePrior`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscretePosterior {
    values: Vec<f64>,
    masses: Vec<f64>,
}

impl DiscretePosterior {
    pub(crate) fn new(values: Vec<f64>, masses: Vec<f64>) -> Self {
        Self { values, masses }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// Posterior mass of a candidate value, if it is one.
    pub fn mass_of(&self, value: f64) -> Option<f64> {
        self.iter().find(|(v, _)| *v == value).map(|(_, m)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied().zip(self.masses.iter().copied())
    }

    pub fn mean(&self) -> f64 {
        self.iter().map(|(v, m)| v * m).sum()
    }

    /// Candidate with the largest mass; the first one wins a tie.
    pub fn mode(&self) -> f64 {
        let mut best = (self.values[0], self.masses[0]);
        for (v, m) in self.iter().skip(1) {
            if m > best.1 {
                best = (v, m);
            }
        }
        best.0
    }
}

/// Normal posterior N(mean, std²).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalPosterior<P = StandardPrimitives> {
    mean: f64,
    std: f64,
    #[serde(skip)]
    primitives: P,
}

impl NormalPosterior<StandardPrimitives> {
    pub fn new(mean: f64, std: f64) -> Result<Self> {
        Self::with_primitives(mean, std, StandardPrimitives)
    }
}

impl<P: DistributionPrimitives> NormalPosterior<P> {
    pub fn with_primitives(mean: f64, std: f64, primitives: P) -> Result<Self> {
        ensure_finite(mean, "posterior.mean")?;
        ensure_positive(std, "posterior.std")?;
        Ok(Self {
            mean,
            std,
            primitives,
        })
    }

    /// Same parameters, evaluated through other primitives.
    pub fn using<Q: DistributionPrimitives>(self, primitives: Q) -> NormalPosterior<Q> {
        NormalPosterior {
            mean: self.mean,
            std: self.std,
            primitives,
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std(&self) -> f64 {
        self.std
    }

    pub fn variance(&self) -> f64 {
        self.std * self.std
    }

    /// Mean and standard deviation. Skewness and excess kurtosis are zero.
    pub fn moments(&self) -> (f64, f64) {
        (self.mean, self.std)
    }

    pub fn pdf(&self, x: f64) -> f64 {
        self.primitives.normal_pdf(x, self.mean, self.std)
    }

    pub fn cdf(&self, x: f64) -> f64 {
        self.primitives.normal_cdf(x, self.mean, self.std)
    }

    pub fn quantile(&self, p: f64) -> Result<f64> {
        ensure_open_unit(p, "p")?;
        Ok(self.primitives.normal_quantile(p, self.mean, self.std))
    }

    pub fn credible_interval(&self, alpha: f64) -> Result<CredibleInterval> {
        ensure_open_unit(alpha, "alpha")?;
        // Upper end by reflection; 1 - α/2 rounds to one once α < ε.
        let low = self.primitives.normal_quantile(alpha / 2.0, self.mean, self.std);
        CredibleInterval::checked(low, self.mean + (self.mean - low))
    }
}

/// Location-scale Student-t posterior: `location + scale · T(df)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentPosterior<P = StandardPrimitives> {
    location: f64,
    scale: f64,
    df: f64,
    #[serde(skip)]
    primitives: P,
}

impl StudentPosterior<StandardPrimitives> {
    pub fn new(location: f64, scale: f64, df: f64) -> Result<Self> {
        Self::with_primitives(location, scale, df, StandardPrimitives)
    }
}

impl<P: DistributionPrimitives> StudentPosterior<P> {
    pub fn with_primitives(location: f64, scale: f64, df: f64, primitives: P) -> Result<Self> {
        ensure_finite(location, "posterior.location")?;
        ensure_positive(scale, "posterior.scale")?;
        ensure_positive(df, "posterior.df")?;
        Ok(Self {
            location,
            scale,
            df,
            primitives,
        })
    }

    pub fn using<Q: DistributionPrimitives>(self, primitives: Q) -> StudentPosterior<Q> {
        StudentPosterior {
            location: self.location,
            scale: self.scale,
            df: self.df,
            primitives,
        }
    }

    pub fn location(&self) -> f64 {
        self.location
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn df(&self) -> f64 {
        self.df
    }

    pub fn quantile(&self, p: f64) -> Result<f64> {
        ensure_open_unit(p, "p")?;
        Ok(self.location + self.primitives.student_t_quantile(p, self.df) * self.scale)
    }

    pub fn credible_interval(&self, alpha: f64) -> Result<CredibleInterval> {
        ensure_open_unit(alpha, "alpha")?;
        let half_width = -self.primitives.student_t_quantile(alpha / 2.0, self.df) * self.scale;
        CredibleInterval::checked(self.location - half_width, self.location + half_width)
    }
}

/// Gamma posterior on a rate, in shape/rate form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GammaPosterior<P = StandardPrimitives> {
    shape: f64,
    rate: f64,
    #[serde(skip)]
    primitives: P,
}

impl GammaPosterior<StandardPrimitives> {
    pub fn new(shape: f64, rate: f64) -> Result<Self> {
        Self::with_primitives(shape, rate, StandardPrimitives)
    }
}

impl<P: DistributionPrimitives> GammaPosterior<P> {
    pub fn with_primitives(shape: f64, rate: f64, primitives: P) -> Result<Self> {
        ensure_positive(shape, "posterior.shape")?;
        ensure_positive(rate, "posterior.rate")?;
        Ok(Self {
            shape,
            rate,
            primitives,
        })
    }

    pub fn using<Q: DistributionPrimitives>(self, primitives: Q) -> GammaPosterior<Q> {
        GammaPosterior {
            shape: self.shape,
            rate: self.rate,
            primitives,
        }
    }

    pub fn shape(&self) -> f64 {
        self.shape
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Scale handed to the primitives. The only rate-to-scale conversion.
    pub fn scale(&self) -> f64 {
        self.rate.recip()
    }

    pub fn mean(&self) -> f64 {
        self.shape / self.rate
    }

    pub fn variance(&self) -> f64 {
        self.shape / (self.rate * self.rate)
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn pdf(&self, x: f64) -> f64 {
        self.primitives.gamma_pdf(x, self.shape, self.scale())
    }

    pub fn cdf(&self, x: f64) -> f64 {
        self.primitives.gamma_cdf(x, self.shape, self.scale())
    }

    pub fn quantile(&self, p: f64) -> Result<f64> {
        ensure_open_unit(p, "p")?;
        Ok(self.primitives.gamma_quantile(p, self.shape, self.scale()))
    }

    /// P(λ > x), accurate far into the upper tail.
    pub fn survival(&self, x: f64) -> f64 {
        self.primitives.gamma_survival(x, self.shape, self.scale())
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.primitives.gamma_sample(self.shape, self.scale(), rng)
    }

    pub fn credible_interval(&self, alpha: f64) -> Result<CredibleInterval> {
        ensure_open_unit(alpha, "alpha")?;
        CredibleInterval::checked(
            self.primitives.gamma_quantile(alpha / 2.0, self.shape, self.scale()),
            self.primitives.gamma_upper_quantile(alpha / 2.0, self.shape, self.scale()),
        )
    }

    pub fn interquartile_range(&self) -> f64 {
        let q1 = self.primitives.gamma_quantile(0.25, self.shape, self.scale());
        let q3 = self.primitives.gamma_quantile(0.75, self.shape, self.scale());
        q3 - q1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    /// Primitives that answer every quantile with a fixed z, so interval
    /// arithmetic can be checked exactly.
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct FixedZ(f64);

    impl DistributionPrimitives for FixedZ {
        fn std_normal_pdf(&self, _z: f64) -> f64 {
            0.0
        }
        fn normal_cdf(&self, _x: f64, _mean: f64, _std: f64) -> f64 {
            0.5
        }
        fn normal_quantile(&self, p: f64, mean: f64, std: f64) -> f64 {
            let z = if p < 0.5 { -self.0 } else { self.0 };
            mean + z * std
        }
        fn gamma_pdf(&self, _x: f64, _shape: f64, _scale: f64) -> f64 {
            0.0
        }
        fn gamma_cdf(&self, _x: f64, _shape: f64, _scale: f64) -> f64 {
            0.0
        }
        fn gamma_quantile(&self, p: f64, shape: f64, scale: f64) -> f64 {
            p * shape * scale
        }
        fn gamma_sample<R: Rng + ?Sized>(&self, shape: f64, scale: f64, _rng: &mut R) -> f64 {
            shape * scale
        }
        fn student_t_quantile(&self, p: f64, _df: f64) -> f64 {
            if p < 0.5 {
                -self.0
            } else {
                self.0
            }
        }
    }

    // ==== samples and priors ====

    #[test]
    fn sample_summary_from_observations() {
        let s = SampleSummary::from_observations(&[1.52, 0.02, 3.35, 3.49, 1.82]).unwrap();
        assert_eq!(s.count, 5);
        assert!(approx_eq(s.mean, 2.04, 1e-12));
        assert!(SampleSummary::from_observations(&[]).is_err());
        assert!(SampleSummary::new(0, 1.0).is_err());
        assert!(SampleSummary::new(3, f64::NAN).is_err());
    }

    #[test]
    fn estimated_sample_needs_two_points() {
        assert!(EstimatedSample::from_observations(&[1.0]).is_err());
        let e = EstimatedSample::from_observations(&[1.0, 3.0]).unwrap();
        assert_eq!(e.count, 2);
        assert!(approx_eq(e.mean, 2.0, 1e-15));
        assert!(approx_eq(e.variance(), 2.0, 1e-12));
        assert_eq!(e.summary().count, 2);
    }

    #[test]
    fn constant_observations_have_no_usable_std() {
        let err = EstimatedSample::from_observations(&[4.0, 4.0, 4.0]).unwrap_err();
        assert_eq!(err.field(), "sample.std");
    }

    #[test]
    fn poisson_sample_validation() {
        assert!(PoissonSample::new(0, 0).is_err());
        let s = PoissonSample::from_counts(&[2, 0, 3, 5]).unwrap();
        assert_eq!(s.total_events, 10);
        assert_eq!(s.intervals, 4);
        assert!(PoissonSample::from_counts(&[]).is_err());
    }

    #[test]
    fn discrete_prior_validation() {
        let err = DiscretePrior::new(vec![1.0, 2.0], vec![0.5]).unwrap_err();
        assert_eq!(err, InferenceError::LengthMismatch { values: 2, masses: 1 });
        assert!(DiscretePrior::new(vec![], vec![]).is_err());
        assert!(DiscretePrior::new(vec![1.0], vec![-0.1]).is_err());
        assert!(DiscretePrior::new(vec![1.0, 2.0], vec![0.0, 0.0]).is_err());
        assert!(DiscretePrior::new(vec![f64::INFINITY], vec![1.0]).is_err());
        let ok = DiscretePrior::new(vec![1.0, 2.0], vec![1.0, 3.0]).unwrap();
        assert_eq!(ok.len(), 2);
    }

    #[test]
    fn rate_prior_parameters() {
        assert_eq!(RatePrior::Flat.parameters(), (1.0, 0.0));
        assert_eq!(RatePrior::Jeffreys.parameters(), (0.5, 0.0));
        assert_eq!(
            RatePrior::Gamma { shape: 2.0, rate: 3.0 }.parameters(),
            (2.0, 3.0)
        );
        assert!(RatePrior::Gamma { shape: -1.0, rate: 0.0 }.validate().is_err());
        assert!(RatePrior::Gamma { shape: 1.0, rate: f64::NAN }.validate().is_err());
    }

    #[test]
    fn rate_prior_from_mean_and_std() {
        // mean 2, std 1 -> r = 4, v = 2; Gamma(4, 2) has mean 2 and variance 1.
        let prior = RatePrior::from_mean_std(2.0, 1.0).unwrap();
        assert_eq!(prior.parameters(), (4.0, 2.0));
        assert!(RatePrior::from_mean_std(0.0, 1.0).is_err());
    }

    // ==== posteriors ====

    #[test]
    fn discrete_posterior_accessors() {
        let post = DiscretePosterior::new(vec![1.0, 2.0, 3.0], vec![0.2, 0.5, 0.3]);
        assert_eq!(post.mass_of(2.0), Some(0.5));
        assert_eq!(post.mass_of(2.5), None);
        assert!(approx_eq(post.mean(), 2.1, 1e-12));
        assert_eq!(post.mode(), 2.0);
        assert_eq!(post.iter().count(), 3);
    }

    #[test]
    fn normal_posterior_interval_through_stub() {
        let post = NormalPosterior::new(1.0, 2.0).unwrap().using(FixedZ(2.0));
        let ci = post.credible_interval(0.05).unwrap();
        assert_eq!(ci, CredibleInterval { low: -3.0, high: 5.0 });
        assert_eq!(post.quantile(0.9).unwrap(), 5.0);
    }

    #[test]
    fn normal_posterior_rejects_degenerate_inputs() {
        assert!(NormalPosterior::new(0.0, 0.0).is_err());
        let post = NormalPosterior::new(0.0, 1.0).unwrap();
        assert!(post.quantile(0.0).is_err());
        assert!(post.quantile(1.0).is_err());
        assert!(post.credible_interval(1.0).is_err());
    }

    #[test]
    fn normal_posterior_standard_values() {
        let post = NormalPosterior::new(0.0, 1.0).unwrap();
        let ci = post.credible_interval(0.05).unwrap();
        assert!(approx_eq(ci.high, 1.959_963_984_540_054, 1e-9));
        assert!(approx_eq(ci.low, -ci.high, 1e-12));
        assert!(approx_eq(post.cdf(0.0), 0.5, 1e-15));
        assert!(approx_eq(post.pdf(0.0), 0.398_942_280_401_432_7, 1e-15));
    }

    #[test]
    fn student_posterior_is_symmetric_about_location() {
        let post = StudentPosterior::new(3.0, 0.5, 27.0).unwrap();
        let ci = post.credible_interval(0.05).unwrap();
        assert!(approx_eq(ci.high - 3.0, 3.0 - ci.low, 1e-12));
        assert!(approx_eq(ci.high, 3.0 + 2.051_830_516_480_283 * 0.5, 1e-8));
        assert!(post.quantile(0.025).unwrap() < post.quantile(0.975).unwrap());

        let stub = post.using(FixedZ(1.0));
        assert_eq!(stub.quantile(0.1).unwrap(), 2.5);
    }

    #[test]
    fn intervals_below_machine_epsilon_stay_finite() {
        let alpha = 1e-17;

        let normal = NormalPosterior::new(0.0, 1.0).unwrap();
        let ci = normal.credible_interval(alpha).unwrap();
        assert!(ci.low.is_finite() && ci.high.is_finite());
        assert_eq!(ci.high, -ci.low);
        // Φ⁻¹(5e-18) ≈ -8.57
        assert!(ci.high > 8.0 && ci.high < 9.0, "{ci:?}");
        let ci = normal.credible_interval(1e-20).unwrap();
        assert!(ci.high.is_finite() && ci.high > 9.0);

        let student = StudentPosterior::new(0.0, 1.0, 5.0).unwrap();
        let ci = student.credible_interval(alpha).unwrap();
        assert!(ci.low.is_finite() && ci.high.is_finite());
        assert_eq!(ci.high, -ci.low);
        assert!(ci.high > 100.0);

        let gamma = GammaPosterior::new(11.0, 5.0).unwrap();
        let ci = gamma.credible_interval(alpha).unwrap();
        assert!(ci.high.is_finite(), "{ci:?}");
        assert!(ci.low > 0.0 && ci.low < ci.high);
        assert!(approx_eq(gamma.survival(ci.high) / 5e-18, 1.0, 1e-7));
    }

    #[test]
    fn checked_interval_rejects_non_finite_endpoints() {
        assert!(CredibleInterval::checked(0.0, f64::INFINITY).is_err());
        assert!(CredibleInterval::checked(f64::NAN, 1.0).is_err());
        assert!(CredibleInterval::checked(2.0, 1.0).is_err());
        let err = CredibleInterval::checked(f64::NEG_INFINITY, 0.0).unwrap_err();
        assert_eq!(err.field(), "alpha");
        assert!(CredibleInterval::checked(1.0, 1.0).is_ok());
    }

    #[test]
    fn gamma_posterior_moments_and_scale() {
        let post = GammaPosterior::new(11.0, 5.0).unwrap();
        assert!(approx_eq(post.mean(), 2.2, 1e-15));
        assert!(approx_eq(post.variance(), 0.44, 1e-15));
        assert!(approx_eq(post.scale(), 0.2, 1e-15));
        assert!(GammaPosterior::new(0.0, 1.0).is_err());
        assert!(GammaPosterior::new(1.0, 0.0).is_err());
    }

    #[test]
    fn gamma_posterior_passes_scale_to_primitives() {
        let post = GammaPosterior::new(10.0, 4.0).unwrap().using(FixedZ(0.0));
        // The stub returns p · shape · scale.
        assert!(approx_eq(post.quantile(0.5).unwrap(), 1.25, 1e-15));
        assert!(approx_eq(post.interquartile_range(), 1.25, 1e-15));
        let mut rng = rand::rng();
        assert!(approx_eq(post.sample(&mut rng), 2.5, 1e-15));
    }

    #[test]
    fn interval_helpers() {
        let ci = CredibleInterval { low: 1.0, high: 3.5 };
        assert_eq!(ci.width(), 2.5);
        assert!(ci.contains(1.0));
        assert!(ci.contains(3.5));
        assert!(!ci.contains(3.6));
    }

    #[test]
    fn serializes_for_output() {
        let post = GammaPosterior::new(2.0, 1.0).unwrap();
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["shape"], 2.0);
        assert_eq!(json["rate"], 1.0);
        assert!(json.get("primitives").is_none());

        let prior = serde_json::to_value(RatePrior::Jeffreys).unwrap();
        assert_eq!(prior["kind"], "jeffreys");

        let evidence = TestEvidence::OneSided {
            null_probability: 0.01,
            odds: 0.0101,
        };
        assert_eq!(serde_json::to_value(evidence).unwrap()["kind"], "one_sided");
    }
}
