//! Distribution primitives used by the posterior types.
//!
//! The engine never calls `cb-math` directly. Every density, CDF, quantile
//! and variate goes through [`DistributionPrimitives`], so a posterior can be
//! evaluated against a deterministic stub in tests.
//!
//! Gamma methods at this boundary are **scale**-parametrized. The engine
//! works with rates and converts in `GammaPosterior::scale` only.

use rand::Rng;

/// Normal, Gamma and Student-t primitives needed by the inference engine.
pub trait DistributionPrimitives: Send + Sync {
    /// Standard normal density φ(z).
    fn std_normal_pdf(&self, z: f64) -> f64;

    /// Density of N(mean, std²) at x.
    fn normal_pdf(&self, x: f64, mean: f64, std: f64) -> f64 {
        if std.is_nan() || std <= 0.0 {
            return f64::NAN;
        }
        self.std_normal_pdf((x - mean) / std) / std
    }

    fn normal_cdf(&self, x: f64, mean: f64, std: f64) -> f64;

    fn normal_quantile(&self, p: f64, mean: f64, std: f64) -> f64;

    fn gamma_pdf(&self, x: f64, shape: f64, scale: f64) -> f64;

    fn gamma_cdf(&self, x: f64, shape: f64, scale: f64) -> f64;

    fn gamma_quantile(&self, p: f64, shape: f64, scale: f64) -> f64;

    /// P(X > x). Implementations should avoid the cancellation in `1 - cdf`.
    fn gamma_survival(&self, x: f64, shape: f64, scale: f64) -> f64 {
        1.0 - self.gamma_cdf(x, shape, scale)
    }

    /// The x with P(X > x) = q.
    fn gamma_upper_quantile(&self, q: f64, shape: f64, scale: f64) -> f64 {
        self.gamma_quantile(1.0 - q, shape, scale)
    }

    /// Draw one Gamma(shape, scale) variate from `rng`.
    fn gamma_sample<R: Rng + ?Sized>(&self, shape: f64, scale: f64, rng: &mut R) -> f64;

    /// Quantile of the standard Student-t with `df` degrees of freedom.
    fn student_t_quantile(&self, p: f64, df: f64) -> f64;
}

/// Primitives backed by `cb-math`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardPrimitives;

impl DistributionPrimitives for StandardPrimitives {
    fn std_normal_pdf(&self, z: f64) -> f64 {
        cb_math::std_normal_pdf(z)
    }

    fn normal_pdf(&self, x: f64, mean: f64, std: f64) -> f64 {
        cb_math::normal_pdf(x, mean, std)
    }

    fn normal_cdf(&self, x: f64, mean: f64, std: f64) -> f64 {
        cb_math::normal_cdf(x, mean, std)
    }

    fn normal_quantile(&self, p: f64, mean: f64, std: f64) -> f64 {
        cb_math::normal_quantile(p, mean, std)
    }

    fn gamma_pdf(&self, x: f64, shape: f64, scale: f64) -> f64 {
        cb_math::gamma_pdf(x, shape, scale.recip())
    }

    fn gamma_cdf(&self, x: f64, shape: f64, scale: f64) -> f64 {
        cb_math::gamma_cdf(x, shape, scale.recip())
    }

    fn gamma_quantile(&self, p: f64, shape: f64, scale: f64) -> f64 {
        cb_math::gamma_quantile(p, shape, scale.recip())
    }

    fn gamma_survival(&self, x: f64, shape: f64, scale: f64) -> f64 {
        cb_math::gamma_survival(x, shape, scale.recip())
    }

    fn gamma_upper_quantile(&self, q: f64, shape: f64, scale: f64) -> f64 {
        cb_math::gamma_upper_quantile(q, shape, scale.recip())
    }

    fn gamma_sample<R: Rng + ?Sized>(&self, shape: f64, scale: f64, rng: &mut R) -> f64 {
        if !(shape.is_finite() && scale.is_finite()) || shape <= 0.0 || scale <= 0.0 {
            return f64::NAN;
        }
        marsaglia_tsang(shape, rng) * scale
    }

    fn student_t_quantile(&self, p: f64, df: f64) -> f64 {
        cb_math::student_t_quantile(p, df)
    }
}

/// Gamma(shape, 1) variate by Marsaglia & Tsang (2000).
///
/// Shapes below one are boosted to `shape + 1` and scaled back by `U^(1/shape)`.
fn marsaglia_tsang<R: Rng + ?Sized>(shape: f64, rng: &mut R) -> f64 {
    if shape < 1.0 {
        let u = open_unit(rng);
        return marsaglia_tsang(shape + 1.0, rng) * u.powf(shape.recip());
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let x = standard_normal(rng);
        let v = 1.0 + c * x;
        if v <= 0.0 {
            continue;
        }
        let v = v * v * v;
        let u = open_unit(rng);
        let x2 = x * x;
        if u < 1.0 - 0.0331 * x2 * x2 || u.ln() < 0.5 * x2 + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}

/// Box-Muller standard normal draw.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1 = open_unit(rng);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Uniform draw on (0, 1].
fn open_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    1.0 - rng.random::<f64>()
}
