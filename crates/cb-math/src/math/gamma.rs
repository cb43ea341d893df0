//! Gamma distribution utilities for Poisson-rate posteriors.
//!
//! Provides PDF, CDF, survival, and quantile functions for the Gamma
//! distribution. Uses the regularized incomplete gamma function with
//! series/continued-fraction approximations for numerical stability.
//!
//! # Parameterization
//!
//! Uses **rate parameterization**: `Gamma(α, β)` where:
//! - `α` = shape parameter (α > 0)
//! - `β` = rate parameter (β > 0)
//!
//! The density is: `f(t) = β^α / Γ(α) * t^(α-1) * e^(-βt)`
//!
//! This is equivalent to scale parameterization with `θ = 1/β`.

use super::normal::std_normal_quantile;
use super::stable::{invert_cdf, log_gamma};

// Constants for incomplete gamma computation
const GAMMAINC_MAX_ITERS: usize = 500;
const GAMMAINC_EPS: f64 = 3.0e-15;
const GAMMAINC_FPMIN: f64 = 1.0e-300;

/// Log of the Gamma distribution PDF at t.
///
/// # Arguments
/// * `t` - The value at which to evaluate (t >= 0)
/// * `alpha` - Shape parameter (α > 0)
/// * `beta` - Rate parameter (β > 0)
pub fn gamma_log_pdf(t: f64, alpha: f64, beta: f64) -> f64 {
    if t.is_nan() || alpha.is_nan() || beta.is_nan() {
        return f64::NAN;
    }
    if alpha <= 0.0 || beta <= 0.0 {
        return f64::NAN;
    }
    if t < 0.0 {
        return f64::NEG_INFINITY;
    }

    if t == 0.0 {
        if alpha < 1.0 {
            // Density diverges to +∞
            return f64::INFINITY;
        } else if alpha == 1.0 {
            // Exponential case: f(0) = β
            return beta.ln();
        } else {
            return f64::NEG_INFINITY;
        }
    }

    // log f(t) = α*log(β) - log(Γ(α)) + (α-1)*log(t) - β*t
    alpha * beta.ln() - log_gamma(alpha) + (alpha - 1.0) * t.ln() - beta * t
}

/// Gamma distribution PDF at t.
pub fn gamma_pdf(t: f64, alpha: f64, beta: f64) -> f64 {
    let log_pdf = gamma_log_pdf(t, alpha, beta);
    if log_pdf.is_nan() {
        return f64::NAN;
    }
    if log_pdf == f64::INFINITY {
        return f64::INFINITY;
    }
    if log_pdf == f64::NEG_INFINITY {
        return 0.0;
    }
    log_pdf.exp()
}

/// Regularized lower incomplete gamma function P(a, x).
///
/// P(a, x) = γ(a, x) / Γ(a), the CDF of Gamma(a, 1) evaluated at x.
pub fn gamma_p(a: f64, x: f64) -> f64 {
    if a.is_nan() || x.is_nan() || a <= 0.0 || x < 0.0 {
        return f64::NAN;
    }
    if x == 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return 1.0;
    }

    if x < a + 1.0 {
        gammainc_series(a, x)
    } else {
        1.0 - gammainc_cf(a, x)
    }
}

/// Regularized upper incomplete gamma function Q(a, x) = 1 - P(a, x).
pub fn gamma_q(a: f64, x: f64) -> f64 {
    if a.is_nan() || x.is_nan() || a <= 0.0 || x < 0.0 {
        return f64::NAN;
    }
    if x == 0.0 {
        return 1.0;
    }
    if x.is_infinite() {
        return 0.0;
    }

    if x < a + 1.0 {
        1.0 - gammainc_series(a, x)
    } else {
        gammainc_cf(a, x)
    }
}

/// Series expansion for P(a, x) when x < a+1.
///
/// P(a, x) = e^(-x) * x^a * Σ_{n=0}^∞ x^n / Γ(a+n+1)
fn gammainc_series(a: f64, x: f64) -> f64 {
    let log_prefactor = a * x.ln() - x - log_gamma(a);

    let mut term = 1.0 / a;
    let mut sum = term;
    for n in 1..=GAMMAINC_MAX_ITERS {
        term *= x / (a + n as f64);
        sum += term;
        if term.abs() < GAMMAINC_EPS * sum.abs() {
            break;
        }
    }

    (log_prefactor.exp() * sum).clamp(0.0, 1.0)
}

/// Continued fraction for Q(a, x) when x >= a+1.
///
/// Uses modified Lentz's algorithm (Numerical Recipes).
fn gammainc_cf(a: f64, x: f64) -> f64 {
    let log_prefactor = a * x.ln() - x - log_gamma(a);

    let mut b = x - a + 1.0;
    let mut c = 1.0 / GAMMAINC_FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;

    for i in 1..=GAMMAINC_MAX_ITERS {
        let ai = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = ai * d + b;
        if d.abs() < GAMMAINC_FPMIN {
            d = GAMMAINC_FPMIN;
        }
        c = b + ai / c;
        if c.abs() < GAMMAINC_FPMIN {
            c = GAMMAINC_FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < GAMMAINC_EPS {
            break;
        }
    }

    (log_prefactor.exp() * h).clamp(0.0, 1.0)
}

/// CDF of the Gamma distribution, P(T <= t) where T ~ Gamma(α, β).
pub fn gamma_cdf(t: f64, alpha: f64, beta: f64) -> f64 {
    if t.is_nan() || alpha.is_nan() || beta.is_nan() {
        return f64::NAN;
    }
    if alpha <= 0.0 || beta <= 0.0 {
        return f64::NAN;
    }
    if t <= 0.0 {
        return 0.0;
    }
    if t.is_infinite() {
        return 1.0;
    }
    gamma_p(alpha, beta * t)
}

/// Survival function S(t) = P(T > t).
pub fn gamma_survival(t: f64, alpha: f64, beta: f64) -> f64 {
    if t.is_nan() || alpha.is_nan() || beta.is_nan() {
        return f64::NAN;
    }
    if alpha <= 0.0 || beta <= 0.0 {
        return f64::NAN;
    }
    if t <= 0.0 {
        return 1.0;
    }
    if t.is_infinite() {
        return 0.0;
    }
    gamma_q(alpha, beta * t)
}

/// Quantile (inverse CDF) of Gamma(α, β).
///
/// Solves in standard units (β = 1) starting from the Wilson-Hilferty
/// cube-root approximation, then rescales by 1/β. Returns 0 at p = 0 and
/// +∞ at p = 1.
pub fn gamma_quantile(p: f64, alpha: f64, beta: f64) -> f64 {
    if p.is_nan() || alpha.is_nan() || beta.is_nan() {
        return f64::NAN;
    }
    if alpha <= 0.0 || beta <= 0.0 || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return 0.0;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let guess = initial_standard_quantile(p, alpha);

    let mut hi = guess.max(1.0) * 2.0;
    while gamma_p(alpha, hi) < p && hi < f64::MAX / 4.0 {
        hi *= 2.0;
    }

    let x = invert_cdf(
        |x| gamma_p(alpha, x),
        |x| gamma_pdf(x, alpha, 1.0),
        p,
        guess,
        0.0,
        hi,
    );
    x / beta
}

/// Upper-tail quantile of Gamma(α, β): the t with S(t) = q.
///
/// Solves on the survival function, so q below machine epsilon still gives
/// a finite answer where `gamma_quantile(1 - q)` would round to +∞.
pub fn gamma_upper_quantile(q: f64, alpha: f64, beta: f64) -> f64 {
    if q.is_nan() || alpha.is_nan() || beta.is_nan() {
        return f64::NAN;
    }
    if alpha <= 0.0 || beta <= 0.0 || !(0.0..=1.0).contains(&q) {
        return f64::NAN;
    }
    if q == 0.0 {
        return f64::INFINITY;
    }
    if q == 1.0 {
        return 0.0;
    }

    // Wilson-Hilferty with the upper-tail z.
    let z = -std_normal_quantile(q);
    let c = 1.0 / (9.0 * alpha);
    let cube = 1.0 - c + z * c.sqrt();
    let guess = if cube > 0.0 { alpha * cube * cube * cube } else { alpha };

    let mut hi = guess.max(1.0) * 2.0;
    while gamma_q(alpha, hi) > q && hi < f64::MAX / 4.0 {
        hi *= 2.0;
    }

    // -Q(a, x) is increasing with derivative equal to the density.
    let x = invert_cdf(
        |x| -gamma_q(alpha, x),
        |x| gamma_pdf(x, alpha, 1.0),
        -q,
        guess,
        0.0,
        hi,
    );
    x / beta
}

fn initial_standard_quantile(p: f64, alpha: f64) -> f64 {
    let z = std_normal_quantile(p);
    let c = 1.0 / (9.0 * alpha);
    let cube = 1.0 - c + z * c.sqrt();
    if alpha >= 1.0 && cube > 0.0 {
        return alpha * cube * cube * cube;
    }
    // Small-x expansion P(a, x) ≈ x^a / (a Γ(a)).
    ((p.ln() + alpha.ln() + log_gamma(alpha)) / alpha).exp()
}

/// Mean of Gamma(α, β): E[T] = α / β.
pub fn gamma_mean(alpha: f64, beta: f64) -> f64 {
    if alpha.is_nan() || beta.is_nan() || alpha <= 0.0 || beta <= 0.0 {
        return f64::NAN;
    }
    alpha / beta
}

/// Variance of Gamma(α, β): Var[T] = α / β².
pub fn gamma_var(alpha: f64, beta: f64) -> f64 {
    if alpha.is_nan() || beta.is_nan() || alpha <= 0.0 || beta <= 0.0 {
        return f64::NAN;
    }
    alpha / (beta * beta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        if a.is_infinite() && b.is_infinite() {
            return a.is_sign_positive() == b.is_sign_positive();
        }
        (a - b).abs() <= tol
    }

    fn rel_eq(a: f64, b: f64, rel_tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        let diff = (a - b).abs();
        let max_ab = a.abs().max(b.abs());
        if max_ab == 0.0 {
            return diff == 0.0;
        }
        diff / max_ab <= rel_tol
    }

    // ==================== Exponential special case tests ====================
    // Gamma(1, β) = Exponential(rate=β)

    #[test]
    fn exponential_cdf_matches_gamma_1_beta() {
        let beta: f64 = 2.0;
        let t: f64 = 0.5;
        let expected = 1.0 - (-beta * t).exp();
        assert!(approx_eq(gamma_cdf(t, 1.0, beta), expected, 1e-12));
    }

    #[test]
    fn exponential_quantile_closed_form() {
        // Exp(β) quantile: -ln(1-p)/β
        let beta = 0.5;
        for p in [0.01, 0.25, 0.5, 0.9, 0.999] {
            let expected = -(1.0 - p as f64).ln() / beta;
            let q = gamma_quantile(p, 1.0, beta);
            assert!(rel_eq(q, expected, 1e-10), "p={p}: got {q}, expected {expected}");
        }
    }

    // ==================== Golden value tests ====================

    #[test]
    fn gamma_pdf_known_values() {
        // Gamma(2, 1) at t=1: e^(-1)
        assert!(approx_eq(gamma_pdf(1.0, 2.0, 1.0), (-1.0f64).exp(), 1e-10));

        // Gamma(3, 2) at t=0.5: 8/2 * 0.25 * e^(-1) = e^(-1)
        assert!(approx_eq(gamma_pdf(0.5, 3.0, 2.0), (-1.0f64).exp(), 1e-10));
    }

    #[test]
    fn gamma_cdf_known_values() {
        // P(2, 2) = 1 - 3e^(-2)
        let expected = 1.0 - 3.0 * (-2.0f64).exp();
        assert!(approx_eq(gamma_cdf(2.0, 2.0, 1.0), expected, 1e-12));
    }

    #[test]
    fn chi_square_reference_quantiles() {
        // χ²(k) = Gamma(k/2, 1/2); table values for k = 10.
        assert!(approx_eq(gamma_quantile(0.95, 5.0, 0.5), 18.307_038, 1e-5));
        assert!(approx_eq(gamma_quantile(0.05, 5.0, 0.5), 3.940_299, 1e-5));
    }

    #[test]
    fn quantile_inverts_cdf() {
        for &(alpha, beta) in &[(0.5, 1.0), (1.5, 3.0), (11.0, 5.0), (250.0, 40.0)] {
            for p in [1e-6, 0.005, 0.25, 0.5, 0.75, 0.995] {
                let x = gamma_quantile(p, alpha, beta);
                let back = gamma_cdf(x, alpha, beta);
                assert!(
                    approx_eq(back, p, 1e-10),
                    "Gamma({alpha},{beta}) p={p}: quantile {x} maps back to {back}"
                );
            }
        }
    }

    #[test]
    fn quantile_boundaries() {
        assert_eq!(gamma_quantile(0.0, 2.0, 1.0), 0.0);
        assert!(gamma_quantile(1.0, 2.0, 1.0).is_infinite());
        assert!(gamma_quantile(1.5, 2.0, 1.0).is_nan());
        assert!(gamma_quantile(0.5, 0.0, 1.0).is_nan());
    }

    #[test]
    fn upper_quantile_agrees_with_lower_in_the_body() {
        for &(alpha, beta) in &[(0.5, 1.0), (11.0, 5.0), (250.0, 40.0)] {
            for q in [0.005, 0.25, 0.5, 0.9] {
                let upper = gamma_upper_quantile(q, alpha, beta);
                let lower = gamma_quantile(1.0 - q, alpha, beta);
                assert!(rel_eq(upper, lower, 1e-9), "Gamma({alpha},{beta}) q={q}");
            }
        }
    }

    #[test]
    fn upper_quantile_is_finite_below_epsilon() {
        // Exp(β) survival e^(-βt) inverts to -ln(q)/β.
        let q = 1e-17;
        let t = gamma_upper_quantile(q, 1.0, 0.5);
        assert!(rel_eq(t, -q.ln() / 0.5, 1e-10), "got {t}");
        // 1 - q rounds to one, so the lower-tail inverse cannot see it.
        assert!(gamma_quantile(1.0 - q, 1.0, 0.5).is_infinite());

        let x = gamma_upper_quantile(5e-18, 11.0, 5.0);
        assert!(x.is_finite());
        assert!(rel_eq(gamma_survival(x, 11.0, 5.0), 5e-18, 1e-8));
    }

    #[test]
    fn upper_quantile_boundaries() {
        assert!(gamma_upper_quantile(0.0, 2.0, 1.0).is_infinite());
        assert_eq!(gamma_upper_quantile(1.0, 2.0, 1.0), 0.0);
        assert!(gamma_upper_quantile(-0.1, 2.0, 1.0).is_nan());
        assert!(gamma_upper_quantile(0.5, 2.0, 0.0).is_nan());
    }

    #[test]
    fn survival_decreasing_in_t() {
        let mut prev = 1.0;
        for t in [0.1, 0.5, 1.0, 2.0, 5.0, 10.0] {
            let s = gamma_survival(t, 2.5, 1.0);
            assert!(s < prev, "S({t}) = {s} >= {prev}");
            prev = s;
        }
    }

    #[test]
    fn alpha_lt_1_density_diverges_at_zero() {
        let log_pdf_0 = gamma_log_pdf(0.0, 0.5, 1.0);
        assert!(log_pdf_0.is_infinite() && log_pdf_0.is_sign_positive());
    }

    #[test]
    fn invalid_params_return_nan() {
        assert!(gamma_log_pdf(1.0, -1.0, 1.0).is_nan());
        assert!(gamma_cdf(1.0, -1.0, 1.0).is_nan());
        assert!(gamma_log_pdf(1.0, 0.0, 1.0).is_nan());
        assert!(gamma_survival(1.0, 1.0, -1.0).is_nan());
        assert!(gamma_cdf(1.0, 1.0, 0.0).is_nan());
    }

    #[test]
    fn negative_t_returns_boundary_values() {
        assert!(approx_eq(gamma_pdf(-1.0, 2.0, 1.0), 0.0, 1e-12));
        assert!(approx_eq(gamma_cdf(-1.0, 2.0, 1.0), 0.0, 1e-12));
        assert!(approx_eq(gamma_survival(-1.0, 2.0, 1.0), 1.0, 1e-12));
    }

    #[test]
    fn mean_and_variance_formulas() {
        assert!(approx_eq(gamma_mean(3.0, 2.0), 1.5, 1e-12));
        assert!(approx_eq(gamma_var(3.0, 2.0), 0.75, 1e-12));
    }

    #[test]
    fn gamma_q_complements_p() {
        let p = gamma_p(2.5, 1.5);
        let q = gamma_q(2.5, 1.5);
        assert!(approx_eq(p + q, 1.0, 1e-12));
    }

    #[test]
    fn gamma_p_boundary_values() {
        assert!(approx_eq(gamma_p(2.0, 0.0), 0.0, 1e-12));
        assert!(approx_eq(gamma_p(2.0, f64::INFINITY), 1.0, 1e-12));
        assert!(approx_eq(gamma_q(2.0, 0.0), 1.0, 1e-12));
        assert!(approx_eq(gamma_q(2.0, f64::INFINITY), 0.0, 1e-12));
    }

    #[test]
    fn nan_propagates() {
        assert!(gamma_log_pdf(f64::NAN, 1.0, 1.0).is_nan());
        assert!(gamma_cdf(f64::NAN, 1.0, 1.0).is_nan());
        assert!(gamma_quantile(f64::NAN, 1.0, 1.0).is_nan());
    }
}
