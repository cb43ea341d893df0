//! Student-t distribution utilities.
//!
//! Standard (location 0, scale 1) Student-t with `df` degrees of freedom.
//! The CDF goes through the incomplete beta function; the quantile is the
//! Cornish-Fisher expansion around the normal quantile, polished by
//! safeguarded Newton iteration on the smaller tail and mirrored by sign.

use std::f64::consts::PI;

use super::beta::beta_cdf;
use super::normal::std_normal_quantile;
use super::stable::{invert_cdf, log_gamma};

/// Density of the standard Student-t at t.
pub fn student_t_pdf(t: f64, df: f64) -> f64 {
    if t.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    let log_norm = log_gamma(0.5 * (df + 1.0)) - log_gamma(0.5 * df) - 0.5 * (df * PI).ln();
    (log_norm - 0.5 * (df + 1.0) * (t * t / df).ln_1p()).exp()
}

/// CDF of the standard Student-t at t.
pub fn student_t_cdf(t: f64, df: f64) -> f64 {
    if t.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t == f64::INFINITY {
        return 1.0;
    }
    if t == f64::NEG_INFINITY {
        return 0.0;
    }
    if t == 0.0 {
        return 0.5;
    }
    // P(|T| > |t|) / 2 = I_{df/(df+t²)}(df/2, 1/2) / 2
    let tail = 0.5 * beta_cdf(df / (df + t * t), 0.5 * df, 0.5);
    if t > 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

/// Quantile of the standard Student-t at probability p.
///
/// Returns ∓∞ at p = 0 and p = 1, and NaN outside [0, 1].
pub fn student_t_quantile(p: f64, df: f64) -> f64 {
    if p.is_nan() || df.is_nan() || df <= 0.0 || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    if p == 0.5 {
        return 0.0;
    }
    if df.is_infinite() {
        return std_normal_quantile(p);
    }
    let t = tail_quantile(p.min(1.0 - p), df);
    if p < 0.5 {
        -t
    } else {
        t
    }
}

/// P(T > t) for t >= 0, without the cancellation in `1 - cdf`.
fn upper_tail(t: f64, df: f64) -> f64 {
    0.5 * beta_cdf(df / (df + t * t), 0.5 * df, 0.5)
}

/// The t >= 0 with P(T > t) = q, for q in (0, 1/2).
fn tail_quantile(q: f64, df: f64) -> f64 {
    let z = -std_normal_quantile(q);
    let z3 = z * z * z;
    let z5 = z3 * z * z;
    let guess = z + (z3 + z) / (4.0 * df) + (5.0 * z5 + 16.0 * z3 + 3.0 * z) / (96.0 * df * df);

    let mut hi = guess.max(1.0) * 2.0;
    while upper_tail(hi, df) > q && hi < f64::MAX / 4.0 {
        hi *= 2.0;
    }

    invert_cdf(
        |t| -upper_tail(t, df),
        |t| student_t_pdf(t, df),
        -q,
        guess,
        0.0,
        hi,
    )
}
