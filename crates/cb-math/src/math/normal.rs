//! Normal (Gaussian) distribution utilities.
//!
//! The CDF is computed from the regularized incomplete gamma function,
//! `erf(x) = P(1/2, x²)`, taking the upper-tail form for negative
//! arguments so that small tail probabilities keep their relative
//! precision. The quantile uses Acklam's rational approximation refined by
//! a single Halley step against that CDF.

use std::f64::consts::PI;

use super::gamma::gamma_q;

const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7; // 1 / sqrt(2*pi)

// Acklam's coefficients: central region.
const ACKLAM_A: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_690e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];
const ACKLAM_B: [f64; 5] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
];
// Tail regions.
const ACKLAM_C: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];
const ACKLAM_D: [f64; 4] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
];
const ACKLAM_P_LOW: f64 = 0.024_25;

/// Standard normal density φ(z).
pub fn std_normal_pdf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    INV_SQRT_2PI * (-0.5 * z * z).exp()
}

/// Normal density at x for N(mean, std²).
pub fn normal_pdf(x: f64, mean: f64, std: f64) -> f64 {
    if x.is_nan() || mean.is_nan() || std.is_nan() || std <= 0.0 {
        return f64::NAN;
    }
    std_normal_pdf((x - mean) / std) / std
}

/// Standard normal CDF Φ(z).
pub fn std_normal_cdf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    if z == f64::INFINITY {
        return 1.0;
    }
    if z == f64::NEG_INFINITY {
        return 0.0;
    }
    let upper_half = 0.5 * gamma_q(0.5, 0.5 * z * z);
    if z < 0.0 {
        upper_half
    } else {
        1.0 - upper_half
    }
}

/// Normal CDF at x for N(mean, std²).
pub fn normal_cdf(x: f64, mean: f64, std: f64) -> f64 {
    if x.is_nan() || mean.is_nan() || std.is_nan() || std <= 0.0 {
        return f64::NAN;
    }
    std_normal_cdf((x - mean) / std)
}

/// Standard normal quantile Φ⁻¹(p).
///
/// Returns -∞ at p = 0, +∞ at p = 1, and NaN outside [0, 1].
pub fn std_normal_quantile(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let x = acklam(p);

    // One Halley step brings the ~1e-9 rational approximation to full precision.
    let e = std_normal_cdf(x) - p;
    let u = e * (2.0 * PI).sqrt() * (0.5 * x * x).exp();
    x - u / (1.0 + 0.5 * x * u)
}

fn acklam(p: f64) -> f64 {
    let [a1, a2, a3, a4, a5, a6] = ACKLAM_A;
    let [b1, b2, b3, b4, b5] = ACKLAM_B;
    let [c1, c2, c3, c4, c5, c6] = ACKLAM_C;
    let [d1, d2, d3, d4] = ACKLAM_D;

    if p < ACKLAM_P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((c1 * q + c2) * q + c3) * q + c4) * q + c5) * q + c6)
            / ((((d1 * q + d2) * q + d3) * q + d4) * q + 1.0)
    } else if p <= 1.0 - ACKLAM_P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((a1 * r + a2) * r + a3) * r + a4) * r + a5) * r + a6) * q
            / (((((b1 * r + b2) * r + b3) * r + b4) * r + b5) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((c1 * q + c2) * q + c3) * q + c4) * q + c5) * q + c6)
            / ((((d1 * q + d2) * q + d3) * q + d4) * q + 1.0)
    }
}

/// Quantile of N(mean, std²) at probability p.
pub fn normal_quantile(p: f64, mean: f64, std: f64) -> f64 {
    if mean.is_nan() || std.is_nan() || std <= 0.0 {
        return f64::NAN;
    }
    mean + std * std_normal_quantile(p)
}
