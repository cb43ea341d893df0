//! Fuzz target for the Poisson rate posterior and its intervals.

#![no_main]

use arbitrary::Arbitrary;
use cb_core::inference::{poisson, PoissonSample, RatePrior};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    events: u64,
    intervals: u64,
    shape: f64,
    rate: f64,
    alpha: f64,
}

fuzz_target!(|input: Input| {
    let Ok(sample) = PoissonSample::new(input.events, input.intervals) else {
        return;
    };
    let prior = RatePrior::Gamma {
        shape: input.shape,
        rate: input.rate,
    };
    if let Ok(ci) = poisson::credible_interval(&sample, &prior, input.alpha) {
        assert!(
            ci.low.is_finite() && ci.high.is_finite() && ci.low <= ci.high,
            "interval [{}, {}] is not a finite ordered pair",
            ci.low,
            ci.high
        );
    }
});
