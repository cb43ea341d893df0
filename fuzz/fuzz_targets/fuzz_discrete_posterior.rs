//! Fuzz target for the discrete-prior Normal mean update.
//!
//! Any prior that `DiscretePrior::new` accepts must yield masses that sum
//! to one; everything else must be rejected with an error.

#![no_main]

use arbitrary::Arbitrary;
use cb_core::inference::{normal_mu, DiscretePrior, SampleSummary};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    values: Vec<f64>,
    masses: Vec<f64>,
    count: u64,
    mean: f64,
    sigma: f64,
}

fuzz_target!(|input: Input| {
    let Ok(prior) = DiscretePrior::new(input.values, input.masses) else {
        return;
    };
    let Ok(sample) = SampleSummary::new(input.count, input.mean) else {
        return;
    };
    if let Ok(post) = normal_mu::discrete_posterior(&sample, input.sigma, &prior) {
        let total: f64 = post.masses().iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "masses sum to {total}");
    }
});
