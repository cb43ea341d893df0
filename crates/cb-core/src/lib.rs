//! Conjugate Bayesian inference core library.
//!
//! This library provides:
//! - Posterior updates for Normal means, differences of means and Poisson rates
//! - Credible intervals, quantiles and posterior hypothesis tests
//! - An injectable distribution-primitives seam over `cb-math`
//! - Exit codes, configuration and logging for the `cb-core` binary
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod inference;
pub mod logging;
pub mod output;
pub mod primitives;

pub use error::{InferenceError, Result};
pub use primitives::{DistributionPrimitives, StandardPrimitives};
