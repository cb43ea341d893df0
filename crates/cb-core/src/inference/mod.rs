//! Conjugate posterior inference.
//!
//! - `normal_mu`: unknown Normal mean (discrete, flat and Normal priors)
//! - `normal_diff`: difference of two Normal means, including Behrens-Fisher
//! - `poisson`: unknown Poisson rate (flat, Jeffreys and Gamma priors)
//!
//! Every function is pure: inputs are validated up front and nothing is
//! cached between calls.

pub mod normal_diff;
pub mod normal_mu;
pub mod poisson;
pub mod types;

pub use poisson::{QuantileRow, DEFAULT_PROBABILITIES};
pub use types::{
    CredibleInterval, DiscretePosterior, DiscretePrior, EstimatedSample, GammaPosterior,
    MeanPrior, NormalPosterior, NormalPrior, PoissonSample, RatePrior, SampleSummary,
    StudentPosterior, TestDecision, TestEvidence,
};
