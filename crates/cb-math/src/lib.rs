//! Distribution primitives for conjugate Bayesian inference.
//!
//! Pure, reentrant kernels for the Normal, Gamma, Beta, and Student-t
//! families. Invalid parameters yield `NaN` rather than an error; callers
//! that need a fallible contract validate before calling in.

pub mod math;

pub use math::beta::*;
pub use math::gamma::*;
pub use math::normal::*;
pub use math::stable::*;
pub use math::student_t::*;
