//! Error types for the inference engine.
//!
//! Every entry point validates its inputs before computing anything and
//! returns one of these instead of a partial or clamped result.

use thiserror::Error;

/// Errors raised by posterior updates and derived products.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("invalid argument {field}: {message}")]
    InvalidArgument {
        field: &'static str,
        message: String,
    },
    #[error("discrete prior has {values} values but {masses} masses")]
    LengthMismatch { values: usize, masses: usize },
}

impl InferenceError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        InferenceError::InvalidArgument {
            field,
            message: message.into(),
        }
    }

    /// Both kinds are caller input errors; neither is retryable.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            InferenceError::InvalidArgument { .. } | InferenceError::LengthMismatch { .. }
        )
    }

    /// Name of the offending input.
    pub fn field(&self) -> &'static str {
        match self {
            InferenceError::InvalidArgument { field, .. } => field,
            InferenceError::LengthMismatch { .. } => "prior.masses",
        }
    }
}

pub type Result<T> = std::result::Result<T, InferenceError>;

// ============================================================================
// Validation helpers
// ============================================================================

pub(crate) fn ensure_finite(value: f64, field: &'static str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InferenceError::invalid(field, format!("must be finite, got {value}")))
    }
}

pub(crate) fn ensure_positive(value: f64, field: &'static str) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(InferenceError::invalid(field, format!("must be > 0, got {value}")))
    }
}

pub(crate) fn ensure_non_negative(value: f64, field: &'static str) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(InferenceError::invalid(field, format!("must be >= 0, got {value}")))
    }
}

/// Probabilities and significance levels live strictly inside (0, 1).
pub(crate) fn ensure_open_unit(value: f64, field: &'static str) -> Result<f64> {
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(InferenceError::invalid(
            field,
            format!("must lie strictly between 0 and 1, got {value}"),
        ))
    }
}
