//! Screening error types.
//!
//! Evaluation and recommendation derivation are total, so these errors only
//! arise at the boundary: looking up a job group, or constructing a code or
//! range from raw input.

use thiserror::Error;

/// Errors raised when building or looking up screening inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreeningError {
    /// The job-group key is not in the registry.
    #[error("unknown job group: {0}")]
    UnknownJobGroup(String),

    /// A measured or reference code lies outside its scale.
    #[error("{scale} value {value} is outside the scale {min}-{max}")]
    OutOfRange {
        scale: &'static str,
        value: u8,
        min: u8,
        max: u8,
    },

    /// A range was declared with its bounds inverted.
    #[error("invalid range {lo}-{hi}: lower bound exceeds upper bound")]
    InvalidRange { lo: u8, hi: u8 },
}

impl ScreeningError {
    /// Returns `true` if the error comes from a malformed measurement rather
    /// than an unknown lookup key.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ScreeningError::OutOfRange { .. } | ScreeningError::InvalidRange { .. }
        )
    }
}
