//! Error types for Cadence clocks

use thiserror::Error;

/// Core Cadence errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClockError {
    // Configuration errors
    #[error("Invalid allowable error: {0}ms (must be finite and non-negative)")]
    InvalidAllowableError(f64),

    #[error("Invalid drift correction: {0} (must be within 0.0..=1.0)")]
    InvalidDriftCorrection(f64),

    #[error("Invalid frame statistics window: {0}")]
    InvalidFrameWindow(String),

    // Control errors
    #[error("Source clock is not adjustable: cannot {0}")]
    NotAdjustable(&'static str),
}

/// Result type for Cadence operations
pub type ClockResult<T> = Result<T, ClockError>;
