//! Error types for gammasep-core.

use thiserror::Error;

/// Result type alias for gammasep operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for gammasep operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A hit broke the track-id convention: track 1 must carry the
    /// 1157 keV prompt emission, tracks 2 and 3 the 511 keV pair.
    #[error(
        "invariant violation in event {event_id}: track {track_id} carries emission energy {emission_energy} keV"
    )]
    InvariantViolation {
        event_id: i32,
        track_id: i32,
        emission_energy: f64,
    },

    /// Invalid histogram binning.
    #[error("invalid binning: {0}")]
    InvalidBinning(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Returns true for domain invariant violations (as opposed to setup errors).
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}
