//! Error types shared by all u-survey crates.

use thiserror::Error;

/// Errors that can occur while configuring or computing a flight plan.
///
/// Geometric problems found *during* rasterization are not reported through
/// this type; they are attached to the resulting plan so that a partial plan
/// can still be returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input geometry cannot be used (too few vertices, zero area, ...).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The elevation source could not answer a query.
    #[error("elevation query failed: {0}")]
    Elevation(String),

    /// The computation was cancelled through its cancel handle.
    #[error("computation cancelled")]
    Cancelled,

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidConfig`] with a formatted message.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Returns true if this error was raised by configuration validation.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }
}

/// Result alias used throughout u-survey.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::config("overlap must be in [0, 100)");
        assert_eq!(
            err.to_string(),
            "invalid configuration: overlap must be in [0, 100)"
        );
        assert!(err.is_config());
        assert!(!Error::Cancelled.is_config());
    }
}
