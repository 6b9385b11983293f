//! Error types for the lspi library.

use thiserror::Error;

/// Result type alias for policy-iteration operations.
pub type Result<T> = std::result::Result<T, LspiError>;

/// Errors that can occur while evaluating or learning a policy.
///
/// Solver and outer-loop non-convergence are deliberately absent: both are
/// reported through the returned values and the log, never as errors.
#[derive(Error, Debug)]
pub enum LspiError {
    /// A feature vector's length does not match the policy's weight vector.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// An exact-only evaluator was given a feature map without exact indices.
    #[error("basis mismatch: {message}")]
    BasisMismatch { message: String },

    /// Invalid parameter value.
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The direct solve of a dense system did not produce a finite solution.
    #[error("singular system: {message}")]
    SingularSystem { message: String },

    /// A configuration file could not be parsed or written.
    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Filesystem error while loading or saving a configuration.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LspiError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        LspiError::InvalidParameter {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LspiError::DimensionMismatch {
            expected: 10,
            got: 5,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 10, got 5");

        let err = LspiError::InvalidParameter {
            message: "gamma must be between 0 and 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid parameter: gamma must be between 0 and 1"
        );

        let err = LspiError::BasisMismatch {
            message: "model-based LSTDQ requires an exact basis".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "basis mismatch: model-based LSTDQ requires an exact basis"
        );
    }

    #[test]
    fn test_invalid_helper() {
        let err = LspiError::invalid("zero actions");
        assert!(matches!(err, LspiError::InvalidParameter { .. }));
    }
}
