//! Error types for preprocessing, training and evaluation.

use thiserror::Error;

/// Result type alias for classifier operations.
pub type Result<T> = std::result::Result<T, ClassifierError>;

/// Errors that can occur while preparing data or fitting classifiers.
///
/// Numerical edge cases (probabilities at exactly 0 or 1) and minimizer
/// non-convergence are not errors: the former is clamped in place and the
/// latter is reported through `optimizers::Termination`.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Raw input blocks missing, empty or with inconsistent column counts.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Shape mismatch between weights, data or labels.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Empty input where non-empty was required.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Invalid configuration parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O failure while reading datasets or writing reports.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClassifierError {
    /// Shorthand for a `DimensionMismatch`.
    pub fn dimension(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = ClassifierError::dimension(3, 4);
        assert_eq!(err.to_string(), "dimension mismatch: expected 3, got 4");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ClassifierError = io.into();
        assert!(matches!(err, ClassifierError::Io(_)));
    }
}
