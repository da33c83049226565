//! Error types for layer construction and memory-module evaluation.

use thiserror::Error;

/// Result type for fallible layer and memory-module operations.
pub type Result<T> = std::result::Result<T, LayerError>;

/// Errors raised when a layer is misconfigured or called with tensors that
/// contradict its configured sizes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayerError {
    /// A weight initialization scheme name that does not match any scheme.
    #[error("unknown initialization scheme '{0}'")]
    UnknownInitialization(String),

    /// Invalid configuration (zero sizes, odd hidden size for AMRL, etc.)
    #[error("invalid configuration for '{param}': {message}")]
    InvalidConfig {
        param: &'static str,
        message: String,
    },

    /// A tensor whose shape contradicts the module configuration.
    #[error("shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

impl LayerError {
    pub(crate) fn invalid_config(param: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            param,
            message: message.into(),
        }
    }

    pub(crate) fn shape_mismatch(
        what: &'static str,
        expected: impl Into<Vec<usize>>,
        actual: impl Into<Vec<usize>>,
    ) -> Self {
        let err = Self::ShapeMismatch {
            what,
            expected: expected.into(),
            actual: actual.into(),
        };
        tracing::warn!(error = %err, "rejecting tensor with unexpected shape");
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = LayerError::UnknownInitialization("orthogonal".into());
        assert_eq!(err.to_string(), "unknown initialization scheme 'orthogonal'");

        let err = LayerError::invalid_config("memory_size", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid configuration for 'memory_size': must be positive"
        );

        let err = LayerError::shape_mismatch("memories", [1, 2, 16], [1, 2, 12]);
        assert_eq!(
            err.to_string(),
            "shape mismatch for memories: expected [1, 2, 16], got [1, 2, 12]"
        );
    }
}
