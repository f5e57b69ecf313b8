//! Rephrase Error Types
//!
//! Every failure a trigger can hit maps onto one of these variants.

use thiserror::Error;

/// Central error type for Rephrase
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A clipboard/selection/keystroke utility is missing, or there is no display server
    #[error("Environment unavailable: {0}")]
    EnvironmentUnavailable(String),

    /// The inference endpoint could not be reached or answered with an error status
    #[error("Inference endpoint unavailable: {0}")]
    InferenceUnavailable(String),

    /// The configured model is missing and pulling it failed
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The model answered, but with nothing usable
    #[error("Inference returned no usable text: {0}")]
    InferenceEmptyResult(String),

    /// Nothing to process (e.g. no selection)
    #[error("No input text available")]
    EmptyInput,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    /// `EmptyInput` aborts a trigger quietly rather than as a failure
    pub fn is_no_op(&self) -> bool {
        matches!(self, ServiceError::EmptyInput)
    }
}

/// Result type alias for Rephrase operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_empty_input_is_no_op() {
        assert!(ServiceError::EmptyInput.is_no_op());
        assert!(!ServiceError::ModelUnavailable("gemma3".into()).is_no_op());
        assert!(!ServiceError::EnvironmentUnavailable("xclip".into()).is_no_op());
    }

    #[test]
    fn test_display_messages() {
        let err = ServiceError::InferenceUnavailable("connection refused".into());
        assert_eq!(
            err.to_string(),
            "Inference endpoint unavailable: connection refused"
        );
    }
}
