use thiserror::Error;

/// Errors surfaced by the dictionary transform and the ensemble driver.
///
/// Degenerate (zero-variance) windows are not an error: they are mapped to
/// [`Word::SENTINEL`](crate::core::word::Word::SENTINEL) and only counted.
#[derive(Debug, Error)]
pub enum WeaselError {
    /// Series length is incompatible with the configured window parameters,
    /// or a member could not be sampled within the retry budget.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("series {index} has length {found}, expected {expected}")]
    LengthMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("model is not fitted")]
    NotFitted,

    /// Feature selection retained zero words; the model would be unusable.
    #[error("feature selection retained no words out of {candidates} candidates")]
    EmptyVocabulary { candidates: usize },

    #[error("fit was cancelled")]
    Cancelled,

    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WeaselError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = WeaselError::LengthMismatch {
            index: 3,
            expected: 64,
            found: 60,
        };
        assert_eq!(e.to_string(), "series 3 has length 60, expected 64");
        assert_eq!(WeaselError::NotFitted.to_string(), "model is not fitted");
        let e = WeaselError::EmptyVocabulary { candidates: 12 };
        assert!(e.to_string().contains("12 candidates"), "got: {e}");
    }

    #[test]
    fn test_serde_error_converts() {
        let err = serde_json::from_str::<Vec<f64>>("not json").unwrap_err();
        let e: WeaselError = err.into();
        assert!(matches!(e, WeaselError::Serialization(_)));
    }
}
