use std::fmt;
use thiserror::Error;

/// Reasons a raw payload is rejected before it becomes a [`PaymentEvent`].
///
/// These are never retryable: the payload has to be corrected upstream.
///
/// [`PaymentEvent`]: crate::domain::event::PaymentEvent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Invalid channel: {0}. Must be one of: qr-pct, qr-tctd, link")]
    InvalidChannel(String),
    #[error("Invalid currency: {0}. Must be one of: ARS, USD")]
    InvalidCurrency(String),
    #[error("Invalid amount: {0}. Must be a non-negative number")]
    InvalidAmount(String),
    #[error("Amount out of range: {0}. Must not exceed 79228162514264337593543950335")]
    AmountOutOfRange(String),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

/// External collaborators the pipeline talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    Store,
    Dispatcher,
    ExternalProcessor,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collaborator::Store => "durable store",
            Collaborator::Dispatcher => "message dispatcher",
            Collaborator::ExternalProcessor => "external processor",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("{collaborator} failure: {source}")]
    CollaboratorFailure {
        collaborator: Collaborator,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Batch deadline of {limit_ms}ms exceeded after {completed} record(s)")]
    DeadlineExceeded { limit_ms: u64, completed: usize },
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl PipelineError {
    /// Wraps an arbitrary error raised by a collaborator.
    pub fn collaborator<E>(collaborator: Collaborator, err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        PipelineError::CollaboratorFailure {
            collaborator,
            source: err.into(),
        }
    }

    /// Transient failures may succeed if the same input is delivered again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PipelineError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_not_retryable() {
        let err = PipelineError::from(ValidationError::InvalidCurrency("EUR".to_string()));
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Validation error: Invalid currency: EUR. Must be one of: ARS, USD"
        );
    }

    #[test]
    fn test_collaborator_failures_are_retryable() {
        let err = PipelineError::collaborator(Collaborator::Store, "connection reset");
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "durable store failure: connection reset");

        let deadline = PipelineError::DeadlineExceeded {
            limit_ms: 100,
            completed: 2,
        };
        assert!(deadline.is_retryable());
    }
}
