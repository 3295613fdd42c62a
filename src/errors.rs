use thiserror::Error;

/// Errors raised by bus operations themselves.
///
/// Subscriber failures never surface here; they are aggregated into the
/// [`PublishOutcome`](crate::PublishOutcome) of the publish that observed
/// them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    /// The bus has been shut down; no further subscriptions or publishes
    /// are accepted.
    #[error("event bus closed")]
    Closed,
}

/// Failure reported by a subscriber callback during dispatch.
///
/// Carries a human-readable message and optionally the underlying error.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HandlerError {
    /// Build a failure from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Build a failure that wraps an underlying error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
