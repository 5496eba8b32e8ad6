//! Observability error types.

/// Result type alias for observe operations.
pub type Result<T> = std::result::Result<T, ObserveError>;

/// Observability errors.
#[derive(Debug, thiserror::Error)]
pub enum ObserveError {
    /// The host monitor could not parse its source.
    #[error("monitor error: {0}")]
    Monitor(String),

    /// The sampler task failed.
    #[error("sampler error: {0}")]
    Sampler(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ObserveError {
    /// Creates a monitor error.
    #[must_use]
    pub fn monitor(msg: impl Into<String>) -> Self {
        Self::Monitor(msg.into())
    }

    /// Creates a sampler error.
    #[must_use]
    pub fn sampler(msg: impl Into<String>) -> Self {
        Self::Sampler(msg.into())
    }
}
