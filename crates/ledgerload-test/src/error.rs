//! Test error types.

/// Result type alias for test operations.
pub type Result<T> = std::result::Result<T, TestError>;

/// Testing errors.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// Run could not be set up.
    #[error("harness error: {0}")]
    Harness(String),

    /// Report could not be built or persisted.
    #[error("report error: {0}")]
    Report(String),

    /// A worker task panicked or was cancelled.
    #[error("worker join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Gateway or configuration error.
    #[error("ledger error: {0}")]
    Ledger(#[from] ledgerload_core::LedgerError),

    /// Sampler error.
    #[error("observe error: {0}")]
    Observe(#[from] ledgerload_observe::ObserveError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TestError {
    /// Creates a harness error.
    #[must_use]
    pub fn harness(msg: impl Into<String>) -> Self {
        Self::Harness(msg.into())
    }

    /// Creates a report error.
    #[must_use]
    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report(msg.into())
    }
}
