//! Error types for ledgerload-core.
//!
//! Per Iron Lotus Framework: All errors are explicit, no panics allowed.

use std::time::Duration;

use crate::gateway::CallKind;

/// Result type alias for gateway and configuration operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Rejection reported by the ledger gateway.
///
/// The gateway exposes no structured error code; `reason` is the
/// human-readable text from the remote side and is what classification
/// inspects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct RemoteError {
    reason: String,
}

impl RemoteError {
    /// Creates a remote error from the gateway's reason text.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Creates the error surfaced when a call class exceeds its deadline.
    #[must_use]
    pub fn deadline_exceeded(kind: CallKind, budget: Duration) -> Self {
        Self::new(format!(
            "deadline exceeded during {kind} after {}ms",
            budget.as_millis()
        ))
    }

    /// Returns the remote reason text.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns true if this rejection came from a local deadline expiry.
    #[must_use]
    pub fn is_deadline(&self) -> bool {
        self.reason.starts_with("deadline exceeded")
    }
}

/// Errors raised while connecting to or configuring the gateway.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No certificate or private key could be resolved from the credential store.
    #[error("credential not found: {0}")]
    CredentialNotFound(String),

    /// The gateway rejected a call.
    #[error("transaction rejected: {0}")]
    Remote(#[from] RemoteError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A model hash log entry could not be parsed.
    #[error("invalid model hash log: {0}")]
    HashLog(String),

    /// Ledger state could not be loaded or stored.
    #[error("ledger state error: {0}")]
    State(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    /// Creates a credential-not-found error.
    #[must_use]
    pub fn credential_not_found(msg: impl Into<String>) -> Self {
        Self::CredentialNotFound(msg.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a model hash log error.
    #[must_use]
    pub fn hash_log(msg: impl Into<String>) -> Self {
        Self::HashLog(msg.into())
    }

    /// Creates a ledger state error.
    #[must_use]
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Returns true if only the current attempt is lost and the caller
    /// can move on to its next transaction.
    #[must_use]
    pub const fn is_per_attempt(&self) -> bool {
        matches!(self, Self::CredentialNotFound(_) | Self::Remote(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::config("concurrency must be positive");
        assert_eq!(
            err.to_string(),
            "configuration error: concurrency must be positive"
        );
    }

    #[test]
    fn test_credential_not_found_is_per_attempt() {
        let err = LedgerError::credential_not_found("no *.pem in signcerts");
        assert!(err.is_per_attempt());
        assert!(err.to_string().contains("credential not found"));
        assert!(!LedgerError::config("bad").is_per_attempt());
    }

    #[test]
    fn test_remote_error_keeps_reason_verbatim() {
        let err = RemoteError::new("The model hash abc already exists");
        assert_eq!(err.reason(), "The model hash abc already exists");
        assert_eq!(err.to_string(), "The model hash abc already exists");

        let wrapped: LedgerError = err.into();
        assert!(wrapped.to_string().contains("already exists"));
    }

    #[test]
    fn test_deadline_error() {
        let err = RemoteError::deadline_exceeded(CallKind::Endorse, Duration::from_millis(15000));
        assert!(err.is_deadline());
        assert!(err.reason().contains("endorse"));
        assert!(err.reason().contains("15000ms"));
        assert!(!RemoteError::new("rate limit exceeded").is_deadline());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LedgerError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }
}
