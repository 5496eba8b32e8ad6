//! Rejection classification.
//!
//! The gateway returns only human-readable reasons, so classification is a
//! substring heuristic over the contract's wording. It lives here alone so the
//! mapping can change without touching call sites; if the contract rewords
//! its messages, rejections silently fall through to [`RejectionKind::Other`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of rejection causes the harness distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionKind {
    /// The contract throttled the caller.
    RateLimited,
    /// Key material is already bound to another identity.
    DuplicateKey,
    /// The submitted content already exists on the ledger.
    DuplicateHash,
    /// Anything else.
    Other,
}

impl RejectionKind {
    /// Maps a remote reason to a rejection kind.
    #[must_use]
    pub fn classify(reason: &str) -> Self {
        let reason = reason.to_ascii_lowercase();
        if reason.contains("rate limit") {
            Self::RateLimited
        } else if reason.contains("already in use") {
            Self::DuplicateKey
        } else if reason.contains("model hash") && reason.contains("already exists") {
            Self::DuplicateHash
        } else {
            Self::Other
        }
    }

    /// Short label used in progress output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::RateLimited => "Rate limited",
            Self::DuplicateKey => "Key already used",
            Self::DuplicateHash => "Duplicate hash",
            Self::Other => "Other error",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
