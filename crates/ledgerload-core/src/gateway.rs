//! Gateway channel and transaction client.
//!
//! A submit runs the gateway's three phases (endorse, order, commit status)
//! and an evaluate runs a single read-only call. Each of the four call
//! classes carries its own deadline; an expiry surfaces as a
//! [`RemoteError`] so callers record it like any other rejection.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::credentials::ClientIdentity;
use crate::error::RemoteError;

/// Deadline class of a gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Read-only query.
    Evaluate,
    /// Proposal endorsement.
    Endorse,
    /// Submission of the endorsed transaction for ordering.
    Submit,
    /// Wait for the commit status of a submitted transaction.
    CommitStatus,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Evaluate => "evaluate",
            Self::Endorse => "endorse",
            Self::Submit => "submit",
            Self::CommitStatus => "commit-status",
        };
        f.write_str(name)
    }
}

/// Per-call deadline budgets in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadlines {
    /// Evaluate budget.
    #[serde(default = "default_evaluate_ms")]
    pub evaluate_ms: u64,
    /// Endorse budget.
    #[serde(default = "default_endorse_ms")]
    pub endorse_ms: u64,
    /// Submit budget.
    #[serde(default = "default_submit_ms")]
    pub submit_ms: u64,
    /// Commit-status budget.
    #[serde(default = "default_commit_status_ms")]
    pub commit_status_ms: u64,
}

fn default_evaluate_ms() -> u64 {
    5_000
}

fn default_endorse_ms() -> u64 {
    15_000
}

fn default_submit_ms() -> u64 {
    5_000
}

fn default_commit_status_ms() -> u64 {
    60_000
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            evaluate_ms: default_evaluate_ms(),
            endorse_ms: default_endorse_ms(),
            submit_ms: default_submit_ms(),
            commit_status_ms: default_commit_status_ms(),
        }
    }
}

impl Deadlines {
    /// Applies one budget to every call class.
    #[must_use]
    pub const fn uniform(ms: u64) -> Self {
        Self {
            evaluate_ms: ms,
            endorse_ms: ms,
            submit_ms: ms,
            commit_status_ms: ms,
        }
    }

    /// Returns the budget for a call class.
    #[must_use]
    pub const fn budget(&self, kind: CallKind) -> Duration {
        let ms = match kind {
            CallKind::Evaluate => self.evaluate_ms,
            CallKind::Endorse => self.endorse_ms,
            CallKind::Submit => self.submit_ms,
            CallKind::CommitStatus => self.commit_status_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Signed transaction proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    /// Transaction id.
    pub tx_id: String,
    /// Channel name.
    pub channel: String,
    /// Chaincode name.
    pub chaincode: String,
    /// Contract function.
    pub function: String,
    /// Function arguments.
    pub args: Vec<String>,
    /// MSP id of the creator.
    pub creator: String,
    /// Creator's signature over [`Proposal::digest`].
    pub signature: Vec<u8>,
}

impl Proposal {
    /// SHA-256 over every field except the signature.
    #[must_use]
    pub fn digest(&self) -> Vec<u8> {
        let mut hasher = Sha256::new();
        for part in [&self.tx_id, &self.channel, &self.chaincode, &self.function, &self.creator] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        for arg in &self.args {
            hasher.update(arg.as_bytes());
            hasher.update([0u8]);
        }
        hasher.finalize().to_vec()
    }
}

/// Versioned key read during endorsement (version 0 means absent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRead {
    /// World state key.
    pub key: String,
    /// Version observed at endorsement.
    pub version: u64,
}

/// Key written by the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyWrite {
    /// World state key.
    pub key: String,
    /// New value.
    pub value: Vec<u8>,
}

/// Endorsed proposal ready for ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endorsement {
    /// Transaction id.
    pub tx_id: String,
    /// Channel name.
    pub channel: String,
    /// Reads the simulation performed.
    pub reads: Vec<KeyRead>,
    /// Writes the simulation produced.
    pub writes: Vec<KeyWrite>,
    /// Contract return value.
    pub result: Vec<u8>,
}

/// Final validation status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStatus {
    /// Committed and valid.
    Valid,
    /// Committed but invalidated, with the validation code.
    Invalid(String),
}

/// Transport-side gateway operations.
///
/// Implemented by the in-process ledger and by any networked gateway.
#[async_trait]
pub trait GatewayBackend: Send + Sync {
    /// Runs a read-only query.
    async fn evaluate(&self, proposal: &Proposal) -> Result<Vec<u8>, RemoteError>;

    /// Simulates the proposal and returns its endorsement.
    async fn endorse(&self, proposal: &Proposal) -> Result<Endorsement, RemoteError>;

    /// Submits an endorsed transaction for ordering; returns its id.
    async fn submit(&self, endorsement: Endorsement) -> Result<String, RemoteError>;

    /// Waits for the commit status of a submitted transaction.
    async fn commit_status(&self, tx_id: &str) -> Result<CommitStatus, RemoteError>;
}

/// Submit/evaluate contract consumed by the load generator and the
/// adversarial runner.
#[async_trait]
pub trait TransactionClient: Send + Sync {
    /// Submits a transaction and waits until it commits or is rejected.
    async fn submit(&self, function: &str, args: &[String]) -> Result<(), RemoteError>;

    /// Evaluates a read-only transaction.
    async fn evaluate(&self, function: &str, args: &[String]) -> Result<Vec<u8>, RemoteError>;
}

/// Established channel to a gateway endpoint.
#[derive(Clone)]
pub struct Channel {
    backend: Arc<dyn GatewayBackend>,
    endpoint: String,
    host_alias: Option<String>,
    tls_root_cert: Option<Vec<u8>>,
    deadlines: Deadlines,
}

impl Channel {
    /// Creates a channel over a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn GatewayBackend>, endpoint: impl Into<String>, deadlines: Deadlines) -> Self {
        Self {
            backend,
            endpoint: endpoint.into(),
            host_alias: None,
            tls_root_cert: None,
            deadlines,
        }
    }

    /// Sets the TLS server name override.
    #[must_use]
    pub fn with_host_alias(mut self, alias: Option<String>) -> Self {
        self.host_alias = alias;
        self
    }

    /// Attaches the TLS root certificate.
    #[must_use]
    pub fn with_tls_root_cert(mut self, cert: Option<Vec<u8>>) -> Self {
        self.tls_root_cert = cert;
        self
    }

    /// Returns the endpoint address.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the TLS server name override.
    #[must_use]
    pub fn host_alias(&self) -> Option<&str> {
        self.host_alias.as_deref()
    }

    /// Returns true if a TLS root certificate is attached.
    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.tls_root_cert.is_some()
    }

    /// Returns the deadline budgets.
    #[must_use]
    pub const fn deadlines(&self) -> &Deadlines {
        &self.deadlines
    }

    async fn with_deadline<T, F>(&self, kind: CallKind, call: F) -> Result<T, RemoteError>
    where
        F: Future<Output = Result<T, RemoteError>> + Send,
    {
        let budget = self.deadlines.budget(kind);
        match tokio::time::timeout(budget, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(endpoint = %self.endpoint, %kind, ?budget, "gateway deadline expired");
                Err(RemoteError::deadline_exceeded(kind, budget))
            }
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("endpoint", &self.endpoint)
            .field("host_alias", &self.host_alias)
            .field("tls", &self.is_tls())
            .field("deadlines", &self.deadlines)
            .finish_non_exhaustive()
    }
}

/// Channel bound to a client identity.
#[derive(Debug, Clone)]
pub struct Gateway {
    channel: Channel,
    identity: ClientIdentity,
}

impl Gateway {
    /// Connects an identity over a channel.
    #[must_use]
    pub const fn connect(channel: Channel, identity: ClientIdentity) -> Self {
        Self { channel, identity }
    }

    /// Returns a contract handle on a ledger channel.
    #[must_use]
    pub fn contract(&self, channel_name: impl Into<String>, chaincode: impl Into<String>) -> Contract {
        Contract {
            channel: self.channel.clone(),
            identity: self.identity.clone(),
            channel_name: channel_name.into(),
            chaincode: chaincode.into(),
        }
    }
}

/// One chaincode on one ledger channel, as seen by one identity.
#[derive(Debug, Clone)]
pub struct Contract {
    channel: Channel,
    identity: ClientIdentity,
    channel_name: String,
    chaincode: String,
}

impl Contract {
    /// Returns the chaincode name.
    #[must_use]
    pub fn chaincode(&self) -> &str {
        &self.chaincode
    }

    fn proposal(&self, function: &str, args: &[String]) -> Proposal {
        let mut proposal = Proposal {
            tx_id: uuid::Uuid::new_v4().simple().to_string(),
            channel: self.channel_name.clone(),
            chaincode: self.chaincode.clone(),
            function: function.to_string(),
            args: args.to_vec(),
            creator: self.identity.msp_id.clone(),
            signature: Vec::new(),
        };
        proposal.signature = self.identity.sign(&proposal.digest());
        proposal
    }
}

#[async_trait]
impl TransactionClient for Contract {
    async fn submit(&self, function: &str, args: &[String]) -> Result<(), RemoteError> {
        let proposal = self.proposal(function, args);
        let backend = &self.channel.backend;

        let endorsement = self
            .channel
            .with_deadline(CallKind::Endorse, backend.endorse(&proposal))
            .await?;
        let tx_id = self
            .channel
            .with_deadline(CallKind::Submit, backend.submit(endorsement))
            .await?;
        let status = self
            .channel
            .with_deadline(CallKind::CommitStatus, backend.commit_status(&tx_id))
            .await?;

        match status {
            CommitStatus::Valid => Ok(()),
            CommitStatus::Invalid(code) => Err(RemoteError::new(format!(
                "transaction {tx_id} failed to commit with status code {code}"
            ))),
        }
    }

    async fn evaluate(&self, function: &str, args: &[String]) -> Result<Vec<u8>, RemoteError> {
        let proposal = self.proposal(function, args);
        self.channel
            .with_deadline(CallKind::Evaluate, self.channel.backend.evaluate(&proposal))
            .await
    }
}
