// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # ledgerload-core
//!
//! Gateway client, credentials and data model for the ledgerload harness.
//!
//! - [`GatewayConnector`] turns a credential store into a ready [`TransactionClient`]
//! - [`Contract`] runs submits (endorse, order, commit status) and evaluates under deadlines
//! - [`InMemoryLedger`] is the in-process [`GatewayBackend`] carrying the model
//!   and enrollment contracts
//! - [`HarnessConfig`] holds every tunable, validated at load
//!
//! ## Iron Lotus Framework
//!
//! - **Jidoka**: Every rejection is a value, never a panic
//! - **Poka-Yoke**: Configuration is validated before any transaction is sent
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ledgerload_core::{ConnectionProvider, CredentialStore, GatewayConnector, InMemoryLedger};
//!
//! let ledger = Arc::new(InMemoryLedger::default());
//! let store = CredentialStore::from_msp_dir("Org1MSP", "msp");
//! let client = GatewayConnector::new(ledger, store, "model").connect().await?;
//! client.submit("CreateModelUpdate", &[hash, timestamp, node_id]).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Allow significant_drop_tightening - overly aggressive for async code with locks
#![allow(clippy::significant_drop_tightening)]

pub mod classify;
pub mod config;
pub mod connection;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod model;
pub mod types;

pub use classify::RejectionKind;
pub use config::{
    AdversarialConfig, ChaosSettings, CredentialConfig, DEFAULT_STATE_FILE, GatewayConfig,
    HarnessConfig, LedgerConfig, LoadConfig, PublishConfig,
};
pub use connection::{ConnectionProvider, GatewayConnector};
pub use credentials::{ClientIdentity, CredentialStore};
pub use error::{LedgerError, RemoteError, Result};
pub use gateway::{
    CallKind, Channel, CommitStatus, Contract, Deadlines, Endorsement, Gateway, GatewayBackend,
    KeyRead, KeyWrite, Proposal, TransactionClient,
};
pub use ledger::{DeviceRecord, InMemoryLedger};
pub use model::{ModelHashEntry, ModelUpdate, content_hash};
pub use types::{
    Outcome, ResourceSample, TransactionResult, TransferCounter, epoch_millis, rfc3339_now,
};
