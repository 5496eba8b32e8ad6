//! Connection provider: credentials in, ready transaction client out.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::HarnessConfig;
use crate::credentials::{ClientIdentity, CredentialStore};
use crate::error::Result;
use crate::gateway::{Channel, Deadlines, Gateway, GatewayBackend, TransactionClient};

/// Produces transaction clients for workers.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Opens a channel, loads an identity and binds them to a contract.
    ///
    /// # Errors
    /// Returns [`crate::LedgerError::CredentialNotFound`] if the credential
    /// store cannot be resolved.
    async fn connect(&self) -> Result<Arc<dyn TransactionClient>>;
}

/// Connects to one chaincode through a gateway backend.
#[derive(Clone)]
pub struct GatewayConnector {
    backend: Arc<dyn GatewayBackend>,
    store: CredentialStore,
    endpoint: String,
    host_alias: Option<String>,
    deadlines: Deadlines,
    channel_name: String,
    chaincode: String,
}

impl GatewayConnector {
    /// Creates a connector with default endpoint, channel and deadlines.
    #[must_use]
    pub fn new(backend: Arc<dyn GatewayBackend>, store: CredentialStore, chaincode: impl Into<String>) -> Self {
        let defaults = crate::config::GatewayConfig::default();
        Self {
            backend,
            store,
            endpoint: defaults.endpoint,
            host_alias: defaults.host_alias,
            deadlines: defaults.deadlines,
            channel_name: defaults.channel,
            chaincode: chaincode.into(),
        }
    }

    /// Creates a connector from the harness configuration.
    #[must_use]
    pub fn from_config(backend: Arc<dyn GatewayBackend>, config: &HarnessConfig, chaincode: impl Into<String>) -> Self {
        Self {
            backend,
            store: config.credentials.store(),
            endpoint: config.gateway.endpoint.clone(),
            host_alias: config.gateway.host_alias.clone(),
            deadlines: config.gateway.deadlines,
            channel_name: config.gateway.channel.clone(),
            chaincode: chaincode.into(),
        }
    }

    /// Overrides the deadlines.
    #[must_use]
    pub const fn with_deadlines(mut self, deadlines: Deadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// Establishes the transport channel.
    ///
    /// # Errors
    /// Returns an error if a configured TLS root certificate is missing.
    pub async fn open_connection(&self) -> Result<Channel> {
        let tls_root_cert = self.store.load_tls_root_cert().await?;
        Ok(
            Channel::new(Arc::clone(&self.backend), self.endpoint.clone(), self.deadlines)
                .with_host_alias(self.host_alias.clone())
                .with_tls_root_cert(tls_root_cert),
        )
    }

    /// Loads the signing identity.
    ///
    /// # Errors
    /// Returns an error if the certificate or private key is missing.
    pub async fn load_identity(&self) -> Result<ClientIdentity> {
        self.store.load_identity().await
    }
}

#[async_trait]
impl ConnectionProvider for GatewayConnector {
    async fn connect(&self) -> Result<Arc<dyn TransactionClient>> {
        let channel = self.open_connection().await?;
        let identity = self.load_identity().await?;
        let gateway = Gateway::connect(channel, identity);
        Ok(Arc::new(gateway.contract(self.channel_name.clone(), self.chaincode.clone())))
    }
}
