//! Credential store discovery and client identities.
//!
//! The store follows the MSP directory convention: a `signcerts` directory
//! holding the enrollment certificate and a `keystore` directory holding the
//! private key. Discovery is name-sorted so the same store always resolves
//! to the same files.

use std::fmt;
use std::path::{Path, PathBuf};

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{LedgerError, Result};

/// Location of one client's credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStore {
    /// Membership service provider id the identity belongs to.
    pub msp_id: String,
    /// Directory containing the `*.pem` certificate.
    pub cert_dir: PathBuf,
    /// Directory containing the private key (`*_sk` preferred).
    pub key_dir: PathBuf,
    /// Optional TLS root certificate of the gateway peer.
    #[serde(default)]
    pub tls_root_cert: Option<PathBuf>,
}

impl CredentialStore {
    /// Creates a store rooted at an MSP directory (`<msp>/signcerts`, `<msp>/keystore`).
    #[must_use]
    pub fn from_msp_dir(msp_id: impl Into<String>, msp_dir: impl AsRef<Path>) -> Self {
        let msp_dir = msp_dir.as_ref();
        Self {
            msp_id: msp_id.into(),
            cert_dir: msp_dir.join("signcerts"),
            key_dir: msp_dir.join("keystore"),
            tls_root_cert: None,
        }
    }

    /// Sets the TLS root certificate path.
    #[must_use]
    pub fn with_tls_root_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.tls_root_cert = Some(path.into());
        self
    }

    /// Loads the client identity from the store.
    ///
    /// # Errors
    /// Returns [`LedgerError::CredentialNotFound`] if no certificate or no
    /// private key can be resolved.
    pub async fn load_identity(&self) -> Result<ClientIdentity> {
        let cert_path = resolve_certificate(&self.cert_dir).await?;
        let key_path = resolve_private_key(&self.key_dir).await?;

        let credentials = tokio::fs::read(&cert_path).await.map_err(|e| {
            LedgerError::credential_not_found(format!("{}: {e}", cert_path.display()))
        })?;
        let key = tokio::fs::read(&key_path).await.map_err(|e| {
            LedgerError::credential_not_found(format!("{}: {e}", key_path.display()))
        })?;

        tracing::trace!(
            msp_id = %self.msp_id,
            cert = %cert_path.display(),
            key = %key_path.display(),
            "loaded client identity"
        );

        Ok(ClientIdentity {
            msp_id: self.msp_id.clone(),
            credentials,
            signer: PrivateKeySigner::new(key),
        })
    }

    /// Reads the TLS root certificate, if one is configured.
    ///
    /// # Errors
    /// Returns [`LedgerError::CredentialNotFound`] if the configured file is missing.
    pub async fn load_tls_root_cert(&self) -> Result<Option<Vec<u8>>> {
        let Some(path) = &self.tls_root_cert else {
            return Ok(None);
        };
        tokio::fs::read(path)
            .await
            .map(Some)
            .map_err(|e| LedgerError::credential_not_found(format!("{}: {e}", path.display())))
    }
}

async fn sorted_file_names(dir: &Path) -> Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        LedgerError::credential_not_found(format!("{}: {e}", dir.display()))
    })?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

async fn resolve_certificate(dir: &Path) -> Result<PathBuf> {
    sorted_file_names(dir)
        .await?
        .into_iter()
        .find(|name| name.ends_with(".pem"))
        .map(|name| dir.join(name))
        .ok_or_else(|| {
            LedgerError::credential_not_found(format!(
                "certificate file not found in {}",
                dir.display()
            ))
        })
}

async fn resolve_private_key(dir: &Path) -> Result<PathBuf> {
    let names = sorted_file_names(dir).await?;
    names
        .iter()
        .find(|name| name.ends_with("_sk"))
        .or_else(|| names.first())
        .map(|name| dir.join(name))
        .ok_or_else(|| {
            LedgerError::credential_not_found(format!(
                "private key file not found in {}",
                dir.display()
            ))
        })
}

/// Certificate, MSP id and signing capability of one logical client.
#[derive(Clone)]
pub struct ClientIdentity {
    /// Membership service provider id.
    pub msp_id: String,
    /// PEM-encoded enrollment certificate.
    pub credentials: Vec<u8>,
    signer: PrivateKeySigner,
}

impl ClientIdentity {
    /// Creates an identity from raw parts.
    #[must_use]
    pub fn new(msp_id: impl Into<String>, credentials: Vec<u8>, private_key: Vec<u8>) -> Self {
        Self {
            msp_id: msp_id.into(),
            credentials,
            signer: PrivateKeySigner::new(private_key),
        }
    }

    /// Signs a proposal digest with this identity's key.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signer.sign(message)
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("msp_id", &self.msp_id)
            .field("credentials_len", &self.credentials.len())
            .finish_non_exhaustive()
    }
}

/// Signs with the raw private key material.
///
/// Produces an HMAC-SHA256 tag keyed by the key bytes. The in-process ledger
/// only requires a non-empty signature; a networked transport substitutes its
/// own scheme behind [`ClientIdentity::sign`].
#[derive(Clone)]
struct PrivateKeySigner {
    key: Vec<u8>,
}

impl PrivateKeySigner {
    fn new(key: Vec<u8>) -> Self {
        Self { key }
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        // HMAC accepts keys of any length, including empty.
        match Hmac::<Sha256>::new_from_slice(&self.key) {
            Ok(mut mac) => {
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            Err(_) => Vec::new(),
        }
    }
}
