//! Harness configuration types.
//!
//! Per Iron Lotus Framework: Configuration is validated at load time (Poka-Yoke),
//! with sensible defaults and clear error messages. Every default matches the
//! stock gateway client so an empty file reproduces a standard run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::credentials::CredentialStore;
use crate::error::{LedgerError, Result};
use crate::gateway::Deadlines;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "LEDGERLOAD_CONFIG";

/// Configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ledgerload.toml";

/// Top-level harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Gateway endpoint and deadlines.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Client credentials.
    #[serde(default)]
    pub credentials: CredentialConfig,

    /// Load test parameters.
    #[serde(default)]
    pub load: LoadConfig,

    /// Adversarial test parameters.
    #[serde(default)]
    pub adversarial: AdversarialConfig,

    /// Model hash publishing.
    #[serde(default)]
    pub publish: PublishConfig,

    /// In-process ledger policy.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Fault injection.
    #[serde(default)]
    pub chaos: ChaosSettings,
}

impl HarnessConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.gateway.channel.is_empty() {
            return Err(LedgerError::config("gateway.channel cannot be empty"));
        }
        if self.gateway.endpoint.is_empty() {
            return Err(LedgerError::config("gateway.endpoint cannot be empty"));
        }
        let d = &self.gateway.deadlines;
        if d.evaluate_ms == 0 || d.endorse_ms == 0 || d.submit_ms == 0 || d.commit_status_ms == 0 {
            return Err(LedgerError::config("gateway deadlines must be positive"));
        }
        if self.credentials.msp_id.is_empty() {
            return Err(LedgerError::config("credentials.msp_id cannot be empty"));
        }

        self.load.validate()?;

        if self.adversarial.chaincode.is_empty() || self.publish.chaincode.is_empty() {
            return Err(LedgerError::config("chaincode names cannot be empty"));
        }

        if self.ledger.pending_ttl_ms == 0 {
            return Err(LedgerError::config("ledger.pending_ttl_ms must be positive"));
        }

        for (name, p) in [
            ("chaos.latency_probability", self.chaos.latency_probability),
            ("chaos.error_probability", self.chaos.error_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(LedgerError::config(format!("{name} must be within [0, 1]")));
            }
        }

        Ok(())
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| LedgerError::config(format!("failed to read config: {e}")))?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    /// Returns an error if the text is not valid configuration.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| LedgerError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by [`CONFIG_ENV`], else [`DEFAULT_CONFIG_FILE`]
    /// if present, else the defaults.
    ///
    /// # Errors
    /// Returns an error if a named file cannot be loaded.
    pub fn discover() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            tracing::debug!(%path, "loading config from environment");
            return Self::load(path);
        }
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::load(DEFAULT_CONFIG_FILE);
        }
        Ok(Self::default())
    }
}

/// Gateway endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Peer endpoint address.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// TLS server name override.
    #[serde(default = "default_host_alias")]
    pub host_alias: Option<String>,

    /// Ledger channel name.
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Per-call deadlines.
    #[serde(default)]
    pub deadlines: Deadlines,
}

fn default_endpoint() -> String {
    "localhost:7051".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_host_alias() -> Option<String> {
    Some("peer0.org1.example.com".to_string())
}

fn default_channel() -> String {
    "mychannel".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            host_alias: default_host_alias(),
            channel: default_channel(),
            deadlines: Deadlines::default(),
        }
    }
}

/// Credential store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// MSP id of the client.
    #[serde(default = "default_msp_id")]
    pub msp_id: String,

    /// MSP directory holding `signcerts/` and `keystore/`.
    #[serde(default = "default_msp_dir")]
    pub msp_dir: PathBuf,

    /// TLS root certificate of the peer.
    #[serde(default)]
    pub tls_root_cert: Option<PathBuf>,
}

fn default_msp_id() -> String {
    "Org1MSP".to_string()
}

fn default_msp_dir() -> PathBuf {
    PathBuf::from("organizations/peerOrganizations/org1.example.com/users/User1@org1.example.com/msp")
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            msp_id: default_msp_id(),
            msp_dir: default_msp_dir(),
            tls_root_cert: None,
        }
    }
}

impl CredentialConfig {
    /// Returns the credential store this configuration describes.
    #[must_use]
    pub fn store(&self) -> CredentialStore {
        let store = CredentialStore::from_msp_dir(self.msp_id.clone(), &self.msp_dir);
        match &self.tls_root_cert {
            Some(path) => store.with_tls_root_cert(path),
            None => store,
        }
    }
}

/// Load test configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Total measured transactions (`N`).
    #[serde(default = "default_total_transactions")]
    pub total_transactions: u32,

    /// Concurrent client workers (`C`).
    #[serde(default = "default_concurrent_clients")]
    pub concurrent_clients: u32,

    /// Pause after each transaction, in milliseconds.
    #[serde(default = "default_think_time_ms")]
    pub think_time_ms: u64,

    /// Resource sampler period, in milliseconds.
    #[serde(default = "default_measurement_interval_ms")]
    pub measurement_interval_ms: u64,

    /// Unmeasured transactions issued before the run.
    #[serde(default = "default_warmup_transactions")]
    pub warmup_transactions: u32,

    /// Assumed bytes transferred per successful transaction.
    #[serde(default = "default_bytes_per_transaction")]
    pub bytes_per_transaction: u64,

    /// Chaincode receiving the model updates.
    #[serde(default = "default_model_chaincode")]
    pub chaincode: String,

    /// Open a fresh connection for every transaction instead of once per worker.
    #[serde(default)]
    pub reconnect_per_transaction: bool,

    /// Directory receiving the scale-test summary.
    #[serde(default = "default_load_results_dir")]
    pub results_dir: PathBuf,
}

fn default_total_transactions() -> u32 {
    1000
}

fn default_concurrent_clients() -> u32 {
    10
}

fn default_think_time_ms() -> u64 {
    50
}

fn default_measurement_interval_ms() -> u64 {
    1000
}

fn default_warmup_transactions() -> u32 {
    50
}

fn default_bytes_per_transaction() -> u64 {
    512
}

fn default_model_chaincode() -> String {
    "model".to_string()
}

fn default_load_results_dir() -> PathBuf {
    PathBuf::from("scale_test_results")
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            total_transactions: default_total_transactions(),
            concurrent_clients: default_concurrent_clients(),
            think_time_ms: default_think_time_ms(),
            measurement_interval_ms: default_measurement_interval_ms(),
            warmup_transactions: default_warmup_transactions(),
            bytes_per_transaction: default_bytes_per_transaction(),
            chaincode: default_model_chaincode(),
            reconnect_per_transaction: false,
            results_dir: default_load_results_dir(),
        }
    }
}

impl LoadConfig {
    /// Validates the load parameters.
    ///
    /// # Errors
    /// Returns an error if concurrency or the sampler interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.concurrent_clients == 0 {
            return Err(LedgerError::config("load.concurrent_clients must be positive"));
        }
        if self.measurement_interval_ms == 0 {
            return Err(LedgerError::config(
                "load.measurement_interval_ms must be positive",
            ));
        }
        if self.chaincode.is_empty() {
            return Err(LedgerError::config("load.chaincode cannot be empty"));
        }
        Ok(())
    }

    /// Transactions assigned to each worker: `ceil(N / C)`.
    #[must_use]
    pub fn transactions_per_client(&self) -> u32 {
        if self.concurrent_clients == 0 {
            return 0;
        }
        self.total_transactions.div_ceil(self.concurrent_clients)
    }

    /// Transactions assigned to a given worker.
    ///
    /// Every worker gets `ceil(N / C)` until `N` is exhausted, so trailing
    /// workers may get fewer (or none).
    #[must_use]
    pub fn assigned_to(&self, client_id: u32) -> u32 {
        let per_client = self.transactions_per_client();
        let already = per_client.saturating_mul(client_id);
        self.total_transactions.saturating_sub(already).min(per_client)
    }
}

/// Adversarial test configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdversarialConfig {
    /// Chaincode receiving enrollments and model updates.
    #[serde(default = "default_adversarial_chaincode")]
    pub chaincode: String,

    /// Enrollments in the rapid identity creation burst.
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,

    /// Enrollments reusing the legitimate key.
    #[serde(default = "default_clone_attempts")]
    pub clone_attempts: u32,

    /// Submissions of the colluding content hash.
    #[serde(default = "default_duplicate_submissions")]
    pub duplicate_submissions: u32,

    /// Device type passed to enrollments.
    #[serde(default = "default_device_type")]
    pub device_type: String,

    /// Directory receiving the report.
    #[serde(default = "default_adversarial_results_dir")]
    pub results_dir: PathBuf,
}

fn default_adversarial_chaincode() -> String {
    "basic".to_string()
}

fn default_burst_size() -> u32 {
    8
}

fn default_clone_attempts() -> u32 {
    3
}

fn default_duplicate_submissions() -> u32 {
    2
}

fn default_device_type() -> String {
    "SENSOR".to_string()
}

fn default_adversarial_results_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for AdversarialConfig {
    fn default() -> Self {
        Self {
            chaincode: default_adversarial_chaincode(),
            burst_size: default_burst_size(),
            clone_attempts: default_clone_attempts(),
            duplicate_submissions: default_duplicate_submissions(),
            device_type: default_device_type(),
            results_dir: default_adversarial_results_dir(),
        }
    }
}

/// Model hash publishing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Log of `nodeId,timestamp,modelHash` lines; the last line is published.
    #[serde(default = "default_hash_log")]
    pub hash_log: PathBuf,

    /// Chaincode receiving the model update.
    #[serde(default = "default_model_chaincode")]
    pub chaincode: String,
}

fn default_hash_log() -> PathBuf {
    PathBuf::from("model_hashes.log")
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            hash_log: default_hash_log(),
            chaincode: default_model_chaincode(),
        }
    }
}

/// Policy of the in-process ledger backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// World state file shared between runs; an empty path disables
    /// persistence.
    #[serde(default = "default_state_path")]
    pub state_path: Option<PathBuf>,

    /// Simulated endorsement latency, in milliseconds.
    #[serde(default)]
    pub endorse_latency_ms: u64,

    /// Simulated ordering + commit latency, in milliseconds.
    #[serde(default)]
    pub commit_latency_ms: u64,

    /// Maximum enrollments per window.
    #[serde(default = "default_enroll_rate_limit")]
    pub enroll_rate_limit: u32,

    /// Enrollment rate window, in milliseconds.
    #[serde(default = "default_enroll_window_ms")]
    pub enroll_window_ms: u64,

    /// Submitted transactions whose status is not requested within this
    /// many milliseconds are discarded.
    #[serde(default = "default_pending_ttl_ms")]
    pub pending_ttl_ms: u64,
}

/// Default world state file of the in-process ledger.
pub const DEFAULT_STATE_FILE: &str = "ledger-state.json";

fn default_state_path() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_STATE_FILE))
}

fn default_enroll_rate_limit() -> u32 {
    5
}

fn default_enroll_window_ms() -> u64 {
    60_000
}

fn default_pending_ttl_ms() -> u64 {
    60_000
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            endorse_latency_ms: 0,
            commit_latency_ms: 0,
            enroll_rate_limit: default_enroll_rate_limit(),
            enroll_window_ms: default_enroll_window_ms(),
            pending_ttl_ms: default_pending_ttl_ms(),
        }
    }
}

/// Fault injection settings applied in front of the gateway backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChaosSettings {
    /// Probability of delaying a call.
    #[serde(default)]
    pub latency_probability: f64,

    /// Injected delay, in milliseconds.
    #[serde(default)]
    pub latency_ms: u64,

    /// Probability of rejecting a call.
    #[serde(default)]
    pub error_probability: f64,
}

impl ChaosSettings {
    /// Returns true if any fault is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        (self.latency_probability > 0.0 && self.latency_ms > 0) || self.error_probability > 0.0
    }
}
