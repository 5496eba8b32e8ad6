//! In-process ledger backend.
//!
//! Implements the companion contracts (model updates and device enrollment)
//! behind [`GatewayBackend`], with endorsement against committed state and
//! MVCC validation at commit. It is the default target of the binaries and
//! the backend of every end-to-end test; a networked gateway plugs in through
//! the same trait.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, RemoteError, Result};
use crate::gateway::{
    CommitStatus, Endorsement, GatewayBackend, KeyRead, KeyWrite, Proposal,
};
use crate::model::ModelUpdate;

const MODEL_PREFIX: &str = "model~";
const DEVICE_PREFIX: &str = "device~";
const PUBKEY_PREFIX: &str = "pubkey~";

/// Enrolled device as stored by the enrollment contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device identifier.
    pub device_id: String,
    /// Public key bound to the device.
    pub public_key: String,
    /// Device type.
    pub device_type: String,
    /// Enrollment timestamp given by the client.
    pub timestamp: String,
    /// MSP id of the enrolling identity.
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Versioned {
    value: String,
    version: u64,
}

#[derive(Debug)]
struct Pending {
    endorsement: Endorsement,
    submitted: Instant,
}

#[derive(Debug, Default)]
struct LedgerState {
    world: BTreeMap<String, Versioned>,
    pending: HashMap<String, Pending>,
    enrollments: VecDeque<Instant>,
}

impl LedgerState {
    fn version(&self, key: &str) -> u64 {
        self.world.get(key).map_or(0, |v| v.version)
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.world.get(key).map(|v| v.value.as_str())
    }

    fn recent_enrollments(&mut self, window: Duration, now: Instant) -> usize {
        while let Some(front) = self.enrollments.front() {
            if now.duration_since(*front) >= window {
                self.enrollments.pop_front();
            } else {
                break;
            }
        }
        self.enrollments.len()
    }

    /// Drops submissions whose status was never requested.
    fn evict_stale(&mut self, ttl: Duration, now: Instant) {
        let before = self.pending.len();
        self.pending
            .retain(|_, p| now.duration_since(p.submitted) < ttl);
        let evicted = before - self.pending.len();
        if evicted > 0 {
            tracing::debug!(evicted, "discarded stale pending transactions");
        }
    }
}

/// Read/write set under construction during simulation.
struct Simulation<'a> {
    state: &'a LedgerState,
    reads: Vec<KeyRead>,
    writes: Vec<KeyWrite>,
}

impl<'a> Simulation<'a> {
    fn new(state: &'a LedgerState) -> Self {
        Self {
            state,
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    fn read(&mut self, key: String) -> Option<&'a str> {
        let version = self.state.version(&key);
        let value = self.state.get(&key);
        self.reads.push(KeyRead { key, version });
        value
    }

    fn write(&mut self, key: String, value: String) {
        self.writes.push(KeyWrite {
            key,
            value: value.into_bytes(),
        });
    }
}

/// In-memory ledger with optional JSON persistence of world state.
#[derive(Debug)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    config: LedgerConfig,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            config,
        }
    }

    /// Creates a ledger, loading world state from `config.state_path` if it exists.
    ///
    /// # Errors
    /// Returns an error if the state file exists but cannot be parsed.
    pub fn open(config: LedgerConfig) -> Result<Self> {
        let ledger = Self::new(config);
        if let Some(path) = ledger.state_path().filter(|p| p.exists()) {
            let content = std::fs::read_to_string(&path)?;
            let world: BTreeMap<String, Versioned> = serde_json::from_str(&content)
                .map_err(|e| LedgerError::state(format!("{}: {e}", path.display())))?;
            tracing::debug!(path = %path.display(), keys = world.len(), "loaded ledger state");
            ledger.state.lock().world = world;
        }
        Ok(ledger)
    }

    fn state_path(&self) -> Option<PathBuf> {
        self.config
            .state_path
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Writes world state to `config.state_path`, if set.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = self.state_path() else {
            return Ok(());
        };
        let json = {
            let state = self.state.lock();
            serde_json::to_string_pretty(&state.world)?
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, json)?;
        Ok(())
    }

    /// Returns a committed model update.
    #[must_use]
    pub fn model_update(&self, hash: &str) -> Option<ModelUpdate> {
        let state = self.state.lock();
        state
            .get(&format!("{MODEL_PREFIX}{hash}"))
            .and_then(|json| serde_json::from_str(json).ok())
    }

    /// Returns a committed device.
    #[must_use]
    pub fn device(&self, device_id: &str) -> Option<DeviceRecord> {
        let state = self.state.lock();
        state
            .get(&format!("{DEVICE_PREFIX}{device_id}"))
            .and_then(|json| serde_json::from_str(json).ok())
    }

    /// Number of committed model updates.
    #[must_use]
    pub fn model_update_count(&self) -> usize {
        let state = self.state.lock();
        state.world.keys().filter(|k| k.starts_with(MODEL_PREFIX)).count()
    }

    /// Number of submitted transactions awaiting a status call.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    fn simulate(&self, proposal: &Proposal) -> std::result::Result<Endorsement, RemoteError> {
        if proposal.signature.is_empty() || proposal.creator.is_empty() {
            return Err(RemoteError::new("access denied: proposal is not signed"));
        }

        let mut state = self.state.lock();
        let window = Duration::from_millis(self.config.enroll_window_ms);
        let recent = state.recent_enrollments(window, Instant::now());

        let mut sim = Simulation::new(&state);
        let result = match proposal.function.as_str() {
            "CreateModelUpdate" => create_model_update(&mut sim, &proposal.args)?,
            "ReadModelUpdate" => read_model_update(&mut sim, &proposal.args)?,
            "ModelUpdateExists" => {
                let [hash] = expect_args::<1>("ModelUpdateExists", &proposal.args)?;
                let exists = sim.read(format!("{MODEL_PREFIX}{hash}")).is_some();
                exists.to_string()
            }
            "EnrollDevice" => {
                if recent >= self.config.enroll_rate_limit as usize {
                    return Err(RemoteError::new(format!(
                        "enrollment rate limit exceeded: {} per {}ms",
                        self.config.enroll_rate_limit, self.config.enroll_window_ms
                    )));
                }
                enroll_device(&mut sim, &proposal.args, &proposal.creator)?
            }
            other => {
                return Err(RemoteError::new(format!(
                    "function {other} not found in chaincode {}",
                    proposal.chaincode
                )));
            }
        };

        Ok(Endorsement {
            tx_id: proposal.tx_id.clone(),
            channel: proposal.channel.clone(),
            reads: sim.reads,
            writes: sim.writes,
            result: result.into_bytes(),
        })
    }
}

fn expect_args<const N: usize>(
    function: &str,
    args: &[String],
) -> std::result::Result<[String; N], RemoteError> {
    <[String; N]>::try_from(args.to_vec()).map_err(|_| {
        RemoteError::new(format!(
            "incorrect number of arguments for {function}: expected {N}, got {}",
            args.len()
        ))
    })
}

fn to_json<T: Serialize>(value: &T) -> std::result::Result<String, RemoteError> {
    serde_json::to_string(value).map_err(|e| RemoteError::new(format!("serialization failed: {e}")))
}

fn create_model_update(sim: &mut Simulation<'_>, args: &[String]) -> std::result::Result<String, RemoteError> {
    let [hash, timestamp, node_id] = expect_args::<3>("CreateModelUpdate", args)?;
    let key = format!("{MODEL_PREFIX}{hash}");
    if sim.read(key.clone()).is_some() {
        return Err(RemoteError::new(format!("The model hash {hash} already exists")));
    }
    let update = ModelUpdate {
        hash,
        timestamp,
        node_id,
    };
    sim.write(key, to_json(&update)?);
    Ok(String::new())
}

fn read_model_update(sim: &mut Simulation<'_>, args: &[String]) -> std::result::Result<String, RemoteError> {
    let [hash] = expect_args::<1>("ReadModelUpdate", args)?;
    sim.read(format!("{MODEL_PREFIX}{hash}"))
        .map(str::to_string)
        .ok_or_else(|| RemoteError::new(format!("Model update {hash} does not exist")))
}

fn enroll_device(
    sim: &mut Simulation<'_>,
    args: &[String],
    creator: &str,
) -> std::result::Result<String, RemoteError> {
    let [device_id, public_key, device_type, timestamp] = expect_args::<4>("EnrollDevice", args)?;

    let device_key = format!("{DEVICE_PREFIX}{device_id}");
    if sim.read(device_key.clone()).is_some() {
        return Err(RemoteError::new(format!("device {device_id} already exists")));
    }
    let pubkey_key = format!("{PUBKEY_PREFIX}{public_key}");
    if let Some(owner) = sim.read(pubkey_key.clone()) {
        return Err(RemoteError::new(format!(
            "public key {public_key} is already in use by device {owner}"
        )));
    }

    let record = DeviceRecord {
        device_id: device_id.clone(),
        public_key,
        device_type,
        timestamp,
        owner: creator.to_string(),
    };
    sim.write(device_key, to_json(&record)?);
    sim.write(pubkey_key, device_id);
    Ok(String::new())
}

#[async_trait]
impl GatewayBackend for InMemoryLedger {
    async fn evaluate(&self, proposal: &Proposal) -> std::result::Result<Vec<u8>, RemoteError> {
        self.simulate(proposal).map(|e| e.result)
    }

    async fn endorse(&self, proposal: &Proposal) -> std::result::Result<Endorsement, RemoteError> {
        if self.config.endorse_latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.endorse_latency_ms)).await;
        }
        self.simulate(proposal)
    }

    async fn submit(&self, endorsement: Endorsement) -> std::result::Result<String, RemoteError> {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.evict_stale(Duration::from_millis(self.config.pending_ttl_ms), now);

        let tx_id = endorsement.tx_id.clone();
        if state.pending.contains_key(&tx_id) {
            return Err(RemoteError::new(format!("duplicate transaction id {tx_id}")));
        }
        state.pending.insert(
            tx_id.clone(),
            Pending {
                endorsement,
                submitted: now,
            },
        );
        Ok(tx_id)
    }

    /// Validates and applies a submitted transaction. The status is
    /// delivered once; a transaction whose status call is abandoned
    /// mid-commit is discarded.
    async fn commit_status(&self, tx_id: &str) -> std::result::Result<CommitStatus, RemoteError> {
        let endorsement = self
            .state
            .lock()
            .pending
            .remove(tx_id)
            .map(|p| p.endorsement)
            .ok_or_else(|| RemoteError::new(format!("transaction {tx_id} not found")))?;

        if self.config.commit_latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.commit_latency_ms)).await;
        }

        let mut state = self.state.lock();

        let conflict = endorsement
            .reads
            .iter()
            .any(|read| state.version(&read.key) != read.version);

        let status = if conflict {
            CommitStatus::Invalid("MVCC_READ_CONFLICT".to_string())
        } else {
            let mut enrolled = false;
            for write in endorsement.writes {
                enrolled |= write.key.starts_with(DEVICE_PREFIX);
                let version = state.version(&write.key) + 1;
                state.world.insert(
                    write.key,
                    Versioned {
                        value: String::from_utf8_lossy(&write.value).into_owned(),
                        version,
                    },
                );
            }
            if enrolled {
                state.enrollments.push_back(Instant::now());
            }
            CommitStatus::Valid
        };

        Ok(status)
    }
}
