//! Adversarial (Sybil) test runner.
//!
//! Replays three scripted attack sequences through one transaction client
//! and counts every rejection as blocked:
//!
//! - **A, Identity Multiplication**: a burst of enrollments with no pause
//! - **B, Credential Cloning**: enrollments reusing a legitimate device's key
//! - **C, Collusion**: the same model hash submitted more than once
//!
//! A rejection whose cause differs from the one the category expects is
//! still blocked; its reason is kept verbatim in the report logs.

use std::fmt;
use std::time::Instant;

use ledgerload_core::{
    AdversarialConfig, RejectionKind, TransactionClient, content_hash, epoch_millis, rfc3339_now,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

const ENROLL_DEVICE: &str = "EnrollDevice";
const CREATE_MODEL_UPDATE: &str = "CreateModelUpdate";

/// Attack sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackCategory {
    /// Rapid identity creation.
    IdentityMultiplication,
    /// Credential reuse.
    CredentialCloning,
    /// Duplicate submission.
    Collusion,
}

impl AttackCategory {
    /// All categories in run order.
    pub const ALL: [Self; 3] = [
        Self::IdentityMultiplication,
        Self::CredentialCloning,
        Self::Collusion,
    ];

    /// Report name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::IdentityMultiplication => "Identity Multiplication",
            Self::CredentialCloning => "Credential Cloning",
            Self::Collusion => "Collusion",
        }
    }

    /// Tag used in report logs.
    #[must_use]
    pub const fn log_type(&self) -> &'static str {
        match self {
            Self::IdentityMultiplication => "TypeA",
            Self::CredentialCloning => "TypeB",
            Self::Collusion => "TypeC",
        }
    }

    /// Defence the category exercises, as shown in the summary.
    #[must_use]
    pub const fn defence(&self) -> &'static str {
        match self {
            Self::IdentityMultiplication => "Rate Limiting",
            Self::CredentialCloning => "Credential Cloning",
            Self::Collusion => "Collusion",
        }
    }

    /// Rejection the contract is expected to produce.
    #[must_use]
    pub const fn expected_rejection(&self) -> RejectionKind {
        match self {
            Self::IdentityMultiplication => RejectionKind::RateLimited,
            Self::CredentialCloning => RejectionKind::DuplicateKey,
            Self::Collusion => RejectionKind::DuplicateHash,
        }
    }
}

/// Attempted/blocked tally of one category.
///
/// `blocked <= attempted` holds for every value, including deserialized ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAttackRecord")]
pub struct AttackRecord {
    name: String,
    attempted: u32,
    blocked: u32,
}

#[derive(Deserialize)]
struct RawAttackRecord {
    name: String,
    attempted: u32,
    blocked: u32,
}

impl TryFrom<RawAttackRecord> for AttackRecord {
    type Error = String;

    fn try_from(raw: RawAttackRecord) -> std::result::Result<Self, Self::Error> {
        if raw.blocked > raw.attempted {
            return Err(format!(
                "{}: blocked ({}) exceeds attempted ({})",
                raw.name, raw.blocked, raw.attempted
            ));
        }
        Ok(Self {
            name: raw.name,
            attempted: raw.attempted,
            blocked: raw.blocked,
        })
    }
}

impl AttackRecord {
    /// Creates an empty tally for a category.
    #[must_use]
    pub fn new(category: AttackCategory) -> Self {
        Self {
            name: category.name().to_string(),
            attempted: 0,
            blocked: 0,
        }
    }

    /// Counts one attempt.
    pub fn record(&mut self, blocked: bool) {
        self.attempted += 1;
        if blocked {
            self.blocked += 1;
        }
    }

    /// Category name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attempts made.
    #[must_use]
    pub const fn attempted(&self) -> u32 {
        self.attempted
    }

    /// Attempts rejected.
    #[must_use]
    pub const fn blocked(&self) -> u32 {
        self.blocked
    }

    /// Blocked share in percent, 0 with no attempts.
    #[must_use]
    pub fn block_percent(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            100.0 * f64::from(self.blocked) / f64::from(self.attempted)
        }
    }
}

/// Tallies of all three categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attacks {
    /// Identity multiplication.
    #[serde(rename = "typeA")]
    pub type_a: AttackRecord,
    /// Credential cloning.
    #[serde(rename = "typeB")]
    pub type_b: AttackRecord,
    /// Collusion.
    #[serde(rename = "typeC")]
    pub type_c: AttackRecord,
}

impl Default for Attacks {
    fn default() -> Self {
        Self {
            type_a: AttackRecord::new(AttackCategory::IdentityMultiplication),
            type_b: AttackRecord::new(AttackCategory::CredentialCloning),
            type_c: AttackRecord::new(AttackCategory::Collusion),
        }
    }
}

impl Attacks {
    /// Tally of one category.
    #[must_use]
    pub const fn get(&self, category: AttackCategory) -> &AttackRecord {
        match category {
            AttackCategory::IdentityMultiplication => &self.type_a,
            AttackCategory::CredentialCloning => &self.type_b,
            AttackCategory::Collusion => &self.type_c,
        }
    }

    fn get_mut(&mut self, category: AttackCategory) -> &mut AttackRecord {
        match category {
            AttackCategory::IdentityMultiplication => &mut self.type_a,
            AttackCategory::CredentialCloning => &mut self.type_b,
            AttackCategory::Collusion => &mut self.type_c,
        }
    }
}

/// Per-attempt latencies in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    /// Category A enrollments.
    pub enrollments: Vec<u64>,
    /// Category C submissions.
    pub model_updates: Vec<u64>,
}

/// One rejection or finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// `TypeA`, `TypeB` or `TypeC`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Remote reason, verbatim.
    pub message: String,
}

/// Overall figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Attempts across all categories.
    pub total_attacks: u32,
    /// Rejections across all categories.
    pub total_blocked: u32,
    /// `total_blocked / total_attacks`, in `[0, 1]`.
    pub prevention_rate: f64,
    /// Mean enrollment latency.
    pub avg_enrollment_time: f64,
    /// Mean model-update latency.
    pub avg_model_update_time: f64,
}

fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<u64>() as f64 / values.len() as f64
    }
}

impl Summary {
    /// Derives the summary; empty inputs resolve to 0.
    #[must_use]
    pub fn compute(attacks: &Attacks, performance: &Performance) -> Self {
        let (total_attacks, total_blocked) = AttackCategory::ALL
            .iter()
            .map(|c| attacks.get(*c))
            .fold((0, 0), |(a, b), r| (a + r.attempted(), b + r.blocked()));

        let prevention_rate = if total_attacks == 0 {
            0.0
        } else {
            f64::from(total_blocked) / f64::from(total_attacks)
        };

        Self {
            total_attacks,
            total_blocked,
            prevention_rate,
            avg_enrollment_time: mean(&performance.enrollments),
            avg_model_update_time: mean(&performance.model_updates),
        }
    }
}

/// Persisted adversarial report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdversarialReport {
    /// RFC 3339 start of the run.
    pub test_date: String,
    /// Run id, embedded in every device id.
    pub test_id: u64,
    /// Per-category tallies.
    pub attacks: Attacks,
    /// Latencies.
    pub performance: Performance,
    /// Rejections and findings.
    pub logs: Vec<LogEntry>,
    /// Overall figures.
    pub summary: Summary,
}

impl fmt::Display for AdversarialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== RESULTS ===")?;
        for (tag, category) in ["A", "B", "C"].iter().zip(AttackCategory::ALL) {
            let record = self.attacks.get(category);
            writeln!(
                f,
                "Type {tag} ({}): {}/{} blocked ({:.1}%)",
                category.defence(),
                record.blocked(),
                record.attempted(),
                record.block_percent()
            )?;
        }
        write!(
            f,
            "Overall Prevention Rate: {:.1}%",
            self.summary.prevention_rate * 100.0
        )
    }
}

/// Runs the three attack sequences.
pub struct AdversarialRunner<'a> {
    client: &'a dyn TransactionClient,
    config: AdversarialConfig,
    test_id: u64,
    timestamp: String,
    attacks: Attacks,
    performance: Performance,
    logs: Vec<LogEntry>,
}

impl<'a> AdversarialRunner<'a> {
    /// Creates a runner; the test id is the current epoch milliseconds.
    #[must_use]
    pub fn new(client: &'a dyn TransactionClient, config: AdversarialConfig) -> Self {
        Self {
            client,
            config,
            test_id: epoch_millis(),
            timestamp: rfc3339_now(),
            attacks: Attacks::default(),
            performance: Performance::default(),
            logs: Vec::new(),
        }
    }

    /// Overrides the test id.
    #[must_use]
    pub const fn with_test_id(mut self, test_id: u64) -> Self {
        self.test_id = test_id;
        self
    }

    /// Runs A, B then C and returns the report. Rejections are tallied,
    /// never returned.
    pub async fn run(mut self) -> AdversarialReport {
        tracing::info!(test_id = self.test_id, "starting Sybil resistance test");

        self.identity_multiplication().await;
        self.credential_cloning().await;
        self.collusion().await;

        let summary = Summary::compute(&self.attacks, &self.performance);
        tracing::info!(
            attacks = summary.total_attacks,
            blocked = summary.total_blocked,
            prevention_rate = summary.prevention_rate,
            "Sybil resistance test completed"
        );

        AdversarialReport {
            test_date: self.timestamp,
            test_id: self.test_id,
            attacks: self.attacks,
            performance: self.performance,
            logs: self.logs,
            summary,
        }
    }

    async fn identity_multiplication(&mut self) {
        let category = AttackCategory::IdentityMultiplication;
        tracing::info!(category = category.name(), "testing type A");

        for i in 0..self.config.burst_size {
            let device_id = format!("rapid-{}-{i}", self.test_id);
            let key = random_key(16);
            let started = Instant::now();
            let outcome = self.enroll(&device_id, &key).await;
            self.performance.enrollments.push(started.elapsed().as_millis() as u64);
            self.tally(category, i, outcome);
        }
    }

    async fn credential_cloning(&mut self) {
        let category = AttackCategory::CredentialCloning;
        tracing::info!(category = category.name(), "testing type B");

        let key = random_key(32);
        let legit = format!("legit-{}", self.test_id);
        match self.enroll(&legit, &key).await {
            Ok(()) => tracing::info!(device = %legit, "legitimate device enrolled"),
            Err(reason) => tracing::warn!(device = %legit, %reason, "legitimate device enrollment failed"),
        }

        for i in 0..self.config.clone_attempts {
            let device_id = format!("clone-{}-{i}", self.test_id);
            let outcome = self.enroll(&device_id, &key).await;
            if outcome.is_ok() {
                tracing::warn!(device = %device_id, "clone enrolled - SECURITY ISSUE");
                self.logs.push(LogEntry {
                    kind: category.log_type().to_string(),
                    message: format!("clone {device_id} enrolled with a reused key - SECURITY ISSUE"),
                });
            }
            self.tally(category, i, outcome);
        }
    }

    async fn collusion(&mut self) {
        let category = AttackCategory::Collusion;
        tracing::info!(category = category.name(), "testing type C");

        let hash = content_hash(&format!("coordinated-model-{}", self.test_id));
        let node_id = format!("legit-{}", self.test_id);
        for i in 0..self.config.duplicate_submissions {
            let args = [hash.clone(), self.timestamp.clone(), node_id.clone()];
            let started = Instant::now();
            let outcome = self
                .client
                .submit(CREATE_MODEL_UPDATE, &args)
                .await
                .map_err(|e| e.reason().to_string());
            self.performance.model_updates.push(started.elapsed().as_millis() as u64);
            self.tally(category, i, outcome);
        }
    }

    async fn enroll(&self, device_id: &str, key: &str) -> std::result::Result<(), String> {
        let args = [
            device_id.to_string(),
            key.to_string(),
            self.config.device_type.clone(),
            self.timestamp.clone(),
        ];
        self.client
            .submit(ENROLL_DEVICE, &args)
            .await
            .map_err(|e| e.reason().to_string())
    }

    fn tally(&mut self, category: AttackCategory, attempt: u32, outcome: std::result::Result<(), String>) {
        match outcome {
            Ok(()) => {
                self.attacks.get_mut(category).record(false);
                tracing::info!(category = category.log_type(), attempt, "accepted");
            }
            Err(reason) => {
                self.attacks.get_mut(category).record(true);
                let kind = RejectionKind::classify(&reason);
                if kind == category.expected_rejection() {
                    tracing::info!(category = category.log_type(), attempt, %kind, "blocked");
                } else {
                    tracing::warn!(
                        category = category.log_type(),
                        attempt,
                        %kind,
                        %reason,
                        "blocked for an unexpected reason; review manually"
                    );
                }
                self.logs.push(LogEntry {
                    kind: category.log_type().to_string(),
                    message: reason,
                });
            }
        }
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Random lowercase hex key of `len` characters.
fn random_key(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())]))
        .collect()
}
