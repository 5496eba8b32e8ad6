//! Load orchestration against the model contract.
//!
//! # Toyota Way: Heijunka (平準化)
//! Level loading to understand capacity limits.
//!
//! # Implementation
//! `C` concurrent workers, each issuing its share of `N` sequential
//! `CreateModelUpdate` submissions with fixed pacing. Results land in a shared
//! [`RunContext`]; a [`ResourceSampler`] runs from before the first worker
//! starts until after the last one joins.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ledgerload_core::{
    ConnectionProvider, LoadConfig, ResourceSample, TransactionClient, TransactionResult,
    TransferCounter, content_hash, epoch_millis, rfc3339_now,
};
use ledgerload_observe::ResourceSampler;
use parking_lot::Mutex;
use tokio::task::JoinError;

use crate::error::{Result, TestError};
use crate::stats::{AggregatedStatistics, RunTotals, aggregate};

const CREATE_MODEL_UPDATE: &str = "CreateModelUpdate";

/// Shared state of one run, owned by the orchestrator and lent to workers.
#[derive(Debug)]
pub struct RunContext {
    results: Mutex<Vec<TransactionResult>>,
    transfer: TransferCounter,
    bytes_per_transaction: u64,
}

impl RunContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new(bytes_per_transaction: u64) -> Self {
        Self {
            results: Mutex::new(Vec::new()),
            transfer: TransferCounter::new(),
            bytes_per_transaction,
        }
    }

    /// Appends a result; successes also count their assumed payload.
    pub fn record(&self, result: TransactionResult) {
        if result.is_success() {
            self.transfer.add(self.bytes_per_transaction);
        }
        self.results.lock().push(result);
    }

    /// Byte counter shared with the sampler.
    #[must_use]
    pub const fn transfer(&self) -> &TransferCounter {
        &self.transfer
    }

    /// Number of results recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_results(&self) -> Vec<TransactionResult> {
        std::mem::take(&mut *self.results.lock())
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct LoadRun {
    /// RFC 3339 start of the measured run.
    pub started_at: String,
    /// Wall-clock duration from sampler start to worker join.
    pub duration: Duration,
    /// Per-transaction results, in completion order.
    pub results: Vec<TransactionResult>,
    /// Resource samples, in tick order.
    pub samples: Vec<ResourceSample>,
    /// Cumulative bytes counted.
    pub total_bytes: u64,
}

impl LoadRun {
    /// Number of committed transactions.
    #[must_use]
    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Aggregates the run.
    #[must_use]
    pub fn statistics(&self, bytes_per_transaction: u64, memory_total: u64) -> AggregatedStatistics {
        aggregate(
            &self.results,
            &self.samples,
            RunTotals {
                duration: self.duration,
                total_bytes: self.total_bytes,
                bytes_per_transaction,
                memory_total,
            },
        )
    }
}

/// Outcome of the measured phase.
struct Measured {
    join_error: Option<JoinError>,
    samples: Vec<ResourceSample>,
}

/// Drives a load run.
pub struct LoadOrchestrator {
    config: LoadConfig,
    provider: Arc<dyn ConnectionProvider>,
}

impl LoadOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(config: LoadConfig, provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { config, provider }
    }

    /// Returns the load config.
    #[must_use]
    pub const fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Runs warm-up, then the measured run.
    ///
    /// # Load Test Phases (Toyota Way: Heijunka)
    /// 1. Warm-up: unmeasured transactions on one connection
    /// 2. Steady-state: all workers active, sampler running
    /// 3. Join: sampler stopped after the last worker finishes
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or a worker task
    /// panics. Transaction failures are recorded, never returned.
    pub async fn run(&self) -> Result<LoadRun> {
        self.config.validate()?;

        tracing::info!(
            total = self.config.total_transactions,
            clients = self.config.concurrent_clients,
            per_client = self.config.transactions_per_client(),
            think_time_ms = self.config.think_time_ms,
            "starting load test"
        );

        self.warmup().await;

        let ctx = Arc::new(RunContext::new(self.config.bytes_per_transaction));
        let started_at = rfc3339_now();
        let start = Instant::now();

        let measured = self.measure(&ctx).await?;
        if let Some(e) = measured.join_error {
            tracing::warn!(samples = measured.samples.len(), "discarding samples of failed run");
            return Err(TestError::Join(e));
        }
        let samples = measured.samples;
        let duration = start.elapsed();
        let results = ctx.take_results();

        tracing::info!(
            results = results.len(),
            samples = samples.len(),
            duration = ?duration,
            "load test completed"
        );

        Ok(LoadRun {
            started_at,
            duration,
            results,
            samples,
            total_bytes: ctx.transfer().total(),
        })
    }

    /// Runs the workers under the sampler. The sampler is stopped after the
    /// join whether or not every worker completed.
    async fn measure(&self, ctx: &Arc<RunContext>) -> Result<Measured> {
        let sampler = ResourceSampler::new(
            Duration::from_millis(self.config.measurement_interval_ms),
            ctx.transfer().clone(),
        )
        .start();

        let mut handles = Vec::with_capacity(self.config.concurrent_clients as usize);
        for client_id in 0..self.config.concurrent_clients {
            let worker = Worker {
                client_id,
                assigned: self.config.assigned_to(client_id),
                think_time: Duration::from_millis(self.config.think_time_ms),
                reconnect: self.config.reconnect_per_transaction,
                provider: Arc::clone(&self.provider),
                ctx: Arc::clone(ctx),
            };
            handles.push(tokio::spawn(worker.run()));
        }

        let mut join_error = None;
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "worker task failed");
                join_error.get_or_insert(e);
            }
        }

        let samples = sampler.stop().await?;
        Ok(Measured { join_error, samples })
    }

    async fn warmup(&self) {
        let count = self.config.warmup_transactions;
        if count == 0 {
            return;
        }

        let client = match self.provider.connect().await {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "warm-up skipped: no connection");
                return;
            }
        };

        tracing::info!(transactions = count, "warming up");
        let mut failed = 0u32;
        for i in 0..count {
            let hash = unique_hash("warmup", i);
            let args = [hash, rfc3339_now(), "warmup".to_string()];
            if client.submit(CREATE_MODEL_UPDATE, &args).await.is_err() {
                failed += 1;
            }
        }
        tracing::info!(transactions = count, failed, "warm-up complete");
    }
}

/// SHA-256 over a label, index, wall-clock and a random nonce.
fn unique_hash(label: &str, index: u32) -> String {
    content_hash(&format!(
        "{label}_tx_{index}_{}_{}",
        epoch_millis(),
        uuid::Uuid::new_v4().simple()
    ))
}

struct Worker {
    client_id: u32,
    assigned: u32,
    think_time: Duration,
    reconnect: bool,
    provider: Arc<dyn ConnectionProvider>,
    ctx: Arc<RunContext>,
}

impl Worker {
    async fn run(self) {
        tracing::info!(client_id = self.client_id, transactions = self.assigned, "client processing");

        let mut connection: Option<Arc<dyn TransactionClient>> = None;
        for index in 0..self.assigned {
            let cached = if self.reconnect { None } else { connection.clone() };
            let client = match cached {
                Some(client) => client,
                None => match self.provider.connect().await {
                    Ok(client) => {
                        connection = Some(Arc::clone(&client));
                        client
                    }
                    Err(e) => {
                        self.fail(index, e.to_string());
                        tokio::time::sleep(self.think_time).await;
                        continue;
                    }
                },
            };

            self.transact(client.as_ref(), index).await;
            tokio::time::sleep(self.think_time).await;
        }

        tracing::info!(client_id = self.client_id, "client completed");
    }

    async fn transact(&self, client: &dyn TransactionClient, index: u32) {
        let hash = unique_hash(&format!("test_client_{}", self.client_id), index);
        let args = [hash.clone(), rfc3339_now(), format!("client_{}", self.client_id)];

        let timestamp_ms = epoch_millis();
        let started = Instant::now();
        match client.submit(CREATE_MODEL_UPDATE, &args).await {
            Ok(()) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                self.ctx.record(TransactionResult::success(
                    self.client_id,
                    timestamp_ms,
                    latency_ms,
                    Some(hash),
                ));
            }
            Err(e) => self.fail(index, e.to_string()),
        }
    }

    fn fail(&self, index: u32, reason: String) {
        tracing::warn!(client_id = self.client_id, transaction = index, %reason, "transaction failed");
        self.ctx
            .record(TransactionResult::failure(self.client_id, epoch_millis(), reason));
    }
}
