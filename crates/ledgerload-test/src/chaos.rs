//! Chaos injection for resilience testing.
//!
//! [`ChaosBackend`] sits in front of any [`GatewayBackend`] and delays or
//! rejects calls at configured probabilities, so deadline expiry and failure
//! recording can be exercised without a misbehaving network.
//!
//! # Reference
//! Netflix. (2012). Chaos Monkey. GitHub.
//! <https://github.com/Netflix/chaosmonkey>

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ledgerload_core::{
    CallKind, ChaosSettings, CommitStatus, Endorsement, GatewayBackend, Proposal, RemoteError,
};

/// Chaos injection configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChaosConfig {
    /// Latency injection: (probability, delay).
    pub latency_injection: Option<(f64, Duration)>,
    /// Error injection probability.
    pub error_injection: Option<f64>,
}

impl ChaosConfig {
    /// Creates a new chaos config with latency injection.
    #[must_use]
    pub fn latency(probability: f64, delay: Duration) -> Self {
        Self {
            latency_injection: Some((probability, delay)),
            ..Default::default()
        }
    }

    /// Creates a new chaos config with error injection.
    #[must_use]
    pub fn errors(probability: f64) -> Self {
        Self {
            error_injection: Some(probability),
            ..Default::default()
        }
    }

    /// Builds a config from the `[chaos]` settings section.
    #[must_use]
    pub fn from_settings(settings: &ChaosSettings) -> Self {
        Self {
            latency_injection: (settings.latency_probability > 0.0 && settings.latency_ms > 0)
                .then_some((settings.latency_probability, Duration::from_millis(settings.latency_ms))),
            error_injection: (settings.error_probability > 0.0).then_some(settings.error_probability),
        }
    }
}

/// Decides, per call, whether to inject a fault.
#[derive(Debug, Clone)]
pub struct ChaosInjector {
    config: ChaosConfig,
}

impl ChaosInjector {
    /// Creates a new chaos injector.
    #[must_use]
    pub const fn new(config: ChaosConfig) -> Self {
        Self { config }
    }

    /// Returns the chaos config.
    #[must_use]
    pub const fn config(&self) -> &ChaosConfig {
        &self.config
    }

    /// Injects latency if configured.
    pub async fn maybe_inject_latency(&self, kind: CallKind) {
        if let Some((probability, delay)) = self.config.latency_injection
            && rand_probability(probability)
        {
            tracing::debug!(%kind, ?delay, "injecting latency");
            tokio::time::sleep(delay).await;
        }
    }

    /// Returns true if an error should be injected.
    #[must_use]
    pub fn should_inject_error(&self, kind: CallKind) -> bool {
        if let Some(probability) = self.config.error_injection
            && rand_probability(probability)
        {
            tracing::debug!(%kind, "injecting error");
            return true;
        }
        false
    }

    async fn before(&self, kind: CallKind) -> Result<(), RemoteError> {
        self.maybe_inject_latency(kind).await;
        if self.should_inject_error(kind) {
            return Err(RemoteError::new(format!("chaos: injected failure during {kind}")));
        }
        Ok(())
    }
}

/// Probability check (not cryptographically secure).
fn rand_probability(p: f64) -> bool {
    if p <= 0.0 {
        return false;
    }
    if p >= 1.0 {
        return true;
    }
    rand::random::<f64>() < p
}

/// Gateway backend with fault injection in front of every call.
pub struct ChaosBackend {
    inner: Arc<dyn GatewayBackend>,
    injector: ChaosInjector,
}

impl ChaosBackend {
    /// Wraps a backend.
    #[must_use]
    pub fn new(inner: Arc<dyn GatewayBackend>, config: ChaosConfig) -> Self {
        tracing::warn!(?config, "chaos injection enabled");
        Self {
            inner,
            injector: ChaosInjector::new(config),
        }
    }

    /// Wraps a backend only if the settings enable any fault.
    #[must_use]
    pub fn wrap(inner: Arc<dyn GatewayBackend>, settings: &ChaosSettings) -> Arc<dyn GatewayBackend> {
        if settings.is_enabled() {
            Arc::new(Self::new(inner, ChaosConfig::from_settings(settings)))
        } else {
            inner
        }
    }
}

#[async_trait]
impl GatewayBackend for ChaosBackend {
    async fn evaluate(&self, proposal: &Proposal) -> Result<Vec<u8>, RemoteError> {
        self.injector.before(CallKind::Evaluate).await?;
        self.inner.evaluate(proposal).await
    }

    async fn endorse(&self, proposal: &Proposal) -> Result<Endorsement, RemoteError> {
        self.injector.before(CallKind::Endorse).await?;
        self.inner.endorse(proposal).await
    }

    async fn submit(&self, endorsement: Endorsement) -> Result<String, RemoteError> {
        self.injector.before(CallKind::Submit).await?;
        self.inner.submit(endorsement).await
    }

    async fn commit_status(&self, tx_id: &str) -> Result<CommitStatus, RemoteError> {
        self.injector.before(CallKind::CommitStatus).await?;
        self.inner.commit_status(tx_id).await
    }
}
