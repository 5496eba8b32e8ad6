//! Process setup shared by the binaries.

use std::process::ExitCode;
use std::sync::Arc;

use ledgerload_core::{GatewayBackend, HarnessConfig, InMemoryLedger};
use ledgerload_test::ChaosBackend;

/// Installs the `fmt` subscriber, filtered by `RUST_LOG` at `info` and above.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

/// Opens the in-process ledger and wraps it with chaos injection if enabled.
///
/// The concrete ledger is returned alongside so callers can persist it.
///
/// # Errors
/// Returns an error if the ledger state file exists but cannot be loaded.
pub fn open_backend(
    config: &HarnessConfig,
) -> ledgerload_core::Result<(Arc<InMemoryLedger>, Arc<dyn GatewayBackend>)> {
    match config.ledger.state_path.as_deref().filter(|p| !p.as_os_str().is_empty()) {
        Some(path) => tracing::info!(path = %path.display(), "ledger state file"),
        None => tracing::warn!("no ledger state file configured; state is lost at exit"),
    }
    let ledger = Arc::new(InMemoryLedger::open(config.ledger.clone())?);
    let backend = ChaosBackend::wrap(Arc::clone(&ledger) as Arc<dyn GatewayBackend>, &config.chaos);
    Ok((ledger, backend))
}

/// Maps a run outcome to a process exit code, logging the error.
pub fn exit_code<E: std::fmt::Display>(result: Result<(), E>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
