use std::path::Path;

use ringsync_core::config::load_resolved_at;
use ringsync_core::ResolvedConfig;
use ringsync_sync::pipeline::{self, ReconcileScope};
use ringsync_sync::{from_kind, Replicator};

use crate::error::{DaemonError, Phase};

/// Output format for daemon logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Start the daemon in the foreground and block until it fails.
///
/// Phases run in order: startup (configuration), reconciliation, graph
/// construction, then the event loop. The returned error is tagged with the
/// phase it escaped from and has already been logged.
pub fn start_blocking(config_path: &Path, log_format: LogFormat) -> Result<(), DaemonError> {
    init_tracing(log_format);
    let result = run(config_path);
    if let Err(err) = &result {
        let phase = err.phase().map(|phase| phase.to_string());
        tracing::error!(phase = phase.as_deref().unwrap_or("unknown"), "{err}");
    }
    result
}

/// Every phase up to and including the event loop, without tracing setup.
pub fn run(config_path: &Path) -> Result<(), DaemonError> {
    let config = load_resolved_at(config_path)
        .map_err(|err| DaemonError::from(err).in_phase(Phase::Startup))?;
    tracing::info!(
        clients = config.clients.len(),
        tracked = config.tracked.len(),
        "loaded configuration from {}",
        config_path.display()
    );

    let replicator = from_kind(&config.replicator);
    reconcile(&config, &replicator).map_err(|err| err.in_phase(Phase::Reconciliation))?;
    serve(config, replicator)
}

fn reconcile(config: &ResolvedConfig, replicator: &dyn Replicator) -> Result<(), DaemonError> {
    let results = pipeline::run(config, replicator, ReconcileScope::All, false)?;
    let writes: usize = results.iter().map(|result| result.writes()).sum();
    tracing::info!(
        tracked = results.len(),
        replicated = writes,
        "reconciliation complete"
    );
    Ok(())
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn serve<R: Replicator>(config: ResolvedConfig, replicator: R) -> Result<(), DaemonError> {
    use crate::inotify::InotifyNotifier;
    use crate::mirror::Mirror;

    let mut mirror = Mirror::build(
        InotifyNotifier::new(config.follow_writes),
        config.clients,
        &config.tracked,
        replicator,
        config.follow_writes,
    )
    .map_err(|err| err.in_phase(Phase::GraphConstruction))?;
    mirror.run().map_err(|err| err.in_phase(Phase::Propagation))
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn serve<R: Replicator>(_config: ResolvedConfig, _replicator: R) -> Result<(), DaemonError> {
    Err(DaemonError::Unsupported.in_phase(Phase::GraphConstruction))
}

/// Install the global subscriber on stderr. `RUST_LOG` overrides the
/// default `info`. Records from crates using the `log` facade are forwarded
/// as well.
pub fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
