// # ifsyncd
//
// Daemon binary wiring the reconciliation engine to the host:
// the iproute2 adapter for interface control, the dhcpcd client
// for address leases, and a process-wide readiness flag.
//
// ## Configuration
//
// Environment variables:
//   - `IFSYNC_CONFIG`: path to the engine configuration JSON (required)
//   - `IFSYNC_LOG_LEVEL`: trace | debug | info | warn | error (default: info)
//   - `IFSYNC_IP_CMD`: override path to the `ip` binary
//   - `IFSYNC_DHCPCD_CMD`: override path to the `dhcpcd` binary
//
// The configuration file deserializes into `ifsync_core::EngineConfig`:
// interface entries, required interfaces, open mode, DNS publishing and
// lease store settings.
//
// ## Lifecycle
//
// Startup runs the configure walk once, then forwards link monitor events
// into the engine until SIGTERM or SIGINT arrives. Engine events are
// drained to the log so operators can follow address changes without a
// control channel attached.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio_stream::StreamExt;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use ifsync_core::{
    AdapterControl, ConnectionStatus, EngineConfig, EngineEvent, LeaseClient, ReconcileEngine,
    SharedReadinessFlag,
};

/// Exit codes for the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IfsyncExitCode {
    /// Clean shutdown after a termination signal
    CleanShutdown = 0,
    /// Configuration was missing or invalid
    ConfigError = 1,
    /// Startup or runtime failure
    RuntimeError = 2,
}

impl From<IfsyncExitCode> for ExitCode {
    fn from(code: IfsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration resolved from the environment
#[derive(Debug, Clone)]
struct DaemonConfig {
    /// Path to the engine configuration JSON
    config_path: PathBuf,
    /// Log level name
    log_level: String,
    /// Optional override for the `ip` binary path
    ip_cmd: Option<String>,
    /// Optional override for the `dhcpcd` binary path
    dhcpcd_cmd: Option<String>,
}

impl DaemonConfig {
    fn from_env() -> Result<Self> {
        let config_path = std::env::var("IFSYNC_CONFIG")
            .context("IFSYNC_CONFIG environment variable is required")?;

        Ok(Self {
            config_path: PathBuf::from(config_path),
            log_level: std::env::var("IFSYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            ip_cmd: std::env::var("IFSYNC_IP_CMD").ok(),
            dhcpcd_cmd: std::env::var("IFSYNC_DHCPCD_CMD").ok(),
        })
    }

    fn validate(&self) -> Result<()> {
        if parse_log_level(&self.log_level).is_none() {
            bail!(
                "Invalid IFSYNC_LOG_LEVEL '{}' (expected trace, debug, info, warn or error)",
                self.log_level
            );
        }
        if !self.config_path.is_file() {
            bail!(
                "IFSYNC_CONFIG does not point at a readable file: {}",
                self.config_path.display()
            );
        }
        Ok(())
    }
}

fn parse_log_level(name: &str) -> Option<Level> {
    match name.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match DaemonConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return IfsyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return IfsyncExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IfsyncExitCode::ConfigError.into();
    }

    info!("Starting ifsyncd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IfsyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            IfsyncExitCode::RuntimeError
        } else {
            IfsyncExitCode::CleanShutdown
        }
    });

    result.into()
}

async fn run_daemon(config: DaemonConfig) -> Result<()> {
    let raw = tokio::fs::read_to_string(&config.config_path)
        .await
        .with_context(|| format!("Failed to read {}", config.config_path.display()))?;
    let engine_config: EngineConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", config.config_path.display()))?;

    info!(
        "Configuration loaded: {} interface(s), {} required, open={}",
        engine_config.interfaces.len(),
        engine_config.required.len(),
        engine_config.open
    );

    let adapter = make_adapter(&config)?;
    let leases = make_lease_client(&config)?;
    let signal = Arc::new(SharedReadinessFlag::default());

    let (engine, mut events) =
        ReconcileEngine::new(adapter.clone(), leases, signal, engine_config)?;

    // Drain engine events into the log. Spawned before configure so the
    // startup walk never runs against a full channel.
    let drain = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_engine_event(&event);
        }
    });

    // Subscribe to link events before the configure walk so changes that
    // land mid-walk are buffered rather than lost.
    let mut link_events = adapter.watch();

    engine.configure().await.context("Configure walk failed")?;

    let forwarder = {
        let engine = engine.clone();
        tokio::spawn(async move {
            while let Some(event) = link_events.next().await {
                debug!(
                    "Forwarding link event: {} up={} running={}",
                    event.interface, event.up, event.running
                );
                if let Err(e) = engine
                    .on_adapter_event(&event.interface, event.up, event.running)
                    .await
                {
                    warn!("Failed to handle link event on {}: {}", event.interface, e);
                }
            }
            warn!("Link event stream ended");
        })
    };

    let signal_name = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal_name);
    info!("Shutting down daemon");

    forwarder.abort();
    drain.abort();
    Ok(())
}

fn log_engine_event(event: &EngineEvent) {
    match event {
        EngineEvent::ConnectionChanged { interface, status } => {
            let verb = match status {
                ConnectionStatus::Created => "created",
                ConnectionStatus::Updated => "updated",
            };
            info!("Connection {}: {}", verb, interface);
        }
        EngineEvent::AddressAssigned { interface, address } => {
            info!("Address assigned on {}: {}", interface, address);
        }
        EngineEvent::AddressesCleared { interface } => {
            info!("Addresses cleared on {}", interface);
        }
        EngineEvent::LeaseFailed { interface } => {
            warn!("Lease acquisition failed on {}", interface);
        }
        EngineEvent::ReadinessChanged { ready } => {
            info!("Network readiness changed to {}", ready);
        }
    }
}

#[cfg(feature = "iproute")]
fn make_adapter(config: &DaemonConfig) -> Result<Arc<dyn AdapterControl>> {
    use ifsync_adapter_iproute::IprouteAdapter;

    let adapter = match &config.ip_cmd {
        Some(path) => IprouteAdapter::with_command(path),
        None => IprouteAdapter::new(),
    };
    Ok(Arc::new(adapter))
}

#[cfg(not(feature = "iproute"))]
fn make_adapter(_config: &DaemonConfig) -> Result<Arc<dyn AdapterControl>> {
    bail!("Built without an adapter implementation (enable the iproute feature)")
}

#[cfg(feature = "dhcpcd")]
fn make_lease_client(config: &DaemonConfig) -> Result<Arc<dyn LeaseClient>> {
    use ifsync_lease_dhcpcd::DhcpcdClient;

    let client = match &config.dhcpcd_cmd {
        Some(path) => DhcpcdClient::with_command(path),
        None => DhcpcdClient::new(),
    };
    Ok(Arc::new(client))
}

#[cfg(not(feature = "dhcpcd"))]
fn make_lease_client(_config: &DaemonConfig) -> Result<Arc<dyn LeaseClient>> {
    bail!("Built without a lease client implementation (enable the dhcpcd feature)")
}

/// Wait for a termination signal
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for Ctrl-C")?;
    Ok("Ctrl-C")
}
