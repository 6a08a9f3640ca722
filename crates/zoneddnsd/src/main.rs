// # zoneddnsd - zoneddns Daemon
//
// This is a THIN integration layer. All reconciliation logic lives in
// zoneddns-core; this binary only wires components together.
//
// The zoneddnsd daemon is responsible for:
// 1. Reading settings from environment variables
// 2. Loading the zone/subdomain document (JSON)
// 3. Building the IP source, state store and per-domain provider clients
// 4. Running the engine until SIGTERM or SIGINT
//
// ## Configuration
//
// ### Files
// - `DDNS_CONFIG_PATH`: JSON document with `domains` and `subdomains` (default: config.json)
// - `DDNS_STATE_PATH`: Persisted IP file (default: ip.lock)
// - `DDNS_STATE_STORE_TYPE`: Type of state store (file, memory)
//
// ### IP Source
// - `DDNS_IP_SOURCE_URL`: URL returning the public IP as plaintext
// - `DDNS_IP_TIMEOUT_SECS`: Request timeout in seconds (1-60)
//
// ### Engine
// - `DDNS_INTERVAL_SECS`: Seconds between checks (10-86400)
// - `DDNS_PERSIST_POLICY`: before-reconcile or after-success
// - `DDNS_MODE`: live or dry-run
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// cat > /etc/zoneddns/config.json <<'EOF'
// {
//   "domains": {
//     "example.com": { "zone_id": "023e105f4ecef8ad9ca31a8372d0c353", "api_token": "..." }
//   },
//   "subdomains": {
//     "home": { "subdomain": "home", "domain": "example.com", "enabled": true }
//   }
// }
// EOF
//
// export DDNS_CONFIG_PATH=/etc/zoneddns/config.json
// export DDNS_STATE_PATH=/var/lib/zoneddns/ip.lock
// zoneddnsd
// ```

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use zoneddns_core::config::DdnsConfig;
use zoneddns_core::engine::EngineEvent;
use zoneddns_core::traits::StateStore;
use zoneddns_core::{DdnsEngine, FileStateStore, MemoryStateStore, PersistPolicy, ZoneRegistry};
use zoneddns_ip_http::HttpIpSource;
use zoneddns_provider_cloudflare::CloudflareFactory;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
struct Config {
    config_path: String,
    state_path: String,
    state_store_type: String,
    ip_source_url: String,
    ip_timeout_secs: u64,
    /// Overrides `engine.interval_secs` from the document when set
    interval_secs: Option<u64>,
    /// Overrides `engine.persist_policy` from the document when set
    persist_policy: Option<PersistPolicy>,
    dry_run: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let ip_timeout_secs = get("DDNS_IP_TIMEOUT_SECS", "5")
            .parse()
            .context("DDNS_IP_TIMEOUT_SECS must be a whole number of seconds")?;
        let interval_secs = lookup("DDNS_INTERVAL_SECS")
            .map(|raw| raw.parse::<u64>())
            .transpose()
            .context("DDNS_INTERVAL_SECS must be a whole number of seconds")?;
        let persist_policy = lookup("DDNS_PERSIST_POLICY")
            .map(|raw| raw.parse::<PersistPolicy>())
            .transpose()
            .map_err(|e| anyhow::anyhow!("DDNS_PERSIST_POLICY: {}", e))?;

        let dry_run = match get("DDNS_MODE", "live").to_lowercase().as_str() {
            "live" => false,
            "dry-run" => true,
            other => anyhow::bail!(
                "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                other
            ),
        };

        Ok(Self {
            config_path: get("DDNS_CONFIG_PATH", "config.json"),
            state_path: get("DDNS_STATE_PATH", zoneddns_core::state::DEFAULT_STATE_FILE),
            state_store_type: get("DDNS_STATE_STORE_TYPE", "file"),
            ip_source_url: get("DDNS_IP_SOURCE_URL", zoneddns_ip_http::DEFAULT_IP_SOURCE_URL),
            ip_timeout_secs,
            interval_secs,
            persist_policy,
            dry_run,
            log_level: get("DDNS_LOG_LEVEL", "info"),
        })
    }

    /// Validate the configuration
    ///
    /// This performs:
    /// - Type enumeration validation
    /// - Numeric range validation
    /// - URL scheme checks
    fn validate(&self) -> Result<()> {
        if self.config_path.is_empty() {
            anyhow::bail!("DDNS_CONFIG_PATH cannot be empty");
        }

        // Validate state store type
        match self.state_store_type.as_str() {
            "file" => {
                if self.state_path.is_empty() {
                    anyhow::bail!("DDNS_STATE_PATH cannot be empty when DDNS_STATE_STORE_TYPE=file");
                }
            }
            "memory" => {}
            _ => anyhow::bail!(
                "DDNS_STATE_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.state_store_type
            ),
        }

        // Validate IP source URL scheme
        if !self.ip_source_url.starts_with("https://") && !self.ip_source_url.starts_with("http://")
        {
            anyhow::bail!(
                "DDNS_IP_SOURCE_URL must use HTTP or HTTPS scheme. Got: {}",
                self.ip_source_url
            );
        }

        // Validate numeric ranges
        if !(1..=60).contains(&self.ip_timeout_secs) {
            anyhow::bail!(
                "DDNS_IP_TIMEOUT_SECS must be between 1 and 60 seconds. Got: {}",
                self.ip_timeout_secs
            );
        }

        if let Some(interval_secs) = self.interval_secs
            && !(10..=86400).contains(&interval_secs)
        {
            anyhow::bail!(
                "DDNS_INTERVAL_SECS must be between 10 and 86400 seconds. Got: {}",
                interval_secs
            );
        }

        // Validate log level
        self.tracing_level()?;

        Ok(())
    }

    fn tracing_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Read the zone document and apply the engine settings set in the environment
    ///
    /// Unset variables leave the document's `engine` section untouched.
    fn load_document(&self) -> Result<DdnsConfig> {
        let mut document = DdnsConfig::load(&self.config_path)
            .with_context(|| format!("Failed to load {}", self.config_path))?;

        if let Some(interval_secs) = self.interval_secs {
            document.engine.interval_secs = interval_secs;
        }
        if let Some(persist_policy) = self.persist_policy {
            document.engine.persist_policy = persist_policy;
        }
        document
            .validate()
            .with_context(|| format!("Invalid configuration in {}", self.config_path))?;

        Ok(document)
    }

    fn state_store(&self) -> Box<dyn StateStore> {
        match self.state_store_type.as_str() {
            "memory" => {
                warn!("Using in-memory state store; every restart will reconcile once");
                Box::new(MemoryStateStore::new())
            }
            _ => Box::new(FileStateStore::new(&self.state_path)),
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = config.tracing_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting zoneddnsd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let (engine, event_rx) = match build_engine(&config) {
            Ok(built) => built,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return DdnsExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(engine, event_rx).await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Build every component from configuration
///
/// Everything here is a startup error (exit code 1).
fn build_engine(config: &Config) -> Result<(DdnsEngine, tokio::sync::mpsc::Receiver<EngineEvent>)> {
    let document = config.load_document()?;
    info!(
        "Configuration loaded: {} domain(s), {} enabled subdomain(s)",
        document.domains.len(),
        document.enabled_count()
    );

    if config.dry_run {
        warn!("Running in DRY-RUN mode - no DNS records will be changed");
    }

    let factory = CloudflareFactory::new(config.dry_run);
    let registry = ZoneRegistry::from_domains(&document.domains, &factory)?;

    let ip_source = HttpIpSource::with_timeout(
        config.ip_source_url.clone(),
        Duration::from_secs(config.ip_timeout_secs),
    )?;
    info!(
        "IP source: {} (timeout {}s)",
        ip_source.url(),
        config.ip_timeout_secs
    );
    info!("State store type: {}", config.state_store_type);

    let (engine, event_rx) = DdnsEngine::new(
        Box::new(ip_source),
        config.state_store(),
        registry,
        document,
    )?;

    Ok((engine, event_rx))
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(
    engine: DdnsEngine,
    mut event_rx: tokio::sync::mpsc::Receiver<EngineEvent>,
) -> Result<()> {
    let events = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("Engine event: {:?}", event);
        }
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let shutdown = wait_for_shutdown()?;
    let signals = tokio::spawn(async move {
        let name = shutdown.await;
        info!("Received shutdown signal: {}", name);
        let _ = shutdown_tx.send(());
    });

    engine.run_with_shutdown(Some(shutdown_rx)).await?;

    signals.abort();
    drop(engine);
    // The engine owned the only sender; the drain task ends once it is dropped
    if let Err(e) = events.await {
        warn!("Event drain task ended abnormally: {}", e);
    }

    info!("Shutting down daemon");
    Ok(())
}

/// Install SIGTERM and SIGINT handlers
///
/// Handlers are installed before the engine starts so a failure to install
/// them is reported instead of leaving the daemon unstoppable.
///
/// # Returns
///
/// A future resolving to the name of the signal received.
#[cfg(unix)]
fn wait_for_shutdown() -> Result<impl std::future::Future<Output = &'static str>> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn wait_for_shutdown() -> Result<impl std::future::Future<Output = &'static str>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
        "SIGINT"
    })
}
