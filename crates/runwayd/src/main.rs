// # runwayd - Runway Alert Daemon
//
// The runwayd daemon is a thin integration layer. It is responsible for:
// 1. Reading configuration from a JSON file or environment variables
// 2. Initializing logging and the runtime
// 3. Registering sources and transports
// 4. Starting the alert engine and forwarding shutdown signals
//
// All watching, diffing and fan-out logic lives in runway-core.
//
// ## Configuration
//
// If `RUNWAY_CONFIG` names a JSON file, the whole `RunwayConfig` is read
// from it. Otherwise it is assembled from environment variables:
//
// ### Source
// - `RUNWAY_LVNL_ENDPOINT`: LVNL runway usage endpoint (required)
//
// ### Transport
// - `RUNWAY_TELEGRAM_BOT_TOKEN`: Telegram bot token (required)
// - `RUNWAY_TELEGRAM_API_BASE`: Bot API base URL (optional)
// - `RUNWAY_MODE=dry-run`: Log messages instead of sending them
//
// ### Subscribers
// - `RUNWAY_SUBSCRIBERS_TYPE`: Repository type (memory, file)
// - `RUNWAY_SUBSCRIBERS_PATH`: Path to subscriber file (for file)
// - `RUNWAY_SUBSCRIBERS`: Comma-separated `chat_id[:label]` list (for memory)
//
// ### Engine
// - `RUNWAY_POLL_INTERVAL_SECS`: Seconds between refresh cycles
// - `RUNWAY_REQUEST_TIMEOUT_SECS`: Upper bound on one source fetch
// - `RUNWAY_MAX_CONCURRENT_DELIVERIES`: Sends in flight per change event
//
// ### Logging
// - `RUNWAY_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export RUNWAY_LVNL_ENDPOINT=https://lvnl.example/runwayusage
// export RUNWAY_TELEGRAM_BOT_TOKEN=123456:your_bot_token
// export RUNWAY_SUBSCRIBERS_TYPE=file
// export RUNWAY_SUBSCRIBERS_PATH=/var/lib/runway/subscribers.json
//
// runwayd
// ```

use anyhow::{Context, Result};
use runway_core::config::{
    RunwayConfig, SourceConfig, SubscriberStoreConfig, TransportConfig,
};
use runway_core::{
    AlertEngine, ComponentRegistry, EngineEvent, RunwayStatus, Subscriber, render_status_table,
};
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Upper bound on draining the change queue after a stop signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum RunwayExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<RunwayExitCode> for ExitCode {
    fn from(code: RunwayExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    runway: RunwayConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from the process environment
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level = lookup("RUNWAY_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let runway = match lookup("RUNWAY_CONFIG") {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read RUNWAY_CONFIG file {}", path))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse RUNWAY_CONFIG file {}", path))?
            }
            None => Self::runway_from_lookup(&lookup)?,
        };

        Ok(Self { runway, log_level })
    }

    fn runway_from_lookup<F>(lookup: &F) -> Result<RunwayConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut runway = RunwayConfig::default();

        runway.source = SourceConfig::Lvnl {
            endpoint: lookup("RUNWAY_LVNL_ENDPOINT").unwrap_or_default(),
        };

        runway.transport = TransportConfig::Telegram {
            bot_token: lookup("RUNWAY_TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            api_base: lookup("RUNWAY_TELEGRAM_API_BASE"),
            dry_run: lookup("RUNWAY_MODE").is_some_and(|m| m.eq_ignore_ascii_case("dry-run")),
        };

        let subscribers_type = lookup("RUNWAY_SUBSCRIBERS_TYPE").unwrap_or_else(|| {
            if lookup("RUNWAY_SUBSCRIBERS_PATH").is_some() {
                "file".to_string()
            } else {
                "memory".to_string()
            }
        });
        runway.subscribers = match subscribers_type.as_str() {
            "file" => SubscriberStoreConfig::File {
                path: lookup("RUNWAY_SUBSCRIBERS_PATH").unwrap_or_default(),
            },
            "memory" => SubscriberStoreConfig::Memory {
                subscribers: parse_subscribers(&lookup("RUNWAY_SUBSCRIBERS").unwrap_or_default()),
            },
            other => anyhow::bail!(
                "RUNWAY_SUBSCRIBERS_TYPE '{}' is not supported. \
                Supported types: memory, file",
                other
            ),
        };

        if let Some(value) = lookup("RUNWAY_POLL_INTERVAL_SECS") {
            runway.engine.poll_interval_secs = parse_number("RUNWAY_POLL_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = lookup("RUNWAY_REQUEST_TIMEOUT_SECS") {
            runway.engine.request_timeout_secs =
                parse_number("RUNWAY_REQUEST_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("RUNWAY_MAX_CONCURRENT_DELIVERIES") {
            runway.engine.max_concurrent_deliveries =
                parse_number("RUNWAY_MAX_CONCURRENT_DELIVERIES", &value)?;
        }

        Ok(runway)
    }

    /// Validate the configuration
    ///
    /// Checks what the core cannot know about (environment names, log
    /// level, filesystem), then defers to `RunwayConfig::validate`.
    fn validate(&self) -> Result<()> {
        log_level(&self.log_level)?;

        match &self.runway.source {
            SourceConfig::Lvnl { endpoint } if endpoint.is_empty() => anyhow::bail!(
                "RUNWAY_LVNL_ENDPOINT is required. \
                Set it via: export RUNWAY_LVNL_ENDPOINT=https://..."
            ),
            SourceConfig::Lvnl { endpoint } if endpoint.starts_with("http://") => {
                eprintln!(
                    "WARNING: LVNL endpoint uses HTTP (not HTTPS). \
                    Consider using HTTPS."
                );
            }
            _ => {}
        }

        if let TransportConfig::Telegram { bot_token, .. } = &self.runway.transport {
            if bot_token.is_empty() {
                anyhow::bail!(
                    "RUNWAY_TELEGRAM_BOT_TOKEN is required. \
                    Set it via: export RUNWAY_TELEGRAM_BOT_TOKEN=123456:your_bot_token"
                );
            }

            // Bot tokens look like `<bot id>:<secret>`
            if !bot_token.contains(':') {
                anyhow::bail!(
                    "RUNWAY_TELEGRAM_BOT_TOKEN does not look like a bot token. \
                    Expected the form <bot id>:<secret> as issued by BotFather."
                );
            }
        }

        if let SubscriberStoreConfig::File { path } = &self.runway.subscribers
            && let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            anyhow::bail!(
                "Subscriber file directory does not exist: {}. \
                Create it first: sudo mkdir -p {}",
                parent.display(),
                parent.display()
            );
        }

        if !(1..=3600).contains(&self.runway.engine.poll_interval_secs) {
            anyhow::bail!(
                "Poll interval must be between 1 and 3600 seconds. Got: {}",
                self.runway.engine.poll_interval_secs
            );
        }

        self.runway.validate()?;

        Ok(())
    }
}

/// Parse `"42:ops, 43"` into subscribers
fn parse_subscribers(value: &str) -> Vec<Subscriber> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((id, label)) => Subscriber::new(id.trim(), label.trim()),
            None => Subscriber::new(entry, ""),
        })
        .collect()
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a positive integer. Got: {}", name, value))
}

fn log_level(value: &str) -> Result<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "RUNWAY_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            value
        ),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return RunwayExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return RunwayExitCode::ConfigError.into();
    }

    // Initialize tracing
    let level = log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return RunwayExitCode::ConfigError.into();
    }

    info!("Starting runwayd daemon");
    info!(
        "Configuration loaded: {} runway(s), polling every {}s",
        config.runway.resources.len(),
        config.runway.engine.poll_interval_secs
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RunwayExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => RunwayExitCode::CleanShutdown,
            Err(DaemonError::Startup(e)) => {
                error!("Startup error: {:#}", e);
                RunwayExitCode::ConfigError
            }
            Err(DaemonError::Runtime(e)) => {
                error!("Daemon error: {:#}", e);
                RunwayExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Failure phase, mapped to distinct exit codes
enum DaemonError {
    Startup(anyhow::Error),
    Runtime(anyhow::Error),
}

/// Run the daemon
async fn run_daemon(config: Config) -> std::result::Result<(), DaemonError> {
    let (engine, events) = build_engine(config.runway).map_err(DaemonError::Startup)?;

    let status_logger = tokio::spawn(log_status(WatchStream::new(engine.status())));
    let event_logger = tokio::spawn(log_events(events));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let mut engine_task = tokio::spawn(engine.run_with_shutdown(shutdown_rx));

    info!("Daemon initialized successfully");

    tokio::select! {
        signal = wait_for_shutdown() => {
            let signal = signal.map_err(DaemonError::Runtime)?;
            info!("Received shutdown signal: {}", signal);
        }
        result = &mut engine_task => {
            // The engine only returns on its own after a failure
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(DaemonError::Runtime(e.into())),
                Err(e) => Err(DaemonError::Runtime(anyhow::anyhow!("Engine task failed: {}", e))),
            };
        }
    }

    info!("Shutting down daemon, draining queued notifications");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, engine_task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => return Err(DaemonError::Runtime(e.into())),
        Ok(Err(e)) => {
            return Err(DaemonError::Runtime(anyhow::anyhow!(
                "Engine task failed: {}",
                e
            )));
        }
        Err(_) => {
            return Err(DaemonError::Runtime(anyhow::anyhow!(
                "Shutdown timeout after {:?}",
                SHUTDOWN_TIMEOUT
            )));
        }
    }

    let _ = status_logger.await;
    let _ = event_logger.await;

    info!("Daemon stopped");
    Ok(())
}

/// Create all components from configuration and build the engine
fn build_engine(runway: RunwayConfig) -> Result<(AlertEngine, mpsc::Receiver<EngineEvent>)> {
    let registry = ComponentRegistry::with_builtins();

    #[cfg(feature = "lvnl")]
    {
        info!("Registering LVNL source");
        runway_source_lvnl::register(&registry);
    }

    #[cfg(feature = "telegram")]
    {
        info!("Registering Telegram transport");
        runway_notify_telegram::register(&registry);
    }

    info!("Source type: {}", runway.source.type_name());
    info!("Transport type: {}", runway.transport.type_name());
    info!("Subscriber repository type: {}", runway.subscribers.type_name());

    let source = registry.create_source(&runway.source)?;
    let transport = registry.create_transport(&runway.transport)?;
    let subscribers = registry.create_subscriber_repository(&runway.subscribers)?;

    let (engine, events) = AlertEngine::new(source, transport, subscribers, runway)?;
    Ok((engine, events))
}

/// Log the status table at startup and whenever it changes
async fn log_status(mut statuses: WatchStream<Vec<RunwayStatus>>) {
    while let Some(status) = statuses.next().await {
        info!("Runway status:\n{}", render_status_table(&status));
    }
}

/// Log monitoring events until the engine drops its sender
async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::Started { resources_count } => {
                debug!("Engine started with {} runway(s)", resources_count)
            }
            EngineEvent::CycleCompleted { changes } => debug!("Cycle completed: {} change(s)", changes),
            EngineEvent::CycleFailed { error } => debug!("Cycle failed: {}", error),
            EngineEvent::DispatchCompleted {
                code,
                succeeded,
                failed,
            } if failed > 0 => warn!(
                "Dispatch for {} partially failed: {} ok, {} failed",
                code, succeeded, failed
            ),
            EngineEvent::DispatchCompleted { code, succeeded, .. } => {
                debug!("Dispatch for {} completed: {} ok", code, succeeded)
            }
            EngineEvent::DispatchFailed { code, error } => {
                debug!("Dispatch for {} failed: {}", code, error)
            }
            EngineEvent::Stopped { reason } => debug!("Engine stopped: {}", reason),
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
