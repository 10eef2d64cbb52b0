// # dns-updater - Dynamic DNS daemon
//
// Thin integration layer: all update logic lives in dns-updater-core.
//
// The daemon is responsible for:
// 1. Parsing the command line and loading the YAML configuration
// 2. Initializing logging and the runtime
// 3. Registering the compiled-in DNS providers
// 4. Building one poll loop per configured record
// 5. Cancelling every loop on SIGTERM/SIGINT and waiting for them to stop
//
// Every record is wired up before any loop starts, so a bad record aborts
// startup instead of silently leaving that record unmanaged.
//
// ## Example
//
// ```bash
// export CF_API_TOKEN=your_token
// dns-updater -c /usr/local/etc/dns-updater.yaml --log-level debug
// ```

use anyhow::{Context, Result};
use clap::Parser;
use dns_updater_core::{
    FileStore, IpResolver, PollLoop, ProviderRegistry, UpdateCycle, UpdaterConfig,
};
use dns_updater_ipify::IpifyResolver;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const DEFAULT_CONFIG_PATH: &str = "/usr/local/etc/dns-updater.yaml";

/// How long stopped loops get to wind down after cancellation
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdaterExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<UpdaterExitCode> for ExitCode {
    fn from(code: UpdaterExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser, Debug)]
#[command(name = "dns-updater", version)]
#[command(about = "Keeps DNS A records pointed at this host's public IPv4 address")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "DNS_UPDATER_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DNS_UPDATER_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = match args.log_level.parse::<Level>() {
        Ok(level) => level,
        Err(_) => {
            eprintln!(
                "Invalid log level '{}'. Valid levels: trace, debug, info, warn, error",
                args.log_level
            );
            return UpdaterExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return UpdaterExitCode::ConfigError.into();
    }

    info!("Starting dns-updater daemon");

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return UpdaterExitCode::ConfigError.into();
        }
    };

    info!(
        "Configuration loaded from {}: {} record(s), interval {:?}",
        args.config.display(),
        config.records.len(),
        config.update_interval()
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return UpdaterExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let registry = build_registry();
        let loops = match build_loops(&config, &registry) {
            Ok(loops) => loops,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return UpdaterExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(loops, CancellationToken::new()).await {
            error!("Daemon error: {:#}", e);
            UpdaterExitCode::RuntimeError
        } else {
            UpdaterExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Load, complete and validate the configuration
///
/// Blank provider credentials are filled from the environment before
/// validation.
fn load_config(path: &Path) -> Result<UpdaterConfig> {
    let mut config = UpdaterConfig::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    config.fill_credentials_from(|var| std::env::var(var).ok());
    config.validate()?;
    Ok(config)
}

/// Registry with every provider compiled into this binary
fn build_registry() -> ProviderRegistry {
    #[allow(unused_mut)]
    let mut registry = ProviderRegistry::new();

    #[cfg(feature = "cloudflare")]
    {
        debug!("Registering Cloudflare provider");
        dns_updater_cloudflare::register(&mut registry);
    }

    #[cfg(feature = "route53")]
    {
        debug!("Registering Route 53 provider");
        dns_updater_route53::register(&mut registry);
    }

    registry
}

/// Build one poll loop per configured record
///
/// The IP resolver is shared; each record gets its own provider and its own
/// last-known-value file under `storage_path`.
fn build_loops(
    config: &UpdaterConfig,
    registry: &ProviderRegistry,
) -> Result<Vec<(String, PollLoop)>> {
    let resolver: Arc<dyn IpResolver> = Arc::new(match &config.ip_endpoint {
        Some(endpoint) => IpifyResolver::with_endpoint(endpoint.clone()),
        None => IpifyResolver::new(),
    });

    let mut loops = Vec::with_capacity(config.records.len());
    for (name, record) in &config.records {
        let target = record
            .target(name)
            .with_context(|| format!("invalid record {}", name))?;
        let updater = registry
            .create_provider(&record.provider)
            .with_context(|| format!("failed to create DNS provider for {}", name))?;
        let store = FileStore::for_record(&config.storage_path, name);

        info!(
            "Managing record {} (zone {}, ttl {:?}) via {}, state in {}",
            name,
            target.zone(),
            target.ttl(),
            updater.provider_name(),
            store.path().display()
        );

        let cycle = UpdateCycle::new(resolver.clone(), updater, Box::new(store), target);
        let poll = PollLoop::new(cycle, config.update_interval())?;
        loops.push((name.clone(), poll));
    }

    Ok(loops)
}

/// Run every poll loop until a shutdown signal arrives
///
/// Loops only return once cancelled, so a loop task ending before the
/// signal is treated as a runtime error and stops the others.
async fn run_daemon(loops: Vec<(String, PollLoop)>, cancel: CancellationToken) -> Result<()> {
    let mut tasks = JoinSet::new();
    for (name, poll) in loops {
        let token = cancel.clone();
        tasks.spawn(async move {
            poll.run(token).await;
            name
        });
    }

    let outcome = tokio::select! {
        signal = wait_for_shutdown() => signal.map(|signal| {
            info!("Received shutdown signal: {}", signal);
        }),
        Some(joined) = tasks.join_next() => Err(match joined {
            Ok(name) => anyhow::anyhow!("Poll loop for {} exited unexpectedly", name),
            Err(e) => anyhow::anyhow!("Poll loop task failed: {}", e),
        }),
    };

    info!("Shutting down daemon");
    cancel.cancel();

    let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        let mut failed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(name) => debug!("Poll loop for {} stopped", name),
                Err(e) => {
                    error!("Poll loop task failed: {}", e);
                    failed += 1;
                }
            }
        }
        failed
    })
    .await;

    match drained {
        Ok(0) => outcome,
        Ok(failed) => outcome.and(Err(anyhow::anyhow!("{} poll loop(s) failed", failed))),
        Err(_) => outcome.and(Err(anyhow::anyhow!(
            "Shutdown timeout after {:?}",
            SHUTDOWN_TIMEOUT
        ))),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}
