//! licwatchd - The licwatch background service
//!
//! This is the main entry point for the licwatchd service.
//! It wires together all the components:
//! - Configuration loading
//! - Host registry and prompt
//! - License oracle (static or HTTP)
//! - Refresh bus
//! - License scheduler

mod host;
mod oracle;

use anyhow::{Context, Result};
use clap::Parser;
use licwatch_config::{Settings, TimingMode, load_config};
use licwatch_core::{
    BroadcastRefreshBus, Collaborators, LicenseEvent, LicenseScheduler, LicenseState,
    SchedulerConfig, TokioTimer, WorkspaceContext,
};
use licwatch_util::default_config_path;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::host::{LogPrompt, StaticRegistry};
use crate::oracle::build_oracle;

/// licwatchd - Periodic license validation service
#[derive(Parser, Debug)]
#[command(name = "licwatchd")]
#[command(about = "Periodic license validation service", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/licwatch/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Use the short test timings (3s / 30s / 3min) regardless of the config
    #[arg(long, env = "LICWATCH_TEST_MODE")]
    test_mode: bool,

    /// Number of simulated workspace-open events fired at startup
    #[arg(short, long, default_value_t = 1)]
    workspaces: usize,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    scheduler: LicenseScheduler,
    bus: Arc<BroadcastRefreshBus>,
    workspaces: usize,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let mut settings: Settings = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        if args.test_mode {
            settings = settings.with_timing_mode(TimingMode::Test);
        }

        info!(
            config_path = %args.config.display(),
            variant_count = settings.variants.len(),
            test_mode = args.test_mode,
            "Configuration loaded"
        );

        let oracle = build_oracle(&settings.oracle).context("Failed to build license oracle")?;
        let bus = Arc::new(BroadcastRefreshBus::default());

        let collaborators = Collaborators {
            registry: Arc::new(StaticRegistry::from_settings(&settings.host)),
            oracle,
            prompt: Arc::new(LogPrompt),
            notifier: bus.clone(),
            timer: Arc::new(TokioTimer::with_handle(Handle::current())),
        };

        let scheduler = LicenseScheduler::new(
            SchedulerConfig::from_settings(&settings),
            collaborators,
            LicenseState::new(),
        );

        Ok(Self {
            scheduler,
            bus,
            workspaces: args.workspaces,
        })
    }

    async fn run(self) -> Result<()> {
        let mut refreshes = self.bus.subscribe();
        let mut events = self.scheduler.subscribe();

        // Hosts open workspaces concurrently; only the first open arms the checker
        for i in 0..self.workspaces {
            let scheduler = self.scheduler.clone();
            tokio::spawn(async move {
                scheduler.on_workspace_opened(&WorkspaceContext::new(format!("workspace-{}", i + 1)));
            });
        }

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sigusr1 =
            signal(SignalKind::user_defined1()).context("Failed to create SIGUSR1 handler")?;

        info!(workspaces = self.workspaces, "Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down");
                    break;
                }

                // SIGUSR1 - dump scheduler status
                _ = sigusr1.recv() => {
                    match serde_json::to_string(&self.scheduler.status()) {
                        Ok(json) => info!(status = %json, "Scheduler status"),
                        Err(e) => warn!(error = %e, "Failed to serialize scheduler status"),
                    }
                }

                refresh = refreshes.recv() => match refresh {
                    Ok(request) => {
                        info!(
                            sequence = request.sequence,
                            activated = self.scheduler.activation().is_activated(),
                            "Refresh requested, licensed features re-evaluated"
                        );
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Refresh receiver lagged");
                    }
                    Err(RecvError::Closed) => break,
                },

                event = events.recv() => match event {
                    Ok(event) => log_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Event receiver lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        info!("Service stopped");
        Ok(())
    }
}

fn log_event(event: &LicenseEvent) {
    match event {
        LicenseEvent::CheckerArmed {
            variant_id,
            schedule,
        } => {
            debug!(variant = %variant_id, ?schedule, "Checker armed");
        }
        LicenseEvent::CheckerNotApplicable { variant_id } => {
            debug!(variant = %variant_id, "Checker not applicable");
        }
        LicenseEvent::CheckerArmFailed { error } => {
            debug!(error = %error, "Checker failed to arm");
        }
        LicenseEvent::CheckCompleted { result, elapsed } => {
            let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
            debug!(result = %result, elapsed_ms, "Check completed");
        }
        LicenseEvent::LicenseRevoked => {
            debug!("License revoked");
        }
        LicenseEvent::PromptRequested { product_code } => {
            debug!(product_code = %product_code, "Prompt requested");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "licwatchd starting");

    let service = Service::new(&args)?;
    service.run().await
}
