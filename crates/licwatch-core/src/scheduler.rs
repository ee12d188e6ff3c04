//! License check scheduler

use chrono::{DateTime, Local};
use licwatch_config::{CheckSchedule, ProductVariant, Settings};
use licwatch_host_api::{
    CheckResult, LicenseOracle, LicensePrompt, PluginRegistry, RefreshNotifier,
};
use licwatch_util::{MonotonicInstant, ProductCode, VariantId};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    ActivationState, LicenseEvent, LicenseState, TaskFuture, Timer, TimerResult, TimerTask,
    VariantResolver,
};

/// Host services the scheduler talks to
#[derive(Clone)]
pub struct Collaborators {
    pub registry: Arc<dyn PluginRegistry>,
    pub oracle: Arc<dyn LicenseOracle>,
    pub prompt: Arc<dyn LicensePrompt>,
    pub notifier: Arc<dyn RefreshNotifier>,
    pub timer: Arc<dyn Timer>,
}

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub schedule: CheckSchedule,
    /// Findable variants, in lookup order
    pub variants: Vec<ProductVariant>,
    pub prompt_message: String,
}

impl SchedulerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            schedule: settings.schedule,
            variants: settings.variants.clone(),
            prompt_message: settings.prompt.message.clone(),
        }
    }
}

/// Opaque handle for the workspace whose opening triggered the call
#[derive(Debug, Clone, Default)]
pub struct WorkspaceContext {
    pub name: String,
}

impl WorkspaceContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Where the scheduler is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPhase {
    /// No workspace has been opened yet
    Idle,
    /// Installed variant needs no license; nothing is scheduled
    NotApplicable,
    /// Timer chain is running
    Armed,
    /// Timer chain could not be armed; no checks will run
    ArmFailed,
}

/// Point-in-time view of the scheduler
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub phase: SchedulerPhase,
    pub variant: Option<VariantId>,
    pub checks_completed: u64,
    pub last_result: Option<CheckResult>,
    pub last_checked_at: Option<DateTime<Local>>,
    pub prompt_shown: bool,
    pub activated: bool,
}

#[derive(Debug)]
struct Progress {
    phase: SchedulerPhase,
    variant: Option<VariantId>,
    checks_completed: u64,
    last_result: Option<CheckResult>,
    last_checked_at: Option<DateTime<Local>>,
}

struct Inner {
    config: SchedulerConfig,
    collaborators: Collaborators,
    state: LicenseState,
    progress: Mutex<Progress>,
    events: broadcast::Sender<LicenseEvent>,
}

/// Arms the periodic license check once per process and reacts to results.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct LicenseScheduler {
    inner: Arc<Inner>,
}

impl LicenseScheduler {
    pub fn new(config: SchedulerConfig, collaborators: Collaborators, state: LicenseState) -> Self {
        let (events, _) = broadcast::channel(64);
        debug!(
            variants = config.variants.len(),
            first_delay_secs = config.schedule.first_delay.as_secs(),
            second_delay_secs = config.schedule.second_delay.as_secs(),
            period_secs = config.schedule.period.as_secs(),
            "License scheduler created"
        );

        Self {
            inner: Arc::new(Inner {
                config,
                collaborators,
                state,
                progress: Mutex::new(Progress {
                    phase: SchedulerPhase::Idle,
                    variant: None,
                    checks_completed: 0,
                    last_result: None,
                    last_checked_at: None,
                }),
                events,
            }),
        }
    }

    /// Entry point, called on every workspace open.
    ///
    /// Only the first call in the lifetime of the shared [`LicenseState`] does
    /// anything; it resolves the variant and arms the timers. Never blocks on
    /// a check and never fails.
    pub fn on_workspace_opened(&self, workspace: &WorkspaceContext) {
        if !self.inner.state.run.try_start() {
            debug!(workspace = %workspace.name, "License checker already started");
            return;
        }

        info!(workspace = %workspace.name, "License checker started");

        let started = MonotonicInstant::now();
        let variant = VariantResolver::new(
            self.inner.collaborators.registry.as_ref(),
            &self.inner.config.variants,
        )
        .resolve();
        info!(
            variant = %variant,
            elapsed_ms = started.elapsed_millis(),
            "Resolved installed variant"
        );

        self.inner.progress().variant = Some(variant.id().clone());

        let Some(product_code) = variant.product_code().cloned() else {
            self.inner.state.activation.set_activated(true);
            self.inner.set_phase(SchedulerPhase::NotApplicable);
            info!(variant = %variant.id(), "Variant does not require a license, not scheduling checks");
            self.inner.emit(LicenseEvent::CheckerNotApplicable {
                variant_id: variant.id().clone(),
            });
            return;
        };

        // Assume licensed until a check says otherwise
        self.inner.state.activation.set_activated(true);

        match self.arm(&product_code) {
            Ok(()) => {
                let schedule = self.inner.config.schedule;
                self.inner.set_phase(SchedulerPhase::Armed);
                info!(
                    variant = %variant.id(),
                    first_delay_secs = schedule.first_delay.as_secs(),
                    second_delay_secs = schedule.second_delay.as_secs(),
                    period_secs = schedule.period.as_secs(),
                    "License checks scheduled"
                );
                self.inner.emit(LicenseEvent::CheckerArmed {
                    variant_id: variant.id().clone(),
                    schedule,
                });
            }
            Err(e) => {
                warn!(error = %e, "Failed to schedule license checks, continuing without them");
                self.inner.set_phase(SchedulerPhase::ArmFailed);
                self.inner.emit(LicenseEvent::CheckerArmFailed {
                    error: e.to_string(),
                });
            }
        }
    }

    fn arm(&self, product_code: &ProductCode) -> TimerResult<()> {
        let schedule = self.inner.config.schedule;
        let timer = &self.inner.collaborators.timer;

        timer.after(schedule.first_delay, self.check_task(product_code))?;
        timer.after(schedule.second_delay, self.check_task(product_code))?;
        timer.every(
            schedule.second_delay,
            schedule.period,
            self.check_task(product_code),
        )?;
        Ok(())
    }

    fn check_task(&self, product_code: &ProductCode) -> TimerTask {
        let inner = Arc::clone(&self.inner);
        let product_code = product_code.clone();
        Arc::new(move || -> TaskFuture {
            let inner = Arc::clone(&inner);
            let product_code = product_code.clone();
            Box::pin(async move { inner.run_check(product_code).await })
        })
    }

    pub fn status(&self) -> SchedulerStatus {
        let progress = self.inner.progress();
        SchedulerStatus {
            phase: progress.phase,
            variant: progress.variant.clone(),
            checks_completed: progress.checks_completed,
            last_result: progress.last_result,
            last_checked_at: progress.last_checked_at,
            prompt_shown: self.inner.state.run.is_prompt_shown(),
            activated: self.inner.state.activation.is_activated(),
        }
    }

    /// Subscribe to scheduler events
    pub fn subscribe(&self) -> broadcast::Receiver<LicenseEvent> {
        self.inner.events.subscribe()
    }

    /// The activation flag other subsystems should consult
    pub fn activation(&self) -> Arc<ActivationState> {
        Arc::clone(&self.inner.state.activation)
    }
}

impl Inner {
    fn progress(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: SchedulerPhase) {
        self.progress().phase = phase;
    }

    fn emit(&self, event: LicenseEvent) {
        let _ = self.events.send(event);
    }

    /// One timer fire: ask the oracle, then react.
    ///
    /// The oracle runs in its own task so a panic inside it is contained and
    /// counts as Unknown, like any other oracle failure.
    async fn run_check(&self, product_code: ProductCode) {
        let started = MonotonicInstant::now();
        let oracle = Arc::clone(&self.collaborators.oracle);

        let result = match Handle::try_current() {
            Ok(runtime) => {
                let code = product_code.clone();
                match runtime.spawn(async move { oracle.check(&code).await }).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => {
                        warn!(error = %e, "License check failed, treating result as unknown");
                        CheckResult::Unknown
                    }
                    Err(e) => {
                        warn!(error = %e, "License check task aborted, treating result as unknown");
                        CheckResult::Unknown
                    }
                }
            }
            Err(_) => match oracle.check(&product_code).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(error = %e, "License check failed, treating result as unknown");
                    CheckResult::Unknown
                }
            },
        };

        let elapsed = started.elapsed();
        info!(
            product_code = %product_code,
            elapsed_ms = started.elapsed_millis(),
            result = %result,
            "License check finished"
        );

        self.handle_result(&product_code, result, elapsed);
    }

    fn handle_result(&self, product_code: &ProductCode, result: CheckResult, elapsed: Duration) {
        {
            let mut progress = self.progress();
            progress.checks_completed += 1;
            progress.last_result = Some(result);
            progress.last_checked_at = Some(licwatch_util::now());
        }
        self.emit(LicenseEvent::CheckCompleted { result, elapsed });

        match result {
            // A later Licensed does not undo an earlier NotLicensed
            CheckResult::Licensed => {
                debug!("License is valid");
            }
            CheckResult::Unknown => {
                warn!("License status unknown, treating user as licensed and retrying on next check");
            }
            CheckResult::NotLicensed => {
                self.state.activation.set_activated(false);
                warn!(
                    product_code = %product_code,
                    "Not licensed, licensed features disabled until a license is activated"
                );
                self.collaborators.notifier.broadcast_refresh();
                self.emit(LicenseEvent::LicenseRevoked);

                if self.state.run.try_mark_prompt_shown() {
                    info!(product_code = %product_code, "Requesting license activation");
                    self.collaborators
                        .prompt
                        .request_license(product_code, &self.config.prompt_message);
                    self.emit(LicenseEvent::PromptRequested {
                        product_code: product_code.clone(),
                    });
                }
            }
        }
    }
}
