//! Timer abstraction for scheduling license checks
//!
//! [`TokioTimer`] runs tasks on a tokio runtime, so tests can drive it with
//! a paused clock. [`ManualTimer`] only records registrations and fires them
//! on demand.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};

/// Future produced by one fire of a [`TimerTask`]
pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Work run on every fire. Called once per fire, so it must be reusable.
pub type TimerTask = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

/// Errors from arming a timer
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("No async runtime available to run timers")]
    NoRuntime,

    #[error("Invalid timer period: {0:?}")]
    InvalidPeriod(Duration),

    #[error("Timer delay out of range: {0:?}")]
    DelayOutOfRange(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type TimerResult<T> = Result<T, TimerError>;

/// Scheduling primitive used by the license scheduler
pub trait Timer: Send + Sync {
    /// Run `task` once after `delay`
    fn after(&self, delay: Duration, task: TimerTask) -> TimerResult<()>;

    /// Run `task` after `start_delay`, then every `period` for as long as
    /// the process lives. Fires are fixed-rate: a late fire does not shift
    /// the ones after it.
    fn every(&self, start_delay: Duration, period: Duration, task: TimerTask) -> TimerResult<()>;
}

/// Timer backed by tokio tasks
#[derive(Debug, Clone, Default)]
pub struct TokioTimer {
    handle: Option<Handle>,
}

impl TokioTimer {
    /// Timer that spawns onto whichever runtime is current when arming
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Timer that always spawns onto `handle`
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    fn deadline(delay: Duration) -> TimerResult<Instant> {
        Instant::now()
            .checked_add(delay)
            .ok_or(TimerError::DelayOutOfRange(delay))
    }

    fn runtime(&self) -> TimerResult<Handle> {
        match &self.handle {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|_| TimerError::NoRuntime),
        }
    }
}

impl Timer for TokioTimer {
    fn after(&self, delay: Duration, task: TimerTask) -> TimerResult<()> {
        let deadline = Self::deadline(delay)?;
        let runtime = self.runtime()?;

        runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            task().await;
        });

        Ok(())
    }

    fn every(&self, start_delay: Duration, period: Duration, task: TimerTask) -> TimerResult<()> {
        if period.is_zero() {
            return Err(TimerError::InvalidPeriod(period));
        }
        let start = Self::deadline(start_delay)?;
        if start.checked_add(period).is_none() {
            return Err(TimerError::InvalidPeriod(period));
        }
        let runtime = self.runtime()?;

        runtime.spawn(async move {
            let mut ticks = tokio::time::interval_at(start, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                ticks.tick().await;
                task().await;
            }
        });

        Ok(())
    }
}

/// A registration recorded by [`ManualTimer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Once { delay: Duration },
    Repeating { start_delay: Duration, period: Duration },
}

/// Timer that never fires on its own. For tests.
#[derive(Default)]
pub struct ManualTimer {
    scheduled: Mutex<Vec<(Registration, TimerTask)>>,
    fail_arming: AtomicBool,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent registration fail
    pub fn set_fail_arming(&self, fail: bool) {
        self.fail_arming.store(fail, Ordering::SeqCst);
    }

    pub fn registrations(&self) -> Vec<Registration> {
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .map(|(registration, _)| *registration)
            .collect()
    }

    pub fn registration_count(&self) -> usize {
        self.scheduled.lock().unwrap().len()
    }

    /// Fire the registration at `index` once
    pub async fn fire(&self, index: usize) {
        let task = self
            .scheduled
            .lock()
            .unwrap()
            .get(index)
            .map(|(_, task)| Arc::clone(task));
        if let Some(task) = task {
            task().await;
        }
    }

    /// Fire every registration once, in registration order
    pub async fn fire_all(&self) {
        let tasks: Vec<TimerTask> = self
            .scheduled
            .lock()
            .unwrap()
            .iter()
            .map(|(_, task)| Arc::clone(task))
            .collect();
        for task in tasks {
            task().await;
        }
    }

    fn register(&self, registration: Registration, task: TimerTask) -> TimerResult<()> {
        if self.fail_arming.load(Ordering::SeqCst) {
            return Err(TimerError::Internal("manual timer set to fail".into()));
        }
        self.scheduled.lock().unwrap().push((registration, task));
        Ok(())
    }
}

impl Timer for ManualTimer {
    fn after(&self, delay: Duration, task: TimerTask) -> TimerResult<()> {
        self.register(Registration::Once { delay }, task)
    }

    fn every(&self, start_delay: Duration, period: Duration, task: TimerTask) -> TimerResult<()> {
        if period.is_zero() {
            return Err(TimerError::InvalidPeriod(period));
        }
        self.register(Registration::Repeating { start_delay, period }, task)
    }
}
