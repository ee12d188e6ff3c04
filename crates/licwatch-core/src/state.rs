//! Process-wide license state
//!
//! Both types are meant to be created once per host process and shared via
//! `Arc`. Tests create fresh instances to get isolated state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Advisory flag telling other subsystems whether licensed features are on.
///
/// Last write wins. The scheduler is the only writer.
#[derive(Debug)]
pub struct ActivationState {
    activated: AtomicBool,
}

impl ActivationState {
    pub fn new(activated: bool) -> Self {
        Self {
            activated: AtomicBool::new(activated),
        }
    }

    pub fn set_activated(&self, activated: bool) {
        self.activated.store(activated, Ordering::Release);
    }

    pub fn is_activated(&self) -> bool {
        self.activated.load(Ordering::Acquire)
    }
}

impl Default for ActivationState {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Write-once flags guarding the timer chain and the license prompt.
///
/// Each flag goes false -> true at most once, through a compare-and-set, so
/// concurrent callers can never both win.
#[derive(Debug, Default)]
pub struct SchedulerRunState {
    started: AtomicBool,
    prompt_shown: AtomicBool,
}

impl SchedulerRunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true for exactly one caller: the one that gets to arm the checker
    pub fn try_start(&self) -> bool {
        self.started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Returns true for exactly one caller: the one that gets to show the prompt
    pub fn try_mark_prompt_shown(&self) -> bool {
        self.prompt_shown
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_prompt_shown(&self) -> bool {
        self.prompt_shown.load(Ordering::Acquire)
    }
}

/// The state handed to a scheduler at construction
#[derive(Debug, Clone, Default)]
pub struct LicenseState {
    pub activation: Arc<ActivationState>,
    pub run: Arc<SchedulerRunState>,
}

impl LicenseState {
    pub fn new() -> Self {
        Self::default()
    }
}
