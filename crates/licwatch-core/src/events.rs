//! Events emitted by the license scheduler

use licwatch_config::CheckSchedule;
use licwatch_host_api::CheckResult;
use licwatch_util::{ProductCode, VariantId};
use std::time::Duration;

/// Events emitted by the scheduler
#[derive(Debug, Clone)]
pub enum LicenseEvent {
    /// Timer chain armed for a licensed variant
    CheckerArmed {
        variant_id: VariantId,
        schedule: CheckSchedule,
    },

    /// Installed variant needs no license; nothing was armed
    CheckerNotApplicable { variant_id: VariantId },

    /// Arming the timer chain failed; the checker is not running
    CheckerArmFailed { error: String },

    /// A scheduled check finished (oracle failures are reported as Unknown)
    CheckCompleted {
        result: CheckResult,
        elapsed: Duration,
    },

    /// A check returned NotLicensed and licensed features were switched off
    LicenseRevoked,

    /// The one-time license prompt was requested
    PromptRequested { product_code: ProductCode },
}
