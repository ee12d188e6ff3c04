//! License check outcome

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single license check.
///
/// `Unknown` means the oracle could not decide (offline, server hiccup).
/// It is never treated as a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckResult {
    Licensed,
    NotLicensed,
    Unknown,
}

impl From<Option<bool>> for CheckResult {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => CheckResult::Licensed,
            Some(false) => CheckResult::NotLicensed,
            None => CheckResult::Unknown,
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckResult::Licensed => write!(f, "licensed"),
            CheckResult::NotLicensed => write!(f, "not licensed"),
            CheckResult::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_nullable_bool() {
        assert_eq!(CheckResult::from(Some(true)), CheckResult::Licensed);
        assert_eq!(CheckResult::from(Some(false)), CheckResult::NotLicensed);
        assert_eq!(CheckResult::from(None), CheckResult::Unknown);
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&CheckResult::NotLicensed).unwrap();
        assert_eq!(json, "\"not_licensed\"");
    }
}
