//! Host integration traits

use async_trait::async_trait;
use licwatch_util::{PluginId, ProductCode};
use thiserror::Error;

use crate::CheckResult;

/// Errors from the license oracle
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("License service unavailable: {0}")]
    Unavailable(String),

    #[error("License check timed out")]
    Timeout,

    #[error("Invalid response from license service: {0}")]
    InvalidResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type OracleResult<T> = Result<T, OracleError>;

/// View of the host's plugin registry
pub trait PluginRegistry: Send + Sync {
    /// The plugin that owns the running code, if the host can tell.
    fn owning_plugin(&self) -> Option<PluginId>;

    /// Every plugin id currently registered in the host.
    fn registered_ids(&self) -> Vec<PluginId>;
}

/// License validation service
///
/// Implementations may perform network I/O. Callers run checks off the
/// host's interactive thread.
#[async_trait]
pub trait LicenseOracle: Send + Sync {
    async fn check(&self, product_code: &ProductCode) -> OracleResult<CheckResult>;
}

/// User-facing license activation prompt. Fire-and-forget.
pub trait LicensePrompt: Send + Sync {
    fn request_license(&self, product_code: &ProductCode, message: &str);
}

/// Broadcast channel telling dependent subsystems to refresh.
///
/// Must be idempotent: receivers tolerate redundant refreshes.
pub trait RefreshNotifier: Send + Sync {
    fn broadcast_refresh(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_error_messages() {
        let err = OracleError::Unavailable("connection refused".into());
        assert_eq!(err.to_string(), "License service unavailable: connection refused");
        assert_eq!(OracleError::Timeout.to_string(), "License check timed out");
    }
}
