//! Mock host collaborators for testing

use async_trait::async_trait;
use licwatch_util::{PluginId, ProductCode};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{
    CheckResult, LicenseOracle, LicensePrompt, OracleError, OracleResult, PluginRegistry,
    RefreshNotifier,
};

/// Mock plugin registry with a fixed direct lookup and registered id set
#[derive(Debug, Clone, Default)]
pub struct MockRegistry {
    owning: Option<PluginId>,
    registered: Vec<PluginId>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the direct "which plugin owns this code" lookup succeed
    pub fn with_owning_plugin(mut self, id: impl Into<PluginId>) -> Self {
        self.owning = Some(id.into());
        self
    }

    pub fn with_registered<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PluginId>,
    {
        self.registered = ids.into_iter().map(Into::into).collect();
        self
    }
}

impl PluginRegistry for MockRegistry {
    fn owning_plugin(&self) -> Option<PluginId> {
        self.owning.clone()
    }

    fn registered_ids(&self) -> Vec<PluginId> {
        self.registered.clone()
    }
}

/// Scripted response for [`MockOracle`]
#[derive(Debug, Clone)]
pub enum MockResponse {
    Result(CheckResult),
    Error(String),
    Panic,
}

/// Mock license oracle for unit/integration testing
///
/// Scripted responses are consumed in order; once the script runs out every
/// call gets the fallback result.
pub struct MockOracle {
    script: Mutex<VecDeque<MockResponse>>,
    fallback: Mutex<CheckResult>,
    calls: AtomicU64,
    codes: Mutex<Vec<ProductCode>>,

    /// Simulated network latency (uses tokio time, so it honors paused clocks)
    pub latency: Arc<Mutex<Option<Duration>>>,
}

impl MockOracle {
    /// Oracle that answers `result` to every call
    pub fn always(result: CheckResult) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(result),
            calls: AtomicU64::new(0),
            codes: Mutex::new(Vec::new()),
            latency: Arc::new(Mutex::new(None)),
        }
    }

    /// Oracle that plays `responses` first, then answers `fallback`
    pub fn scripted(responses: impl IntoIterator<Item = MockResponse>, fallback: CheckResult) -> Self {
        let oracle = Self::always(fallback);
        oracle.script.lock().unwrap().extend(responses);
        oracle
    }

    pub fn set_fallback(&self, result: CheckResult) {
        *self.fallback.lock().unwrap() = result;
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Product codes received, in call order
    pub fn checked_codes(&self) -> Vec<ProductCode> {
        self.codes.lock().unwrap().clone()
    }
}

#[async_trait]
impl LicenseOracle for MockOracle {
    async fn check(&self, product_code: &ProductCode) -> OracleResult<CheckResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.codes.lock().unwrap().push(product_code.clone());

        let latency = *self.latency.lock().unwrap();
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(MockResponse::Result(result)) => Ok(result),
            Some(MockResponse::Error(msg)) => Err(OracleError::Unavailable(msg)),
            Some(MockResponse::Panic) => panic!("mock oracle panicked"),
            None => Ok(*self.fallback.lock().unwrap()),
        }
    }
}

/// Prompt that records every license request
#[derive(Debug, Default)]
pub struct RecordingPrompt {
    requests: Mutex<Vec<(ProductCode, String)>>,
}

impl RecordingPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(ProductCode, String)> {
        self.requests.lock().unwrap().clone()
    }
}

impl LicensePrompt for RecordingPrompt {
    fn request_license(&self, product_code: &ProductCode, message: &str) {
        self.requests
            .lock()
            .unwrap()
            .push((product_code.clone(), message.to_string()));
    }
}

/// Refresh notifier that counts broadcasts
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    broadcasts: AtomicU64,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broadcast_count(&self) -> u64 {
        self.broadcasts.load(Ordering::SeqCst)
    }
}

impl RefreshNotifier for RecordingNotifier {
    fn broadcast_refresh(&self) {
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_reports_configured_ids() {
        let registry = MockRegistry::new()
            .with_owning_plugin("com.example.plugin")
            .with_registered(["a", "b"]);

        assert_eq!(registry.owning_plugin(), Some(PluginId::new("com.example.plugin")));
        assert_eq!(registry.registered_ids().len(), 2);
        assert_eq!(MockRegistry::new().owning_plugin(), None);
    }

    #[tokio::test]
    async fn oracle_plays_script_then_fallback() {
        let oracle = MockOracle::scripted(
            [
                MockResponse::Result(CheckResult::NotLicensed),
                MockResponse::Error("offline".into()),
            ],
            CheckResult::Unknown,
        );
        let code = ProductCode::new("CODE");

        assert_eq!(oracle.check(&code).await.unwrap(), CheckResult::NotLicensed);
        assert!(matches!(oracle.check(&code).await, Err(OracleError::Unavailable(_))));
        assert_eq!(oracle.check(&code).await.unwrap(), CheckResult::Unknown);
        assert_eq!(oracle.call_count(), 3);
        assert_eq!(oracle.checked_codes(), vec![code.clone(), code.clone(), code]);
    }

    #[test]
    fn prompt_and_notifier_record_calls() {
        let prompt = RecordingPrompt::new();
        prompt.request_license(&ProductCode::new("CODE"), "activate please");
        assert_eq!(prompt.request_count(), 1);
        assert_eq!(prompt.requests()[0].1, "activate please");

        let notifier = RecordingNotifier::new();
        notifier.broadcast_refresh();
        notifier.broadcast_refresh();
        assert_eq!(notifier.broadcast_count(), 2);
    }
}
