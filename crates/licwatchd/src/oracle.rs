//! License oracle backends

use async_trait::async_trait;
use licwatch_config::OracleSettings;
use licwatch_host_api::{CheckResult, LicenseOracle, OracleError, OracleResult};
use licwatch_util::ProductCode;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Build the oracle selected in the config
pub fn build_oracle(settings: &OracleSettings) -> anyhow::Result<Arc<dyn LicenseOracle>> {
    Ok(match settings {
        OracleSettings::Static { result } => Arc::new(StaticOracle::new(*result)),
        OracleSettings::Http { url, timeout } => Arc::new(HttpOracle::new(url.clone(), *timeout)?),
    })
}

/// Oracle that always answers the same thing
#[derive(Debug, Clone, Copy)]
pub struct StaticOracle {
    result: CheckResult,
}

impl StaticOracle {
    pub fn new(result: CheckResult) -> Self {
        Self { result }
    }
}

#[async_trait]
impl LicenseOracle for StaticOracle {
    async fn check(&self, _product_code: &ProductCode) -> OracleResult<CheckResult> {
        Ok(self.result)
    }
}

/// Oracle backed by an HTTP license endpoint.
///
/// Sends `GET {url}?code={product_code}` and maps the status code.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    client: reqwest::Client,
    url: String,
}

impl HttpOracle {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl LicenseOracle for HttpOracle {
    async fn check(&self, product_code: &ProductCode) -> OracleResult<CheckResult> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("code", product_code.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout
                } else if e.is_builder() {
                    OracleError::Internal(e.to_string())
                } else {
                    OracleError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        debug!(status = %status, product_code = %product_code, "License endpoint responded");
        classify_status(status)
    }
}

/// 2xx is licensed, 402/403 is not licensed, anything else is an error
fn classify_status(status: StatusCode) -> OracleResult<CheckResult> {
    if status.is_success() {
        return Ok(CheckResult::Licensed);
    }
    match status {
        StatusCode::PAYMENT_REQUIRED | StatusCode::FORBIDDEN => Ok(CheckResult::NotLicensed),
        s if s.is_server_error() => Err(OracleError::Unavailable(format!("server error {}", s))),
        s => Err(OracleError::InvalidResponse(format!("unexpected status {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_licensed() {
        assert_eq!(classify_status(StatusCode::OK).unwrap(), CheckResult::Licensed);
        assert_eq!(
            classify_status(StatusCode::NO_CONTENT).unwrap(),
            CheckResult::Licensed
        );
    }

    #[test]
    fn payment_required_and_forbidden_are_not_licensed() {
        assert_eq!(
            classify_status(StatusCode::PAYMENT_REQUIRED).unwrap(),
            CheckResult::NotLicensed
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN).unwrap(),
            CheckResult::NotLicensed
        );
    }

    #[test]
    fn other_statuses_are_errors() {
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            Err(OracleError::Unavailable(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND),
            Err(OracleError::InvalidResponse(_))
        ));
        assert!(classify_status(StatusCode::UNAUTHORIZED).is_err());
    }

    #[tokio::test]
    async fn static_oracle_answers_configured_result() {
        let oracle = build_oracle(&OracleSettings::Static {
            result: CheckResult::NotLicensed,
        })
        .unwrap();
        let result = oracle.check(&ProductCode::new("P")).await.unwrap();
        assert_eq!(result, CheckResult::NotLicensed);
    }

    #[tokio::test]
    async fn malformed_url_is_an_internal_error() {
        let oracle = HttpOracle::new("not a url".into(), Duration::from_secs(1)).unwrap();
        assert!(matches!(
            oracle.check(&ProductCode::new("P")).await,
            Err(OracleError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let oracle = HttpOracle::new("http://127.0.0.1:9/check".into(), Duration::from_secs(2))
            .unwrap();
        assert!(oracle.check(&ProductCode::new("P")).await.is_err());
    }
}
