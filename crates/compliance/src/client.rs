use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_RANGE_URL: &str = "https://api.range.org/v1";

#[derive(Debug, Clone, Error)]
pub enum ComplianceError {
    #[error("risk request failed: {0}")]
    RequestFailed(String),

    #[error("risk API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid risk response: {0}")]
    InvalidResponse(String),

    #[error("no assessment for {0}")]
    UnknownAddress(String),
}

/// Exposure percentages to risky counterparties, 0-100
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskExposure {
    pub mixers: f64,
    pub gambling: f64,
    pub scams: f64,
}

/// Risk profile of one wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub address: String,

    /// 0-100, higher is riskier
    pub risk_score: f64,

    pub is_sanctioned: bool,

    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default)]
    pub exposure: RiskExposure,

    #[serde(default)]
    pub first_seen: Option<String>,

    #[serde(default)]
    pub last_activity: Option<String>,
}

/// Source of wallet risk assessments
#[async_trait]
pub trait RiskSource: Send + Sync {
    async fn assess(&self, address: &str) -> Result<RiskAssessment, ComplianceError>;
}

/// Range risk API client
pub struct RangeClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RangeClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create client with a bounded request timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ComplianceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ComplianceError::RequestFailed(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    pub fn risk_url(&self, address: &str) -> String {
        format!("{}/wallets/{}/risk", self.base_url, address)
    }
}

#[async_trait]
impl RiskSource for RangeClient {
    async fn assess(&self, address: &str) -> Result<RiskAssessment, ComplianceError> {
        let url = self.risk_url(address);
        debug!(url = %url, "Requesting wallet risk");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| ComplianceError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, address = %address, "Range API error");
            return Err(ComplianceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<RiskAssessment>()
            .await
            .map_err(|e| ComplianceError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

/// Fixed assessments keyed by address, for tests and offline runs
#[derive(Default)]
pub struct StaticRiskSource {
    assessments: HashMap<String, RiskAssessment>,
}

impl StaticRiskSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, assessment: RiskAssessment) -> Self {
        self.assessments
            .insert(assessment.address.clone(), assessment);
        self
    }
}

#[async_trait]
impl RiskSource for StaticRiskSource {
    async fn assess(&self, address: &str) -> Result<RiskAssessment, ComplianceError> {
        self.assessments
            .get(address)
            .cloned()
            .ok_or_else(|| ComplianceError::UnknownAddress(address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_risk_response() {
        let body = r#"{
            "address": "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU",
            "risk_score": 12,
            "is_sanctioned": false,
            "labels": ["exchange"],
            "exposure": { "mixers": 0, "gambling": 4.5, "scams": 0 },
            "first_seen": "2023-01-04T00:00:00Z",
            "last_activity": "2024-06-01T12:00:00Z"
        }"#;
        let assessment: RiskAssessment = serde_json::from_str(body).unwrap();

        assert_eq!(assessment.risk_score, 12.0);
        assert_eq!(assessment.exposure.gambling, 4.5);
        assert_eq!(assessment.labels, vec!["exchange".to_string()]);
    }

    #[test]
    fn test_missing_optional_fields() {
        let body = r#"{ "address": "abc", "risk_score": 40, "is_sanctioned": true }"#;
        let assessment: RiskAssessment = serde_json::from_str(body).unwrap();
        assert!(assessment.is_sanctioned);
        assert_eq!(assessment.exposure, RiskExposure::default());
        assert!(assessment.first_seen.is_none());
    }

    #[test]
    fn test_risk_url() {
        let client = RangeClient::new("https://api.range.org/v1/", "key");
        assert_eq!(
            client.risk_url("abc"),
            "https://api.range.org/v1/wallets/abc/risk"
        );
    }

    #[tokio::test]
    async fn test_static_source_unknown_address() {
        let source = StaticRiskSource::new();
        assert!(matches!(
            source.assess("missing").await,
            Err(ComplianceError::UnknownAddress(_))
        ));
    }
}
