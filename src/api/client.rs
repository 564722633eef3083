//! API client for the spreadsheet-backed monitoring service.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests against the dashboard server, which fronts the Google Sheet
//! holding committees, organizations, indicators, and monitoring results.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    Indicator, IndicatorApiItem, MonitoringResult, OrgRole, Organization, OrganizationApiItem,
    RawRecord,
};
use crate::reconcile::Period;
use crate::session::{Committee, SessionData};

use super::{ApiError, ResultRepository};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// The sheet API can be slow on cold reads; 30s fails fast enough for the UI.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Envelope every server response is wrapped in
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap a success envelope, turning anything else into `Rejected`
    fn into_data(self, what: &str) -> Result<T> {
        if self.status == "success" {
            if let Some(data) = self.data {
                return Ok(data);
            }
        }
        let message = self
            .message
            .unwrap_or_else(|| format!("{} request did not succeed", what));
        Err(ApiError::Rejected(message).into())
    }
}

#[derive(Debug, Default, Deserialize)]
struct LoginData {
    token: String,
    committee: CommitteeApiItem,
}

#[derive(Debug, Default, Deserialize)]
struct CommitteeApiItem {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OrganizationsData {
    #[serde(rename = "mainOrganizations", default)]
    main: Vec<OrganizationApiItem>,
    #[serde(rename = "subOrganizations", default)]
    sub: Vec<OrganizationApiItem>,
}

#[derive(Debug, Default, Deserialize)]
struct IndicatorsData {
    #[serde(default)]
    indicators: Vec<IndicatorApiItem>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultsData {
    #[serde(default)]
    results: Vec<RawRecord>,
}

/// API client for the monitoring service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client against the given base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    // ===== Authentication =====

    /// Log in with a committee name and return session data
    pub async fn login(&self, committee_name: &str) -> Result<SessionData> {
        let body = serde_json::json!({ "committeeName": committee_name });
        let envelope: Envelope<LoginData> = self.post("auth/login", &body).await?;
        let login = envelope.into_data("login")?;

        Ok(SessionData {
            token: login.token,
            committee: Committee {
                name: login.committee.name.unwrap_or_else(|| committee_name.to_string()),
                id: login.committee.id.unwrap_or_default(),
                role: login.committee.role.unwrap_or_default(),
            },
            created_at: Utc::now(),
        })
    }

    // ===== Reference data =====

    /// Fetch the organizations assigned to the authenticated committee,
    /// split into main and sub responsibility.
    pub async fn fetch_my_organizations(&self) -> Result<Vec<Organization>> {
        let envelope: Envelope<OrganizationsData> = self.get("organizations/my").await?;
        let data = envelope.into_data("organizations")?;

        debug!(
            main = data.main.len(),
            sub = data.sub.len(),
            "Organizations loaded"
        );

        let mut orgs: Vec<Organization> = data
            .main
            .iter()
            .map(|o| o.to_organization(OrgRole::Main))
            .collect();
        orgs.extend(data.sub.iter().map(|o| o.to_organization(OrgRole::Sub)));
        Ok(orgs)
    }

    /// Fetch the indicators to check in the given period tab
    pub async fn fetch_indicators(&self, period: Period) -> Result<Vec<Indicator>> {
        let path = format!("indicators?period={}", urlencode(period.label()));
        let envelope: Envelope<IndicatorsData> = self.get(&path).await?;
        let data = envelope.into_data("indicators")?;

        debug!(period = period.label(), count = data.indicators.len(), "Indicators loaded");
        Ok(data.indicators.iter().map(|i| i.to_indicator()).collect())
    }

    // ===== Monitoring results =====

    /// Fetch all monitoring results recorded for an organization
    pub async fn fetch_results(&self, org_code: &str) -> Result<Vec<MonitoringResult>> {
        let path = format!("results/organization/{}", urlencode(org_code));
        let envelope: Envelope<ResultsData> = self.get(&path).await?;
        let data = envelope.into_data("results")?;

        // Rows without an indicator id are dropped at the boundary
        let results: Vec<MonitoringResult> = data
            .results
            .into_iter()
            .filter_map(MonitoringResult::from_raw)
            .collect();

        debug!(org_code, count = results.len(), "Results loaded");
        Ok(results)
    }

    /// Submit one monitoring result row. Returns the server's optional
    /// confirmation message.
    pub async fn submit_result(&self, record: &RawRecord) -> Result<Option<String>> {
        let envelope: Envelope<serde_json::Value> = self.post("results", record).await?;
        if envelope.status == "success" {
            Ok(envelope.message)
        } else {
            let message = envelope
                .message
                .unwrap_or_else(|| "save request did not succeed".to_string());
            Err(ApiError::Rejected(message).into())
        }
    }
}

#[async_trait]
impl ResultRepository for ApiClient {
    async fn results_by_organization(&self, org_code: &str) -> Result<Vec<MonitoringResult>> {
        self.fetch_results(org_code).await
    }

    async fn save_result(&self, record: &RawRecord) -> Result<Option<String>> {
        self.submit_result(record).await
    }
}

/// Percent-encode a path/query segment. The sheet keys routinely carry
/// Korean labels, which must not hit the wire raw.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(*byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
