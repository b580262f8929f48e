//! BLS public API (v2) integration.

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::domain::ProviderConfig;
use crate::error::AppError;

const STATUS_SUCCEEDED: &str = "REQUEST_SUCCEEDED";

/// One observation as the provider reports it, before normalization.
///
/// Every field is optional text; the collector decides what survives.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawObservation {
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default, rename = "periodName")]
    pub period_name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// Anything that can return raw monthly observations for a series.
///
/// `Sync` so the collector can fan out across the rayon pool.
pub trait Provider: Sync {
    fn fetch_series(
        &self,
        provider_id: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<RawObservation>, AppError>;
}

pub struct BlsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl BlsClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::provider(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

impl Provider for BlsClient {
    fn fetch_series(
        &self,
        provider_id: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<RawObservation>, AppError> {
        let url = format!("{}/{provider_id}", self.base_url);
        let mut req = self.client.get(&url).query(&[
            ("startyear", start_year.to_string()),
            ("endyear", end_year.to_string()),
        ]);
        if let Some(key) = &self.api_key {
            req = req.query(&[("registrationkey", key)]);
        }

        debug!(series_id = provider_id, start_year, end_year, "BLS request");

        let resp = req
            .send()
            .map_err(|e| AppError::provider(format!("BLS request for {provider_id} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::provider(format!(
                "BLS request for {provider_id} failed with status {}.",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::provider(format!("Failed to read BLS response for {provider_id}: {e}")))?;

        parse_response(provider_id, &body)
    }
}

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    status: String,
    #[serde(default)]
    message: Vec<String>,
    #[serde(default, rename = "Results")]
    results: Option<TimeseriesResults>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResults {
    #[serde(default)]
    series: Vec<TimeseriesSeries>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesSeries {
    #[serde(default)]
    data: Vec<RawObservation>,
}

/// Decode a timeseries payload, surfacing the provider's own message on failure.
pub fn parse_response(provider_id: &str, body: &str) -> Result<Vec<RawObservation>, AppError> {
    let payload: TimeseriesResponse = serde_json::from_str(body)
        .map_err(|e| AppError::provider(format!("Failed to parse BLS response for {provider_id}: {e}")))?;

    if payload.status != STATUS_SUCCEEDED {
        let message = if payload.message.is_empty() {
            payload.status.clone()
        } else {
            payload.message.join("; ")
        };
        return Err(AppError::provider(format!(
            "BLS API error for {provider_id}: {message}"
        )));
    }

    payload
        .results
        .and_then(|r| r.series.into_iter().next())
        .map(|s| s.data)
        .ok_or_else(|| AppError::provider(format!("BLS response for {provider_id} contained no series.")))
}
