use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    config::{BackendConfig, HttpConfig},
    error::SearchError,
    model::{WeatherRequest, WeatherResult},
    provider::Endpoint,
    retry::{RetryPolicy, send_with_retry},
    time::Clock,
};

use super::WeatherProvider;

/// Client for the local weather backend (`POST` with a flat JSON body).
#[derive(Debug, Clone)]
pub struct BackendWeatherProvider {
    base_url: String,
    forecast_path: String,
    historical_path: String,
    http: Client,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl BackendWeatherProvider {
    pub fn new(
        config: &BackendConfig,
        http: &HttpConfig,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(http.timeout())
            .build()
            .context("Failed to create weather backend HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            forecast_path: config.forecast_path.clone(),
            historical_path: config.historical_path.clone(),
            http: client,
            retry: http.retry_policy(),
            clock,
        })
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        let path = match endpoint {
            Endpoint::Forecast => &self.forecast_path,
            Endpoint::Historical => &self.historical_path,
        };
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Human-readable message for a non-success response.
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { detail: Some(serde_json::Value::String(detail)) }) => detail,
        Ok(ErrorBody { detail: Some(other) }) if !other.is_null() => other.to_string(),
        _ => format!(
            "Server error ({}). The weather service returned no readable details.",
            status.as_u16()
        ),
    }
}

#[async_trait]
impl WeatherProvider for BackendWeatherProvider {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherResult, SearchError> {
        let now = self.clock.now();
        let endpoint = Endpoint::select(request.when.as_naive(), now);
        let url = self.endpoint_url(endpoint);

        tracing::debug!("Querying {} endpoint {} for {:?}", endpoint, url, request);

        let res = send_with_retry(self.retry, || self.http.post(&url).json(request).send()).await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let message = error_message(status, &body);
            tracing::warn!("Weather {} request failed with status {}: {}", endpoint, status, message);
            return Err(SearchError::WeatherService(message));
        }

        let parsed: WeatherResult = serde_json::from_str(&body).map_err(|e| {
            SearchError::WeatherService(format!("Malformed response from weather service: {e}"))
        })?;

        tracing::info!(
            "Weather {} for {} received (source: {})",
            endpoint,
            request.when,
            parsed.source.as_deref().unwrap_or("unknown")
        );

        Ok(parsed)
    }
}
