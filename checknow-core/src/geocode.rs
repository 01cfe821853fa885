//! Forward and reverse geocoding against Nominatim (OpenStreetMap).

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;

use crate::config::{GeocoderConfig, HttpConfig};
use crate::error::SearchError;
use crate::model::{Coordinates, PlaceFields};
use crate::retry::{RetryPolicy, send_with_retry};

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Best candidate for a free-text query. Empty result set is `NotFound`.
    async fn forward(&self, query: &str) -> Result<Coordinates, SearchError>;

    /// Place name decomposition for a coordinate.
    async fn reverse(&self, position: Coordinates) -> Result<PlaceFields, SearchError>;
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
    retry: RetryPolicy,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig, http: &HttpConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(http.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to create geocoding HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http: client,
            retry: http.retry_policy(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SearchError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Nominatim request: {} {:?}", url, query);

        let res = send_with_retry(self.retry, || self.http.get(&url).query(query).send())
            .await
            .map_err(|e| SearchError::geocode("Failed to send request to Nominatim", Some(e)))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            SearchError::geocode("Failed to read Nominatim response body", Some(e))
        })?;

        if !status.is_success() {
            return Err(SearchError::geocode(
                format!(
                    "Nominatim request failed with status {}: {}",
                    status,
                    truncate_body(&body)
                ),
                None,
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            SearchError::geocode(format!("Failed to parse Nominatim JSON: {e}"), None)
        })
    }
}

#[derive(Debug, Deserialize)]
struct NmPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NmReverse {
    #[serde(default)]
    address: Option<NmAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NmAddress {
    country: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    suburb: Option<String>,
    neighbourhood: Option<String>,
    road: Option<String>,
}

impl From<NmAddress> for PlaceFields {
    fn from(addr: NmAddress) -> Self {
        PlaceFields {
            country: first_non_empty([addr.country]),
            city: first_non_empty([addr.city, addr.town, addr.village, addr.county]),
            locality: first_non_empty([addr.suburb, addr.neighbourhood, addr.road]),
        }
    }
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .unwrap_or_default()
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn forward(&self, query: &str) -> Result<Coordinates, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::validation(
                "Please enter a location or double-click on the map.",
            ));
        }

        let places: Vec<NmPlace> = self
            .get_json(
                "/search",
                &[
                    ("q", query.to_string()),
                    ("format", "json".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::NotFound(query.to_string()))?;

        let lat: f64 = place.lat.parse().map_err(|_| {
            SearchError::geocode(format!("Nominatim returned invalid latitude '{}'", place.lat), None)
        })?;
        let lon: f64 = place.lon.parse().map_err(|_| {
            SearchError::geocode(format!("Nominatim returned invalid longitude '{}'", place.lon), None)
        })?;

        tracing::info!(
            "Geocoded '{}' to ({:.4}, {:.4}) {}",
            query,
            lat,
            lon,
            place.display_name.as_deref().unwrap_or_default()
        );

        Ok(Coordinates::new(lat, lon))
    }

    async fn reverse(&self, position: Coordinates) -> Result<PlaceFields, SearchError> {
        let body: NmReverse = self
            .get_json(
                "/reverse",
                &[
                    ("format", "json".to_string()),
                    ("lat", position.lat.to_string()),
                    ("lon", position.lon.to_string()),
                    ("zoom", "18".to_string()),
                    ("addressdetails", "1".to_string()),
                ],
            )
            .await?;

        let fields = PlaceFields::from(body.address.unwrap_or_default());
        tracing::info!(
            "Reverse geocoded ({:.4}, {:.4}) to '{}' / '{}' / '{}'",
            position.lat,
            position.lon,
            fields.country,
            fields.city,
            fields.locality
        );

        Ok(fields)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
