use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::SearchError;
use crate::time::TimePoint;

/// A `(lat, lon)` pair. Doubles as the selected map position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lon) {
            return Err(SearchError::validation(format!(
                "Latitude/longitude out of range: lat={}, lon={}",
                self.lat, self.lon
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lat: {:.4}, Lon: {:.4}", self.lat, self.lon)
    }
}

/// Place name decomposition produced by reverse geocoding.
/// Missing parts are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceFields {
    pub country: String,
    pub city: String,
    pub locality: String,
}

/// What the user asked for: text fields and/or a fixed coordinate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationQuery {
    pub country: String,
    pub city: String,
    pub locality: String,
    pub coordinates: Option<Coordinates>,
}

impl LocationQuery {
    pub fn has_text(&self) -> bool {
        [&self.country, &self.city, &self.locality]
            .iter()
            .any(|s| !s.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_none() && !self.has_text()
    }

    /// Free-text query for forward geocoding: `locality, city, country`,
    /// skipping blank parts.
    pub fn geocoding_text(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.locality, &self.city, &self.country]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() { None } else { Some(parts.join(", ")) }
    }

    pub fn place(&self) -> PlaceQuery {
        fn non_blank(s: &str) -> Option<String> {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }

        PlaceQuery {
            country: non_blank(&self.country),
            city: non_blank(&self.city),
            locality: non_blank(&self.locality),
        }
    }
}

/// Text-field half of a backend request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaceQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
}

/// Exactly one location representation goes on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestLocation {
    Coordinates(Coordinates),
    Place(PlaceQuery),
}

/// Body of the POST to the weather backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherRequest {
    #[serde(flatten)]
    pub location: RequestLocation,
    #[serde(rename = "dateTime")]
    pub when: TimePoint,
}

/// A formatted reading such as `"22°C"` or `"5.2 m/s"`.
/// The backend may also send bare numbers; those are kept as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Reading(pub String);

impl Reading {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading numeric magnitude, if the text carries one.
    pub fn value(&self) -> Option<f64> {
        leading_number(&self.0)
    }

    /// The number written directly before a `%` sign.
    pub fn percent(&self) -> Option<f64> {
        percentage(&self.0)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Reading(s),
            Raw::Number(n) => Reading(n.to_string()),
        })
    }
}

/// First signed decimal number found in `text`.
///
/// `"22°C"` → 22, `"Probabilidad de lluvia: 45.5%"` → 45.5, `"-3 °C"` → -3.
pub fn leading_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;

    let mut end = start;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }

    let negative = start > 0 && bytes[start - 1] == b'-';
    let magnitude: f64 = text[start..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// `"Probabilidad de lluvia: 45.5%"` → 45.5. Text without a percent sign,
/// or with nothing numeric right before it, has no percentage.
pub fn percentage(text: &str) -> Option<f64> {
    let before = text[..text.find('%')?].trim_end();
    let start = before
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
        .last()
        .map(|(i, _)| i)?;
    before[start..].parse().ok()
}

/// Weather returned by the backend for one search.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WeatherResult {
    #[serde(default)]
    pub temperature: Option<Reading>,
    #[serde(default)]
    pub precipitation: Option<Reading>,
    #[serde(default)]
    pub wind: Option<Reading>,
    #[serde(default, rename = "solarRadiation")]
    pub solar_radiation: Option<Reading>,
    #[serde(default, rename = "rain_prediction")]
    pub rain_prediction: Option<Reading>,
    /// Which upstream the backend used, e.g. "Meteomatics" or "NASA POWER".
    #[serde(default)]
    pub source: Option<String>,
    /// Position the backend resolved the query to.
    #[serde(default, rename = "location")]
    pub resolved_location: Option<Coordinates>,
}
