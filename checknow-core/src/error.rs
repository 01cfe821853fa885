//! Failure taxonomy for a single search attempt.

use thiserror::Error;

/// Every way a search or a map pick can fail.
///
/// All variants are terminal for the attempt that produced them; the
/// controller turns them into an alert and leaves displayed data alone.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Missing or out-of-range input, detected before any network call.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Forward geocoding returned no candidates.
    #[error("Location not found: {0}")]
    NotFound(String),

    /// Geocoding lookup failed (status, transport or parse).
    #[error("Geocoding failed: {message}")]
    Geocode {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The weather backend answered with a non-success status or a body we
    /// could not read.
    #[error("Weather service error: {0}")]
    WeatherService(String),

    /// Transport failure talking to the weather backend.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl SearchError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn geocode(message: impl Into<String>, source: Option<reqwest::Error>) -> Self {
        Self::Geocode { message: message.into(), source }
    }

    /// Text shown to the user in a blocking alert.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::NotFound(query) => {
                format!("Location not found: {query}. Try being more specific.")
            }
            Self::Geocode { .. } => {
                "Could not contact the location service. Try again later.".to_string()
            }
            Self::WeatherService(msg) => format!("Error fetching data: {msg}"),
            Self::Network(_) => {
                "Network error: could not connect to the weather server. Is it running?"
                    .to_string()
            }
        }
    }

    /// Only transport hiccups are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Geocode { source: Some(e), .. } => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = SearchError::validation("Please select a date and time.");
        assert_eq!(err.user_message(), "Please select a date and time.");
    }

    #[test]
    fn weather_service_message_carries_detail() {
        let err = SearchError::WeatherService("Server error (500).".into());
        assert!(err.user_message().contains("500"));
    }

    #[test]
    fn not_found_mentions_query() {
        let err = SearchError::NotFound("Atlantis".into());
        assert!(err.user_message().contains("Atlantis"));
    }

    #[test]
    fn non_network_errors_are_not_retryable() {
        assert!(!SearchError::validation("x").is_retryable());
        assert!(!SearchError::NotFound("x".into()).is_retryable());
        assert!(!SearchError::WeatherService("x".into()).is_retryable());
        assert!(!SearchError::geocode("x", None).is_retryable());
    }
}
