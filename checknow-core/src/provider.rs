use crate::{
    Config, WeatherRequest, WeatherResult, error::SearchError,
    provider::backend::BackendWeatherProvider, time::Clock,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::{fmt::Debug, sync::Arc};

pub mod backend;

/// Which backend variant serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Forecast,
    Historical,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Forecast => "forecast",
            Endpoint::Historical => "historical",
        }
    }

    pub const fn all() -> &'static [Endpoint] {
        &[Endpoint::Forecast, Endpoint::Historical]
    }

    /// Strictly future selects the forecast; now or earlier selects history.
    pub fn select(when: NaiveDateTime, now: NaiveDateTime) -> Self {
        if when > now { Endpoint::Forecast } else { Endpoint::Historical }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherResult, SearchError>;
}

/// Construct the backend provider from config.
pub fn provider_from_config(
    config: &Config,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let provider = BackendWeatherProvider::new(&config.backend, &config.http, clock)?;
    Ok(Box::new(provider))
}
