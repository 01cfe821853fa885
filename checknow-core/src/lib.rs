//! Core library for the `checknow` CLI.
//!
//! This crate defines:
//! - Configuration handling
//! - Geocoding (forward and reverse) against Nominatim
//! - The weather backend client and forecast/historical endpoint selection
//! - The search workflow controller and its map adapter
//! - Activity recommendations
//!
//! It is used by `checknow-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod geocode;
pub mod map;
pub mod model;
pub mod provider;
pub mod recommend;
pub mod retry;
pub mod time;
pub mod workflow;

pub use config::Config;
pub use error::SearchError;
pub use geocode::{Geocoder, NominatimGeocoder};
pub use map::{MapAdapter, MapEvent, MapView, Marker};
pub use model::{Coordinates, LocationQuery, PlaceFields, Reading, WeatherRequest, WeatherResult};
pub use provider::{Endpoint, WeatherProvider, provider_from_config};
pub use recommend::{Recommendation, RecommendationKind};
pub use time::{Clock, FixedClock, SystemClock, TimePoint, YearWindow};
pub use workflow::{Effect, Event, Phase, SearchController, SearchSettings, SearchState};
