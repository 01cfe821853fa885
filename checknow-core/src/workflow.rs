//! Search workflow controller.
//!
//! `SearchController` is the single owner of search state. Views feed it
//! [`Event`]s and act on the [`Effect`]s it returns; nothing else mutates
//! [`SearchState`].
//!
//! Phases: `Idle → Validating → Resolving → Querying → Ready`. Every search
//! and every map pick carries a generation number, and a completion whose
//! generation is no longer current is dropped, so only the latest request's
//! response is ever applied.
//!
//! Sequential callers use [`SearchController::handle`]. Callers that keep
//! several requests in flight use the split API:
//! `begin_search` → [`PendingSearch::resolve`] → `begin_query` →
//! [`PendingQuery::run`] → `complete_search` (and `begin_pick` →
//! [`PendingPick::run`] → `complete_pick` for map picks).

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::SearchError;
use crate::geocode::{Geocoder, NominatimGeocoder};
use crate::model::{Coordinates, LocationQuery, PlaceFields, RequestLocation, WeatherRequest, WeatherResult};
use crate::provider::{WeatherProvider, provider_from_config};
use crate::recommend;
use crate::time::{Clock, SystemClock, TimePoint, YearWindow};

pub const MISSING_DATE: &str = "Please select a date and time.";
pub const MISSING_LOCATION: &str = "Please enter a location or double-click on the map.";
pub const PICK_FAILED: &str = "Error getting location name. Try a manual search.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    /// Forward geocoding in flight.
    Resolving,
    /// Weather request in flight.
    Querying,
    /// A result is displayed.
    Ready,
}

/// User input, already decoded from widgets.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SetCountry(String),
    SetCity(String),
    SetLocality(String),
    SetDateTime(Option<TimePoint>),
    ClearPosition,
    MapDoubleClick(Coordinates),
    Submit,
}

/// Side effects for the view to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Blocking user notification.
    Alert(String),
    /// Bring the results panel into view once `after` has elapsed.
    ScrollToResults { after: Duration },
    /// Move the map viewport.
    Recenter { center: Coordinates, zoom: u8 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub country: String,
    pub city: String,
    pub locality: String,
    pub date_time: Option<TimePoint>,
    pub selected_position: Option<Coordinates>,
    pub weather: Option<WeatherResult>,
    pub phase: Phase,
}

impl SearchState {
    pub fn location_query(&self) -> LocationQuery {
        LocationQuery {
            country: self.country.clone(),
            city: self.city.clone(),
            locality: self.locality.clone(),
            coordinates: self.selected_position,
        }
    }

    pub fn recommendations(&self) -> Vec<String> {
        recommend::recommendations(self.weather.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub year_window: YearWindow,
    pub scroll_delay: Duration,
    pub map_zoom: u8,
    pub send_resolved_coordinates: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SearchSettings {
    fn from(config: &Config) -> Self {
        Self {
            year_window: config.search.year_window(),
            scroll_delay: config.search.scroll_delay(),
            map_zoom: config.map.zoom,
            send_resolved_coordinates: config.search.send_resolved_coordinates,
        }
    }
}

#[derive(Debug)]
pub struct SearchController {
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherProvider>,
    clock: Arc<dyn Clock>,
    settings: SearchSettings,
    state: SearchState,
    search_generation: u64,
    pick_generation: u64,
}

/// A validated search, before geocoding.
#[derive(Debug)]
pub struct PendingSearch {
    generation: u64,
    pick_generation: u64,
    prior_phase: Phase,
    query: LocationQuery,
    when: TimePoint,
    send_resolved_coordinates: bool,
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherProvider>,
}

/// A search whose location is settled, ready to hit the weather backend.
#[derive(Debug)]
pub struct PendingQuery {
    generation: u64,
    pick_generation: u64,
    prior_phase: Phase,
    request: WeatherRequest,
    /// Position found by forward geocoding, if that ran.
    candidate: Option<Coordinates>,
    weather: Arc<dyn WeatherProvider>,
}

/// Outcome of a search, to be applied by `complete_search`.
#[derive(Debug)]
pub struct SearchCompletion {
    generation: u64,
    pick_generation: u64,
    prior_phase: Phase,
    failed_in: Phase,
    user_fixed_position: bool,
    candidate: Option<Coordinates>,
    outcome: Result<WeatherResult, SearchError>,
}

#[derive(Debug)]
pub struct PendingPick {
    generation: u64,
    position: Coordinates,
    geocoder: Arc<dyn Geocoder>,
}

#[derive(Debug)]
pub struct PickCompletion {
    generation: u64,
    outcome: Result<PlaceFields, SearchError>,
}

impl PendingSearch {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn needs_geocoding(&self) -> bool {
        self.query.coordinates.is_none()
    }

    /// Forward geocode the text fields unless a coordinate is already fixed.
    pub async fn resolve(self) -> Result<PendingQuery, SearchCompletion> {
        if let Some(position) = self.query.coordinates {
            return Ok(PendingQuery {
                generation: self.generation,
                pick_generation: self.pick_generation,
                prior_phase: self.prior_phase,
                request: WeatherRequest {
                    location: RequestLocation::Coordinates(position),
                    when: self.when,
                },
                candidate: None,
                weather: self.weather,
            });
        }

        let text = self.query.geocoding_text().unwrap_or_default();
        match self.geocoder.forward(&text).await {
            Ok(found) => {
                let location = if self.send_resolved_coordinates {
                    RequestLocation::Coordinates(found)
                } else {
                    RequestLocation::Place(self.query.place())
                };
                Ok(PendingQuery {
                    generation: self.generation,
                    pick_generation: self.pick_generation,
                    prior_phase: self.prior_phase,
                    request: WeatherRequest { location, when: self.when },
                    candidate: Some(found),
                    weather: self.weather,
                })
            }
            Err(e) => Err(SearchCompletion {
                generation: self.generation,
                pick_generation: self.pick_generation,
                prior_phase: self.prior_phase,
                failed_in: Phase::Resolving,
                user_fixed_position: false,
                candidate: None,
                outcome: Err(e),
            }),
        }
    }
}

impl PendingQuery {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> &WeatherRequest {
        &self.request
    }

    pub async fn run(self) -> SearchCompletion {
        let outcome = self.weather.get_weather(&self.request).await;
        SearchCompletion {
            generation: self.generation,
            pick_generation: self.pick_generation,
            prior_phase: self.prior_phase,
            failed_in: Phase::Querying,
            user_fixed_position: self.candidate.is_none(),
            candidate: self.candidate,
            outcome,
        }
    }
}

impl PendingPick {
    pub async fn run(self) -> PickCompletion {
        PickCompletion {
            generation: self.generation,
            outcome: self.geocoder.reverse(self.position).await,
        }
    }
}

impl SearchController {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherProvider>,
        clock: Arc<dyn Clock>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            geocoder,
            weather,
            clock,
            settings,
            state: SearchState::default(),
            search_generation: 0,
            pick_generation: 0,
        }
    }

    /// Nominatim + the configured backend + the system clock.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let geocoder = NominatimGeocoder::new(&config.geocoder, &config.http)?;
        let weather = provider_from_config(config, clock.clone())?;

        Ok(Self::new(
            Arc::new(geocoder),
            Arc::from(weather),
            clock,
            SearchSettings::from(config),
        ))
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Single entry point for sequential callers.
    pub async fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::SetCountry(value) => {
                self.edit_text(|s| &mut s.country, value);
                Vec::new()
            }
            Event::SetCity(value) => {
                self.edit_text(|s| &mut s.city, value);
                Vec::new()
            }
            Event::SetLocality(value) => {
                self.edit_text(|s| &mut s.locality, value);
                Vec::new()
            }
            Event::SetDateTime(when) => {
                self.state.date_time = when;
                Vec::new()
            }
            Event::ClearPosition => {
                self.state.selected_position = None;
                Vec::new()
            }
            Event::MapDoubleClick(position) => self.pick(position).await,
            Event::Submit => self.submit().await,
        }
    }

    /// A typed edit describes a new place, so a previously selected position
    /// no longer applies.
    fn edit_text(&mut self, field: impl FnOnce(&mut SearchState) -> &mut String, value: String) {
        let slot = field(&mut self.state);
        if *slot != value {
            *slot = value;
            if self.state.selected_position.take().is_some() {
                tracing::debug!("Text edit cleared the selected position");
            }
        }
    }

    pub async fn submit(&mut self) -> Vec<Effect> {
        let pending = match self.begin_search() {
            Ok(p) => p,
            Err(e) => return vec![Effect::Alert(e.user_message())],
        };

        let query = match pending.resolve().await {
            Ok(q) => q,
            Err(failed) => return self.complete_search(failed),
        };

        if !self.begin_query(&query) {
            return Vec::new();
        }

        let completion = query.run().await;
        self.complete_search(completion)
    }

    pub async fn pick(&mut self, position: Coordinates) -> Vec<Effect> {
        let (pending, mut effects) = self.begin_pick(position);
        let completion = pending.run().await;
        effects.extend(self.complete_pick(completion));
        effects
    }

    /// Validate inputs and start a new search generation.
    ///
    /// On validation failure nothing changes and no request is made.
    pub fn begin_search(&mut self) -> Result<PendingSearch, SearchError> {
        let current_phase = self.state.phase;
        let prior_phase = self.settled_phase();
        self.state.phase = Phase::Validating;

        let validated = self.validate();
        let (query, when) = match validated {
            Ok(v) => v,
            Err(e) => {
                self.state.phase = current_phase;
                tracing::debug!("Search rejected: {}", e);
                return Err(e);
            }
        };

        self.search_generation += 1;
        self.state.phase = if query.coordinates.is_some() {
            Phase::Querying
        } else {
            Phase::Resolving
        };

        tracing::debug!(
            "Search #{} started for {:?} at {}",
            self.search_generation,
            query,
            when
        );

        Ok(PendingSearch {
            generation: self.search_generation,
            pick_generation: self.pick_generation,
            prior_phase,
            query,
            when,
            send_resolved_coordinates: self.settings.send_resolved_coordinates,
            geocoder: self.geocoder.clone(),
            weather: self.weather.clone(),
        })
    }

    /// Phase to fall back to when a search fails. A search that starts while
    /// another is in flight falls back to what is on display, never to an
    /// in-flight phase.
    fn settled_phase(&self) -> Phase {
        match self.state.phase {
            Phase::Idle | Phase::Ready => self.state.phase,
            _ if self.state.weather.is_some() => Phase::Ready,
            _ => Phase::Idle,
        }
    }

    fn validate(&self) -> Result<(LocationQuery, TimePoint), SearchError> {
        let when = self
            .state
            .date_time
            .ok_or_else(|| SearchError::validation(MISSING_DATE))?;

        let query = self.state.location_query();
        if query.is_empty() {
            return Err(SearchError::validation(MISSING_LOCATION));
        }
        if let Some(position) = query.coordinates {
            position.validate()?;
        }

        self.settings.year_window.check(when, self.clock.now())?;

        Ok((query, when))
    }

    /// Mark the weather request as in flight. False if the search is stale.
    pub fn begin_query(&mut self, query: &PendingQuery) -> bool {
        if query.generation != self.search_generation {
            tracing::debug!("Search #{} superseded before querying", query.generation);
            return false;
        }
        self.state.phase = Phase::Querying;
        true
    }

    /// Apply a finished search. Stale completions are dropped.
    pub fn complete_search(&mut self, completion: SearchCompletion) -> Vec<Effect> {
        if completion.generation != self.search_generation {
            tracing::debug!(
                "Dropping response for search #{} (current is #{})",
                completion.generation,
                self.search_generation
            );
            return Vec::new();
        }

        let result = match completion.outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Search #{} failed: {}", completion.generation, e);
                self.state.phase = match completion.failed_in {
                    Phase::Resolving => Phase::Idle,
                    _ => completion.prior_phase,
                };
                return vec![Effect::Alert(e.user_message())];
            }
        };

        let mut effects = Vec::new();

        let picked_meanwhile = completion.pick_generation != self.pick_generation;
        if !completion.user_fixed_position && !picked_meanwhile {
            if let Some(position) = result.resolved_location.or(completion.candidate) {
                self.state.selected_position = Some(position);
                effects.push(self.recenter(position));
            }
        }

        self.state.weather = Some(result);
        self.state.phase = Phase::Ready;
        effects.push(Effect::ScrollToResults { after: self.settings.scroll_delay });

        tracing::info!("Search #{} completed", completion.generation);
        effects
    }

    /// Select a position from the map and start reverse geocoding it.
    pub fn begin_pick(&mut self, position: Coordinates) -> (PendingPick, Vec<Effect>) {
        self.pick_generation += 1;
        self.state.selected_position = Some(position);

        let pending = PendingPick {
            generation: self.pick_generation,
            position,
            geocoder: self.geocoder.clone(),
        };
        (pending, vec![self.recenter(position)])
    }

    /// Fill the text fields from a reverse geocode. Never starts a search.
    pub fn complete_pick(&mut self, completion: PickCompletion) -> Vec<Effect> {
        if completion.generation != self.pick_generation {
            tracing::debug!("Dropping reverse geocode for pick #{}", completion.generation);
            return Vec::new();
        }

        match completion.outcome {
            Ok(fields) => {
                self.state.country = fields.country;
                self.state.city = fields.city;
                self.state.locality = fields.locality;
                self.state.date_time = Some(TimePoint::now(self.clock.as_ref()));
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Reverse geocoding failed: {}", e);
                vec![Effect::Alert(PICK_FAILED.to_string())]
            }
        }
    }

    fn recenter(&self, center: Coordinates) -> Effect {
        Effect::Recenter { center, zoom: self.settings.map_zoom }
    }
}
