use anyhow::Context;
use checknow_core::{Config, Effect, Event, MapAdapter, MapEvent, SearchController, TimePoint};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Text};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "checknow",
    version,
    about = "Weather and activity suggestions for a place and time"
)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively edit the backend and geocoder settings.
    Configure,

    /// Search the weather for a place and time.
    Show {
        #[arg(long, default_value = "")]
        country: String,

        #[arg(long, default_value = "")]
        city: String,

        #[arg(long, default_value = "")]
        locality: String,

        /// Latitude, as if double-clicked on the map (requires --lon).
        #[arg(
            long,
            requires = "lon",
            conflicts_with_all = ["country", "city", "locality"],
            allow_hyphen_values = true
        )]
        lat: Option<f64>,

        /// Longitude (requires --lat).
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Date and time, `YYYY-MM-DDTHH:MM`.
        #[arg(long)]
        date: Option<TimePoint>,
    },

    /// Select a coordinate as the map would and fill in the place name.
    Pick {
        #[arg(allow_hyphen_values = true)]
        lat: f64,

        #[arg(allow_hyphen_values = true)]
        lon: f64,

        /// Run the search right away for the current time.
        #[arg(long)]
        show: bool,
    },
}

impl Cli {
    pub async fn run(self, config: anyhow::Result<Config>) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(config.unwrap_or_default()),
            Command::Show { country, city, locality, lat, lon, date } => {
                let mut session = Session::new(&config?)?;

                if let (Some(lat), Some(lon)) = (lat, lon) {
                    session.double_click(lat, lon).await;
                }
                for event in [
                    (!country.is_empty()).then_some(Event::SetCountry(country)),
                    (!city.is_empty()).then_some(Event::SetCity(city)),
                    (!locality.is_empty()).then_some(Event::SetLocality(locality)),
                    date.map(|d| Event::SetDateTime(Some(d))),
                ]
                .into_iter()
                .flatten()
                {
                    session.send(event).await;
                }

                session.submit().await;
                Ok(())
            }
            Command::Pick { lat, lon, show } => {
                let mut session = Session::new(&config?)?;
                session.double_click(lat, lon).await;
                render::print_selection(session.controller.state());

                if show {
                    session.submit().await;
                }
                Ok(())
            }
        }
    }
}

/// Controller plus map viewport, driven sequentially.
struct Session {
    controller: SearchController,
    map: MapAdapter,
}

impl Session {
    fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            controller: SearchController::from_config(config)
                .context("Failed to set up weather search")?,
            map: MapAdapter::default(),
        })
    }

    async fn double_click(&mut self, lat: f64, lon: f64) {
        let event = self.map.translate(MapEvent::DoubleClick { lat, lon });
        self.send(event).await;
    }

    async fn submit(&mut self) {
        if self.send(Event::Submit).await {
            render::print_weather(self.controller.state(), &self.map);
        }
    }

    /// Returns whether the results should be shown.
    async fn send(&mut self, event: Event) -> bool {
        let effects = self.controller.handle(event).await;
        self.map.apply(&effects);

        let mut show_results = false;
        for effect in effects {
            match effect {
                Effect::Alert(message) => render::alert(&message),
                Effect::ScrollToResults { after } => {
                    tokio::time::sleep(after).await;
                    show_results = true;
                }
                Effect::Recenter { center, zoom } => {
                    tracing::debug!("Map recentered on {} at zoom {}", center, zoom);
                }
            }
        }
        show_results
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    config.backend.base_url = Text::new("Weather backend URL:")
        .with_default(&config.backend.base_url)
        .prompt()?;

    config.geocoder.base_url = Text::new("Geocoder (Nominatim) URL:")
        .with_default(&config.geocoder.base_url)
        .prompt()?;

    config.geocoder.user_agent = Text::new("User agent sent to the geocoder:")
        .with_default(&config.geocoder.user_agent)
        .prompt()?;

    config.search.send_resolved_coordinates =
        Confirm::new("Send geocoded coordinates instead of place names?")
            .with_default(config.search.send_resolved_coordinates)
            .prompt()?;

    config.validate()?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_parses_text_fields_and_date() {
        let cli = Cli::try_parse_from([
            "checknow", "show", "--country", "Guatemala", "--city", "Antigua", "--date",
            "2026-10-20T10:00",
        ])
        .unwrap();

        match cli.command {
            Command::Show { country, city, locality, lat, date, .. } => {
                assert_eq!(country, "Guatemala");
                assert_eq!(city, "Antigua");
                assert!(locality.is_empty());
                assert!(lat.is_none());
                assert_eq!(date.map(|d| d.to_string()).as_deref(), Some("2026-10-20T10:00"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn show_rejects_bad_date() {
        let res = Cli::try_parse_from(["checknow", "show", "--city", "Antigua", "--date", "tomorrow"]);
        assert!(res.is_err());
    }

    #[test]
    fn coordinates_conflict_with_text_fields() {
        let res = Cli::try_parse_from([
            "checknow", "show", "--lat", "15", "--lon", "-90", "--city", "Antigua",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn pick_accepts_negative_longitude_and_global_verbose() {
        let cli = Cli::try_parse_from(["checknow", "pick", "15.0", "-90.0", "--show", "-v"]).unwrap();

        assert!(cli.verbose);
        match cli.command {
            Command::Pick { lat, lon, show } => {
                assert_eq!(lat, 15.0);
                assert_eq!(lon, -90.0);
                assert!(show);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
