//! Rule-based activity suggestions derived from a weather result.
//!
//! Pure and total: no I/O, no state, same input gives the same list.

use crate::model::{Reading, WeatherResult};

pub const PLACEHOLDER: &str = "Search a location and time to get activity recommendations.";
pub const NO_MATCH: &str = "No specific recommendation, but check the weather!";

const HOT_ABOVE: f64 = 28.0;
const COLD_BELOW: f64 = 18.0;
const RAIN_PROBABILITY_ABOVE: f64 = 30.0;
const STRONG_WIND_ABOVE: f64 = 25.0;
const MODERATE_WIND_ABOVE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecommendationKind {
    Placeholder,
    Hot,
    Pleasant,
    Cold,
    Rain,
    StrongWind,
    ModerateWind,
    NoMatch,
}

impl RecommendationKind {
    pub fn text(&self) -> &'static str {
        match self {
            Self::Placeholder => PLACEHOLDER,
            Self::Hot => "Hot: swimming, water sports, or indoor activities with air conditioning.",
            Self::Pleasant => "Pleasant: hiking, cycling, or a picnic. Perfect for outdoors!",
            Self::Cold => "Cold: visit a museum, a gallery, or enjoy a movie at home.",
            Self::Rain => "Rain: board games, reading, or visit a shopping mall.",
            Self::StrongWind => "Strong wind: avoid elevated activities. Great for indoors!",
            Self::ModerateWind => "Moderate wind: fly a kite or go light sailing.",
            Self::NoMatch => NO_MATCH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendation {
    pub kind: RecommendationKind,
}

impl Recommendation {
    fn of(kind: RecommendationKind) -> Self {
        Self { kind }
    }

    pub fn text(&self) -> &'static str {
        self.kind.text()
    }
}

/// Ordered suggestions: temperature, then rain, then wind.
pub fn evaluate(weather: Option<&WeatherResult>) -> Vec<Recommendation> {
    use RecommendationKind::*;

    let Some(weather) = weather else {
        return vec![Recommendation::of(Placeholder)];
    };

    let mut recs = Vec::new();

    if let Some(temp) = number(&weather.temperature) {
        if temp > HOT_ABOVE {
            recs.push(Recommendation::of(Hot));
        } else if temp >= COLD_BELOW {
            recs.push(Recommendation::of(Pleasant));
        } else {
            recs.push(Recommendation::of(Cold));
        }
    }

    let rain_chance = weather.rain_prediction.as_ref().and_then(Reading::percent);
    if rain_chance.is_some_and(|p| p > RAIN_PROBABILITY_ABOVE) {
        recs.push(Recommendation::of(Rain));
    }

    if let Some(wind) = number(&weather.wind) {
        if wind > STRONG_WIND_ABOVE {
            recs.push(Recommendation::of(StrongWind));
        } else if wind > MODERATE_WIND_ABOVE {
            recs.push(Recommendation::of(ModerateWind));
        }
    }

    if recs.is_empty() {
        recs.push(Recommendation::of(NoMatch));
    }

    recs
}

/// Plain-text form of [`evaluate`].
pub fn recommendations(weather: Option<&WeatherResult>) -> Vec<String> {
    evaluate(weather).iter().map(|r| r.text().to_string()).collect()
}

fn number(reading: &Option<Reading>) -> Option<f64> {
    reading.as_ref().and_then(Reading::value)
}
