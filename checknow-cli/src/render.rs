//! Human-friendly terminal output.

use checknow_core::map::marker;
use checknow_core::recommend::{self, RecommendationKind};
use checknow_core::{MapAdapter, Reading, SearchState};

pub fn alert(message: &str) {
    eprintln!("! {message}");
}

/// Fields filled in by a map pick.
pub fn print_selection(state: &SearchState) {
    println!("Country:  {}", or_dash(&state.country));
    println!("City:     {}", or_dash(&state.city));
    println!("Locality: {}", or_dash(&state.locality));
    if let Some(when) = state.date_time {
        println!("Date:     {}", when.as_naive().format("%A %-d %B %Y, %H:%M"));
    }
    if let Some(m) = marker(state.selected_position) {
        println!("{}", m.popup);
    }
}

pub fn print_weather(state: &SearchState, map: &MapAdapter) {
    let Some(weather) = state.weather.as_ref() else {
        return;
    };

    println!();
    match state.date_time {
        Some(when) => println!("Weather for {}", when.as_naive().format("%A %-d %B %Y, %H:%M")),
        None => println!("Weather"),
    }

    print_reading("Temperature", &weather.temperature);
    print_reading("Precipitation", &weather.precipitation);
    print_reading("Wind", &weather.wind);
    print_reading("Solar radiation", &weather.solar_radiation);
    print_reading("Rain", &weather.rain_prediction);
    if let Some(source) = &weather.source {
        println!("  {:<16}{}", "Source", source);
    }

    if let Some(m) = marker(state.selected_position) {
        let view = map.view();
        println!("  {} (map zoom {})", m.popup, view.zoom);
    }

    println!();
    println!("Recommended activities:");
    for rec in recommend::evaluate(Some(weather)) {
        println!("  {} {}", icon(rec.kind), rec.text());
    }
}

fn print_reading(label: &str, reading: &Option<Reading>) {
    let text = reading.as_ref().map(Reading::as_str).unwrap_or("--");
    println!("  {label:<16}{text}");
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "--" } else { s }
}

fn icon(kind: RecommendationKind) -> &'static str {
    match kind {
        RecommendationKind::Hot => "[hot]",
        RecommendationKind::Pleasant => "[ok]",
        RecommendationKind::Cold => "[cold]",
        RecommendationKind::Rain => "[rain]",
        RecommendationKind::StrongWind | RecommendationKind::ModerateWind => "[wind]",
        RecommendationKind::NoMatch | RecommendationKind::Placeholder => "[-]",
    }
}
