//! End-to-end search workflow against a mocked geocoder and weather backend.

use std::sync::Arc;
use std::time::Duration;

use checknow_core::config::{BackendConfig, GeocoderConfig, HttpConfig};
use checknow_core::provider::backend::BackendWeatherProvider;
use checknow_core::recommend::RecommendationKind;
use checknow_core::workflow::{MISSING_DATE, PICK_FAILED};
use checknow_core::{
    Clock, Coordinates, Effect, Event, FixedClock, MapAdapter, MapEvent, NominatimGeocoder, Phase,
    SearchController, SearchSettings, TimePoint, recommend,
};
use chrono::NaiveDate;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn now() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap()
}

fn controller(server: &MockServer) -> SearchController {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(now()));
    let http = HttpConfig::default();
    let geocoder = NominatimGeocoder::new(
        &GeocoderConfig {
            base_url: server.uri(),
            user_agent: "checknow-tests".into(),
        },
        &http,
    )
    .unwrap();
    let backend = BackendWeatherProvider::new(
        &BackendConfig {
            base_url: server.uri(),
            ..Default::default()
        },
        &http,
        clock.clone(),
    )
    .unwrap();

    SearchController::new(Arc::new(geocoder), Arc::new(backend), clock, SearchSettings::default())
}

async fn mount_forward(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"lat": "14.5600", "lon": "-90.7300"}
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_text_search_for_tomorrow_uses_forecast_and_adopts_location() {
    let mock_server = MockServer::start().await;
    mount_forward(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/query_weather/forecast"))
        .and(body_json(serde_json::json!({
            "country": "Guatemala",
            "city": "Antigua",
            "dateTime": "2026-10-20T12:00"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "temperature": "23°C",
            "wind": "2 m/s",
            "rain_prediction": "Probabilidad de lluvia: 5%",
            "source": "Meteomatics",
            "location": {"lat": 14.5586, "lon": -90.7295}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut c = controller(&mock_server);
    c.handle(Event::SetCountry("Guatemala".into())).await;
    c.handle(Event::SetCity("Antigua".into())).await;
    c.handle(Event::SetDateTime(Some("2026-10-20T12:00".parse().unwrap()))).await;

    let effects = c.handle(Event::Submit).await;

    let adopted = Coordinates::new(14.5586, -90.7295);
    assert_eq!(c.state().phase, Phase::Ready);
    assert_eq!(c.state().selected_position, Some(adopted));
    assert_eq!(
        effects,
        vec![
            Effect::Recenter { center: adopted, zoom: 10 },
            Effect::ScrollToResults { after: Duration::from_millis(200) },
        ]
    );

    let mut map = MapAdapter::default();
    assert!(map.apply(&effects));
    assert_eq!(map.view().center, adopted);

    let kinds: Vec<_> = recommend::evaluate(c.state().weather.as_ref())
        .into_iter()
        .map(|r| r.kind)
        .collect();
    assert_eq!(kinds, vec![RecommendationKind::Pleasant]);
}

#[tokio::test]
async fn test_double_click_reverse_geocodes_without_querying_weather() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("lat", "15"))
        .and(query_param("lon", "-90"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": {"country": "Guatemala", "city": "Cobán", "neighbourhood": "Centro"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut c = controller(&mock_server);
    let map = MapAdapter::default();
    let event = map.translate(MapEvent::DoubleClick { lat: 15.0, lon: -90.0 });

    let effects = c.handle(event).await;

    let position = Coordinates::new(15.0, -90.0);
    assert_eq!(effects, vec![Effect::Recenter { center: position, zoom: 10 }]);
    assert_eq!(c.state().selected_position, Some(position));
    assert_eq!(c.state().country, "Guatemala");
    assert_eq!(c.state().city, "Cobán");
    assert_eq!(c.state().locality, "Centro");
    assert_eq!(c.state().date_time, Some(TimePoint::new(now())));
    assert_eq!(c.state().phase, Phase::Idle);
}

#[tokio::test]
async fn test_failed_reverse_geocode_keeps_position_and_alerts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut c = controller(&mock_server);
    let effects = c.handle(Event::MapDoubleClick(Coordinates::new(15.0, -90.0))).await;

    assert_eq!(effects.last(), Some(&Effect::Alert(PICK_FAILED.into())));
    assert_eq!(c.state().selected_position, Some(Coordinates::new(15.0, -90.0)));
    assert!(c.state().country.is_empty());
}

#[tokio::test]
async fn test_server_error_keeps_previous_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query_weather/historical"))
        .and(body_json(serde_json::json!({
            "lat": 15.0,
            "lon": -90.0,
            "dateTime": "2026-10-01T09:00"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "temperature": "19°C",
            "source": "NASA POWER"
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/query_weather/historical"))
        .and(body_json(serde_json::json!({
            "lat": 15.0,
            "lon": -90.0,
            "dateTime": "2026-10-02T09:00"
        })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut c = controller(&mock_server);
    c.handle(Event::SetDateTime(Some("2026-10-01T09:00".parse().unwrap()))).await;
    let _ = c.begin_pick(Coordinates::new(15.0, -90.0));

    c.handle(Event::Submit).await;
    let before = c.state().weather.clone();
    assert!(before.is_some());

    c.handle(Event::SetDateTime(Some("2026-10-02T09:00".parse().unwrap()))).await;
    let effects = c.handle(Event::Submit).await;

    assert!(matches!(&effects[..], [Effect::Alert(msg)] if msg.contains("500")));
    assert_eq!(c.state().weather, before);
    assert_eq!(c.state().phase, Phase::Ready);
}

#[tokio::test]
async fn test_validation_failure_makes_no_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut c = controller(&mock_server);
    c.handle(Event::SetCity("Antigua".into())).await;

    let effects = c.handle(Event::Submit).await;

    assert_eq!(effects, vec![Effect::Alert(MISSING_DATE.into())]);
    assert_eq!(c.state().phase, Phase::Idle);
}

#[tokio::test]
async fn test_newer_search_wins_over_slower_older_one() {
    let mock_server = MockServer::start().await;
    mount_forward(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/query_weather/forecast"))
        .and(body_json(serde_json::json!({"city": "Antigua", "dateTime": "2026-10-20T12:00"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "temperature": "35°C"
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/query_weather/forecast"))
        .and(body_json(serde_json::json!({"city": "Cobán", "dateTime": "2026-10-20T12:00"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "temperature": "15°C"
        })))
        .mount(&mock_server)
        .await;

    let mut c = controller(&mock_server);
    c.handle(Event::SetDateTime(Some("2026-10-20T12:00".parse().unwrap()))).await;

    c.handle(Event::SetCity("Antigua".into())).await;
    let older = c.begin_search().unwrap();
    c.handle(Event::SetCity("Cobán".into())).await;
    let newer = c.begin_search().unwrap();

    let newer_query = newer.resolve().await.unwrap();
    assert!(c.begin_query(&newer_query));
    let newer_done = newer_query.run().await;

    let older_done = older.resolve().await.unwrap().run().await;

    c.complete_search(newer_done);
    assert!(c.complete_search(older_done).is_empty());

    let temperature = c.state().weather.as_ref().and_then(|w| w.temperature.clone());
    assert_eq!(temperature.map(|t| t.0), Some("15°C".to_string()));
}
