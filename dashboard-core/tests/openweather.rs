//! Integration tests for the OpenWeather provider and the caching client
//! against a mock HTTP server.

use std::sync::Arc;

use dashboard_core::{
    CacheHandle, Coordinates, Units, WeatherClient, WeatherError, WeatherProvider, WeatherQuery,
    forecast::{daily_view_in, hourly_view},
    model::QueryLocation,
    provider::openweather::OpenWeatherProvider,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// 2026-03-01 00:00:00 UTC
const START: i64 = 1_772_323_200;

fn current_json() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": -0.1278, "lat": 51.5074 },
        "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
        "base": "stations",
        "main": {
            "temp": 11.2, "feels_like": 10.1, "temp_min": 9.8, "temp_max": 12.4,
            "pressure": 1008, "humidity": 81
        },
        "visibility": 9000,
        "wind": { "speed": 5.1, "deg": 240 },
        "clouds": { "all": 90 },
        "dt": START + 9 * 3600,
        "sys": { "country": "GB", "sunrise": START + 6 * 3600, "sunset": START + 17 * 3600 },
        "timezone": 0,
        "id": 2643743,
        "name": "London",
        "cod": 200
    })
}

fn forecast_json() -> serde_json::Value {
    let list: Vec<_> = (0..40)
        .map(|i| {
            serde_json::json!({
                "dt": START + i * 3 * 3600,
                "main": {
                    "temp": 8.0 + i as f64 * 0.1, "feels_like": 7.0, "temp_min": 6.0, "temp_max": 9.0,
                    "pressure": 1010, "humidity": 75
                },
                "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }],
                "clouds": { "all": 75 },
                "wind": { "speed": 4.2, "deg": 250 },
                "visibility": 10000,
                "pop": 0.35,
                "dt_txt": "ignored"
            })
        })
        .collect();

    serde_json::json!({
        "cod": "200",
        "message": 0,
        "cnt": 40,
        "list": list,
        "city": {
            "id": 2643743,
            "name": "London",
            "coord": { "lat": 51.5074, "lon": -0.1278 },
            "country": "GB",
            "population": 1000000,
            "timezone": 0,
            "sunrise": START + 6 * 3600,
            "sunset": START + 17 * 3600
        }
    })
}

fn air_json() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": -0.1278, "lat": 51.5074 },
        "list": [{
            "dt": START,
            "main": { "aqi": 3 },
            "components": {
                "co": 230.31, "no": 0.1, "no2": 18.5, "o3": 60.08,
                "so2": 2.3, "pm2_5": 14.2, "pm10": 19.9, "nh3": 0.9
            }
        }]
    })
}

fn provider(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::with_base_url("TEST_KEY".to_string(), &server.uri())
}

#[tokio::test]
async fn test_current_weather_by_city() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "London"))
        .and(query_param("appid", "TEST_KEY"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json()))
        .expect(1)
        .mount(&server)
        .await;

    let current = provider(&server)
        .current(&QueryLocation::City("London".into()), Units::Imperial)
        .await
        .unwrap();

    assert_eq!(current.location.name, "London");
    assert_eq!(current.location.country, "GB");
    assert_eq!(current.condition.category, "Rain");
    assert_eq!(current.condition.icon_code, "10d");
    assert_eq!(current.measurements.humidity_pct, 81);
    assert_eq!(current.visibility_m, Some(9000));
    assert_eq!(current.cloud_cover_pct, 90);
    assert!(!current.is_night());
}

#[tokio::test]
async fn test_coordinates_are_sent_as_lat_lon() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("lat", "51.5074"))
        .and(query_param("lon", "-0.1278"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json()))
        .expect(1)
        .mount(&server)
        .await;

    let series = provider(&server)
        .forecast(&QueryLocation::Coordinates(Coordinates::new(51.5074, -0.1278)), Units::Metric)
        .await
        .unwrap();

    assert_eq!(series.items.len(), 40);
    assert_eq!(series.items[0].precipitation_probability, 0.35);
    assert_eq!(hourly_view(&series, 24).len(), 8);
    assert_eq!(daily_view_in(&series, 5, &chrono::Utc).len(), 5);
}

#[tokio::test]
async fn test_current_not_found_is_location_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
        )
        .mount(&server)
        .await;

    let err = provider(&server)
        .current(&QueryLocation::City("Atlantis".into()), Units::Metric)
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::LocationNotFound));
}

#[tokio::test]
async fn test_forecast_not_found_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = provider(&server)
        .forecast(&QueryLocation::City("London".into()), Units::Metric)
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Upstream { status: 404, .. }));
}

#[tokio::test]
async fn test_unauthorized_carries_upstream_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .current(&QueryLocation::City("London".into()), Units::Metric)
        .await
        .unwrap_err();

    match err {
        WeatherError::Upstream { status, message } => {
            assert_eq!(status, 401);
            assert!(message.starts_with("Invalid API key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"unexpected\": true}"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .current(&QueryLocation::City("London".into()), Units::Metric)
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_air_quality_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/air_pollution"))
        .and(query_param("lat", "51.5074"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(air_json()))
        .mount(&server)
        .await;

    let snapshot = provider(&server)
        .air_quality(Coordinates::new(51.5074, -0.1278))
        .await
        .unwrap()
        .expect("snapshot");

    assert_eq!(snapshot.aqi, 3);
    assert_eq!(snapshot.level().label(), "Moderate");
    assert_eq!(snapshot.components.pm2_5, 14.2);
}

#[tokio::test]
async fn test_empty_air_quality_list_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/air_pollution"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "list": [] })))
        .mount(&server)
        .await;

    let snapshot = provider(&server).air_quality(Coordinates::new(0.0, 0.0)).await.unwrap();
    assert!(snapshot.is_none());
}

#[tokio::test]
async fn test_client_hits_network_once_per_cache_window() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = WeatherClient::new(Arc::new(provider(&server)), CacheHandle::new());

    let first = client.fetch_weather(&WeatherQuery::city("London")).await.unwrap();
    let second = client.fetch_weather(&WeatherQuery::city("LONDON")).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(client.cache().len(), 1);
}

#[tokio::test]
async fn test_client_does_not_request_forecast_after_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json()))
        .expect(0)
        .mount(&server)
        .await;

    let client = WeatherClient::new(Arc::new(provider(&server)), CacheHandle::new());
    let err = client.fetch_weather(&WeatherQuery::city("Nowhere")).await.unwrap_err();

    assert!(matches!(err, WeatherError::LocationNotFound));
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let provider: Arc<dyn WeatherProvider> =
        Arc::new(OpenWeatherProvider::with_base_url("KEY".into(), "http://127.0.0.1:9"));

    let err = provider
        .current(&QueryLocation::City("London".into()), Units::Metric)
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Network(_)));
}
