use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::instrument;

use crate::{
    error::WeatherError,
    model::{
        AirQualityComponents, AirQualitySnapshot, Condition, Coordinates, CurrentWeather,
        ForecastItem, ForecastSeries, LocationInfo, Measurements, QueryLocation, Wind,
    },
    units::Units,
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl std::fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherProvider").field("base_url", &self.base_url).finish()
    }
}

/// How a 404 from an endpoint should be reported.
#[derive(Debug, Clone, Copy)]
enum NotFound {
    Location,
    Status,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn location_params(
        &self,
        location: &QueryLocation,
        units: Units,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("units", units.as_str().to_string()),
            ("appid", self.api_key.clone()),
        ];
        match location {
            QueryLocation::City(city) => params.push(("q", city.clone())),
            QueryLocation::Coordinates(c) => {
                params.push(("lat", c.lat.to_string()));
                params.push(("lon", c.lon.to_string()));
            }
        }
        params
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
        not_found: NotFound,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/data/2.5/{endpoint}", self.base_url);
        tracing::info!(endpoint, "requesting upstream");

        let res = self.http.get(&url).query(params).send().await.map_err(WeatherError::Network)?;

        let status = res.status();
        let body = res.text().await.map_err(WeatherError::Network)?;

        if !status.is_success() {
            if status == StatusCode::NOT_FOUND && matches!(not_found, NotFound::Location) {
                return Err(WeatherError::LocationNotFound);
            }
            return Err(WeatherError::Upstream {
                status: status.as_u16(),
                message: upstream_message(status, &body),
            });
        }

        serde_json::from_str(&body).map_err(|err| {
            let body = truncate_body(&body);
            WeatherError::InvalidResponse(format!("{endpoint}: {err}; body: {body}"))
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self), level = "debug")]
    async fn current(
        &self,
        location: &QueryLocation,
        units: Units,
    ) -> Result<CurrentWeather, WeatherError> {
        let params = self.location_params(location, units);
        let parsed: OwCurrentResponse = self
            .get_json("weather", &params, NotFound::Location)
            .await?;
        Ok(parsed.into())
    }

    #[instrument(skip(self), level = "debug")]
    async fn forecast(
        &self,
        location: &QueryLocation,
        units: Units,
    ) -> Result<ForecastSeries, WeatherError> {
        let params = self.location_params(location, units);
        let parsed: OwForecastResponse = self
            .get_json("forecast", &params, NotFound::Status)
            .await?;
        Ok(parsed.into())
    }

    #[instrument(skip(self), level = "debug")]
    async fn air_quality(
        &self,
        coordinates: Coordinates,
    ) -> Result<Option<AirQualitySnapshot>, WeatherError> {
        let params = [
            ("lat", coordinates.lat.to_string()),
            ("lon", coordinates.lon.to_string()),
            ("appid", self.api_key.clone()),
        ];
        let parsed: OwAirResponse = self
            .get_json("air_pollution", &params, NotFound::Status)
            .await?;

        Ok(parsed.list.into_iter().next().map(|entry| AirQualitySnapshot {
            observed_at: unix_to_utc(entry.dt),
            aqi: entry.main.aqi,
            components: entry.components,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

impl From<OwCoord> for Coordinates {
    fn from(c: OwCoord) -> Self {
        Coordinates::new(c.lat, c.lon)
    }
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    id: u32,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: f64,
    humidity: u8,
}

impl From<OwMain> for Measurements {
    fn from(m: OwMain) -> Self {
        Measurements {
            temperature: m.temp,
            feels_like: m.feels_like,
            temp_min: m.temp_min,
            temp_max: m.temp_max,
            pressure: m.pressure,
            humidity_pct: m.humidity,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

impl From<OwWind> for Wind {
    fn from(w: OwWind) -> Self {
        Wind {
            speed: w.speed,
            direction_deg: w.deg,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: OwCoord,
    weather: Vec<OwCondition>,
    main: OwMain,
    visibility: Option<u32>,
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    dt: i64,
    sys: OwSys,
    name: String,
}

impl From<OwCurrentResponse> for CurrentWeather {
    fn from(r: OwCurrentResponse) -> Self {
        CurrentWeather {
            location: LocationInfo {
                name: r.name,
                country: r.sys.country,
                coordinates: r.coord.into(),
            },
            observed_at: unix_to_utc(r.dt),
            measurements: r.main.into(),
            visibility_m: r.visibility,
            wind: r.wind.into(),
            cloud_cover_pct: r.clouds.all,
            sunrise: r.sys.sunrise,
            sunset: r.sys.sunset,
            condition: primary_condition(r.weather),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwCondition>,
    #[serde(default)]
    clouds: OwClouds,
    wind: OwWind,
    visibility: Option<u32>,
    #[serde(default)]
    pop: f64,
}

impl From<OwForecastEntry> for ForecastItem {
    fn from(e: OwForecastEntry) -> Self {
        ForecastItem {
            at: unix_to_utc(e.dt),
            measurements: e.main.into(),
            condition: primary_condition(e.weather),
            wind: e.wind.into(),
            cloud_cover_pct: e.clouds.all,
            visibility_m: e.visibility,
            precipitation_probability: e.pop.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    coord: OwCoord,
    #[serde(default)]
    country: String,
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

impl From<OwForecastResponse> for ForecastSeries {
    fn from(r: OwForecastResponse) -> Self {
        let mut items: Vec<ForecastItem> = r.list.into_iter().map(Into::into).collect();
        items.sort_by_key(|item| item.at);

        ForecastSeries {
            location: LocationInfo {
                name: r.city.name,
                country: r.city.country,
                coordinates: r.city.coord.into(),
            },
            utc_offset_secs: r.city.timezone,
            items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwAirIndex {
    aqi: u8,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    dt: i64,
    main: OwAirIndex,
    components: AirQualityComponents,
}

#[derive(Debug, Deserialize)]
struct OwAirResponse {
    #[serde(default)]
    list: Vec<OwAirEntry>,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: String,
}

fn primary_condition(weather: Vec<OwCondition>) -> Condition {
    weather
        .into_iter()
        .next()
        .map(|w| Condition {
            id: w.id,
            category: w.main,
            description: w.description,
            icon_code: w.icon,
        })
        .unwrap_or_else(|| Condition {
            id: 0,
            category: "Unknown".to_string(),
            description: "Unknown".to_string(),
            icon_code: String::new(),
        })
}

fn upstream_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<OwErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or_default().to_string())
}

fn unix_to_utc(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
