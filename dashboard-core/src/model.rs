use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::WeatherError, units::Units};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A search for weather data, either by city name or by coordinates.
///
/// When both are present the city wins; `units` falls back to metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherQuery {
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub units: Option<Units>,
}

/// The part of a [`WeatherQuery`] that identifies a place.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryLocation {
    City(String),
    Coordinates(Coordinates),
}

impl WeatherQuery {
    pub fn city(city: impl Into<String>) -> Self {
        Self {
            city: Some(city.into()),
            ..Self::default()
        }
    }

    pub fn coordinates(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
            ..Self::default()
        }
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = Some(units);
        self
    }

    pub fn units(&self) -> Units {
        self.units.unwrap_or_default()
    }

    /// Resolve which location this query names, failing with
    /// [`WeatherError::InvalidQuery`] if neither a non-blank city nor a full
    /// coordinate pair is usable.
    pub fn location(&self) -> Result<QueryLocation, WeatherError> {
        if let Some(city) = self.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            return Ok(QueryLocation::City(city.to_string()));
        }

        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => {
                let coords = Coordinates::new(lat, lon);
                if coords.is_valid() {
                    Ok(QueryLocation::Coordinates(coords))
                } else {
                    Err(WeatherError::InvalidQuery(format!(
                        "coordinates out of range: lat={lat}, lon={lon}"
                    )))
                }
            }
            _ => Err(WeatherError::InvalidQuery(
                "either a city name or both lat and lon must be provided".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
}

/// Primary weather condition as reported upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: u32,
    /// Coarse group such as "Rain" or "Clouds".
    pub category: String,
    pub description: String,
    pub icon_code: String,
}

impl Condition {
    pub fn icon_url(&self) -> String {
        icon_url(&self.icon_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    /// hPa
    pub pressure: f64,
    pub humidity_pct: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub direction_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub location: LocationInfo,
    pub observed_at: DateTime<Utc>,
    pub measurements: Measurements,
    /// Metres.
    pub visibility_m: Option<u32>,
    pub wind: Wind,
    pub cloud_cover_pct: u8,
    /// Epoch seconds.
    pub sunrise: i64,
    /// Epoch seconds.
    pub sunset: i64,
    pub condition: Condition,
}

impl CurrentWeather {
    pub fn is_night(&self) -> bool {
        let now = self.observed_at.timestamp();
        now < self.sunrise || now > self.sunset
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastItem {
    pub at: DateTime<Utc>,
    pub measurements: Measurements,
    pub condition: Condition,
    pub wind: Wind,
    pub cloud_cover_pct: u8,
    pub visibility_m: Option<u32>,
    /// In `[0, 1]`.
    pub precipitation_probability: f64,
}

/// Chronological 3-hour-interval forecast for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub location: LocationInfo,
    /// Offset of the location's local time from UTC, in seconds.
    pub utc_offset_secs: i32,
    pub items: Vec<ForecastItem>,
}

impl ForecastSeries {
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_secs).unwrap_or(Utc.fix())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub current: CurrentWeather,
    pub forecast: ForecastSeries,
}

/// Five-level severity scale for the upstream air quality index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AqiLevel {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
}

impl AqiLevel {
    /// Indices outside `1..=5` display as [`AqiLevel::Good`].
    pub fn from_index(aqi: u8) -> Self {
        match aqi {
            2 => Self::Fair,
            3 => Self::Moderate,
            4 => Self::Poor,
            5 => Self::VeryPoor,
            _ => Self::Good,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Moderate => "Moderate",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Self::Good => "Air quality is excellent, perfect for outdoor activities",
            Self::Fair => "Air quality is acceptable for most people",
            Self::Moderate => {
                "Sensitive individuals should consider limiting prolonged outdoor exposure"
            }
            Self::Poor => "Everyone may begin to experience health effects",
            Self::VeryPoor => "Health alert: everyone may experience serious health effects",
        }
    }
}

/// Pollutant concentrations in μg/m³.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AirQualityComponents {
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySnapshot {
    pub observed_at: DateTime<Utc>,
    pub aqi: u8,
    pub components: AirQualityComponents,
}

impl AirQualitySnapshot {
    pub fn level(&self) -> AqiLevel {
        AqiLevel::from_index(self.aqi)
    }
}

pub fn icon_url(icon_code: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon_code}@2x.png")
}
