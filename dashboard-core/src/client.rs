//! Cached access to weather and air quality data.
//!
//! Every operation checks the cache first and only reaches the provider on a
//! miss. Nothing is retried: a failed fetch is reported once.

use std::{sync::Arc, time::Duration};
use tracing::instrument;

use crate::{
    cache::CacheHandle,
    error::WeatherError,
    key,
    model::{AirQualitySnapshot, Coordinates, QueryLocation, WeatherData, WeatherQuery},
    provider::WeatherProvider,
};

/// Upstream refreshes roughly every 10 minutes.
pub const WEATHER_TTL: Duration = Duration::from_secs(5 * 60);
pub const AIR_QUALITY_TTL: Duration = Duration::from_secs(60 * 60);

/// Outcome of an air quality lookup. Failures are not errors: air quality
/// is supplementary, so callers get an explicit "unavailable" instead.
#[derive(Debug, Clone, PartialEq)]
pub enum AirQuality {
    Available(Arc<AirQualitySnapshot>),
    Unavailable { reason: String },
}

impl AirQuality {
    pub fn snapshot(&self) -> Option<&AirQualitySnapshot> {
        match self {
            AirQuality::Available(snapshot) => Some(snapshot),
            AirQuality::Unavailable { .. } => None,
        }
    }

    fn unavailable(reason: impl Into<String>) -> Self {
        AirQuality::Unavailable {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    provider: Arc<dyn WeatherProvider>,
    cache: CacheHandle,
}

impl WeatherClient {
    pub fn new(provider: Arc<dyn WeatherProvider>, cache: CacheHandle) -> Self {
        Self { provider, cache }
    }

    pub fn cache(&self) -> &CacheHandle {
        &self.cache
    }

    /// Current conditions plus forecast for `query`.
    ///
    /// The two upstream requests run one after the other; a failure of
    /// either fails the whole fetch and nothing is cached.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_weather(
        &self,
        query: &WeatherQuery,
    ) -> Result<Arc<WeatherData>, WeatherError> {
        let location = query.location()?;
        let cache_key = key::weather_key(query)?;

        if let Some(hit) = self.cache.get::<WeatherData>(&cache_key) {
            tracing::debug!(key = %cache_key, "weather cache hit");
            return Ok(hit);
        }
        tracing::debug!(key = %cache_key, "weather cache miss");

        let units = query.units();
        let current = self.provider.current(&location, units).await?;
        let forecast = self.provider.forecast(&location, units).await?;

        let data = Arc::new(WeatherData { current, forecast });
        self.cache.set_shared(cache_key, Arc::clone(&data), WEATHER_TTL);
        Ok(data)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_air_quality(&self, lat: f64, lon: f64) -> AirQuality {
        let coordinates = match WeatherQuery::coordinates(lat, lon).location() {
            Ok(QueryLocation::Coordinates(c)) => c,
            _ => return AirQuality::unavailable(format!("invalid coordinates: {lat}, {lon}")),
        };
        let cache_key = key::air_quality_key(lat, lon);

        if let Some(hit) = self.cache.get::<AirQualitySnapshot>(&cache_key) {
            tracing::debug!(key = %cache_key, "air quality cache hit");
            return AirQuality::Available(hit);
        }

        match self.provider.air_quality(coordinates).await {
            Ok(Some(snapshot)) => {
                let snapshot = Arc::new(snapshot);
                self.cache.set_shared(cache_key, Arc::clone(&snapshot), AIR_QUALITY_TTL);
                AirQuality::Available(snapshot)
            }
            Ok(None) => AirQuality::unavailable("no air quality data for this location"),
            Err(err) => {
                tracing::warn!(error = %err, "air quality unavailable");
                AirQuality::unavailable(err.user_message())
            }
        }
    }

    /// Air quality for already-resolved coordinates.
    pub async fn fetch_air_quality_at(&self, coordinates: Coordinates) -> AirQuality {
        self.fetch_air_quality(coordinates.lat, coordinates.lon).await
    }
}
