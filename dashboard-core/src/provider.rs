use crate::{
    Config,
    error::WeatherError,
    model::{AirQualitySnapshot, Coordinates, CurrentWeather, ForecastSeries, QueryLocation},
    provider::openweather::OpenWeatherProvider,
    units::Units,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Upstream source of weather, forecast and air quality data.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions. An unknown place fails with [`WeatherError::LocationNotFound`].
    async fn current(
        &self,
        location: &QueryLocation,
        units: Units,
    ) -> Result<CurrentWeather, WeatherError>;

    /// 5-day forecast in 3-hour steps, chronological.
    async fn forecast(
        &self,
        location: &QueryLocation,
        units: Units,
    ) -> Result<ForecastSeries, WeatherError>;

    /// Latest air quality sample, `None` when upstream has no data for the point.
    async fn air_quality(
        &self,
        coordinates: Coordinates,
    ) -> Result<Option<AirQualitySnapshot>, WeatherError>;
}

/// Construct the OpenWeather provider from config, failing fast when no
/// usable API key is configured.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn WeatherProvider>, WeatherError> {
    let api_key = config.require_api_key()?;

    let provider = match config.base_url.as_deref() {
        Some(base_url) => OpenWeatherProvider::with_base_url(api_key, base_url),
        None => OpenWeatherProvider::new(api_key),
    };

    Ok(Arc::new(provider))
}
