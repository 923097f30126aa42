//! Core library for the `weather-dash` terminal dashboard.
//!
//! This crate defines:
//! - A TTL response cache and deterministic cache keys
//! - The weather client over an abstract upstream provider (OpenWeather)
//! - Forecast views (hourly, daily, temperature trend)
//! - Persisted preferences (units, recent searches)
//! - Configuration & credentials handling
//!
//! It is used by `dashboard-cli`, but can also be reused by other front ends.

pub mod cache;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod forecast;
pub mod geolocation;
pub mod key;
pub mod model;
pub mod preferences;
pub mod provider;
pub mod units;

pub use cache::{CacheHandle, MIN_SWEEP_INTERVAL, SWEEP_INTERVAL, Sweeper, TtlCache};
pub use client::{AirQuality, WeatherClient};
pub use config::{Config, ValidationMode};
pub use dashboard::{Dashboard, DashboardView, SearchOutcome};
pub use error::{GeolocationError, SearchError, WeatherError};
pub use geolocation::{ConfiguredLocation, LocationSource};
pub use model::{AirQualitySnapshot, Coordinates, WeatherData, WeatherQuery};
pub use preferences::{FileStore, PreferenceContext, Preferences};
pub use provider::{WeatherProvider, provider_from_config};
pub use units::Units;
