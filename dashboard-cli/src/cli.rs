use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use dashboard_core::{
    CacheHandle, Config, ConfiguredLocation, Dashboard, FileStore, PreferenceContext,
    SearchError, SearchOutcome, ValidationMode, WeatherClient, WeatherQuery, model::QueryLocation,
    provider_from_config,
};

use crate::{render, session};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dash", version, about = "Terminal weather dashboard")]
pub struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and an optional home location.
    Configure,

    /// Show weather for a city or a coordinate pair.
    Show {
        /// City name, e.g. "London" or "Paris,FR".
        city: Option<String>,

        #[arg(long, requires = "lon", conflicts_with = "city", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", conflicts_with = "city", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Hours covered by the hourly view.
        #[arg(long, default_value_t = 24)]
        hours: usize,

        /// Days covered by the daily view.
        #[arg(long, default_value_t = 5)]
        days: usize,

        /// Print the raw result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show weather at the configured home location.
    Here,

    /// Switch between metric and imperial units.
    Units,

    /// List recent searches.
    Recent,

    /// Interactive dashboard that keeps its cache between searches.
    Dashboard,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, lat, lon, hours, days, json } => {
                let dashboard = build_dashboard()?;
                let query = WeatherQuery {
                    city,
                    lat,
                    lon,
                    units: None,
                };
                // Fail before any network access when the query is unusable.
                let location = query.location().map_err(|err| anyhow!(err.user_message()))?;

                let outcome = match location {
                    QueryLocation::City(city) => dashboard.search_city(&city).await,
                    QueryLocation::Coordinates(c) => {
                        dashboard.search_coordinates(c.lat, c.lon).await
                    }
                };
                print_outcome(outcome, hours, days, json)
            }
            Command::Here => {
                let dashboard = build_dashboard()?;
                print_outcome(dashboard.search_here().await, 24, 5, false)
            }
            Command::Units => {
                let mut prefs = load_preferences()?;
                prefs.toggle_units();
                println!("Units: {}", prefs.units());
                Ok(())
            }
            Command::Recent => {
                let prefs = load_preferences()?;
                if prefs.recent_searches().is_empty() {
                    println!("No recent searches.");
                }
                for city in prefs.recent_searches() {
                    println!("{city}");
                }
                Ok(())
            }
            Command::Dashboard => {
                let dashboard = build_dashboard()?;
                session::run(dashboard).await
            }
        }
    }
}

fn print_outcome(
    outcome: Result<SearchOutcome, SearchError>,
    hours: usize,
    days: usize,
    json: bool,
) -> anyhow::Result<()> {
    match outcome.map_err(|err| anyhow!(err.user_message()))? {
        SearchOutcome::Applied(view) if json => {
            let weather = view.weather.as_deref();
            let air = view.air_quality.as_ref().and_then(|a| a.snapshot());
            let out = serde_json::json!({
                "units": view.units,
                "weather": weather,
                "air_quality": air,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        SearchOutcome::Applied(view) => print!("{}", render::view(&view, hours, days)),
        SearchOutcome::Superseded => {}
    }
    Ok(())
}

/// Preferences for commands that never reach the upstream.
fn load_preferences() -> anyhow::Result<PreferenceContext> {
    Config::load()?.validate(ValidationMode::Lenient)?;
    open_preferences()
}

fn open_preferences() -> anyhow::Result<PreferenceContext> {
    let path = Config::preferences_file_path()?;
    Ok(PreferenceContext::load(Box::new(FileStore::open(path))))
}

fn build_dashboard() -> anyhow::Result<Dashboard> {
    let config = Config::load()?;
    config
        .validate(ValidationMode::Strict)
        .map_err(|err| anyhow!(err.user_message()))?;

    let provider = provider_from_config(&config)?;
    let client = WeatherClient::new(provider, CacheHandle::new());
    let prefs = open_preferences()?;
    let location = Arc::new(ConfiguredLocation::new(config.home));

    Ok(Dashboard::new(client, prefs, location))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message("Get one at https://openweathermap.org/api")
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);
    config.require_api_key().map_err(|err| anyhow!(err.user_message()))?;

    let set_home = inquire::Confirm::new("Set a home location for `weather-dash here`?")
        .with_default(config.home.is_some())
        .prompt()?;
    if set_home {
        let lat = inquire::CustomType::<f64>::new("Latitude:").prompt()?;
        let lon = inquire::CustomType::<f64>::new("Longitude:").prompt()?;
        match WeatherQuery::coordinates(lat, lon).location() {
            Ok(QueryLocation::Coordinates(home)) => config.home = Some(home),
            _ => return Err(anyhow!("Coordinates out of range: {lat}, {lon}")),
        }
    }

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}
