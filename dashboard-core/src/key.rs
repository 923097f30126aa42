//! Cache key derivation.
//!
//! Coordinates are rounded to two decimals (about 1.1 km) so that nearby
//! lookups share one entry. Ties round away from zero, on the exact binary
//! value of the coordinate.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    error::WeatherError,
    model::{QueryLocation, WeatherQuery},
};

pub fn weather_key(query: &WeatherQuery) -> Result<String, WeatherError> {
    let units = query.units();
    let key = match query.location()? {
        QueryLocation::City(city) => format!("weather:{}:{units}", city.to_lowercase()),
        QueryLocation::Coordinates(c) => {
            format!("weather:{}:{}:{units}", two_decimals(c.lat), two_decimals(c.lon))
        }
    };
    Ok(key)
}

/// Pollutant concentrations do not depend on the unit system, so the key has no units part.
pub fn air_quality_key(lat: f64, lon: f64) -> String {
    format!("airquality:{}:{}", two_decimals(lat), two_decimals(lon))
}

fn two_decimals(value: f64) -> String {
    match Decimal::from_f64_retain(value) {
        Some(exact) => {
            let rounded = exact.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("{rounded:.2}")
        }
        None => format!("{value:.2}"),
    }
}
