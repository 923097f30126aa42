//! Error taxonomy for the weather client and the location collaborators.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Location not found")]
    LocationNotFound,

    #[error("Upstream request failed with status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl WeatherError {
    /// Message shown to the user for a failed search.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidQuery(_) => {
                "Either city name or coordinates (lat/lon) must be provided.".to_string()
            }
            Self::LocationNotFound => "Location not found. Please check and try again.".to_string(),
            Self::Upstream { status, message } if message.is_empty() => {
                format!("Failed to fetch weather data (status {status}).")
            }
            Self::Upstream { status, message } => {
                format!("Failed to fetch weather data (status {status}): {message}")
            }
            Self::Network(_) => {
                "Could not reach the weather service. Check your connection.".to_string()
            }
            Self::Configuration(msg) => format!("Weather service is not configured. {msg}"),
            Self::InvalidResponse(_) => {
                "The weather service returned data that could not be read.".to_string()
            }
        }
    }
}

/// Failure reported by a location source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location information is unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Geolocation is not supported")]
    Unsupported,
    #[error("Unknown geolocation error (code {0})")]
    Unknown(u16),
}

impl GeolocationError {
    /// Map a numeric location error code (1 = denied, 2 = unavailable, 3 = timeout).
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            other => Self::Unknown(other),
        }
    }

    pub fn user_message(&self) -> String {
        let detail = match self {
            Self::PermissionDenied => "Please allow location access in your system settings.",
            Self::PositionUnavailable => "Location information is unavailable.",
            Self::Timeout => "Location request timed out.",
            Self::Unsupported => return "Geolocation is not supported on this system.".to_string(),
            Self::Unknown(_) => "An unknown error occurred.",
        };
        format!("Unable to retrieve your location. {detail}")
    }
}

/// Failure of a dashboard search, from either the location source or the weather client.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Weather(#[from] WeatherError),
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),
}

impl SearchError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Weather(err) => err.user_message(),
            Self::Geolocation(err) => err.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_are_distinct_per_condition() {
        let messages = [
            WeatherError::InvalidQuery("empty".into()).user_message(),
            WeatherError::LocationNotFound.user_message(),
            WeatherError::Upstream {
                status: 500,
                message: String::new(),
            }
            .user_message(),
            WeatherError::Configuration("missing key".into()).user_message(),
            WeatherError::InvalidResponse("eof".into()).user_message(),
        ];

        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn upstream_message_carries_status() {
        let err = WeatherError::Upstream {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert!(err.user_message().contains("503"));
        assert!(err.user_message().contains("Service Unavailable"));
    }

    #[test]
    fn geolocation_codes_map_to_variants() {
        assert_eq!(GeolocationError::from_code(1), GeolocationError::PermissionDenied);
        assert_eq!(GeolocationError::from_code(2), GeolocationError::PositionUnavailable);
        assert_eq!(GeolocationError::from_code(3), GeolocationError::Timeout);
        assert_eq!(GeolocationError::from_code(9), GeolocationError::Unknown(9));
    }

    #[test]
    fn geolocation_messages() {
        let denied = GeolocationError::PermissionDenied.user_message();
        assert!(denied.starts_with("Unable to retrieve your location."));
        assert!(denied.contains("allow location access"));

        let unknown = GeolocationError::from_code(42).user_message();
        assert!(unknown.ends_with("An unknown error occurred."));

        assert_ne!(
            GeolocationError::Timeout.user_message(),
            GeolocationError::PositionUnavailable.user_message()
        );
    }
}
