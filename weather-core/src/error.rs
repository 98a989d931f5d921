use thiserror::Error;

pub const MSG_CITY_NOT_FOUND: &str = "City not found. Please check spelling.";
pub const MSG_INVALID_API_KEY: &str = "Invalid API key.";
pub const MSG_WEATHER_FAILED: &str = "Failed to load weather data.";
pub const MSG_FORECAST_FAILED: &str = "Failed to load forecast data.";
pub const MSG_EMPTY_SEARCH: &str = "Please enter a city name.";

/// Failures talking to the weather provider.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("location not found by provider")]
    NotFound,

    #[error("provider rejected the API key")]
    Unauthorized,

    #[error("provider request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to reach provider: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode provider response: {0}")]
    Decode(String),
}

impl WeatherError {
    /// Message shown to the user when the current-weather request fails.
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::NotFound => MSG_CITY_NOT_FOUND,
            WeatherError::Unauthorized => MSG_INVALID_API_KEY,
            _ => MSG_WEATHER_FAILED,
        }
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::Decode(err.to_string())
    }
}

/// Why the geolocation source could not produce a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location service unavailable")]
    Unavailable,
}
