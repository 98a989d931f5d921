use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// How a location is identified to the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum Locator {
    ByCoordinate(Coordinates),
    ByName(String),
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::ByCoordinate(coords) => write!(f, "({coords})"),
            Locator::ByName(name) => f.write_str(name),
        }
    }
}

/// Current conditions, already shaped for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// "{name}, {country code}", e.g. "Delhi, IN".
    pub location_label: String,
    pub temperature_celsius: f64,
    pub description: String,
    pub icon_url: String,
    /// Where the provider resolved the locator to; the forecast is fetched for these.
    pub coordinates: Coordinates,
}

/// One 3-hour-interval record as returned by the forecast endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub timestamp: DateTime<Utc>,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub description: String,
}

/// A forecast record with its display label (a time for hourly rows, a date for daily rows).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub hourly: Vec<ForecastEntry>,
    pub daily: Vec<ForecastEntry>,
}
