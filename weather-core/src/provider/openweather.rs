use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    config::DEFAULT_BASE_URL,
    error::WeatherError,
    model::{Coordinates, CurrentWeather, ForecastRecord, Locator},
};

use super::WeatherProvider;

pub const ICON_URL_PREFIX: &str = "https://openweathermap.org/img/wn/";
const UNITS: &str = "metric";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Point the provider at another host, e.g. a mock server in tests.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = base_url.as_ref().trim_end_matches('/').to_string();
        self
    }

    /// GET `{base_url}/{endpoint}` with the locator, key and unit parameters.
    async fn get(&self, endpoint: &str, locator: &Locator) -> Result<String, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut query: Vec<(&str, String)> = match locator {
            Locator::ByCoordinate(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ],
            Locator::ByName(name) => vec![("q", name.clone())],
        };
        query.push(("appid", self.api_key.clone()));
        query.push(("units", UNITS.to_string()));

        debug!(%endpoint, %locator, "requesting OpenWeather");

        let res = self.http.get(&url).query(&query).send().await?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::Decode(format!("failed to read {endpoint} body: {e}")))?;

        match status {
            s if s.is_success() => Ok(body),
            StatusCode::NOT_FOUND => Err(WeatherError::NotFound),
            StatusCode::UNAUTHORIZED => Err(WeatherError::Unauthorized),
            s => {
                warn!(status = s.as_u16(), %endpoint, "OpenWeather request failed");
                Err(WeatherError::Status { status: s.as_u16(), body: truncate_body(&body) })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp_max: f64,
    temp_min: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    coord: OwCoord,
    main: OwMain,
    sys: OwSys,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

impl TryFrom<OwCurrentResponse> for CurrentWeather {
    type Error = WeatherError;

    fn try_from(parsed: OwCurrentResponse) -> Result<Self, Self::Error> {
        let weather = parsed
            .weather
            .first()
            .ok_or_else(|| WeatherError::Decode("current weather has no conditions".into()))?;

        let coordinates = Coordinates::new(parsed.coord.lat, parsed.coord.lon);

        Ok(CurrentWeather {
            location_label: location_label(&parsed.name, parsed.sys.country.as_deref(), coordinates),
            temperature_celsius: parsed.main.temp,
            description: weather.description.clone(),
            icon_url: icon_url(&weather.icon),
            coordinates,
        })
    }
}

impl TryFrom<OwForecastEntry> for ForecastRecord {
    type Error = WeatherError;

    fn try_from(entry: OwForecastEntry) -> Result<Self, Self::Error> {
        let timestamp = DateTime::from_timestamp(entry.dt, 0)
            .ok_or_else(|| WeatherError::Decode(format!("invalid forecast timestamp {}", entry.dt)))?;

        let description = entry
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .ok_or_else(|| WeatherError::Decode("forecast record has no conditions".into()))?;

        Ok(ForecastRecord {
            timestamp,
            temperature_max: entry.main.temp_max,
            temperature_min: entry.main.temp_min,
            description,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(&self, locator: &Locator) -> Result<CurrentWeather, WeatherError> {
        let body = self.get("weather", locator).await?;
        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        parsed.try_into()
    }

    async fn forecast(&self, coordinates: Coordinates) -> Result<Vec<ForecastRecord>, WeatherError> {
        let body = self.get("forecast", &Locator::ByCoordinate(coordinates)).await?;
        let parsed: OwForecastResponse = serde_json::from_str(&body)?;
        parsed.list.into_iter().map(ForecastRecord::try_from).collect()
    }
}

/// "{name}, {country}" from whichever parts are present; open sea has neither.
fn location_label(name: &str, country: Option<&str>, coordinates: Coordinates) -> String {
    let parts: Vec<&str> = [Some(name), country]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() {
        coordinates.to_string()
    } else {
        parts.join(", ")
    }
}

pub fn icon_url(icon: &str) -> String {
    format!("{ICON_URL_PREFIX}{icon}.png")
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
