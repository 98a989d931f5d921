//! Core library for the `weather` dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the [`WeatherProvider`] abstraction
//! - Location resolution with a fallback city
//! - Forecast summarizing (next few slots, one slot per coming day)
//! - The [`Dashboard`] controller that owns what is displayed
//!
//! It is used by `weather-cli`, but can also drive other front ends.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod forecast;
pub mod location;
pub mod model;
pub mod provider;

pub use config::Config;
pub use dashboard::{Dashboard, DashboardState, RacePolicy};
pub use error::{LocationError, WeatherError};
pub use location::{FixedPosition, GeolocationSource, LocationResolver, NoGeolocation};
pub use model::{Coordinates, CurrentWeather, Forecast, ForecastEntry, ForecastRecord, Locator};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
