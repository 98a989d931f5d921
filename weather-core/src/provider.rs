use crate::{
    Config,
    error::WeatherError,
    model::{Coordinates, CurrentWeather, ForecastRecord, Locator},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(&self, locator: &Locator) -> Result<CurrentWeather, WeatherError>;

    /// The provider's flat list of 3-hour records, oldest first.
    async fn forecast(&self, coordinates: Coordinates) -> Result<Vec<ForecastRecord>, WeatherError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;

    let provider = OpenWeatherProvider::new(api_key.to_owned()).with_base_url(&config.base_url);

    Ok(Arc::new(provider))
}
