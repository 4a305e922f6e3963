use crate::{
    Config,
    error::WeatherError,
    model::{Coordinates, WeatherReading},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Resolves a free-text city name to a canonical name and coordinates.
#[async_trait]
pub trait GeoResolver: Send + Sync + Debug {
    /// `city_name` is expected to be trimmed and non-empty.
    async fn resolve(&self, city_name: &str) -> Result<Coordinates, WeatherError>;
}

/// Produces the `[current, day1, .., day5]` reading series for a location.
#[async_trait]
pub trait ForecastAggregator: Send + Sync + Debug {
    async fn fetch(&self, coords: &Coordinates) -> Result<Vec<WeatherReading>, WeatherError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = config.api_key()?;

    let provider =
        OpenWeatherProvider::new(api_key.to_owned(), config.base_url.clone(), config.timeout())?;

    Ok(provider)
}
