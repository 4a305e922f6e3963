//! Core library for `weather-dash`.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - City geocoding and forecast reduction over OpenWeather
//! - The persisted, de-duplicated search history
//! - [`WeatherService`], which ties the three together for a front end
//!
//! It is used by `weather-dash-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod forecast;
pub mod history;
pub mod model;
pub mod provider;
pub mod service;

pub use config::Config;
pub use error::{ErrorKind, WeatherError};
pub use history::HistoryStore;
pub use model::{City, Coordinates, QueryOutcome, WeatherReading};
pub use provider::{ForecastAggregator, GeoResolver, openweather::OpenWeatherProvider};
pub use service::WeatherService;
