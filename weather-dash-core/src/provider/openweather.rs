use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    error::WeatherError,
    forecast::{self, FeedResponse},
    model::{Coordinates, WeatherReading},
};

use super::{ForecastAggregator, GeoResolver};

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<T, WeatherError> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    upstream(what, "request timed out", e)
                } else {
                    upstream(what, "request failed", e)
                }
            })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| upstream(what, "could not read response body", e))?;

        if !status.is_success() {
            return Err(WeatherError::Upstream(format!(
                "OpenWeather {what} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body).map_err(|e| upstream(what, "returned malformed JSON", e))
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoMatch {
    name: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    country: Option<String>,
    state: Option<String>,
}

#[async_trait]
impl GeoResolver for OpenWeatherProvider {
    #[instrument(skip(self))]
    async fn resolve(&self, city_name: &str) -> Result<Coordinates, WeatherError> {
        let matches: Vec<OwGeoMatch> = self
            .get_json("/geo/1.0/direct", &[("q", city_name), ("limit", "1")], "geocode")
            .await?;

        let Some(top) = matches.into_iter().next() else {
            return Err(WeatherError::NotFound(format!("City not found: {city_name}")));
        };

        let (Some(name), Some(lat), Some(lon)) = (top.name, top.lat, top.lon) else {
            return Err(WeatherError::Upstream(
                "OpenWeather geocode match is missing name, lat or lon".to_string(),
            ));
        };

        debug!(%name, lat, lon, "Resolved city");

        Ok(Coordinates {
            name,
            lat,
            lon,
            country: top.country.unwrap_or_default(),
            state: top.state,
        })
    }
}

#[async_trait]
impl ForecastAggregator for OpenWeatherProvider {
    #[instrument(skip(self, coords), fields(city = %coords.name))]
    async fn fetch(&self, coords: &Coordinates) -> Result<Vec<WeatherReading>, WeatherError> {
        let lat = coords.lat.to_string();
        let lon = coords.lon.to_string();

        let feed: FeedResponse = self
            .get_json(
                "/data/2.5/forecast",
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("units", "imperial")],
                "forecast",
            )
            .await?;

        debug!(entries = feed.list.len(), "Received forecast feed");

        forecast::aggregate(&coords.name, feed.list)
    }
}

fn upstream(what: &str, action: &str, err: impl std::fmt::Display) -> WeatherError {
    WeatherError::Upstream(format!("OpenWeather {what} {action}: {err}"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
