use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    error::WeatherError,
    history::HistoryStore,
    model::{City, QueryOutcome},
    provider::{ForecastAggregator, GeoResolver},
};

/// Geocode → forecast → record in history.
///
/// Built once at startup and shared by handle with whatever front end serves
/// requests.
#[derive(Debug, Clone)]
pub struct WeatherService {
    geo: Arc<dyn GeoResolver>,
    forecast: Arc<dyn ForecastAggregator>,
    history: Arc<HistoryStore>,
}

impl WeatherService {
    pub fn new(
        geo: Arc<dyn GeoResolver>,
        forecast: Arc<dyn ForecastAggregator>,
        history: Arc<HistoryStore>,
    ) -> Self {
        Self { geo, forecast, history }
    }

    /// Look up the weather for `city_name` and record the search.
    ///
    /// A failure to save history is logged and does not fail the query.
    #[instrument(skip(self))]
    pub async fn query(&self, city_name: &str) -> Result<QueryOutcome, WeatherError> {
        let city_name = city_name.trim();
        if city_name.is_empty() {
            return Err(WeatherError::Validation("City name is required".to_string()));
        }

        let coords = self.geo.resolve(city_name).await?;
        let readings = self.forecast.fetch(&coords).await?;
        info!(city = %coords.name, readings = readings.len(), "Fetched forecast");

        if let Err(err) = self.history.add(city_name).await {
            warn!(error = %err, "Could not save city to history");
        }

        let history = self.history.list().await;

        Ok(QueryOutcome { readings, history })
    }

    pub async fn history(&self) -> Vec<City> {
        self.history.list().await
    }

    /// Remove a history entry and return what is left.
    pub async fn remove_city(&self, id: &str) -> Result<Vec<City>, WeatherError> {
        self.history.remove(id).await?;
        Ok(self.history.list().await)
    }
}
