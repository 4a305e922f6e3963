use serde::{Deserialize, Serialize};

/// One entry of the search history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub id: String,
}

/// Geocoded location for a single query. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Normalized weather snapshot for one city and calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    pub city: String,
    /// Calendar day formatted as `M/D/YYYY`.
    pub date: String,
    pub temp_f: i64,
    pub wind_speed: i64,
    pub humidity: u8,
    pub icon: String,
    pub icon_description: String,
}

/// Result of a successful query: the reading series plus the updated history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    #[serde(rename = "weatherData")]
    pub readings: Vec<WeatherReading>,
    pub history: Vec<City>,
}
