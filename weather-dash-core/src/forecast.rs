//! Reduction of a 3-hour forecast feed to "today + daily snapshots".
//!
//! Each feed entry is decoded on its own, and every field is optional, so a
//! single broken daily entry (missing or wrongly typed fields) is skipped
//! instead of failing the whole payload. The current reading has no such
//! escape hatch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::{error::WeatherError, model::WeatherReading};

/// Time of day (feed clock) that represents a whole day.
pub const REFERENCE_TIME: &str = "12:00:00";

/// Number of daily snapshots that follow the current reading.
pub const MAX_DAILY_READINGS: usize = 5;

#[derive(Debug, Deserialize)]
pub(crate) struct FeedResponse {
    #[serde(default)]
    pub list: Vec<Value>,
}

/// One feed entry. Timestamps are pulled out of the raw JSON first so a
/// malformed entry can still be ordered and classified.
#[derive(Debug)]
struct FeedEntry {
    dt: Option<i64>,
    dt_txt: Option<String>,
    body: Result<EntryBody, String>,
}

impl FeedEntry {
    fn from_value(value: Value) -> Self {
        let dt = value.get("dt").and_then(Value::as_i64);
        let dt_txt = value.get("dt_txt").and_then(Value::as_str).map(str::to_string);
        let body = serde_json::from_value(value).map_err(|e| e.to_string());
        Self { dt, dt_txt, body }
    }
}

#[derive(Debug, Deserialize)]
struct EntryBody {
    main: Option<FeedMain>,
    wind: Option<FeedWind>,
    #[serde(default)]
    weather: Vec<FeedCondition>,
}

#[derive(Debug, Deserialize)]
struct FeedMain {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FeedWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FeedCondition {
    icon: Option<String>,
    description: Option<String>,
    main: Option<String>,
}

/// Turn raw feed entries into `[current, day1, .., day5]`.
///
/// Entries are ordered by `dt` first. The first entry is the current reading
/// regardless of its time of day; daily readings are the entries stamped at
/// [`REFERENCE_TIME`], one per calendar day, strictly increasing.
pub(crate) fn aggregate(city: &str, list: Vec<Value>) -> Result<Vec<WeatherReading>, WeatherError> {
    let mut entries: Vec<FeedEntry> = list.into_iter().map(FeedEntry::from_value).collect();
    entries.sort_by_key(|e| e.dt.unwrap_or(i64::MAX));

    let Some(first) = entries.first() else {
        return Err(WeatherError::Upstream(
            "Forecast response contained no readings".to_string(),
        ));
    };

    let (_, current) = to_reading(city, first).map_err(|reason| {
        WeatherError::Upstream(format!("Current forecast entry is malformed: {reason}"))
    })?;

    let mut readings = Vec::with_capacity(1 + MAX_DAILY_READINGS);
    readings.push(current);

    let mut last_day: Option<NaiveDate> = None;
    for entry in entries.iter().filter(|e| is_reference_time(e)) {
        if readings.len() > MAX_DAILY_READINGS {
            break;
        }

        match to_reading(city, entry) {
            Ok((day, reading)) => {
                if last_day.is_some_and(|seen| seen >= day) {
                    continue;
                }
                last_day = Some(day);
                readings.push(reading);
            }
            Err(reason) => {
                warn!(dt = ?entry.dt, dt_txt = ?entry.dt_txt, %reason, "Skipping malformed daily forecast entry");
            }
        }
    }

    Ok(readings)
}

fn is_reference_time(entry: &FeedEntry) -> bool {
    match (&entry.dt_txt, entry.dt) {
        (Some(txt), _) => txt.ends_with(REFERENCE_TIME),
        (None, Some(dt)) => unix_to_utc(dt)
            .is_some_and(|at| at.format("%H:%M:%S").to_string() == REFERENCE_TIME),
        (None, None) => false,
    }
}

fn missing(field: &str) -> String {
    format!("missing {field}")
}

fn to_reading(city: &str, entry: &FeedEntry) -> Result<(NaiveDate, WeatherReading), String> {
    let at = entry.dt.and_then(unix_to_utc).ok_or_else(|| missing("or invalid dt"))?;
    let body = entry.body.as_ref().map_err(|e| format!("undecodable entry: {e}"))?;
    let main = body.main.as_ref().ok_or_else(|| missing("main"))?;
    let temp = main.temp.ok_or_else(|| missing("main.temp"))?;
    let humidity = main.humidity.ok_or_else(|| missing("main.humidity"))?;
    let humidity = percentage(humidity).ok_or_else(|| format!("main.humidity out of range: {humidity}"))?;
    let wind_speed = body.wind.as_ref().and_then(|w| w.speed).ok_or_else(|| missing("wind.speed"))?;
    let condition = body.weather.first().ok_or_else(|| missing("weather[0]"))?;
    let icon = condition.icon.clone().ok_or_else(|| missing("weather[0].icon"))?;

    let icon_description = condition
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .or(condition.main.as_deref())
        .unwrap_or_default()
        .to_string();

    let reading = WeatherReading {
        city: city.to_string(),
        date: at.format("%-m/%-d/%Y").to_string(),
        temp_f: temp.round() as i64,
        wind_speed: wind_speed.round() as i64,
        humidity,
        icon,
        icon_description,
    };

    Ok((at.date_naive(), reading))
}

/// Upstream sends whole percentages, sometimes encoded as floats (`55.0`).
fn percentage(value: f64) -> Option<u8> {
    (0.0..=100.0).contains(&value).then(|| value.round() as u8)
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // 2024-06-01 00:00:00 UTC
    const DAY0: i64 = 1_717_200_000;
    const HOUR: i64 = 3_600;

    fn entry_at(dt: i64, temp: f64) -> Value {
        let txt = unix_to_utc(dt).unwrap().format("%Y-%m-%d %H:%M:%S").to_string();
        json!({
            "dt": dt,
            "dt_txt": txt,
            "main": { "temp": temp, "humidity": 55 },
            "wind": { "speed": 4.4 },
            "weather": [{ "icon": "10d", "description": "light rain", "main": "Rain" }]
        })
    }

    fn parse(list: Vec<Value>) -> Vec<Value> {
        let feed: FeedResponse = serde_json::from_value(json!({ "list": list })).unwrap();
        feed.list
    }

    fn five_day_feed() -> Vec<Value> {
        (0..40).map(|i| entry_at(DAY0 + 9 * HOUR + i * 3 * HOUR, 60.0 + i as f64)).collect()
    }

    #[test]
    fn current_plus_five_daily_readings() {
        let readings = aggregate("London", parse(five_day_feed())).unwrap();

        assert_eq!(readings.len(), 6);
        assert_eq!(readings[0].date, "6/1/2024");
        let days: Vec<&str> = readings[1..].iter().map(|r| r.date.as_str()).collect();
        assert_eq!(days, ["6/1/2024", "6/2/2024", "6/3/2024", "6/4/2024", "6/5/2024"]);
        assert!(readings.iter().all(|r| r.city == "London"));
    }

    #[test]
    fn thirteen_entries_with_single_noon_yield_one_daily() {
        // 15:00 on day 0 through 03:00 on day 2, so only day 1 has a noon slot.
        let list = (0..13).map(|i| entry_at(DAY0 + 15 * HOUR + i * 3 * HOUR, 50.0)).collect();

        let readings = aggregate("Oslo", parse(list)).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].date, "6/2/2024");
    }

    #[test]
    fn current_is_chronologically_first_even_if_feed_unsorted() {
        let mut list = five_day_feed();
        list.reverse();

        let readings = aggregate("Rome", parse(list)).unwrap();

        assert_eq!(readings[0].temp_f, 60);
        assert_eq!(readings[0].date, "6/1/2024");
    }

    #[test]
    fn numeric_fields_are_rounded_but_humidity_is_not() {
        let list = vec![json!({
            "dt": DAY0,
            "dt_txt": "2024-06-01 00:00:00",
            "main": { "temp": 71.6, "humidity": 83 },
            "wind": { "speed": 3.4 },
            "weather": [{ "icon": "01n", "description": "clear sky", "main": "Clear" }]
        })];

        let readings = aggregate("Cairo", parse(list)).unwrap();

        assert_eq!(readings[0].temp_f, 72);
        assert_eq!(readings[0].wind_speed, 3);
        assert_eq!(readings[0].humidity, 83);
    }

    #[test]
    fn description_falls_back_to_main_category() {
        let list = vec![json!({
            "dt": DAY0,
            "main": { "temp": 40.0, "humidity": 90 },
            "wind": { "speed": 1.0 },
            "weather": [{ "icon": "50d", "description": "", "main": "Mist" }]
        })];

        let readings = aggregate("Lima", parse(list)).unwrap();

        assert_eq!(readings[0].icon, "50d");
        assert_eq!(readings[0].icon_description, "Mist");
    }

    #[test]
    fn empty_feed_is_upstream_error() {
        let err = aggregate("Nowhere", parse(vec![])).unwrap_err();
        assert!(matches!(err, WeatherError::Upstream(_)));
    }

    #[test]
    fn malformed_current_entry_aborts() {
        let mut list = five_day_feed();
        list[0]["main"] = json!({ "humidity": 10 });

        let err = aggregate("Quito", parse(list)).unwrap_err();

        assert!(matches!(err, WeatherError::Upstream(_)));
        assert!(err.to_string().contains("main.temp"));
    }

    #[test]
    fn malformed_daily_entry_is_skipped() {
        let mut list = five_day_feed();
        // index 1 is 12:00 on day 0
        list[1]["weather"] = json!([]);

        let readings = aggregate("Kyiv", parse(list)).unwrap();

        // the feed has no noon slot on 6/6, so nothing replaces the skipped day
        assert_eq!(readings.len(), 5);
        assert_eq!(readings[1].date, "6/2/2024");
        assert_eq!(readings[4].date, "6/5/2024");
    }

    #[test]
    fn noon_detected_from_dt_when_dt_txt_missing() {
        let list = vec![
            json!({
                "dt": DAY0,
                "main": { "temp": 40.0, "humidity": 90 },
                "wind": { "speed": 1.0 },
                "weather": [{ "icon": "01d", "description": "clear sky" }]
            }),
            json!({
                "dt": DAY0 + 12 * HOUR,
                "main": { "temp": 50.0, "humidity": 80 },
                "wind": { "speed": 2.0 },
                "weather": [{ "icon": "01d", "description": "clear sky" }]
            }),
        ];

        let readings = aggregate("Accra", parse(list)).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].temp_f, 50);
    }

    #[test]
    fn duplicate_noon_entries_for_same_day_collapse() {
        let list = vec![entry_at(DAY0 + 12 * HOUR, 50.0), entry_at(DAY0 + 12 * HOUR, 51.0)];

        let readings = aggregate("Baku", parse(list)).unwrap();

        assert_eq!(readings.len(), 2);
    }

    #[test]
    fn wrongly_typed_daily_entry_is_skipped_not_fatal() {
        let mut bad_noon = entry_at(DAY0 + 12 * HOUR, 0.0);
        bad_noon["main"]["temp"] = json!("warm");
        let list = vec![entry_at(DAY0, 50.0), bad_noon, entry_at(DAY0 + 36 * HOUR, 65.0)];

        let entries = parse(list);
        assert_eq!(entries.len(), 3);

        let readings = aggregate("Paris", entries).unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].temp_f, 50);
        assert_eq!(readings[1].date, "6/2/2024");
        assert_eq!(readings[1].temp_f, 65);
    }

    #[test]
    fn wrongly_typed_current_entry_aborts() {
        let mut list = five_day_feed();
        list[0]["wind"] = json!({ "speed": "breezy" });

        let err = aggregate("Paris", parse(list)).unwrap_err();

        assert!(matches!(err, WeatherError::Upstream(_)));
        assert!(err.to_string().contains("undecodable entry"));
    }

    #[test]
    fn float_encoded_humidity_is_accepted() {
        let mut list = vec![entry_at(DAY0, 50.0)];
        list[0]["main"]["humidity"] = json!(55.0);

        let readings = aggregate("Paris", parse(list)).unwrap();

        assert_eq!(readings[0].humidity, 55);
    }

    #[test]
    fn out_of_range_humidity_skips_daily_entry() {
        let mut list = vec![entry_at(DAY0, 50.0), entry_at(DAY0 + 12 * HOUR, 60.0)];
        list[1]["main"]["humidity"] = json!(140);

        let readings = aggregate("Paris", parse(list)).unwrap();

        assert_eq!(readings.len(), 1);
    }
}
