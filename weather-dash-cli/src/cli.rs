use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode, Text};
use tracing::debug;
use weather_dash_core::{
    City, Config, HistoryStore, WeatherReading, WeatherService, provider::provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dash", version, about = "City weather with search history")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively store the OpenWeather API key and connection settings.
    Configure,

    /// Show current weather and the 5-day outlook for a city, and remember it.
    Show {
        /// City name, e.g. "San Francisco".
        #[arg(required = true)]
        city: Vec<String>,

        /// Print the raw `{ weatherData, history }` document as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List previously searched cities.
    History {
        /// Most recent search first.
        #[arg(long)]
        newest_first: bool,

        #[arg(long)]
        json: bool,
    },

    /// Forget a city by its history id.
    Remove {
        id: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure()?,
            Command::Show { city, json } => {
                let config = Config::load()?;
                let service = build_service(&config)?;

                let outcome = service.query(&city.join(" ")).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                } else {
                    print!("{}", render_readings(&outcome.readings));
                }
            }
            Command::History { newest_first, json } => {
                let config = Config::load()?;
                let store = HistoryStore::new(config.history_path()?);

                let cities = if newest_first {
                    store.list_newest_first().await
                } else {
                    store.list().await
                };

                if json {
                    println!("{}", serde_json::to_string_pretty(&cities)?);
                } else {
                    print!("{}", render_history(&cities));
                }
            }
            Command::Remove { id } => {
                let config = Config::load()?;
                let store = HistoryStore::new(config.history_path()?);

                store.remove(&id).await?;
                println!("Removed {id} from history.");
            }
        }

        Ok(())
    }
}

fn build_service(config: &Config) -> anyhow::Result<WeatherService> {
    let provider = Arc::new(provider_from_config(config)?);
    let history = Arc::new(HistoryStore::new(config.history_path()?));
    debug!(history = %history.path().display(), base_url = %config.base_url, "Built weather service");

    Ok(WeatherService::new(provider.clone(), provider, history))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load_file()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("API key prompt aborted")?;

    let base_url = Text::new("API base URL:")
        .with_default(&config.base_url)
        .prompt()
        .context("Base URL prompt aborted")?;

    let timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.timeout_secs)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()
        .context("Timeout prompt aborted")?;

    config.set_api_key(api_key);
    config.base_url = base_url.trim().trim_end_matches('/').to_string();
    config.timeout_secs = timeout_secs;
    config.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

fn render_readings(readings: &[WeatherReading]) -> String {
    let mut out = String::new();

    for (i, r) in readings.iter().enumerate() {
        let label = if i == 0 { "Now" } else { "" };
        out.push_str(&format!(
            "{label:<4}{city} {date:<10}  {temp:>4}°F  wind {wind:>3} mph  humidity {hum:>3}%  {desc} [{icon}]\n",
            city = r.city,
            date = r.date,
            temp = r.temp_f,
            wind = r.wind_speed,
            hum = r.humidity,
            desc = r.icon_description,
            icon = r.icon,
        ));
    }

    out
}

fn render_history(cities: &[City]) -> String {
    if cities.is_empty() {
        return "No cities in history yet.\n".to_string();
    }

    cities.iter().map(|c| format!("{}  {}\n", c.id, c.name)).collect()
}
