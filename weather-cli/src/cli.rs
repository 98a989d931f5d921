use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use tracing::debug;
use weather_core::{
    Config, Coordinates, Dashboard, FixedPosition, GeolocationSource, NoGeolocation,
};

use crate::render::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and location defaults.
    Configure,

    /// Show the dashboard once and exit.
    Show {
        /// City to search for; without it your location (or the fallback city) is used.
        city: Option<String>,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Show the dashboard, then keep prompting for cities to search.
    Dashboard {
        #[command(flatten)]
        location: LocationArgs,
    },
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Latitude of your position.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of your position.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Act as if location access was refused.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub no_geolocation: bool,
}

impl LocationArgs {
    /// Flags win over the configured location.
    pub fn geolocation(&self, config: &Config) -> Box<dyn GeolocationSource> {
        if self.no_geolocation {
            return Box::new(NoGeolocation { denied: true });
        }

        let from_flags = self.lat.zip(self.lon).map(|(lat, lon)| Coordinates::new(lat, lon));
        match from_flags.or(config.location) {
            Some(coords) => Box::new(FixedPosition(coords)),
            None => Box::new(NoGeolocation::default()),
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, location } => show(city, &location).await,
            Command::Dashboard { location } => interactive(&location).await,
        }
    }
}

fn configure() -> Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    let mut key_prompt = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked);
    if config.api_key().is_some() {
        key_prompt = key_prompt.with_help_message("Leave blank to keep the current key");
    }
    let api_key = key_prompt.prompt()?;
    if !api_key.trim().is_empty() {
        config.api_key = Some(api_key.trim().to_string());
    }
    config.require_api_key()?;

    let current_location = config
        .location
        .map(|c| format!("{},{}", c.latitude, c.longitude))
        .unwrap_or_default();
    let location = Text::new("Your location as \"lat,lon\" (blank for none):")
        .with_initial_value(&current_location)
        .prompt()?;
    config.location = parse_coordinates(&location)?;

    let fallback = Text::new("City to show when your location is unknown:")
        .with_default(&config.fallback_city)
        .prompt()?;
    if !fallback.trim().is_empty() {
        config.fallback_city = fallback.trim().to_string();
    }

    let saved = config.save()?;
    println!("Configuration saved to {}", saved.display());

    Ok(())
}

async fn show(city: Option<String>, location: &LocationArgs) -> Result<()> {
    let config = Config::load()?;
    let dashboard = Dashboard::from_config(&config)?;

    match city {
        Some(city) => dashboard.search(city).await,
        None => dashboard.load_initial(&*location.geolocation(&config)).await,
    }

    print!("{}", render(&dashboard.snapshot().await, Local::now()));
    Ok(())
}

async fn interactive(location: &LocationArgs) -> Result<()> {
    let config = Config::load()?;
    let dashboard = Dashboard::from_config(&config)?;
    debug!(policy = ?dashboard.race_policy(), "starting interactive dashboard");

    dashboard.load_initial(&*location.geolocation(&config)).await;
    print!("{}", render(&dashboard.snapshot().await, Local::now()));

    loop {
        let input = tokio::task::spawn_blocking(|| {
            Text::new("Enter city name:").with_help_message("Esc to quit").prompt_skippable()
        })
        .await
        .context("search prompt crashed")?;

        let city = match input {
            Ok(Some(city)) => city,
            Ok(None) | Err(InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        dashboard.search(city).await;
        println!();
        print!("{}", render(&dashboard.snapshot().await, Local::now()));
    }

    Ok(())
}

/// Parse `"lat,lon"`; blank input means no location.
fn parse_coordinates(input: &str) -> Result<Option<Coordinates>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let Some((lat, lon)) = input.split_once(',') else {
        bail!("Expected \"lat,lon\", got '{input}'");
    };

    let lat: f64 = lat.trim().parse().with_context(|| format!("Invalid latitude '{lat}'"))?;
    let lon: f64 = lon.trim().parse().with_context(|| format!("Invalid longitude '{lon}'"))?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        bail!("Coordinates out of range: {lat},{lon}");
    }

    Ok(Some(Coordinates::new(lat, lon)))
}
