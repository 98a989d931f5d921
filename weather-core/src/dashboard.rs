//! The dashboard controller: owns the displayed state and runs the
//! locate → current weather → forecast flow against a [`WeatherProvider`].
//!
//! All mutations go through [`Dashboard`]; callers read via [`Dashboard::snapshot`].
//! Each completed request applies its changes under a single write guard.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::{
    Config,
    error::{MSG_EMPTY_SEARCH, MSG_FORECAST_FAILED},
    forecast::summarize,
    location::{GeolocationSource, LocationResolver},
    model::{Coordinates, CurrentWeather, Forecast, ForecastEntry, Locator},
    provider::{WeatherProvider, provider_from_config},
};

/// Label shown before the first successful fetch.
pub const PLACEHOLDER_LABEL: &str = "Delhi, IN";

/// What to do when requests overlap, e.g. a search issued while the initial load is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RacePolicy {
    /// Every response is applied as it arrives, so the slowest one ends up displayed.
    #[default]
    LastResponseWins,
    /// Responses belonging to a request that has since been superseded are dropped.
    LatestRequestWins,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    /// Pending search input; cleared once a search is submitted.
    pub search_text: String,
    pub current: Option<CurrentWeather>,
    pub hourly: Vec<ForecastEntry>,
    pub daily: Vec<ForecastEntry>,
    pub error_message: Option<String>,
    /// True only while a current-weather request is outstanding.
    pub is_loading: bool,
}

impl DashboardState {
    pub fn location_label(&self) -> &str {
        self.current.as_ref().map_or(PLACEHOLDER_LABEL, |c| c.location_label.as_str())
    }
}

/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone)]
pub struct Dashboard {
    provider: Arc<dyn WeatherProvider>,
    resolver: LocationResolver,
    policy: RacePolicy,
    state: Arc<RwLock<DashboardState>>,
    latest_ticket: Arc<AtomicU64>,
}

impl Dashboard {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            provider,
            resolver: LocationResolver::default(),
            policy: RacePolicy::default(),
            state: Arc::new(RwLock::new(DashboardState::default())),
            latest_ticket: Arc::new(AtomicU64::new(0)),
        }
    }

    /// OpenWeather-backed dashboard using the configured key, fallback city and race policy.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;

        Ok(Self::new(provider)
            .with_resolver(LocationResolver::new(config.fallback_city.clone()))
            .with_race_policy(config.race_policy))
    }

    pub fn with_resolver(mut self, resolver: LocationResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_race_policy(mut self, policy: RacePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn race_policy(&self) -> RacePolicy {
        self.policy
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    /// First load: locate the user (or fall back) and fetch weather for that place.
    #[instrument(skip(self))]
    pub async fn load_initial(&self, source: &dyn GeolocationSource) {
        let locator = self.resolver.resolve(source).await;
        self.fetch_weather(locator).await;
    }

    pub async fn set_search_text(&self, text: impl Into<String>) {
        self.state.write().await.search_text = text.into();
    }

    /// Search for the pending search text.
    ///
    /// Blank input only sets a validation message; no request is made and the
    /// text is left as typed.
    #[instrument(skip(self))]
    pub async fn submit_search(&self) {
        let query = {
            let mut state = self.state.write().await;
            let query = state.search_text.trim().to_string();
            if query.is_empty() {
                state.error_message = Some(MSG_EMPTY_SEARCH.to_string());
                return;
            }
            state.search_text.clear();
            query
        };

        info!(%query, "searching by city name");
        self.fetch_weather(Locator::ByName(query)).await;
    }

    pub async fn search(&self, text: impl Into<String>) {
        self.set_search_text(text).await;
        self.submit_search().await;
    }

    /// Fetch current weather for `locator`, then its forecast.
    ///
    /// On failure the previous weather and forecast stay as they were and only
    /// the error message changes.
    #[instrument(skip(self))]
    pub async fn fetch_weather(&self, locator: Locator) {
        let ticket = self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut state = self.state.write().await;
            state.is_loading = true;
            state.error_message = None;
        }

        let result = self.provider.current_weather(&locator).await;

        let coordinates = {
            let mut state = self.state.write().await;
            if self.is_superseded(ticket) {
                debug!(ticket, "dropping superseded current weather response");
                return;
            }

            state.is_loading = false;
            match result {
                Ok(current) => {
                    let coordinates = current.coordinates;
                    state.current = Some(current);
                    state.error_message = None;
                    coordinates
                }
                Err(err) => {
                    warn!(error = %err, %locator, "current weather request failed");
                    state.error_message = Some(err.user_message().to_string());
                    return;
                }
            }
        };

        self.fetch_forecast(coordinates, ticket).await;
    }

    async fn fetch_forecast(&self, coordinates: Coordinates, ticket: u64) {
        let result = self.provider.forecast(coordinates).await;
        let summary = result.map(|records| summarize(&records, &Local));

        let mut state = self.state.write().await;
        if self.is_superseded(ticket) {
            debug!(ticket, "dropping superseded forecast response");
            return;
        }

        match summary {
            Ok(Forecast { hourly, daily }) => {
                state.hourly = hourly;
                state.daily = daily;
            }
            Err(err) => {
                warn!(error = %err, %coordinates, "forecast request failed");
                state.error_message = Some(MSG_FORECAST_FAILED.to_string());
            }
        }
    }

    fn is_superseded(&self, ticket: u64) -> bool {
        match self.policy {
            RacePolicy::LastResponseWins => false,
            RacePolicy::LatestRequestWins => self.latest_ticket.load(Ordering::SeqCst) != ticket,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{MSG_CITY_NOT_FOUND, MSG_INVALID_API_KEY, MSG_WEATHER_FAILED, WeatherError},
        location::{FixedPosition, NoGeolocation},
        model::ForecastRecord,
    };
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::{
        collections::HashMap,
        sync::{Mutex, atomic::AtomicUsize},
        time::Duration,
    };

    #[derive(Debug, Clone, Copy)]
    enum Outcome {
        Found,
        NotFound,
        Unauthorized,
        ServerError,
    }

    /// Scripted provider keyed by the locator's display form.
    #[derive(Debug, Default)]
    struct FakeProvider {
        places: HashMap<String, (Outcome, Duration)>,
        forecast_len: Option<usize>,
        forecast_delay: Duration,
        requested: Mutex<Vec<Locator>>,
        forecast_calls: AtomicUsize,
    }

    impl FakeProvider {
        fn place(mut self, name: &str, outcome: Outcome, delay_ms: u64) -> Self {
            self.places.insert(name.to_string(), (outcome, Duration::from_millis(delay_ms)));
            self
        }

        fn forecast(mut self, len: usize) -> Self {
            self.forecast_len = Some(len);
            self
        }

        fn forecast_delay(mut self, delay_ms: u64) -> Self {
            self.forecast_delay = Duration::from_millis(delay_ms);
            self
        }

        fn requested(&self) -> Vec<Locator> {
            self.requested.lock().expect("lock").clone()
        }
    }

    fn weather_for(name: &str) -> CurrentWeather {
        CurrentWeather {
            location_label: format!("{name}, XX"),
            temperature_celsius: 21.5,
            description: "few clouds".to_string(),
            icon_url: "https://openweathermap.org/img/wn/02d.png".to_string(),
            coordinates: Coordinates::new(10.0, 20.0),
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn current_weather(&self, locator: &Locator) -> Result<CurrentWeather, WeatherError> {
            self.requested.lock().expect("lock").push(locator.clone());

            let key = locator.to_string();
            let (outcome, delay) =
                self.places.get(&key).copied().unwrap_or((Outcome::NotFound, Duration::ZERO));
            tokio::time::sleep(delay).await;

            match outcome {
                Outcome::Found => Ok(weather_for(&key)),
                Outcome::NotFound => Err(WeatherError::NotFound),
                Outcome::Unauthorized => Err(WeatherError::Unauthorized),
                Outcome::ServerError => {
                    Err(WeatherError::Status { status: 500, body: "oops".to_string() })
                }
            }
        }

        async fn forecast(
            &self,
            _coordinates: Coordinates,
        ) -> Result<Vec<ForecastRecord>, WeatherError> {
            self.forecast_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.forecast_delay).await;

            let len = self
                .forecast_len
                .ok_or_else(|| WeatherError::Status { status: 503, body: String::new() })?;

            Ok((0..len)
                .map(|i| ForecastRecord {
                    timestamp: DateTime::from_timestamp(1_792_368_000 + i as i64 * 10_800, 0)
                        .expect("valid timestamp"),
                    temperature_max: 30.0,
                    temperature_min: 20.0,
                    description: format!("slot {i}"),
                })
                .collect())
        }
    }

    fn dashboard(provider: FakeProvider) -> (Dashboard, Arc<FakeProvider>) {
        let provider = Arc::new(provider);
        (Dashboard::new(provider.clone()), provider)
    }

    #[tokio::test]
    async fn starts_with_placeholder() {
        let (dash, _) = dashboard(FakeProvider::default());
        let state = dash.snapshot().await;

        assert_eq!(state.location_label(), PLACEHOLDER_LABEL);
        assert!(state.current.is_none());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn successful_search_fills_everything_and_clears_error() {
        let (dash, provider) =
            dashboard(FakeProvider::default().place("Paris", Outcome::Found, 0).forecast(40));

        dash.search("   ").await;
        assert!(dash.snapshot().await.error_message.is_some());

        dash.search("  Paris ").await;
        let state = dash.snapshot().await;

        assert_eq!(state.location_label(), "Paris, XX");
        assert_eq!(state.error_message, None);
        assert!(!state.is_loading);
        assert!(state.search_text.is_empty());
        assert_eq!(state.hourly.len(), 5);
        assert_eq!(state.daily.len(), 4);
        assert_eq!(provider.requested(), vec![Locator::ByName("Paris".into())]);
    }

    #[tokio::test]
    async fn loading_covers_only_the_current_weather_request() {
        let (dash, _) = dashboard(
            FakeProvider::default()
                .place("Paris", Outcome::Found, 100)
                .forecast(10)
                .forecast_delay(200),
        );

        let search = tokio::spawn({
            let dash = dash.clone();
            async move { dash.search("Paris").await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        let waiting_for_current = dash.snapshot().await;
        assert!(waiting_for_current.is_loading);
        assert!(waiting_for_current.current.is_none());

        tokio::time::sleep(Duration::from_millis(100)).await;
        let waiting_for_forecast = dash.snapshot().await;
        assert!(!waiting_for_forecast.is_loading);
        assert_eq!(waiting_for_forecast.location_label(), "Paris, XX");
        assert!(waiting_for_forecast.hourly.is_empty());

        search.await.unwrap();
        let done = dash.snapshot().await;
        assert!(!done.is_loading);
        assert_eq!(done.hourly.len(), 5);
    }

    #[tokio::test]
    async fn blank_search_makes_no_request() {
        let (dash, provider) = dashboard(FakeProvider::default());

        dash.search(" \t ").await;
        let state = dash.snapshot().await;

        assert_eq!(state.error_message.as_deref(), Some(MSG_EMPTY_SEARCH));
        assert_eq!(state.search_text, " \t ");
        assert!(provider.requested().is_empty());
    }

    #[tokio::test]
    async fn not_found_keeps_previous_weather_and_forecast() {
        let (dash, _) =
            dashboard(FakeProvider::default().place("Paris", Outcome::Found, 0).forecast(40));
        dash.search("Paris").await;
        let before = dash.snapshot().await;

        dash.search("Atlantis").await;
        let after = dash.snapshot().await;

        assert_eq!(after.error_message.as_deref(), Some(MSG_CITY_NOT_FOUND));
        assert_eq!(after.current, before.current);
        assert_eq!(after.hourly, before.hourly);
        assert_eq!(after.daily, before.daily);
        assert!(!after.is_loading);
    }

    #[tokio::test]
    async fn failures_map_to_user_messages() {
        let (dash, _) = dashboard(
            FakeProvider::default()
                .place("Locked", Outcome::Unauthorized, 0)
                .place("Broken", Outcome::ServerError, 0),
        );

        dash.search("Locked").await;
        assert_eq!(dash.snapshot().await.error_message.as_deref(), Some(MSG_INVALID_API_KEY));

        dash.search("Broken").await;
        assert_eq!(dash.snapshot().await.error_message.as_deref(), Some(MSG_WEATHER_FAILED));
    }

    #[tokio::test]
    async fn forecast_failure_keeps_current_weather() {
        let (dash, provider) = dashboard(FakeProvider::default().place("Paris", Outcome::Found, 0));

        dash.search("Paris").await;
        let state = dash.snapshot().await;

        assert_eq!(state.location_label(), "Paris, XX");
        assert_eq!(state.error_message.as_deref(), Some(MSG_FORECAST_FAILED));
        assert!(state.hourly.is_empty());
        assert_eq!(provider.forecast_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn short_forecast_replaces_longer_one() {
        let (dash, _) =
            dashboard(FakeProvider::default().place("Paris", Outcome::Found, 0).forecast(40));
        dash.search("Paris").await;

        let (short, _) =
            dashboard(FakeProvider::default().place("Paris", Outcome::Found, 0).forecast(3));
        let dash = Dashboard { provider: short.provider, ..dash };
        dash.search("Paris").await;

        let state = dash.snapshot().await;
        assert_eq!(state.hourly.len(), 3);
        assert!(state.daily.is_empty());
    }

    #[tokio::test]
    async fn initial_load_uses_position() {
        let (dash, provider) =
            dashboard(FakeProvider::default().place("(1.0000, 2.0000)", Outcome::Found, 0));

        dash.load_initial(&FixedPosition(Coordinates::new(1.0, 2.0))).await;

        assert_eq!(
            provider.requested(),
            vec![Locator::ByCoordinate(Coordinates::new(1.0, 2.0))]
        );
    }

    #[tokio::test]
    async fn initial_load_without_position_uses_fallback_city() {
        let (dash, provider) = dashboard(FakeProvider::default().place("Delhi", Outcome::Found, 0));

        dash.load_initial(&NoGeolocation { denied: true }).await;

        assert_eq!(provider.requested(), vec![Locator::ByName("Delhi".into())]);
        assert_eq!(dash.snapshot().await.location_label(), "Delhi, XX");
    }

    #[tokio::test]
    async fn overlapping_searches_last_response_wins() {
        let (dash, _) = dashboard(
            FakeProvider::default()
                .place("Slow", Outcome::Found, 150)
                .place("Fast", Outcome::Found, 10)
                .forecast(10),
        );

        tokio::join!(
            dash.fetch_weather(Locator::ByName("Slow".into())),
            dash.fetch_weather(Locator::ByName("Fast".into())),
        );

        assert_eq!(dash.snapshot().await.location_label(), "Slow, XX");
    }

    #[tokio::test]
    async fn overlapping_searches_latest_request_wins() {
        let (dash, _) = dashboard(
            FakeProvider::default()
                .place("Slow", Outcome::Found, 150)
                .place("Fast", Outcome::Found, 10)
                .forecast(10),
        );
        let dash = dash.with_race_policy(RacePolicy::LatestRequestWins);

        tokio::join!(
            dash.fetch_weather(Locator::ByName("Slow".into())),
            dash.fetch_weather(Locator::ByName("Fast".into())),
        );

        let state = dash.snapshot().await;
        assert_eq!(state.location_label(), "Fast, XX");
        assert!(!state.is_loading);
    }

    #[test]
    fn race_policy_serializes_snake_case() {
        #[derive(Serialize)]
        struct Wrapper {
            policy: RacePolicy,
        }

        let toml = toml::to_string(&Wrapper { policy: RacePolicy::LatestRequestWins })
            .expect("serialize");
        assert_eq!(toml.trim(), "policy = \"latest_request_wins\"");
    }
}
