use async_trait::async_trait;
use std::fmt::Debug;
use tracing::{debug, info};

use crate::{
    config::DEFAULT_FALLBACK_CITY,
    error::LocationError,
    model::{Coordinates, Locator},
};

/// Something that can report where the user is.
#[async_trait]
pub trait GeolocationSource: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// A position known up front (command-line flags or the config file).
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl GeolocationSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// No position available, either because there is no source or the user refused one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation {
    pub denied: bool,
}

#[async_trait]
impl GeolocationSource for NoGeolocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        if self.denied {
            Err(LocationError::PermissionDenied)
        } else {
            Err(LocationError::Unavailable)
        }
    }
}

/// Turns a geolocation attempt into a locator, falling back to a named city.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    fallback_city: String,
}

impl Default for LocationResolver {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_CITY)
    }
}

impl LocationResolver {
    pub fn new(fallback_city: impl Into<String>) -> Self {
        Self { fallback_city: fallback_city.into() }
    }

    pub fn fallback_city(&self) -> &str {
        &self.fallback_city
    }

    /// Single attempt; never fails.
    pub async fn resolve(&self, source: &dyn GeolocationSource) -> Locator {
        match source.current_position().await {
            Ok(coords) => {
                debug!(%coords, "geolocation succeeded");
                Locator::ByCoordinate(coords)
            }
            Err(err) => {
                info!(error = %err, fallback = %self.fallback_city, "using fallback city");
                Locator::ByName(self.fallback_city.clone())
            }
        }
    }
}
