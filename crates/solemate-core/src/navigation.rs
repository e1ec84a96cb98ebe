//! Turn-by-turn guidance for the navigate screen.
//!
//! A [`NavigationSession`] holds at most one active [`Route`]. Starting
//! guidance needs a destination and a connected shoe; the directions come
//! from a [`RoutePlanner`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use utoipa::ToSchema;

/// Location reported until a positioning source is wired in.
pub const MOCK_LOCATION: &str = "123 Main Street, Downtown";

/// Errors from starting or stopping guidance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// The destination was blank.
    #[error("Please enter a destination")]
    MissingDestination,

    /// Guidance runs through the shoe, so one must be connected.
    #[error("Please connect your SoleMate device first")]
    DeviceNotConnected,

    /// Stop requested with no active route.
    #[error("Navigation is not running")]
    NotNavigating,

    /// The planner could not produce directions.
    #[error("Could not plan a route: {0}")]
    PlannerFailed(String),
}

/// Result type for navigation operations.
pub type NavigationResult<T> = std::result::Result<T, NavigationError>;

/// An active guidance session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Route {
    /// Where guidance started.
    #[schema(example = "123 Main Street, Downtown")]
    pub origin: String,

    /// Where the user is going.
    #[schema(example = "Central Library")]
    pub destination: String,

    /// Spoken directions, in order.
    pub directions: Vec<String>,

    /// When guidance started.
    pub started_at: DateTime<Utc>,
}

/// Produces directions between two places.
#[async_trait]
pub trait RoutePlanner: Send + Sync {
    /// Where the user is now.
    fn current_location(&self) -> String;

    /// Directions from `origin` to `destination`.
    async fn plan(&self, origin: &str, destination: &str) -> NavigationResult<Vec<String>>;
}

/// A planner that returns the same short walk for every destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockRoutePlanner;

impl MockRoutePlanner {
    /// Creates the planner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RoutePlanner for MockRoutePlanner {
    fn current_location(&self) -> String {
        MOCK_LOCATION.to_string()
    }

    async fn plan(&self, _origin: &str, _destination: &str) -> NavigationResult<Vec<String>> {
        Ok([
            "Head north on Main Street for 100 meters",
            "Turn right onto Oak Avenue",
            "Continue straight for 200 meters",
            "Your destination will be on the left",
        ]
        .into_iter()
        .map(String::from)
        .collect())
    }
}

/// Owns the active route for the navigate screen.
pub struct NavigationSession {
    planner: Box<dyn RoutePlanner>,
    active: Option<Route>,
}

impl NavigationSession {
    /// Creates an idle session.
    #[must_use]
    pub fn new(planner: Box<dyn RoutePlanner>) -> Self {
        Self {
            planner,
            active: None,
        }
    }

    /// Where the user is now.
    #[must_use]
    pub fn current_location(&self) -> String {
        self.planner.current_location()
    }

    /// The active route, if guidance is running.
    #[must_use]
    pub const fn active(&self) -> Option<&Route> {
        self.active.as_ref()
    }

    /// Starts guidance to `destination`, replacing any active route.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::MissingDestination`] for a blank
    /// destination, [`NavigationError::DeviceNotConnected`] without a
    /// connected shoe, or the planner's error.
    pub async fn start(
        &mut self,
        destination: &str,
        device_connected: bool,
    ) -> NavigationResult<&Route> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(NavigationError::MissingDestination);
        }
        if !device_connected {
            return Err(NavigationError::DeviceNotConnected);
        }

        let origin = self.planner.current_location();
        let directions = self.planner.plan(&origin, destination).await?;
        info!(%destination, steps = directions.len(), "Navigation started");

        Ok(&*self.active.insert(Route {
            origin,
            destination: destination.to_string(),
            directions,
            started_at: Utc::now(),
        }))
    }

    /// Ends guidance and returns the route that was active.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::NotNavigating`] if nothing is running.
    pub fn stop(&mut self) -> NavigationResult<Route> {
        let route = self.active.take().ok_or(NavigationError::NotNavigating)?;
        info!(destination = %route.destination, "Navigation stopped");
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> NavigationSession {
        NavigationSession::new(Box::new(MockRoutePlanner::new()))
    }

    #[tokio::test]
    async fn test_start_requires_destination() {
        let mut nav = session();
        assert_eq!(
            nav.start("   ", true).await.unwrap_err(),
            NavigationError::MissingDestination
        );
        assert!(nav.active().is_none());
    }

    #[tokio::test]
    async fn test_start_requires_connected_device() {
        let mut nav = session();
        assert_eq!(
            nav.start("Central Library", false).await.unwrap_err(),
            NavigationError::DeviceNotConnected
        );
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let mut nav = session();
        let route = nav.start("  Central Library ", true).await.unwrap();
        assert_eq!(route.destination, "Central Library");
        assert_eq!(route.origin, MOCK_LOCATION);
        assert_eq!(route.directions.len(), 4);

        let stopped = nav.stop().unwrap();
        assert_eq!(stopped.destination, "Central Library");
        assert!(nav.active().is_none());
        assert_eq!(nav.stop().unwrap_err(), NavigationError::NotNavigating);
    }

    #[tokio::test]
    async fn test_restart_replaces_route() {
        let mut nav = session();
        nav.start("Central Library", true).await.unwrap();
        nav.start("City Park", true).await.unwrap();
        assert_eq!(nav.active().unwrap().destination, "City Park");
    }
}
