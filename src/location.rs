//! Position acquisition for the machine locator.
//!
//! Two halves live here. [`Acquisition`] is the synchronous state machine
//! that tracks where a lookup stands (idle, in flight, located, failed) and
//! enforces that at most one lookup is outstanding at a time. The
//! [`PositionProvider`] trait is the asynchronous capability that actually
//! produces a fix; the app wires one in at startup based on `config.toml`.
//!
//! The shipped providers are [`IpLookup`], which geolocates the machine's
//! public IP via [IpApi](https://ip-api.com/), and [`FixedPosition`] for
//! manually configured coordinates. Provider failures are folded into
//! [`LocationError`], whose `Display` strings are shown to the user as-is.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ipgeolocate::{Locator, Service};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::{LocationConfig, LocationMode};
use crate::geo::Coordinate;

/// Why a position lookup did not produce a fix.
///
/// Every variant is recoverable: a new request clears the failure and tries
/// again. The `Display` text is the message rendered in the status pane, so
/// it is written for the user rather than for the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location lookup is not available; set a location mode in config.toml")]
    Unsupported,
    #[error("permission to determine your position was denied")]
    PermissionDenied,
    #[error("your position could not be determined right now")]
    PositionUnavailable,
    #[error("the position lookup timed out")]
    Timeout,
    #[error("something unexpected went wrong while locating you")]
    Unknown,
}

/// Tuning knobs passed to every lookup.
#[derive(Debug, Clone)]
pub struct LookupOptions {
    /// Ask the provider for its best fix. Providers without an accuracy
    /// trade-off note the hint and carry on.
    pub high_accuracy: bool,
    /// How long a single lookup may run before it fails with
    /// [`LocationError::Timeout`].
    pub timeout_ms: u64,
    /// How old a previously acquired fix may be before the provider must
    /// fetch a fresh one.
    pub max_cached_age_ms: u64,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 15_000,
            max_cached_age_ms: 300_000,
        }
    }
}

/// A source of position fixes.
///
/// Implementations are injected into the app at startup, which keeps the
/// state machine testable with scripted providers and keeps the IP lookup
/// swappable for a fixed coordinate in manual mode.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// Produces one position fix, or the error to show the user.
    async fn locate(&self, options: &LookupOptions) -> Result<Coordinate, LocationError>;
}

/// Where the acquisition currently stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AcquisitionState {
    /// No lookup has been attempted yet.
    #[default]
    Idle,
    /// A lookup is in flight; its outcome has not arrived.
    Requesting,
    /// The most recent lookup produced this fix.
    Located(Coordinate),
    /// The most recent lookup failed. A retry clears this.
    Failed(LocationError),
}

/// The acquisition state machine.
///
/// Purely synchronous: the app drives it with [`request`](Self::request)
/// when the user (or startup) asks for a position, and
/// [`resolve`](Self::resolve) when the spawned lookup task reports back.
/// While a lookup is in flight further requests are ignored, so an
/// outcome is never raced against a second lookup.
#[derive(Debug, Default)]
pub struct Acquisition {
    state: AcquisitionState,
}

impl Acquisition {
    pub fn new() -> Self {
        Self {
            state: AcquisitionState::Idle,
        }
    }

    pub fn state(&self) -> &AcquisitionState {
        &self.state
    }

    pub fn is_requesting(&self) -> bool {
        matches!(self.state, AcquisitionState::Requesting)
    }

    /// The current fix, if the last lookup succeeded.
    pub fn position(&self) -> Option<Coordinate> {
        match &self.state {
            AcquisitionState::Located(position) => Some(*position),
            _ => None,
        }
    }

    /// The current failure, if the last lookup failed.
    pub fn error(&self) -> Option<&LocationError> {
        match &self.state {
            AcquisitionState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Starts a lookup, unless one is already in flight.
    ///
    /// Returns whether the caller should actually spawn the lookup. A
    /// request made from [`AcquisitionState::Failed`] is the retry path; it
    /// discards the previous error before entering
    /// [`AcquisitionState::Requesting`].
    pub fn request(&mut self) -> bool {
        match &self.state {
            AcquisitionState::Requesting => {
                debug!("ignoring position request while a lookup is in flight");
                false
            }
            AcquisitionState::Failed(err) => {
                info!(previous = %err, "retrying position lookup");
                self.state = AcquisitionState::Requesting;
                true
            }
            _ => {
                self.state = AcquisitionState::Requesting;
                true
            }
        }
    }

    /// Fails the acquisition without ever starting a lookup.
    ///
    /// Used when no provider is configured at all, so the user still gets
    /// the explanation in the status pane.
    pub fn mark_unsupported(&mut self) {
        warn!("no position provider configured; location features are off");
        self.state = AcquisitionState::Failed(LocationError::Unsupported);
    }

    /// Applies a lookup outcome.
    ///
    /// Returns `false` and leaves the state alone when no lookup is
    /// pending, which makes a stale or duplicate completion harmless.
    pub fn resolve(&mut self, outcome: Result<Coordinate, LocationError>) -> bool {
        if !self.is_requesting() {
            warn!("dropping a position outcome that has no pending request");
            return false;
        }
        match outcome {
            Ok(position) => {
                info!(
                    latitude = position.latitude,
                    longitude = position.longitude,
                    "position fix acquired"
                );
                self.state = AcquisitionState::Located(position);
            }
            Err(err) => {
                error!(%err, "position lookup failed");
                self.state = AcquisitionState::Failed(err);
            }
        }
        true
    }
}

#[derive(Debug, Deserialize)]
struct IpifyResponse {
    ip: String,
}

/// Geolocates the machine's public IP address.
///
/// Fetches the public IP from [ipify](https://www.ipify.org/), then asks
/// the IpApi service where that address is. Successful fixes are cached in
/// memory and served again while younger than
/// [`LookupOptions::max_cached_age_ms`], since IP geolocation rarely moves
/// between lookups.
pub struct IpLookup {
    client: Client,
    cache: Mutex<Option<(Coordinate, Instant)>>,
}

impl Default for IpLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl IpLookup {
    pub fn new() -> Self {
        Self {
            client: Client::builder().user_agent("vendo-tui").build().unwrap(),
            cache: Mutex::new(None),
        }
    }

    fn cached_fix(&self, max_age_ms: u64) -> Option<Coordinate> {
        let cache = self.cache.lock().ok()?;
        let (position, fixed_at) = (*cache)?;
        if fixed_at.elapsed() <= Duration::from_millis(max_age_ms) {
            Some(position)
        } else {
            None
        }
    }

    fn store_fix(&self, position: Coordinate) {
        if let Ok(mut cache) = self.cache.lock() {
            *cache = Some((position, Instant::now()));
        }
    }

    async fn public_ip(&self) -> Result<String, LocationError> {
        let response = self
            .client
            .get("https://api.ipify.org?format=json")
            .send()
            .await
            .map_err(|e| {
                error!("Error fetching the public IP address: {}", e);
                LocationError::PositionUnavailable
            })?;
        let body: IpifyResponse = response.json().await.map_err(|e| {
            error!("Error decoding the public IP response: {}", e);
            LocationError::PositionUnavailable
        })?;
        Ok(body.ip)
    }

    async fn lookup(&self) -> Result<Coordinate, LocationError> {
        let ip = self.public_ip().await?;
        // Using IpApi as the service, it's pretty reliable.
        match Locator::get(&ip, Service::IpApi).await {
            Ok(loc) => {
                let latitude = loc
                    .latitude
                    .parse::<f64>()
                    .map_err(|_| LocationError::Unknown)?;
                let longitude = loc
                    .longitude
                    .parse::<f64>()
                    .map_err(|_| LocationError::Unknown)?;
                info!("Geolocation successful - ({}, {})", latitude, longitude);
                Ok(Coordinate::new(latitude, longitude))
            }
            Err(e) => {
                error!("Error using geolocation service: {}", e);
                Err(LocationError::PositionUnavailable)
            }
        }
    }
}

#[async_trait]
impl PositionProvider for IpLookup {
    async fn locate(&self, options: &LookupOptions) -> Result<Coordinate, LocationError> {
        if options.high_accuracy {
            debug!("high-accuracy hint has no effect on IP geolocation");
        }
        if let Some(position) = self.cached_fix(options.max_cached_age_ms) {
            debug!("serving position fix from cache");
            return Ok(position);
        }
        let position = timeout(Duration::from_millis(options.timeout_ms), self.lookup())
            .await
            .map_err(|_| LocationError::Timeout)??;
        self.store_fix(position);
        Ok(position)
    }
}

/// Always reports the coordinates it was built with. Backs manual mode.
pub struct FixedPosition {
    position: Coordinate,
}

impl FixedPosition {
    pub fn new(position: Coordinate) -> Self {
        Self { position }
    }
}

#[async_trait]
impl PositionProvider for FixedPosition {
    async fn locate(&self, _options: &LookupOptions) -> Result<Coordinate, LocationError> {
        Ok(self.position)
    }
}

/// Builds the provider selected in `config.toml`, or `None` when location
/// is switched off entirely.
pub fn provider_from_config(config: &LocationConfig) -> Option<Arc<dyn PositionProvider>> {
    match config.mode {
        LocationMode::Auto => Some(Arc::new(IpLookup::new())),
        LocationMode::Manual => Some(Arc::new(FixedPosition::new(Coordinate::new(
            config.manual_lat,
            config.manual_lon,
        )))),
        LocationMode::Off => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fix() -> Coordinate {
        Coordinate::new(30.2672, -97.7431)
    }

    #[test]
    fn request_from_idle_starts_a_lookup() {
        let mut acquisition = Acquisition::new();
        assert_eq!(*acquisition.state(), AcquisitionState::Idle);
        assert!(acquisition.request());
        assert!(acquisition.is_requesting());
    }

    #[test]
    fn request_while_a_lookup_is_in_flight_is_ignored() {
        let mut acquisition = Acquisition::new();
        assert!(acquisition.request());
        assert!(!acquisition.request(), "second request must not start a lookup");
        assert!(acquisition.is_requesting());
    }

    #[test]
    fn successful_outcome_moves_to_located() {
        let mut acquisition = Acquisition::new();
        acquisition.request();
        assert!(acquisition.resolve(Ok(fix())));
        assert_eq!(acquisition.position(), Some(fix()));
        assert!(acquisition.error().is_none());
    }

    #[test]
    fn failed_outcome_carries_the_error() {
        let mut acquisition = Acquisition::new();
        acquisition.request();
        assert!(acquisition.resolve(Err(LocationError::PermissionDenied)));
        assert_eq!(
            *acquisition.state(),
            AcquisitionState::Failed(LocationError::PermissionDenied)
        );
        assert!(acquisition.position().is_none());
    }

    #[test]
    fn retry_after_failure_clears_the_previous_error() {
        let mut acquisition = Acquisition::new();
        acquisition.request();
        acquisition.resolve(Err(LocationError::Timeout));
        assert_eq!(acquisition.error(), Some(&LocationError::Timeout));

        assert!(acquisition.request(), "retry must start a fresh lookup");
        assert!(acquisition.error().is_none());
        assert!(acquisition.is_requesting());

        acquisition.resolve(Err(LocationError::PermissionDenied));
        assert_eq!(acquisition.error(), Some(&LocationError::PermissionDenied));
    }

    #[test]
    fn a_new_lookup_can_replace_an_existing_fix() {
        let mut acquisition = Acquisition::new();
        acquisition.request();
        acquisition.resolve(Ok(fix()));

        assert!(acquisition.request());
        let newer = Coordinate::new(29.7604, -95.3698);
        acquisition.resolve(Ok(newer));
        assert_eq!(acquisition.position(), Some(newer));
    }

    #[test]
    fn unsupported_is_reported_without_a_lookup() {
        let mut acquisition = Acquisition::new();
        acquisition.mark_unsupported();
        assert_eq!(
            *acquisition.state(),
            AcquisitionState::Failed(LocationError::Unsupported)
        );
        // Still recoverable if a provider shows up later in the session.
        assert!(acquisition.request());
    }

    #[test]
    fn outcome_without_a_pending_request_is_dropped() {
        let mut acquisition = Acquisition::new();
        assert!(!acquisition.resolve(Ok(fix())));
        assert_eq!(*acquisition.state(), AcquisitionState::Idle);

        acquisition.request();
        acquisition.resolve(Ok(fix()));
        assert!(!acquisition.resolve(Err(LocationError::Unknown)));
        assert_eq!(
            acquisition.position(),
            Some(fix()),
            "late error must not clobber the fix"
        );
    }

    #[test]
    fn every_error_renders_a_distinct_user_message() {
        let errors = [
            LocationError::Unsupported,
            LocationError::PermissionDenied,
            LocationError::PositionUnavailable,
            LocationError::Timeout,
            LocationError::Unknown,
        ];
        let messages: HashSet<String> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(messages.len(), errors.len());
        assert!(messages.iter().all(|m| !m.is_empty()));
    }

    #[test]
    fn ip_lookup_serves_a_fresh_cache_entry() {
        let lookup = IpLookup::new();
        assert!(lookup.cached_fix(300_000).is_none());

        lookup.store_fix(fix());
        assert_eq!(lookup.cached_fix(300_000), Some(fix()));
    }

    #[tokio::test]
    async fn fixed_position_reports_the_configured_coordinates() {
        let provider = FixedPosition::new(fix());
        let outcome = provider.locate(&LookupOptions::default()).await;
        assert_eq!(outcome, Ok(fix()));
    }
}
