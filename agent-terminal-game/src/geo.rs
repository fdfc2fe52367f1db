//! Distance and heading from the player to the target, plus the locator
//! screen that asks the device where it is.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::ProgressStorage;
use crate::config::TerminalConfig;
use crate::constants::{COMPASS_SECTOR_DEG, EARTH_RADIUS_KM, LOCATION_TIMEOUT_MS};
use crate::progress::ProgressStore;
use crate::routes::{Redirect, Route, guard};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle distance in kilometres (haversine).
#[must_use]
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Initial bearing (forward azimuth) in degrees, within [0, 360).
#[must_use]
pub fn bearing_deg(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();
    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    let bearing = (y.atan2(x).to_degrees() + 360.0) % 360.0;
    if bearing >= 360.0 { 0.0 } else { bearing }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassPoint {
    N,
    Nne,
    Ne,
    Ene,
    E,
    Ese,
    Se,
    Sse,
    S,
    Ssw,
    Sw,
    Wsw,
    W,
    Wnw,
    Nw,
    Nnw,
}

impl CompassPoint {
    const ALL: [Self; 16] = [
        Self::N,
        Self::Nne,
        Self::Ne,
        Self::Ene,
        Self::E,
        Self::Ese,
        Self::Se,
        Self::Sse,
        Self::S,
        Self::Ssw,
        Self::Sw,
        Self::Wsw,
        Self::W,
        Self::Wnw,
        Self::Nw,
        Self::Nnw,
    ];

    /// Nearest of the sixteen 22.5° sectors.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_bearing(bearing: f64) -> Self {
        let sector = (bearing.rem_euclid(360.0) / COMPASS_SECTOR_DEG).round() as usize;
        Self::ALL[sector % Self::ALL.len()]
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::Nne => "NNE",
            Self::Ne => "NE",
            Self::Ene => "ENE",
            Self::E => "E",
            Self::Ese => "ESE",
            Self::Se => "SE",
            Self::Sse => "SSE",
            Self::S => "S",
            Self::Ssw => "SSW",
            Self::Sw => "SW",
            Self::Wsw => "WSW",
            Self::W => "W",
            Self::Wnw => "WNW",
            Self::Nw => "NW",
            Self::Nnw => "NNW",
        }
    }
}

impl std::fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Meters below 1 km, two decimals below 10 km, one decimal beyond.
#[must_use]
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} meters", (km * 1000.0).round())
    } else if km < 10.0 {
        format!("{km:.2} km")
    } else {
        format!("{km:.1} km")
    }
}

/// How the device should be asked for a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationOptions {
    #[serde(default = "LocationOptions::default_high_accuracy")]
    pub high_accuracy: bool,
    #[serde(default = "LocationOptions::default_timeout_ms")]
    pub timeout_ms: u64,
    /// Oldest cached fix the device may return; zero forces a fresh reading.
    #[serde(default)]
    pub maximum_age_ms: u64,
}

impl LocationOptions {
    const fn default_high_accuracy() -> bool {
        true
    }

    const fn default_timeout_ms() -> u64 {
        LOCATION_TIMEOUT_MS
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: Self::default_high_accuracy(),
            timeout_ms: Self::default_timeout_ms(),
            maximum_age_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LocationError {
    #[error("Location permission denied. Please enable location access.")]
    PermissionDenied,
    #[error("Location unavailable. Please check your device settings.")]
    PositionUnavailable,
    #[error("Location request timed out. Please try again.")]
    Timeout,
    #[error("Geolocation is not supported by your device")]
    Unsupported,
}

/// Device location capability: one request, one answer.
#[async_trait]
pub trait LocationProvider {
    async fn request_location(
        &self,
        options: &LocationOptions,
    ) -> Result<Coordinate, LocationError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorReport {
    pub position: Coordinate,
    pub distance_km: f64,
    pub distance_label: String,
    pub bearing_deg: f64,
    pub direction: CompassPoint,
}

impl LocatorReport {
    #[must_use]
    pub fn compute(position: Coordinate, target: Coordinate) -> Self {
        let distance_km = distance_km(position, target);
        let bearing_deg = bearing_deg(position, target);
        Self {
            position,
            distance_km,
            distance_label: format_distance(distance_km),
            bearing_deg,
            direction: CompassPoint::from_bearing(bearing_deg),
        }
    }

    #[must_use]
    pub fn position_label(&self) -> String {
        format!(
            "{:.6}, {:.6}",
            self.position.latitude, self.position.longitude
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocatorState {
    Idle,
    Locating,
    Located(LocatorReport),
    Failed(LocationError),
}

/// The final screen. Only opens once every challenge is solved.
#[derive(Debug, Clone)]
pub struct Locator {
    target: Coordinate,
    options: LocationOptions,
    state: LocatorState,
}

impl Locator {
    /// # Errors
    ///
    /// Returns the redirect when the player is signed out or has puzzles left.
    pub fn open<S: ProgressStorage>(
        store: &ProgressStore<S>,
        config: &TerminalConfig,
    ) -> Result<Self, Redirect> {
        guard(Route::Locator, store.state())?;
        Ok(Self {
            target: config.target,
            options: config.location,
            state: LocatorState::Idle,
        })
    }

    #[must_use]
    pub const fn state(&self) -> &LocatorState {
        &self.state
    }

    #[must_use]
    pub const fn options(&self) -> &LocationOptions {
        &self.options
    }

    #[must_use]
    pub const fn target(&self) -> Coordinate {
        self.target
    }

    /// Label for the request button, if one should be shown.
    #[must_use]
    pub const fn action_label(&self) -> Option<&'static str> {
        match self.state {
            LocatorState::Idle => Some("Get My Location"),
            LocatorState::Failed(LocationError::PermissionDenied) => {
                Some("Retry Location Request")
            }
            LocatorState::Failed(_) => Some("Try Again"),
            LocatorState::Locating | LocatorState::Located(_) => None,
        }
    }

    /// Ask the provider for one fix and compute the report from it. Failures
    /// stay on screen until the player retries.
    pub async fn locate<P>(&mut self, provider: &P) -> &LocatorState
    where
        P: LocationProvider + Sync + ?Sized,
    {
        self.state = LocatorState::Locating;
        self.state = match provider.request_location(&self.options).await {
            Ok(position) => LocatorState::Located(LocatorReport::compute(position, self.target)),
            Err(err) => {
                log::debug!("location request failed: {err:?}");
                LocatorState::Failed(err)
            }
        };
        &self.state
    }

    /// Explicit retry after a failure. Does nothing in any other state.
    pub async fn retry<P>(&mut self, provider: &P) -> &LocatorState
    where
        P: LocationProvider + Sync + ?Sized,
    {
        if matches!(self.state, LocatorState::Failed(_)) {
            return self.locate(provider).await;
        }
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINNIPEG: Coordinate = Coordinate::new(49.8951, -97.1384);
    const LONDON: Coordinate = Coordinate::new(51.5074, -0.1278);
    const PARIS: Coordinate = Coordinate::new(48.8566, 2.3522);

    #[test]
    fn distance_to_self_is_zero() {
        assert!(distance_km(LONDON, LONDON).abs() < 1e-9);
    }

    #[test]
    fn london_paris_reference_values() {
        let d = distance_km(LONDON, PARIS);
        assert!((d - 343.5).abs() < 1.0, "got {d}");
        let forward = bearing_deg(LONDON, PARIS);
        assert!((forward - 148.1).abs() < 0.5, "got {forward}");
        let back = bearing_deg(PARIS, LONDON);
        assert!((back - 330.2).abs() < 0.5, "got {back}");
        assert!(((forward + 180.0) - back).abs() > 0.5);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = distance_km(WINNIPEG, LONDON);
        let b = distance_km(LONDON, WINNIPEG);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn cardinal_bearings() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!(bearing_deg(origin, Coordinate::new(1.0, 0.0)).abs() < 1e-9);
        assert!((bearing_deg(origin, Coordinate::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing_deg(origin, Coordinate::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((bearing_deg(origin, Coordinate::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn compass_sectors_round_to_nearest() {
        assert_eq!(CompassPoint::from_bearing(0.0), CompassPoint::N);
        assert_eq!(CompassPoint::from_bearing(11.2), CompassPoint::N);
        assert_eq!(CompassPoint::from_bearing(11.25), CompassPoint::Nne);
        assert_eq!(CompassPoint::from_bearing(90.0), CompassPoint::E);
        assert_eq!(CompassPoint::from_bearing(200.0), CompassPoint::Ssw);
        assert_eq!(CompassPoint::from_bearing(350.0), CompassPoint::N);
        assert_eq!(CompassPoint::from_bearing(337.5).label(), "NNW");
    }

    #[test]
    fn distance_formatting_bands() {
        assert_eq!(format_distance(0.4567), "457 meters");
        assert_eq!(format_distance(0.0), "0 meters");
        assert_eq!(format_distance(1.0), "1.00 km");
        assert_eq!(format_distance(9.876), "9.88 km");
        assert_eq!(format_distance(10.0), "10.0 km");
        assert_eq!(format_distance(343.55), "343.6 km");
    }

    #[test]
    fn report_for_target_itself() {
        let target = Coordinate::new(49.898_076_859_393_28, -97.134_862_385_105_36);
        let report = LocatorReport::compute(target, target);
        assert_eq!(report.distance_label, "0 meters");
        assert_eq!(report.position_label(), "49.898077, -97.134862");
    }

    #[test]
    fn coordinate_validation() {
        assert!(LONDON.is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
    }

    #[test]
    fn error_messages_are_distinct() {
        let messages = [
            LocationError::PermissionDenied,
            LocationError::PositionUnavailable,
            LocationError::Timeout,
            LocationError::Unsupported,
        ]
        .map(|err| err.to_string());
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
