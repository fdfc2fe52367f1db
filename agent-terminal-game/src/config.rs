//! Tunable timings and locator settings.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{INTRO_COMPLETE_PCT, TARGET_LATITUDE, TARGET_LONGITUDE};
use crate::geo::{Coordinate, LocationOptions};

const DEFAULT_TERMINAL_DATA: &str = include_str!("../data/terminal.json");

/// Errors raised when a terminal configuration is unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("intro_step_ms must be greater than zero")]
    ZeroIntroStep,
    #[error("intro_increment_pct must be between 1 and {max} (got {value})")]
    IntroIncrement { value: u8, max: u8 },
    #[error("target coordinate out of range (lat {latitude:.4}, lon {longitude:.4})")]
    TargetOutOfRange { latitude: f64, longitude: f64 },
    #[error("location timeout must be greater than zero")]
    ZeroLocationTimeout,
}

/// Delays (milliseconds) for banners, auto-navigation and the hub intro, plus
/// the locator target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default = "TerminalConfig::default_passcode_error_ms")]
    pub passcode_error_ms: u64,
    #[serde(default = "TerminalConfig::default_banner_ms")]
    pub cipher_success_ms: u64,
    #[serde(default = "TerminalConfig::default_banner_ms")]
    pub cipher_error_ms: u64,
    #[serde(default = "TerminalConfig::default_banner_ms")]
    pub lights_success_ms: u64,
    #[serde(default = "TerminalConfig::default_codebreaker_success_ms")]
    pub codebreaker_success_ms: u64,
    #[serde(default = "TerminalConfig::default_intro_step_ms")]
    pub intro_step_ms: u64,
    #[serde(default = "TerminalConfig::default_intro_increment_pct")]
    pub intro_increment_pct: u8,
    #[serde(default = "TerminalConfig::default_intro_settle_ms")]
    pub intro_settle_ms: u64,
    #[serde(default = "TerminalConfig::default_target")]
    pub target: Coordinate,
    #[serde(default)]
    pub location: LocationOptions,
}

impl TerminalConfig {
    const fn default_passcode_error_ms() -> u64 {
        1_000
    }

    const fn default_banner_ms() -> u64 {
        2_000
    }

    const fn default_codebreaker_success_ms() -> u64 {
        3_000
    }

    const fn default_intro_step_ms() -> u64 {
        50
    }

    const fn default_intro_increment_pct() -> u8 {
        5
    }

    const fn default_intro_settle_ms() -> u64 {
        300
    }

    const fn default_target() -> Coordinate {
        Coordinate::new(TARGET_LATITUDE, TARGET_LONGITUDE)
    }

    /// Load the configuration shipped with the crate, falling back to the
    /// compiled defaults if the asset cannot be parsed.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_TERMINAL_DATA).unwrap_or_default()
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the invariants the widgets rely on.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.intro_step_ms == 0 {
            return Err(ConfigError::ZeroIntroStep);
        }
        if self.intro_increment_pct == 0 || self.intro_increment_pct > INTRO_COMPLETE_PCT {
            return Err(ConfigError::IntroIncrement {
                value: self.intro_increment_pct,
                max: INTRO_COMPLETE_PCT,
            });
        }
        if !self.target.is_valid() {
            return Err(ConfigError::TargetOutOfRange {
                latitude: self.target.latitude,
                longitude: self.target.longitude,
            });
        }
        if self.location.timeout_ms == 0 {
            return Err(ConfigError::ZeroLocationTimeout);
        }
        Ok(())
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            passcode_error_ms: Self::default_passcode_error_ms(),
            cipher_success_ms: Self::default_banner_ms(),
            cipher_error_ms: Self::default_banner_ms(),
            lights_success_ms: Self::default_banner_ms(),
            codebreaker_success_ms: Self::default_codebreaker_success_ms(),
            intro_step_ms: Self::default_intro_step_ms(),
            intro_increment_pct: Self::default_intro_increment_pct(),
            intro_settle_ms: Self::default_intro_settle_ms(),
            target: Self::default_target(),
            location: LocationOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_asset_matches_defaults() {
        assert_eq!(TerminalConfig::load_from_static(), TerminalConfig::default());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg = TerminalConfig::from_json(r#"{ "passcode_error_ms": 250 }"#).unwrap();
        assert_eq!(cfg.passcode_error_ms, 250);
        assert_eq!(cfg.codebreaker_success_ms, 3_000);
        assert_eq!(cfg.location.timeout_ms, 10_000);
        assert!(cfg.location.high_accuracy);
        assert_eq!(cfg.location.maximum_age_ms, 0);
    }

    #[test]
    fn rejects_zero_intro_increment() {
        let err = TerminalConfig::from_json(r#"{ "intro_increment_pct": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::IntroIncrement { value: 0, .. }));
    }

    #[test]
    fn rejects_target_outside_globe() {
        let err = TerminalConfig::from_json(
            r#"{ "target": { "latitude": 91.0, "longitude": 0.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::TargetOutOfRange { .. }));
    }

    #[test]
    fn rejects_zero_location_timeout() {
        let err = TerminalConfig::from_json(
            r#"{ "location": { "high_accuracy": true, "timeout_ms": 0, "maximum_age_ms": 0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroLocationTimeout));
    }
}
