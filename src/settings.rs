//! Game settings
//!
//! Loaded from JSON; every field has a default so partial files work.

use serde::{Deserialize, Serialize};

use crate::camera::DwellConfig;
use crate::consts::{CAMERA_SAMPLE_INTERVAL, LANDMARK_INTERVAL_MS, MAX_FRAME_DT};
use crate::error::{GameError, GameResult};

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed (the host picks one when unset)
    pub seed: Option<u64>,

    // === Number line geometry ===
    /// Render surface width in pixels
    pub viewport_width: f64,
    /// Render surface height in pixels
    pub viewport_height: f64,

    // === Timing ===
    /// Largest step a single frame may simulate (seconds)
    pub max_frame_dt: f32,

    // === Camera ===
    /// Seconds between camera samples
    pub camera_sample_interval: f32,
    /// Minimum spacing between landmark inferences (ms)
    pub landmark_interval_ms: f64,
    /// Dwell-to-submit thresholds
    pub dwell: DwellConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            viewport_width: 960.0,
            viewport_height: 540.0,
            max_frame_dt: MAX_FRAME_DT,
            camera_sample_interval: CAMERA_SAMPLE_INTERVAL,
            landmark_interval_ms: LANDMARK_INTERVAL_MS,
            dwell: DwellConfig::default(),
        }
    }
}

impl Settings {
    /// Parse and validate settings JSON
    pub fn from_json(json: &str) -> GameResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> GameResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn validate(&self) -> GameResult<()> {
        let fail = |msg: &str| Err(GameError::InvalidSettings(msg.to_string()));
        if !(self.viewport_width > 0.0 && self.viewport_height > 0.0) {
            return fail("viewport must have a positive size");
        }
        if !(self.max_frame_dt > 0.0) {
            return fail("max_frame_dt must be positive");
        }
        if !(self.camera_sample_interval > 0.0) {
            return fail("camera_sample_interval must be positive");
        }
        if !(self.landmark_interval_ms >= 0.0) {
            return fail("landmark_interval_ms must not be negative");
        }
        let dwell = &self.dwell;
        if !(dwell.hold_secs > 0.0 && dwell.cooldown_secs >= 0.0) {
            return fail("dwell hold must be positive and cooldown not negative");
        }
        if !(0.0..=1.0).contains(&dwell.min_confidence) || !(0.0..=1.0).contains(&dwell.confident_above) {
            return fail("dwell confidence thresholds must be within [0, 1]");
        }
        if !(dwell.steady_threshold > 0.0 && dwell.strict_threshold > 0.0) {
            return fail("dwell stability thresholds must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.dwell.hold_secs, 0.95);
        assert_eq!(settings.dwell.cooldown_secs, 1.3);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{"seed": 7, "dwell": {"hold_secs": 1.5}}"#).unwrap();
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.dwell.hold_secs, 1.5);
        assert_eq!(settings.dwell.cooldown_secs, 1.3);
        assert_eq!(settings.viewport_width, 960.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Settings::from_json(r#"{"viewport_width": 0}"#),
            Err(GameError::InvalidSettings(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{"dwell": {"min_confidence": 2.0}}"#),
            Err(GameError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Settings::from_json("{seed"), Err(GameError::Json(_))));
    }
}
