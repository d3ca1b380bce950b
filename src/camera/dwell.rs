//! Dwell-to-submit
//!
//! Holding the camera pointer still for long enough locks in the answer.
//! After a submit the detector refuses to fire again until its cooldown
//! has run out, so one held gesture produces one submission.

use serde::{Deserialize, Serialize};

/// Thresholds for the dwell detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellConfig {
    /// Seconds the pointer must stay put before submitting
    pub hold_secs: f32,
    /// Refractory period after a submit (seconds)
    pub cooldown_secs: f32,
    /// Tracking confidence required to submit
    pub min_confidence: f32,
    /// Allowed x drift per sample when tracking is confident
    pub steady_threshold: f32,
    /// Allowed x drift per sample otherwise
    pub strict_threshold: f32,
    /// Confidence above which `steady_threshold` applies
    pub confident_above: f32,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            hold_secs: 0.95,
            cooldown_secs: 1.3,
            min_confidence: 0.35,
            steady_threshold: 0.008,
            strict_threshold: 0.006,
            confident_above: 0.7,
        }
    }
}

/// Cooldown enforced when the tracker loses the hand
pub const REANCHOR_COOLDOWN: f32 = 0.5;

/// Accumulates hold time on a stable pointer x
#[derive(Debug, Clone)]
pub struct DwellDetector {
    pub config: DwellConfig,
    /// Anchor the pointer has to stay near
    pub last_stable_x: f32,
    /// Seconds held near the anchor
    pub dwell: f32,
    /// Seconds until another submit is allowed
    pub cooldown: f32,
}

impl Default for DwellDetector {
    fn default() -> Self {
        Self::new(DwellConfig::default())
    }
}

impl DwellDetector {
    pub fn new(config: DwellConfig) -> Self {
        Self {
            config,
            last_stable_x: 0.5,
            dwell: 0.0,
            cooldown: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.last_stable_x = 0.5;
        self.dwell = 0.0;
        self.cooldown = 0.0;
    }

    /// Forget the current hold and re-anchor at `x`
    pub fn reanchor(&mut self, x: f32) {
        self.last_stable_x = x;
        self.dwell = 0.0;
        self.cooldown = self.cooldown.max(REANCHOR_COOLDOWN);
    }

    /// Advance by one camera sample. Returns true when a submit should fire.
    ///
    /// When not `engaged` (not playing, or pointer input) the hold and the
    /// cooldown only decay.
    pub fn step(&mut self, x: f32, confidence: f32, step_secs: f32, engaged: bool) -> bool {
        if !engaged {
            self.dwell = (self.dwell - step_secs).max(0.0);
            self.cooldown = (self.cooldown - step_secs).max(0.0);
            return false;
        }

        let delta = (x - self.last_stable_x).abs();
        let threshold = if confidence > self.config.confident_above {
            self.config.steady_threshold
        } else {
            self.config.strict_threshold
        };
        if delta < threshold {
            self.dwell += step_secs;
        } else {
            self.dwell = (self.dwell - step_secs).max(0.0);
            self.last_stable_x = x;
        }

        self.cooldown = (self.cooldown - step_secs).max(0.0);
        if self.dwell > self.config.hold_secs
            && self.cooldown <= 0.0
            && confidence > self.config.min_confidence
        {
            self.dwell = 0.0;
            self.cooldown = self.config.cooldown_secs;
            return true;
        }
        false
    }
}
