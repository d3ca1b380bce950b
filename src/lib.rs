//! Fraction Explorer - a number-line fraction game
//!
//! Core modules:
//! - `fraction`: Pure fraction arithmetic and label formatting
//! - `sim`: Deterministic gameplay (levels, questions, scoring, state machine)
//! - `camera`: Gesture trackers and the dwell-to-submit protocol
//! - `snapshot`: Serializable diagnostic view of the game
//! - `settings`: Data-driven configuration
//! - `web`: wasm bindings for the browser render adapter

pub mod camera;
pub mod error;
pub mod fraction;
pub mod settings;
pub mod sim;
pub mod snapshot;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{CameraError, GameError, GameResult};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Starting (and maximum) number of lives
    pub const MAX_LIVES: u8 = 4;

    /// Fixed step used by the time-advance hook (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest simulation step a single host frame may apply
    pub const MAX_FRAME_DT: f32 = 0.05;

    /// Downsampled camera frame used by the heuristic tracker
    pub const CAM_W: usize = 160;
    pub const CAM_H: usize = 120;
    /// Camera frames are sampled at most this often (seconds)
    pub const CAMERA_SAMPLE_INTERVAL: f32 = 0.05;

    /// Minimum spacing between landmark inference calls (ms)
    pub const LANDMARK_INTERVAL_MS: f64 = 34.0;
    /// A hand unseen for longer than this starts decaying confidence (ms)
    pub const LANDMARK_LOST_MS: f64 = 180.0;
    /// The landmark tracker keeps the pointer while it saw a hand this recently (ms)
    pub const LANDMARK_RECENT_MS: f64 = 260.0;

    /// Generator attempts before falling back to free-throw filler
    pub const QUESTION_RETRY_BUDGET: u32 = 240;
    /// Values closer than this are treated as duplicates / integers
    pub const VALUE_EPSILON: f64 = 1e-4;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Round to a fixed number of decimal places (for display/diagnostics only)
#[inline]
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}
