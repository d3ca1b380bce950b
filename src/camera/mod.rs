//! Camera gesture input
//!
//! Two interchangeable trackers estimate a normalized pointer from camera
//! frames: the always-available skin/motion heuristic and the optional hand
//! landmark model. Whichever is active, the dwell detector turns a held
//! pointer into a submit.
//!
//! The camera device and the landmark model are host capabilities. Their
//! failures are recorded here and surfaced as feedback; they never stop
//! the game loop.

pub mod dwell;
pub mod landmark;
pub mod skin;

pub use dwell::{DwellConfig, DwellDetector};
pub use landmark::{HandLandmarks, InferenceTicket, LandmarkBackend, LandmarkSource, LandmarkTracker};
pub use skin::{SkinMotionTracker, is_skin_pixel};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::CameraError;
use crate::settings::Settings;

/// Which estimator produced the current pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackerKind {
    #[default]
    Heuristic,
    Landmark,
}

impl TrackerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerKind::Heuristic => "heuristic",
            TrackerKind::Landmark => "landmark",
        }
    }
}

/// Pointer estimate shared by both trackers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerState {
    /// Normalized camera-frame position, (0,0) top-left
    pub pos: Vec2,
    /// Tracking confidence in [0, 1]
    pub confidence: f32,
    /// Motion magnitude of the last tracked sample
    pub last_motion: f32,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            pos: Vec2::splat(0.5),
            confidence: 0.0,
            last_motion: 0.0,
        }
    }
}

/// One sampled camera frame (RGBA, row-major)
#[derive(Debug, Clone, Copy)]
pub struct CameraFrame<'a> {
    pub rgba: &'a [u8],
    pub width: usize,
    pub height: usize,
    /// Host timestamp in milliseconds
    pub now_ms: f64,
}

impl<'a> CameraFrame<'a> {
    pub fn new(rgba: &'a [u8], width: usize, height: usize, now_ms: f64) -> Self {
        Self {
            rgba,
            width,
            height,
            now_ms,
        }
    }
}

/// A pointer estimator fed with camera frames
pub trait GestureTracker: std::fmt::Debug {
    fn kind(&self) -> TrackerKind;

    /// Update `pointer` from `frame`. Returns false when the frame produced
    /// no usable sample (e.g. it only primed a baseline).
    fn track(&mut self, frame: &CameraFrame<'_>, pointer: &mut PointerState) -> Result<bool, CameraError>;

    /// Drop any per-stream state
    fn reset(&mut self) {}
}

/// Parameters of the stream requested from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRequest {
    pub facing_user: bool,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for StreamRequest {
    fn default() -> Self {
        Self {
            facing_user: true,
            ideal_width: 640,
            ideal_height: 480,
        }
    }
}

/// Host media-capture facility
pub trait CameraDevice {
    fn open(&mut self, request: &StreamRequest) -> Result<(), CameraError>;
    fn close(&mut self);
}

/// Landmark confidence below which the heuristic tracker takes over
const LANDMARK_HANDOFF_CONFIDENCE: f32 = 0.2;

/// Camera-derived input state
#[derive(Debug)]
pub struct CameraTracking {
    /// Stream is open
    pub active: bool,
    pub pointer: PointerState,
    pub dwell: DwellDetector,
    /// Tracker that produced the last sample
    pub tracker: TrackerKind,
    pub landmark: LandmarkTracker,
    /// Last user-facing camera problem
    pub error_text: String,
    /// Incremented on every start/stop; invalidates in-flight inferences
    pub session: u32,
    sample_interval: f32,
    sample_accumulator: f32,
    fallback: Box<dyn GestureTracker>,
    pending_error: Option<CameraError>,
}

/// A camera sample ready for the dwell protocol
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSample {
    /// Seconds covered by this sample
    pub step: f32,
    pub pointer: PointerState,
}

impl CameraTracking {
    pub fn new(settings: &Settings) -> Self {
        Self {
            active: false,
            pointer: PointerState::default(),
            dwell: DwellDetector::new(settings.dwell.clone()),
            tracker: TrackerKind::Heuristic,
            landmark: LandmarkTracker::new(settings.landmark_interval_ms),
            error_text: String::new(),
            session: 0,
            sample_interval: settings.camera_sample_interval,
            sample_accumulator: 0.0,
            fallback: Box::new(SkinMotionTracker::default()),
            pending_error: None,
        }
    }

    /// Replace the always-available tracker
    pub fn with_fallback(mut self, tracker: Box<dyn GestureTracker>) -> Self {
        self.fallback = tracker;
        self
    }

    /// Open the stream (no-op if already open) and reset all tracking state
    pub fn activate(&mut self, device: &mut dyn CameraDevice, request: &StreamRequest) -> Result<(), CameraError> {
        if self.active {
            return Ok(());
        }
        if let Err(err) = device.open(request) {
            log::warn!("Camera unavailable: {err}");
            self.error_text = err.to_string();
            return Err(err);
        }
        self.active = true;
        self.error_text.clear();
        self.start_session();
        log::info!("Camera stream active (session {})", self.session);
        Ok(())
    }

    /// Close the stream and drop everything derived from it
    pub fn stop(&mut self, device: &mut dyn CameraDevice) {
        if !self.active {
            return;
        }
        device.close();
        self.active = false;
        self.start_session();
        log::info!("Camera stream stopped");
    }

    fn start_session(&mut self) {
        self.session = self.session.wrapping_add(1);
        self.pointer = PointerState::default();
        self.dwell.reset();
        self.tracker = TrackerKind::Heuristic;
        self.sample_accumulator = 0.0;
        self.fallback.reset();
        self.landmark.set_session(self.session);
    }

    /// Record a recoverable failure for the game to surface
    pub fn report_error(&mut self, err: CameraError) {
        log::warn!("Camera tracking: {err}");
        self.error_text = err.to_string();
        self.pending_error = Some(err);
    }

    pub fn take_error(&mut self) -> Option<CameraError> {
        self.pending_error.take()
    }

    /// Accumulate `dt` and, once a sample is due, run the active tracker on `frame`.
    /// The returned step covers all time since the previous sample, including
    /// ticks that had no frame.
    ///
    /// The landmark tracker keeps the pointer while it has seen a hand
    /// recently with enough confidence; otherwise the heuristic tracker
    /// processes the frame.
    pub fn sample(&mut self, dt: f32, frame: Option<&CameraFrame<'_>>) -> Option<CameraSample> {
        if !self.active {
            return None;
        }
        self.sample_accumulator += dt;
        if self.sample_accumulator < self.sample_interval {
            return None;
        }
        // Time keeps accumulating until a frame shows up
        let frame = frame?;
        let step = self.sample_accumulator;
        self.sample_accumulator = 0.0;

        if self.landmark.is_loaded() {
            match self.landmark.track(frame, &mut self.pointer) {
                Err(err) => {
                    self.tracker = TrackerKind::Heuristic;
                    self.report_error(err);
                }
                Ok(_) => {
                    if self.landmark.seen_recently(frame.now_ms)
                        && self.pointer.confidence > LANDMARK_HANDOFF_CONFIDENCE
                    {
                        self.tracker = TrackerKind::Landmark;
                        return Some(CameraSample {
                            step,
                            pointer: self.pointer,
                        });
                    }
                    if self.pointer.confidence < LANDMARK_HANDOFF_CONFIDENCE {
                        self.dwell.reanchor(self.pointer.pos.x);
                    }
                }
            }
        }

        self.tracker = self.fallback.kind();
        match self.fallback.track(frame, &mut self.pointer) {
            Ok(true) => Some(CameraSample {
                step,
                pointer: self.pointer,
            }),
            Ok(false) => None,
            Err(err) => {
                self.report_error(err);
                None
            }
        }
    }
}
