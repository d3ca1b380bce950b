//! Optional hand-landmark tracker
//!
//! The landmark model itself is an external capability: the host loads it
//! lazily and either runs inference itself (reporting results back with a
//! ticket) or hands us an in-process `LandmarkSource`. Any failure disables
//! this tracker for the rest of the game and the heuristic tracker takes over.

use glam::Vec2;

use super::{CameraFrame, GestureTracker, PointerState, TrackerKind};
use crate::consts::{LANDMARK_INTERVAL_MS, LANDMARK_LOST_MS, LANDMARK_RECENT_MS};
use crate::error::CameraError;
use crate::lerp;

/// Pointer smoothing toward the reported fingertip
const SMOOTH_X: f32 = 0.46;
const SMOOTH_Y: f32 = 0.42;
/// Per-report decay while the hand is lost
const LOST_CONFIDENCE_STEP: f32 = 0.08;
const LOST_MOTION_DECAY: f32 = 0.86;
/// Motion reported per unit of confidence (keeps diagnostics comparable to the heuristic tracker)
const MOTION_SCALE: f32 = 30_000.0;

/// Normalized landmarks of one detected hand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks {
    /// Index fingertip
    pub tip: Vec2,
    /// Index finger middle joint, when reported
    pub pip: Option<Vec2>,
}

/// In-process landmark inference
pub trait LandmarkSource: std::fmt::Debug {
    /// Detect at most one hand in `frame`
    fn detect(&mut self, frame: &CameraFrame<'_>) -> Result<Option<HandLandmarks>, CameraError>;
}

/// Where inference runs once the model is loaded
#[derive(Debug)]
pub enum LandmarkBackend {
    /// The host runs inference and reports back with `complete_inference`
    Host,
    /// Inference runs inside `track`
    Local(Box<dyn LandmarkSource>),
}

#[derive(Debug)]
enum LoadState {
    Idle,
    Loading,
    Ready(LandmarkBackend),
    Disabled(String),
}

/// Proof that an inference was started for a given camera session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceTicket {
    pub session: u32,
}

#[derive(Debug)]
pub struct LandmarkTracker {
    load: LoadState,
    session: u32,
    busy: bool,
    interval_ms: f64,
    last_inference_ms: f64,
    last_seen_ms: f64,
}

impl Default for LandmarkTracker {
    fn default() -> Self {
        Self::new(LANDMARK_INTERVAL_MS)
    }
}

impl LandmarkTracker {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            load: LoadState::Idle,
            session: 0,
            busy: false,
            interval_ms,
            last_inference_ms: f64::NEG_INFINITY,
            last_seen_ms: f64::NEG_INFINITY,
        }
    }

    /// Claim the single load slot. Returns true only for the caller that
    /// should actually start loading; everyone else waits on that load.
    pub fn request_load(&mut self) -> bool {
        if matches!(self.load, LoadState::Idle) {
            self.load = LoadState::Loading;
            true
        } else {
            false
        }
    }

    /// Report the outcome of a load started after `request_load`
    pub fn finish_load(&mut self, result: Result<LandmarkBackend, CameraError>) -> Result<(), CameraError> {
        if self.is_disabled() {
            return Ok(());
        }
        match result {
            Ok(backend) => {
                log::info!("Hand landmark tracker ready");
                self.load = LoadState::Ready(backend);
                Ok(())
            }
            Err(err) => {
                self.disable(&err);
                Err(err)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.load, LoadState::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.load, LoadState::Ready(_))
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.load, LoadState::Disabled(_))
    }

    /// Why the tracker was disabled, if it was
    pub fn error_text(&self) -> Option<&str> {
        match &self.load {
            LoadState::Disabled(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn disable(&mut self, err: &CameraError) {
        log::warn!("Hand landmark tracker disabled: {err}");
        self.load = LoadState::Disabled(err.to_string());
        self.busy = false;
    }

    /// Start a new camera session; results of older inferences are dropped
    pub fn set_session(&mut self, session: u32) {
        self.session = session;
        self.busy = false;
        self.last_inference_ms = f64::NEG_INFINITY;
        self.last_seen_ms = f64::NEG_INFINITY;
    }

    /// A hand was reported within the recent window
    pub fn seen_recently(&self, now_ms: f64) -> bool {
        now_ms - self.last_seen_ms <= LANDMARK_RECENT_MS
    }

    /// Start an inference if loaded, idle and outside the rate limit
    pub fn begin_inference(&mut self, now_ms: f64) -> Option<InferenceTicket> {
        if !self.is_loaded() || self.busy || now_ms - self.last_inference_ms < self.interval_ms {
            return None;
        }
        self.busy = true;
        self.last_inference_ms = now_ms;
        Some(InferenceTicket { session: self.session })
    }

    /// Apply an inference result. Stale tickets and results arriving after
    /// the tracker was unloaded are ignored.
    pub fn complete_inference(
        &mut self,
        ticket: InferenceTicket,
        result: Result<Option<HandLandmarks>, CameraError>,
        now_ms: f64,
        pointer: &mut PointerState,
    ) -> Result<(), CameraError> {
        if ticket.session != self.session {
            return Ok(());
        }
        self.busy = false;
        if !self.is_loaded() {
            return Ok(());
        }

        match result {
            Err(err) => {
                self.disable(&err);
                Err(err)
            }
            Ok(None) => {
                if now_ms - self.last_seen_ms > LANDMARK_LOST_MS {
                    pointer.confidence = (pointer.confidence - LOST_CONFIDENCE_STEP).max(0.0);
                    pointer.last_motion = (pointer.last_motion * LOST_MOTION_DECAY).max(0.0);
                }
                Ok(())
            }
            Ok(Some(hand)) => {
                let tip = hand.tip.clamp(Vec2::ZERO, Vec2::ONE);
                let pip_y = hand.pip.map_or(tip.y, |pip| pip.y);
                // A finger pointing at the camera shows little tip/joint separation
                let depth_weight = (0.3 + (pip_y - tip.y).abs() * 2.4).clamp(0.3, 1.0);

                pointer.pos.x = lerp(pointer.pos.x, tip.x, SMOOTH_X);
                pointer.pos.y = lerp(pointer.pos.y, tip.y, SMOOTH_Y);
                pointer.confidence = (0.74 + depth_weight * 0.22).clamp(0.0, 1.0);
                pointer.last_motion = MOTION_SCALE * pointer.confidence;
                self.last_seen_ms = now_ms;
                Ok(())
            }
        }
    }
}

impl GestureTracker for LandmarkTracker {
    fn kind(&self) -> TrackerKind {
        TrackerKind::Landmark
    }

    /// Runs in-process inference; host-driven backends report asynchronously instead
    fn track(&mut self, frame: &CameraFrame<'_>, pointer: &mut PointerState) -> Result<bool, CameraError> {
        if !matches!(self.load, LoadState::Ready(LandmarkBackend::Local(_))) {
            return Ok(false);
        }
        let Some(ticket) = self.begin_inference(frame.now_ms) else {
            return Ok(false);
        };
        let result = match &mut self.load {
            LoadState::Ready(LandmarkBackend::Local(source)) => source.detect(frame),
            _ => Ok(None),
        };
        self.complete_inference(ticket, result, frame.now_ms, pointer)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedHand(Option<HandLandmarks>);

    impl LandmarkSource for FixedHand {
        fn detect(&mut self, _frame: &CameraFrame<'_>) -> Result<Option<HandLandmarks>, CameraError> {
            Ok(self.0)
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl LandmarkSource for Broken {
        fn detect(&mut self, _frame: &CameraFrame<'_>) -> Result<Option<HandLandmarks>, CameraError> {
            Err(CameraError::Inference("model crashed".into()))
        }
    }

    fn hand(x: f32, y: f32) -> HandLandmarks {
        HandLandmarks {
            tip: Vec2::new(x, y),
            pip: Some(Vec2::new(x, y + 0.1)),
        }
    }

    fn frame(now_ms: f64) -> CameraFrame<'static> {
        CameraFrame::new(&[], 0, 0, now_ms)
    }

    #[test]
    fn test_single_load_slot() {
        let mut tracker = LandmarkTracker::default();
        assert!(tracker.request_load());
        assert!(!tracker.request_load());
        assert!(tracker.is_loading());
        tracker.finish_load(Ok(LandmarkBackend::Host)).unwrap();
        assert!(tracker.is_loaded());
        assert!(!tracker.request_load());
    }

    #[test]
    fn test_load_failure_is_permanent() {
        let mut tracker = LandmarkTracker::default();
        tracker.request_load();
        let err = CameraError::TrackerLoad("offline".into());
        assert_eq!(tracker.finish_load(Err(err.clone())), Err(err));
        assert!(tracker.is_disabled());
        assert!(!tracker.request_load());
        assert!(tracker.error_text().unwrap().contains("offline"));
    }

    #[test]
    fn test_fingertip_smoothing_and_confidence() {
        let mut tracker = LandmarkTracker::default();
        tracker.request_load();
        tracker
            .finish_load(Ok(LandmarkBackend::Local(Box::new(FixedHand(Some(hand(1.0, 0.0)))))))
            .unwrap();

        let mut pointer = PointerState::default();
        assert!(tracker.track(&frame(1000.0), &mut pointer).unwrap());
        assert!((pointer.pos.x - 0.73).abs() < 1e-5);
        assert!((pointer.pos.y - 0.29).abs() < 1e-5);
        // depth weight 0.54 -> 0.74 + 0.54 * 0.22
        assert!((pointer.confidence - 0.8588).abs() < 1e-4);
        assert!(tracker.seen_recently(1200.0));
        assert!(!tracker.seen_recently(1300.0));
    }

    #[test]
    fn test_rate_limit_and_busy_guard() {
        let mut tracker = LandmarkTracker::default();
        tracker.request_load();
        tracker.finish_load(Ok(LandmarkBackend::Host)).unwrap();

        let ticket = tracker.begin_inference(100.0).expect("first inference starts");
        assert!(tracker.begin_inference(200.0).is_none(), "busy");

        let mut pointer = PointerState::default();
        tracker.complete_inference(ticket, Ok(None), 150.0, &mut pointer).unwrap();
        assert!(tracker.begin_inference(120.0).is_none(), "within interval");
        assert!(tracker.begin_inference(134.0).is_some());
    }

    #[test]
    fn test_lost_hand_decays_after_grace_period() {
        let mut tracker = LandmarkTracker::default();
        tracker.request_load();
        tracker.finish_load(Ok(LandmarkBackend::Host)).unwrap();
        let mut pointer = PointerState::default();

        let ticket = tracker.begin_inference(0.0).unwrap();
        tracker.complete_inference(ticket, Ok(Some(hand(0.5, 0.5))), 0.0, &mut pointer).unwrap();
        let confident = pointer.confidence;

        let ticket = tracker.begin_inference(100.0).unwrap();
        tracker.complete_inference(ticket, Ok(None), 100.0, &mut pointer).unwrap();
        assert_eq!(pointer.confidence, confident, "still within grace period");

        let ticket = tracker.begin_inference(300.0).unwrap();
        tracker.complete_inference(ticket, Ok(None), 300.0, &mut pointer).unwrap();
        assert!((pointer.confidence - (confident - 0.08)).abs() < 1e-6);
    }

    #[test]
    fn test_stale_ticket_ignored() {
        let mut tracker = LandmarkTracker::default();
        tracker.request_load();
        tracker.finish_load(Ok(LandmarkBackend::Host)).unwrap();
        let ticket = tracker.begin_inference(0.0).unwrap();

        tracker.set_session(1);
        let mut pointer = PointerState::default();
        tracker.complete_inference(ticket, Ok(Some(hand(0.9, 0.9))), 10.0, &mut pointer).unwrap();
        assert_eq!(pointer, PointerState::default());
    }

    #[test]
    fn test_inference_error_disables() {
        let mut tracker = LandmarkTracker::default();
        tracker.request_load();
        tracker.finish_load(Ok(LandmarkBackend::Local(Box::new(Broken)))).unwrap();
        let mut pointer = PointerState::default();
        assert!(tracker.track(&frame(0.0), &mut pointer).is_err());
        assert!(tracker.is_disabled());
        assert!(!tracker.track(&frame(100.0), &mut pointer).unwrap());
    }
}
