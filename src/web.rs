//! Browser bindings
//!
//! `WebGame` is the only object JavaScript talks to. The page owns the
//! canvas, the media stream and the landmark model; it forwards intents and
//! capability results here and reads `render_game_to_text` back.

use wasm_bindgen::prelude::*;

use crate::camera::{CameraDevice, CameraFrame, HandLandmarks, InferenceTicket, LandmarkBackend, StreamRequest};
use crate::error::CameraError;
use crate::settings::Settings;
use crate::sim::{GameState, InputMode, KeyCommand, SubmitSource, TickInput, advance_time, frame};
use crate::snapshot::render_game_to_text;

/// Camera stream owned by the page. The page asks for permission first and
/// reports the outcome, which the next `open` consumes.
#[derive(Debug, Default)]
struct HostCamera {
    grant: Option<Result<(), CameraError>>,
    open: bool,
}

impl CameraDevice for HostCamera {
    fn open(&mut self, _request: &StreamRequest) -> Result<(), CameraError> {
        match self.grant.take() {
            Some(Ok(())) => {
                self.open = true;
                Ok(())
            }
            Some(Err(err)) => Err(err),
            None => Err(CameraError::Unavailable),
        }
    }

    fn close(&mut self) {
        self.open = false;
    }
}

/// Latest downsampled frame pushed by the page
#[derive(Debug, Default)]
struct FrameBuffer {
    rgba: Vec<u8>,
    width: usize,
    height: usize,
    now_ms: f64,
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WebGame {
    state: GameState,
    device: HostCamera,
    frame: FrameBuffer,
}

impl WebGame {
    fn from_state(state: GameState) -> WebGame {
        log::info!("Game initialized with seed: {}", state.seed);
        WebGame {
            state,
            device: HostCamera::default(),
            frame: FrameBuffer::default(),
        }
    }

    fn finish_camera_request(&mut self, grant: Result<(), CameraError>) -> bool {
        if self.state.input_mode == InputMode::Camera {
            return true;
        }
        self.device.grant = Some(grant);
        self.state.toggle_camera_mode(&mut self.device) == InputMode::Camera
    }
}

#[wasm_bindgen]
impl WebGame {
    /// New game with default settings. A non-finite seed uses the clock.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: f64) -> WebGame {
        Self::from_state(GameState::new(pick_seed(seed)))
    }

    /// New game from settings JSON
    pub fn with_settings(json: &str) -> Result<WebGame, JsValue> {
        let settings = Settings::from_json(json).map_err(js_error)?;
        let seed = settings.seed.unwrap_or_else(|| pick_seed(f64::NAN));
        let state = GameState::with_levels(crate::sim::catalog(), &settings, seed).map_err(js_error)?;
        Ok(Self::from_state(state))
    }

    /// One display refresh; `dt` in seconds, clamped inside. The most recent
    /// pushed camera frame is offered on every refresh.
    pub fn frame(&mut self, dt: f32) {
        let camera_frame = (!self.frame.rgba.is_empty()).then(|| {
            CameraFrame::new(&self.frame.rgba, self.frame.width, self.frame.height, self.frame.now_ms)
        });
        let input = TickInput {
            camera_frame,
            ..Default::default()
        };
        frame(&mut self.state, &input, dt);
    }

    /// Deterministic advance for automation
    pub fn advance_time(&mut self, ms: f64) {
        advance_time(&mut self.state, ms);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.state.resize(width, height);
    }

    // === Intents ===

    pub fn pointer_move(&mut self, x: f64) {
        self.state.set_marker_from_position(x);
    }

    pub fn pointer_submit(&mut self) {
        self.state.submit_guess(SubmitSource::Pointer);
    }

    pub fn button_submit(&mut self) {
        self.state.submit_guess(SubmitSource::Button);
    }

    /// Returns false for unknown keys so the page can let them through
    pub fn key(&mut self, key: &str) -> bool {
        let Some(command) = KeyCommand::from_key(key, self.state.levels.len()) else {
            return false;
        };
        if command == KeyCommand::ToggleCamera {
            // The page runs the permission flow through request_camera
            return false;
        }
        self.state.apply_key(command, &mut self.device);
        true
    }

    pub fn start_campaign_from_level(&mut self, index: usize) -> Result<(), JsValue> {
        self.state.start_campaign_from_level(index).map_err(js_error)
    }

    pub fn begin_next_level(&mut self) {
        self.state.begin_next_level();
    }

    pub fn return_to_menu(&mut self) {
        self.state.return_to_menu();
    }

    // === Camera ===

    /// Toggle requested. Returns true when the page should ask for a
    /// stream and report back; false when camera input was switched off
    /// (the page should stop its tracks).
    pub fn request_camera(&mut self) -> bool {
        if self.state.input_mode == InputMode::Camera {
            self.state.toggle_camera_mode(&mut self.device);
            return false;
        }
        true
    }

    pub fn camera_granted(&mut self) -> bool {
        self.finish_camera_request(Ok(()))
    }

    pub fn camera_denied(&mut self, reason: &str) -> bool {
        self.finish_camera_request(Err(CameraError::PermissionDenied(reason.to_string())))
    }

    pub fn camera_unavailable(&mut self) -> bool {
        self.finish_camera_request(Err(CameraError::Unavailable))
    }

    /// Page unload / stream ended
    pub fn stop_camera(&mut self) {
        self.state.stop_camera(&mut self.device);
        self.frame = FrameBuffer::default();
    }

    /// Copy the latest downsampled RGBA frame
    pub fn push_frame(&mut self, rgba: &[u8], width: usize, height: usize, now_ms: f64) {
        if !self.device.open {
            return;
        }
        self.frame.rgba.clear();
        self.frame.rgba.extend_from_slice(rgba);
        self.frame.width = width;
        self.frame.height = height;
        self.frame.now_ms = now_ms;
    }

    /// True for exactly one caller: the page should start loading the model
    pub fn landmark_should_load(&mut self) -> bool {
        self.state.camera.active && self.state.camera.landmark.request_load()
    }

    pub fn landmark_ready(&mut self) {
        self.state.landmark_loaded(Ok(LandmarkBackend::Host));
    }

    pub fn landmark_failed(&mut self, reason: &str) {
        self.state
            .landmark_loaded(Err(CameraError::TrackerLoad(reason.to_string())));
    }

    /// Session number to hand back with the result, if an inference may start now
    pub fn landmark_begin(&mut self, now_ms: f64) -> Option<u32> {
        if !self.state.camera.active {
            return None;
        }
        self.state
            .camera
            .landmark
            .begin_inference(now_ms)
            .map(|ticket| ticket.session)
    }

    /// Report a finished inference. `tip_x`/`tip_y` are absent when no hand was found.
    pub fn landmark_result(
        &mut self,
        session: u32,
        tip_x: Option<f32>,
        tip_y: Option<f32>,
        pip_y: Option<f32>,
        now_ms: f64,
    ) {
        let hand = tip_x.zip(tip_y).map(|(x, y)| HandLandmarks {
            tip: glam::Vec2::new(x, y),
            pip: pip_y.map(|py| glam::Vec2::new(x, py)),
        });
        self.state
            .landmark_result(InferenceTicket { session }, Ok(hand), now_ms);
    }

    pub fn landmark_error(&mut self, session: u32, reason: &str, now_ms: f64) {
        self.state.landmark_result(
            InferenceTicket { session },
            Err(CameraError::Inference(reason.to_string())),
            now_ms,
        );
    }

    // === Reads ===

    pub fn mode(&self) -> String {
        self.state.mode.as_str().to_string()
    }

    pub fn render_game_to_text(&self) -> Result<String, JsValue> {
        render_game_to_text(&self.state).map_err(js_error)
    }

    /// Events since the last call, as a JSON array
    pub fn drain_events(&mut self) -> Result<String, JsValue> {
        let events = self.state.drain_events();
        serde_json::to_string(&events).map_err(js_error)
    }
}

fn pick_seed(seed: f64) -> u64 {
    if seed.is_finite() && seed >= 0.0 {
        seed as u64
    } else {
        js_sys::Date::now() as u64
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("Fraction Explorer starting...");
}
