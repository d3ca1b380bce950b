//! Game state and transitions
//!
//! One `GameState` owns everything the game mutates: mode, active level,
//! question list, marker, score/lives/combo, timers and camera tracking.
//! Transitions are methods; the render adapter only calls intents and
//! reads state.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::builder::build_questions;
use super::levels::{LevelDef, catalog, validate_catalog};
use super::question::Question;
use crate::camera::{CameraDevice, CameraTracking, HandLandmarks, InferenceTicket, LandmarkBackend, StreamRequest};
use crate::consts::MAX_LIVES;
use crate::error::{CameraError, GameError, GameResult};
use crate::settings::Settings;

/// Top-level game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Level select / title
    Menu,
    /// Answering questions
    Playing,
    /// Level finished, waiting to advance
    LevelClear,
    /// Final level finished
    GameComplete,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Menu => "menu",
            GameMode::Playing => "playing",
            GameMode::LevelClear => "level_clear",
            GameMode::GameComplete => "game_complete",
        }
    }
}

/// Where marker input comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputMode {
    #[default]
    Pointer,
    Camera,
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Pointer => "pointer",
            InputMode::Camera => "camera",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackKind {
    Info,
    Success,
    Warning,
    Error,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Info => "info",
            FeedbackKind::Success => "success",
            FeedbackKind::Warning => "warning",
            FeedbackKind::Error => "error",
        }
    }
}

/// Transient message shown to the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub text: String,
    pub kind: FeedbackKind,
    /// Seconds left on screen
    pub ttl: f32,
}

/// What triggered a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitSource {
    Pointer,
    Keyboard,
    Button,
    CameraDwell,
}

/// Gameplay events for sounds/particles (drained by the adapter)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Correct { value: f64, gain: u32 },
    Wrong { target: f64, marker: f64 },
    Timeout,
    LifeLost { remaining: u8 },
    LivesDepleted,
    LevelCleared { level: usize },
    CampaignComplete { score: u64 },
    CameraSubmit,
}

/// Render surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Pixel placement of the number line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

/// Base points for any correct answer
const BASE_POINTS: u32 = 140;
/// Time bonus on untimed levels
const UNTIMED_BONUS: u32 = 20;
/// Time bonus per remaining second on timed levels
const TIME_BONUS_PER_SEC: f32 = 12.0;
const PRECISION_BONUS: f64 = 100.0;
const COMBO_STEP: u32 = 8;
const COMBO_CAP: u32 = 120;
/// Keyboard nudge on free (non-snapping) levels, as a fraction of the span
const FREE_NUDGE_DIVISIONS: f64 = 60.0;

/// Complete game state
#[derive(Debug)]
pub struct GameState {
    pub seed: u64,
    pub mode: GameMode,
    /// Level catalog (validated)
    pub levels: Vec<LevelDef>,
    /// Active level, if any
    pub level_index: Option<usize>,
    pub questions: Vec<Question>,
    pub question_index: usize,
    /// Value the player currently points at
    pub marker_value: f64,
    pub score: u64,
    /// Correct answers in the current level
    pub level_correct: u32,
    pub combo: u32,
    pub lives: u8,
    pub elapsed_in_level: f32,
    /// Seconds left for the current question (timed levels)
    pub time_left: f32,
    /// Sideways offset of the visible window on moving levels
    pub line_shift: f64,
    pub input_mode: InputMode,
    pub feedback: Feedback,
    /// A campaign was started at least once
    pub has_played: bool,
    pub viewport: Viewport,
    pub camera: CameraTracking,
    pub max_frame_dt: f32,
    events: Vec<GameEvent>,
    rng: Pcg32,
}

impl GameState {
    /// Built-in campaign with default settings
    pub fn new(seed: u64) -> Self {
        let settings = Settings::default();
        Self::build(catalog(), &settings, seed)
    }

    /// Custom catalog and settings; both are validated
    pub fn with_levels(levels: Vec<LevelDef>, settings: &Settings, seed: u64) -> GameResult<Self> {
        validate_catalog(&levels)?;
        settings.validate()?;
        Ok(Self::build(levels, settings, seed))
    }

    fn build(levels: Vec<LevelDef>, settings: &Settings, seed: u64) -> Self {
        Self {
            seed,
            mode: GameMode::Menu,
            levels,
            level_index: None,
            questions: Vec::new(),
            question_index: 0,
            marker_value: 0.0,
            score: 0,
            level_correct: 0,
            combo: 0,
            lives: MAX_LIVES,
            elapsed_in_level: 0.0,
            time_left: 0.0,
            line_shift: 0.0,
            input_mode: InputMode::Pointer,
            feedback: Feedback {
                text: "Start the campaign and chart a fraction path.".to_string(),
                kind: FeedbackKind::Info,
                ttl: 0.0,
            },
            has_played: false,
            viewport: Viewport {
                width: settings.viewport_width,
                height: settings.viewport_height,
            },
            camera: CameraTracking::new(settings),
            max_frame_dt: settings.max_frame_dt,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    // === Queries ===

    pub fn level(&self) -> Option<&LevelDef> {
        self.level_index.and_then(|i| self.levels.get(i))
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.level_index?;
        self.questions.get(self.question_index)
    }

    /// Tick spacing currently in effect
    pub fn active_tick_step(&self) -> f64 {
        let Some(level) = self.level() else {
            return 0.125;
        };
        if level.dynamic_tick
            && let Some(den) = self.current_question().and_then(|q| q.denominator)
        {
            return 1.0 / den as f64;
        }
        level.tick_step
    }

    /// Visible value window (shifted on moving levels)
    pub fn visual_range(&self) -> (f64, f64) {
        match self.level() {
            None => (0.0, 1.0),
            Some(level) if level.moving => (level.range.0 + self.line_shift, level.range.1 + self.line_shift),
            Some(level) => level.range,
        }
    }

    pub fn line_geometry(&self) -> LineGeometry {
        LineGeometry {
            x: self.viewport.width * 0.1,
            y: self.viewport.height * 0.64,
            width: self.viewport.width * 0.8,
        }
    }

    pub fn value_to_x(&self, value: f64) -> f64 {
        let line = self.line_geometry();
        let (min, max) = self.visual_range();
        line.x + (value - min) / (max - min) * line.width
    }

    pub fn x_to_value(&self, x: f64) -> f64 {
        let line = self.line_geometry();
        let (min, max) = self.visual_range();
        let ratio = ((x - line.x) / line.width).clamp(0.0, 1.0);
        min + ratio * (max - min)
    }

    /// Clamp to the level range and, on snapping levels, to the tick grid
    pub fn normalize_marker_value(&self, value: f64) -> f64 {
        let Some(level) = self.level() else {
            return value;
        };
        let (min, max) = level.range;
        let clamped = value.clamp(min, max);
        if !level.snap_to_ticks {
            return clamped;
        }
        let step = self.active_tick_step();
        ((clamped / step).round() * step).clamp(min, max)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn set_feedback(&mut self, text: impl Into<String>, kind: FeedbackKind, ttl: f32) {
        self.feedback = Feedback {
            text: text.into(),
            kind,
            ttl,
        };
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.viewport = Viewport { width, height };
        }
    }

    // === Marker intents ===

    pub fn set_marker_value(&mut self, value: f64) {
        if self.level().is_some() {
            self.marker_value = self.normalize_marker_value(value);
        }
    }

    /// Pointer/touch position on the render surface (ignored in camera mode)
    pub fn set_marker_from_position(&mut self, x: f64) {
        if self.mode != GameMode::Playing || self.input_mode == InputMode::Camera {
            return;
        }
        self.place_marker_at(x);
    }

    fn place_marker_at(&mut self, x: f64) {
        let value = self.x_to_value(x);
        self.set_marker_value(value);
    }

    /// Keyboard step: one active tick on snapping levels, 1/60 of the span otherwise
    pub fn nudge_marker(&mut self, steps: i32) {
        if self.mode != GameMode::Playing {
            return;
        }
        let Some(level) = self.level() else {
            return;
        };
        let step = if level.snap_to_ticks {
            self.active_tick_step()
        } else {
            level.span() / FREE_NUDGE_DIVISIONS
        };
        self.set_marker_value(self.marker_value + step * steps as f64);
    }

    // === Campaign flow ===

    pub fn start_campaign(&mut self) {
        // Index 0 always exists in a validated catalog
        let _ = self.start_campaign_from_level(0);
    }

    /// Reset score, combo and lives and start at `index`
    pub fn start_campaign_from_level(&mut self, index: usize) -> GameResult<()> {
        if index >= self.levels.len() {
            return Err(GameError::LevelOutOfRange {
                index,
                count: self.levels.len(),
            });
        }
        self.has_played = true;
        self.score = 0;
        self.combo = 0;
        self.lives = MAX_LIVES;
        log::info!("Campaign started at level {}", index + 1);
        self.begin_level(index);
        Ok(())
    }

    fn begin_level(&mut self, index: usize) {
        let level = self.levels[index].clone();
        self.level_index = Some(index);
        self.questions = build_questions(&level, &mut self.rng);
        self.question_index = 0;
        self.level_correct = 0;
        self.elapsed_in_level = 0.0;
        self.time_left = level.time_limit;
        self.line_shift = 0.0;
        self.mode = GameMode::Playing;

        let center = (level.range.0 + level.range.1) * 0.5;
        self.marker_value = self.normalize_marker_value(center);

        let mut text = format!("Level {} started: {}", index + 1, level.name);
        if level.camera_focus && self.input_mode != InputMode::Camera {
            text.push_str(" | camera mode recommended (C)");
        }
        log::info!("{text} ({} questions)", self.questions.len());
        self.set_feedback(text, FeedbackKind::Info, 2.2);
    }

    /// Continue after a cleared level, or replay after completing the campaign
    pub fn begin_next_level(&mut self) {
        match self.mode {
            GameMode::LevelClear => {
                let next = self.level_index.map_or(0, |i| i + 1);
                if next < self.levels.len() {
                    self.begin_level(next);
                } else {
                    self.start_campaign();
                }
            }
            GameMode::GameComplete => self.start_campaign(),
            GameMode::Menu | GameMode::Playing => {}
        }
    }

    /// Abandon whatever is in progress
    pub fn return_to_menu(&mut self) {
        self.mode = GameMode::Menu;
        self.level_index = None;
        self.questions.clear();
        self.question_index = 0;
        self.marker_value = 0.0;
        self.elapsed_in_level = 0.0;
        self.line_shift = 0.0;
        self.time_left = 0.0;
        self.combo = 0;
        self.set_feedback("Back to the menu.", FeedbackKind::Info, 1.2);
    }

    // === Answers ===

    /// Evaluate the marker against the current target.
    ///
    /// Returns `None` when there is nothing to answer, otherwise whether the
    /// answer was within tolerance. A wrong answer keeps the same question.
    pub fn submit_guess(&mut self, source: SubmitSource) -> Option<bool> {
        if self.mode != GameMode::Playing {
            return None;
        }
        let level = self.level()?;
        let tolerance = level.span() * level.tolerance;
        let timed = level.is_timed();
        let question = self.current_question()?;
        let target = question.value;
        let label = question.label.clone();

        let error = (self.marker_value - target).abs();
        let correct = error <= tolerance;
        log::debug!(
            "Submit ({source:?}): marker={:.4} target={target:.4} error={error:.4} tolerance={tolerance:.4} -> {}",
            self.marker_value,
            if correct { "correct" } else { "wrong" }
        );

        if correct {
            let time_bonus = if timed {
                (self.time_left.max(0.0) * TIME_BONUS_PER_SEC).round() as u32
            } else {
                UNTIMED_BONUS
            };
            let precision_bonus = ((1.0 - (error / tolerance).min(1.0)) * PRECISION_BONUS).round() as u32;
            let combo_bonus = (self.combo * COMBO_STEP).min(COMBO_CAP);
            let gain = BASE_POINTS + time_bonus + precision_bonus + combo_bonus;

            self.score += u64::from(gain);
            self.level_correct += 1;
            self.combo += 1;
            self.set_feedback(
                format!("CORRECT! Found {label}. +{gain} points"),
                FeedbackKind::Success,
                2.4,
            );
            self.events.push(GameEvent::Correct { value: target, gain });
            self.advance_question();
        } else {
            let before = self.lives;
            self.events.push(GameEvent::Wrong {
                target,
                marker: self.marker_value,
            });
            self.set_feedback(
                format!(
                    "WRONG! Target was {label}. Lives {before} -> {}",
                    before.saturating_sub(1)
                ),
                FeedbackKind::Error,
                3.0,
            );
            self.lose_life("Out of lives. Restart the campaign.");
        }
        Some(correct)
    }

    /// The countdown for the current question ran out. Costs a life like a
    /// wrong answer but moves on to the next question.
    pub fn timeout_penalty(&mut self) {
        if self.mode != GameMode::Playing || self.level().is_none() {
            return;
        }
        let before = self.lives;
        self.events.push(GameEvent::Timeout);
        self.set_feedback(
            format!("TIME'S UP! Lives {before} -> {}", before.saturating_sub(1)),
            FeedbackKind::Warning,
            2.4,
        );
        if self.lose_life("Ran out of time. Try again.") {
            return;
        }
        self.advance_question();
    }

    /// Take a life and break the combo. Returns true when that ended the run.
    fn lose_life(&mut self, depleted_message: &str) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.combo = 0;
        self.events.push(GameEvent::LifeLost { remaining: self.lives });
        if self.lives > 0 {
            return false;
        }
        log::info!("Out of lives at level {}", self.level_index.map_or(0, |i| i + 1));
        self.mode = GameMode::Menu;
        self.events.push(GameEvent::LivesDepleted);
        self.set_feedback(depleted_message, FeedbackKind::Error, 2.8);
        true
    }

    fn advance_question(&mut self) {
        self.question_index += 1;
        let Some(index) = self.level_index else {
            return;
        };
        let level = &self.levels[index];
        if self.question_index >= self.questions.len() {
            if index + 1 >= self.levels.len() {
                log::info!("Campaign complete with {} points", self.score);
                self.mode = GameMode::GameComplete;
                self.events.push(GameEvent::CampaignComplete { score: self.score });
                self.set_feedback("Every fraction system is balanced.", FeedbackKind::Success, 3.0);
            } else {
                let name = level.name.clone();
                log::info!("Level {} cleared ({} correct)", index + 1, self.level_correct);
                self.mode = GameMode::LevelClear;
                self.events.push(GameEvent::LevelCleared { level: index });
                self.set_feedback(format!("{name} cleared."), FeedbackKind::Success, 2.6);
            }
            return;
        }
        self.time_left = level.time_limit;
    }

    // === Camera ===

    /// Switch between pointer and camera input. Turning the camera on opens
    /// the stream; failures leave pointer input active and show feedback.
    pub fn toggle_camera_mode(&mut self, device: &mut dyn CameraDevice) -> InputMode {
        if self.input_mode == InputMode::Camera {
            self.input_mode = InputMode::Pointer;
            self.camera.stop(device);
            self.set_feedback("Camera pointer off.", FeedbackKind::Info, 1.2);
            return self.input_mode;
        }

        match self.camera.activate(device, &StreamRequest::default()) {
            Ok(()) => {
                self.input_mode = InputMode::Camera;
                self.set_feedback(
                    "Camera pointer on. Move your finger, hold still to lock in.",
                    FeedbackKind::Info,
                    2.4,
                );
            }
            Err(err) => {
                let text = match err {
                    CameraError::Unavailable => "This browser has no camera API.".to_string(),
                    _ => "Could not open the camera. Allow access and try again.".to_string(),
                };
                self.set_feedback(text, FeedbackKind::Warning, 2.6);
            }
        }
        self.input_mode
    }

    /// Stop the camera (e.g. on page unload) and fall back to pointer input
    pub fn stop_camera(&mut self, device: &mut dyn CameraDevice) {
        self.camera.stop(device);
        self.input_mode = InputMode::Pointer;
    }

    /// Report the outcome of a landmark tracker load
    pub fn landmark_loaded(&mut self, result: Result<LandmarkBackend, CameraError>) {
        match self.camera.landmark.finish_load(result) {
            Ok(()) if self.camera.landmark.is_loaded() => {
                self.set_feedback("Camera hand tracking active.", FeedbackKind::Success, 1.8);
            }
            Ok(()) => {}
            Err(err) => self.camera.report_error(err),
        }
    }

    /// Apply a host-run landmark inference started with `begin_inference`
    pub fn landmark_result(
        &mut self,
        ticket: InferenceTicket,
        result: Result<Option<HandLandmarks>, CameraError>,
        now_ms: f64,
    ) {
        let camera = &mut self.camera;
        if let Err(err) = camera
            .landmark
            .complete_inference(ticket, result, now_ms, &mut camera.pointer)
        {
            camera.report_error(err);
        }
    }

    /// Apply one camera sample: move the marker and run the dwell detector
    pub(crate) fn apply_camera_sample(&mut self, step: f32) {
        let engaged =
            self.mode == GameMode::Playing && self.level().is_some() && self.input_mode == InputMode::Camera;
        let pointer = self.camera.pointer;
        if engaged {
            // The camera image is mirrored
            let line = self.line_geometry();
            let x = line.x + (1.0 - f64::from(pointer.pos.x)) * line.width;
            self.place_marker_at(x);
        }
        if self.camera.dwell.step(pointer.pos.x, pointer.confidence, step, engaged) {
            self.events.push(GameEvent::CameraSubmit);
            self.submit_guess(SubmitSource::CameraDwell);
        }
    }

    /// Turn pending camera errors into feedback
    pub(crate) fn surface_camera_errors(&mut self) {
        if let Some(err) = self.camera.take_error() {
            let text = match err {
                CameraError::Inference(_) | CameraError::TrackerLoad(_) => {
                    "Hand tracking paused. Using basic camera tracking.".to_string()
                }
                other => other.to_string(),
            };
            self.set_feedback(text, FeedbackKind::Warning, 2.2);
        }
    }
}
