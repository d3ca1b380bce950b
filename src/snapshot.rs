//! Diagnostic snapshot
//!
//! A serializable view of everything visible on screen, used by automated
//! tests and browser tooling. Numbers are rounded so the text is stable
//! across frames.

use serde::Serialize;

use crate::round_to;
use crate::sim::{GameState, InputMode};

const COORDINATE_SYSTEM: &str =
    "Canvas origin top-left; x right, y down; number line values increase left to right.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub coordinate_system: &'static str,
    pub mode: &'static str,
    pub level: Option<LevelInfo>,
    pub input_mode: &'static str,
    pub score: u64,
    pub lives: u8,
    pub combo: u32,
    pub question: Option<QuestionInfo>,
    pub line: Option<LineInfo>,
    /// Seconds left, timed levels only
    pub timer: Option<f64>,
    pub feedback: String,
    pub feedback_type: &'static str,
    pub camera: CameraInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelInfo {
    /// 1-based
    pub index: usize,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionInfo {
    /// 1-based
    pub index: usize,
    pub total: usize,
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineInfo {
    pub pixel_start: f64,
    pub pixel_end: f64,
    pub visual_min: f64,
    pub visual_max: f64,
    pub marker_value: f64,
    pub marker_x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    pub active: bool,
    pub using_camera_input: bool,
    pub tracker: &'static str,
    pub motion: f64,
    pub pointer_x: f64,
    pub confidence: f64,
    pub dwell: f64,
    /// Last camera problem, if any
    pub error: Option<String>,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        let level = state.level_index.zip(state.level()).map(|(index, level)| LevelInfo {
            index: index + 1,
            id: level.id.clone(),
            name: level.name.clone(),
        });

        let question = state.current_question().map(|q| QuestionInfo {
            index: state.question_index + 1,
            total: state.questions.len(),
            label: q.label.clone(),
            value: round_to(q.value, 4),
        });

        let line = state.level().map(|_| {
            let geometry = state.line_geometry();
            let (min, max) = state.visual_range();
            LineInfo {
                pixel_start: round_to(geometry.x, 2),
                pixel_end: round_to(geometry.x + geometry.width, 2),
                visual_min: round_to(min, 4),
                visual_max: round_to(max, 4),
                marker_value: round_to(state.marker_value, 4),
                marker_x: round_to(state.value_to_x(state.marker_value), 2),
            }
        });

        let timer = state
            .level()
            .filter(|level| level.is_timed())
            .map(|_| round_to(f64::from(state.time_left), 2));

        let camera = &state.camera;
        Self {
            coordinate_system: COORDINATE_SYSTEM,
            mode: state.mode.as_str(),
            level,
            input_mode: state.input_mode.as_str(),
            score: state.score,
            lives: state.lives,
            combo: state.combo,
            question,
            line,
            timer,
            feedback: state.feedback.text.clone(),
            feedback_type: state.feedback.kind.as_str(),
            camera: CameraInfo {
                active: camera.active,
                using_camera_input: state.input_mode == InputMode::Camera,
                tracker: camera.tracker.as_str(),
                motion: f64::from(camera.pointer.last_motion).round(),
                pointer_x: round_to(f64::from(camera.pointer.pos.x), 3),
                confidence: round_to(f64::from(camera.pointer.confidence), 3),
                dwell: round_to(f64::from(camera.dwell.dwell), 3),
                error: (!camera.error_text.is_empty()).then(|| camera.error_text.clone()),
            },
        }
    }

    pub fn to_json(&self) -> crate::GameResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// JSON text of the current state
pub fn render_game_to_text(state: &GameState) -> crate::GameResult<String> {
    Snapshot::capture(state).to_json()
}
