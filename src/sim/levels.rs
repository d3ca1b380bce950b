//! Level catalog
//!
//! Levels are plain data. The built-in campaign runs from fraction warm-ups
//! through negative ranges and mixed numbers to timed moving lines and the
//! camera boss.

use serde::{Deserialize, Serialize};

use super::question::QuestionKind;
use crate::error::{GameError, GameResult};

/// Line motion used when a level has no explicit speed
pub const DEFAULT_MOVE_SPEED: f64 = 1.1;
/// Line motion used when a level has no explicit amplitude (fraction of span)
pub const DEFAULT_MOVE_AMPLITUDE: f64 = 0.17;

/// Static definition of one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    pub id: String,
    pub name: String,
    /// One-line menu description
    pub description: String,
    /// Inclusive number-line range (min, max)
    pub range: (f64, f64),
    /// Base distance between ticks
    pub tick_step: f64,
    /// Questions per level
    pub questions: usize,
    /// Accepted error as a fraction of the range span
    pub tolerance: f64,
    /// Seconds per question (0 = untimed)
    pub time_limit: f32,
    /// Line oscillates sideways
    pub moving: bool,
    pub move_speed: f64,
    pub move_amplitude: f64,
    /// Camera input is recommended
    pub camera_focus: bool,
    /// Marker snaps to the active tick grid
    pub snap_to_ticks: bool,
    /// Tick grid follows the current question's denominator
    pub dynamic_tick: bool,
    pub kind: QuestionKind,
}

impl LevelDef {
    /// Untimed, static level with the given range and generator
    pub fn new(id: &str, name: &str, range: (f64, f64), kind: QuestionKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            range,
            tick_step: 0.25,
            questions: 6,
            tolerance: 0.05,
            time_limit: 0.0,
            moving: false,
            move_speed: DEFAULT_MOVE_SPEED,
            move_amplitude: DEFAULT_MOVE_AMPLITUDE,
            camera_focus: false,
            snap_to_ticks: false,
            dynamic_tick: false,
            kind,
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn ticks(mut self, tick_step: f64) -> Self {
        self.tick_step = tick_step;
        self
    }

    pub fn questions(mut self, count: usize, tolerance: f64) -> Self {
        self.questions = count;
        self.tolerance = tolerance;
        self
    }

    pub fn timed(mut self, seconds: f32) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn moving(mut self, speed: f64, amplitude: f64) -> Self {
        self.moving = true;
        self.move_speed = speed;
        self.move_amplitude = amplitude;
        self
    }

    pub fn camera_focus(mut self) -> Self {
        self.camera_focus = true;
        self
    }

    /// Snap the marker to a grid derived from each question's denominator
    pub fn dynamic_ticks(mut self) -> Self {
        self.snap_to_ticks = true;
        self.dynamic_tick = true;
        self
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.range.1 - self.range.0
    }

    #[inline]
    pub fn is_timed(&self) -> bool {
        self.time_limit > 0.0
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.range.0 && value <= self.range.1
    }

    /// Reject definitions that cannot be played
    pub fn validate(&self) -> GameResult<()> {
        let fail = |reason: &str| {
            Err(GameError::InvalidLevel {
                id: self.id.clone(),
                reason: reason.to_string(),
            })
        };
        if !(self.range.0.is_finite() && self.range.1.is_finite()) || self.span() <= 0.0 {
            return fail("range must be finite with max > min");
        }
        if !(self.tick_step > 0.0) {
            return fail("tick step must be positive");
        }
        if self.questions == 0 {
            return fail("needs at least one question");
        }
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return fail("tolerance must be in (0, 1)");
        }
        if !(self.time_limit >= 0.0) {
            return fail("time limit must not be negative");
        }
        if self.moving && !(self.move_speed.is_finite() && self.move_amplitude.is_finite()) {
            return fail("moving level needs finite speed and amplitude");
        }
        Ok(())
    }
}

/// Validate a whole catalog
pub fn validate_catalog(levels: &[LevelDef]) -> GameResult<()> {
    if levels.is_empty() {
        return Err(GameError::EmptyCatalog);
    }
    levels.iter().try_for_each(LevelDef::validate)
}

/// The built-in campaign, in play order
pub fn catalog() -> Vec<LevelDef> {
    vec![
        LevelDef::new("L1", "Fraction Warm-up", (0.0, 1.0), QuestionKind::Warmup)
            .describe("Basic fractions between 0 and 1")
            .ticks(0.125)
            .questions(6, 0.07)
            .dynamic_ticks(),
        LevelDef::new("L1B", "Whole-number Bridge", (0.0, 3.0), QuestionKind::Mixed)
            .describe("Mixed numbers on a denominator grid")
            .ticks(0.25)
            .questions(6, 0.055)
            .dynamic_ticks(),
        LevelDef::new("L2S", "Drifting Sprint", (0.0, 3.0), QuestionKind::Sprint)
            .describe("Levels 1-2 difficulty on a slowly drifting line")
            .ticks(0.125)
            .questions(8, 0.06)
            .timed(13.0)
            .moving(0.42, 0.1)
            .dynamic_ticks(),
        LevelDef::new("L2", "Equivalence Portal", (0.0, 1.0), QuestionKind::Equivalent)
            .describe("Hunt for equivalent fractions")
            .ticks(0.125)
            .questions(6, 0.04),
        LevelDef::new("L3", "Negative Canyon", (-2.0, 2.0), QuestionKind::Negative)
            .describe("Find positions below zero")
            .ticks(0.25)
            .questions(6, 0.035),
        LevelDef::new("L4", "Compound Lab", (0.0, 3.0), QuestionKind::Compound)
            .describe("Improper fractions and mixed numbers")
            .ticks(0.25)
            .questions(6, 0.034),
        LevelDef::new("L5", "Drifting Turbo", (0.0, 3.0), QuestionKind::Drift)
            .describe("Advanced fast drifting line")
            .ticks(0.25)
            .questions(7, 0.038)
            .timed(11.0)
            .moving(DEFAULT_MOVE_SPEED, DEFAULT_MOVE_AMPLITUDE),
        LevelDef::new("L6", "Camera Boss", (-1.0, 2.0), QuestionKind::Boss)
            .describe("Final level in finger mode")
            .ticks(0.25)
            .questions(7, 0.04)
            .timed(10.0)
            .moving(DEFAULT_MOVE_SPEED, DEFAULT_MOVE_AMPLITUDE)
            .camera_focus(),
    ]
}
