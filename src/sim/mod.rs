//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only (one `Pcg32` owned by the game state)
//! - Time only advances through `tick`
//! - No rendering or platform dependencies

pub mod builder;
pub mod input;
pub mod levels;
pub mod question;
pub mod state;
pub mod tick;

pub use builder::{build_questions, build_questions_with};
pub use input::KeyCommand;
pub use levels::{DEFAULT_MOVE_AMPLITUDE, DEFAULT_MOVE_SPEED, LevelDef, catalog, validate_catalog};
pub use question::{Question, QuestionKind, WARMUP_POOL, warmup_question};
pub use state::{
    Feedback, FeedbackKind, GameEvent, GameMode, GameState, InputMode, LineGeometry, SubmitSource, Viewport,
};
pub use tick::{TickInput, advance_time, frame, tick};
