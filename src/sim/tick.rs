//! Simulation tick
//!
//! Advances timers, the drifting line and camera input. Hosts call `frame`
//! once per display refresh; tests and automation use `advance_time`.

use super::state::{GameMode, GameState, SubmitSource};
use crate::camera::CameraFrame;
use crate::consts::SIM_DT;

/// Input gathered since the previous tick
#[derive(Debug, Clone, Default)]
pub struct TickInput<'a> {
    /// Pointer/touch x on the render surface
    pub pointer_x: Option<f64>,
    /// Keyboard nudge steps
    pub nudge: i32,
    /// Submit button / click
    pub submit: bool,
    /// Latest downsampled camera frame, if the stream produced one
    pub camera_frame: Option<CameraFrame<'a>>,
}

/// Advance the game state by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput<'_>, dt: f32) {
    state.feedback.ttl = (state.feedback.ttl - dt).max(0.0);

    if let Some(x) = input.pointer_x {
        state.set_marker_from_position(x);
    }
    if input.nudge != 0 {
        state.nudge_marker(input.nudge);
    }
    if input.submit {
        state.submit_guess(SubmitSource::Pointer);
    }

    if let Some(sample) = state.camera.sample(dt, input.camera_frame.as_ref()) {
        state.apply_camera_sample(sample.step);
    }
    state.surface_camera_errors();

    if state.mode != GameMode::Playing {
        return;
    }
    let Some(level) = state.level() else {
        return;
    };
    let (moving, speed, amplitude, span, timed) =
        (level.moving, level.move_speed, level.move_amplitude, level.span(), level.is_timed());

    state.elapsed_in_level += dt;
    state.line_shift = if moving {
        (f64::from(state.elapsed_in_level) * speed).sin() * span * amplitude
    } else {
        0.0
    };

    if timed {
        state.time_left -= dt;
        if state.time_left <= 0.0 {
            state.time_left = 0.0;
            state.timeout_penalty();
        }
    }
}

/// One host frame: `raw_dt` is clamped so a stalled tab cannot jump the timers.
/// A non-finite `raw_dt` counts as no time at all.
pub fn frame(state: &mut GameState, input: &TickInput<'_>, raw_dt: f32) {
    let raw_dt = if raw_dt.is_finite() { raw_dt } else { 0.0 };
    let dt = raw_dt.clamp(0.0, state.max_frame_dt);
    tick(state, input, dt);
}

/// Deterministic time advance in fixed 60 Hz steps (at least one step)
pub fn advance_time(state: &mut GameState, ms: f64) {
    let frame_ms = 1000.0 / 60.0;
    let steps = (ms / frame_ms).round().max(1.0) as u32;
    let input = TickInput::default();
    for _ in 0..steps {
        tick(state, &input, SIM_DT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{
        CameraDevice, CameraTracking, GestureTracker, HandLandmarks, LandmarkBackend, LandmarkSource, PointerState,
        StreamRequest, TrackerKind,
    };
    use crate::error::CameraError;
    use crate::settings::Settings;
    use crate::sim::levels::LevelDef;
    use crate::sim::question::{Question, QuestionKind};
    use crate::sim::state::{GameEvent, InputMode};

    #[derive(Debug, Default)]
    struct Granted;

    impl CameraDevice for Granted {
        fn open(&mut self, _request: &StreamRequest) -> Result<(), CameraError> {
            Ok(())
        }
        fn close(&mut self) {}
    }

    /// Fallback tracker holding a fixed pointer
    #[derive(Debug)]
    struct Steady(f32);

    impl GestureTracker for Steady {
        fn kind(&self) -> TrackerKind {
            TrackerKind::Heuristic
        }
        fn track(&mut self, _frame: &CameraFrame<'_>, pointer: &mut PointerState) -> Result<bool, CameraError> {
            pointer.pos.x = self.0;
            pointer.confidence = 0.9;
            Ok(true)
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl LandmarkSource for Broken {
        fn detect(&mut self, _frame: &CameraFrame<'_>) -> Result<Option<HandLandmarks>, CameraError> {
            Err(CameraError::Inference("model crashed".into()))
        }
    }

    fn one_level(level: LevelDef, targets: &[f64]) -> GameState {
        let mut state = GameState::with_levels(vec![level], &Settings::default(), 77).unwrap();
        state.start_campaign();
        state.questions = targets
            .iter()
            .map(|v| Question::new(*v, format!("{v}"), "", None))
            .collect();
        state
    }

    fn with_camera(mut state: GameState, pointer_x: f32) -> GameState {
        state.camera = CameraTracking::new(&Settings::default()).with_fallback(Box::new(Steady(pointer_x)));
        assert_eq!(state.toggle_camera_mode(&mut Granted), InputMode::Camera);
        state
    }

    #[test]
    fn test_timer_runs_out() {
        let level = LevelDef::new("T", "Timed", (0.0, 1.0), QuestionKind::Basic)
            .questions(3, 0.05)
            .timed(2.0);
        let mut state = one_level(level, &[0.2, 0.4, 0.6]);
        state.lives = 2;

        advance_time(&mut state, 1000.0);
        assert_eq!(state.question_index, 0);
        assert!((state.time_left - 1.0).abs() < 0.02);

        advance_time(&mut state, 1100.0);
        assert_eq!(state.lives, 1);
        assert_eq!(state.mode, GameMode::Playing);
        assert_eq!(state.question_index, 1);
        assert!(state.time_left > 1.8);
        assert!(state.drain_events().contains(&GameEvent::Timeout));
    }

    #[test]
    fn test_untimed_level_never_times_out() {
        let level = LevelDef::new("U", "Untimed", (0.0, 1.0), QuestionKind::Basic).questions(2, 0.05);
        let mut state = one_level(level, &[0.2, 0.4]);
        advance_time(&mut state, 60_000.0);
        assert_eq!(state.lives, 4);
        assert_eq!(state.question_index, 0);
        assert!(state.elapsed_in_level > 59.0);
    }

    #[test]
    fn test_moving_line_shift() {
        let level = LevelDef::new("M", "Moving", (0.0, 2.0), QuestionKind::Basic)
            .questions(2, 0.05)
            .moving(1.0, 0.1);
        let mut state = one_level(level, &[0.5, 1.5]);
        advance_time(&mut state, 500.0);
        let expected = f64::from(state.elapsed_in_level).sin() * 2.0 * 0.1;
        assert!((state.line_shift - expected).abs() < 1e-9);
        assert!(state.line_shift > 0.0);
        // Target values never move with the window
        assert_eq!(state.current_question().map(|q| q.value), Some(0.5));
    }

    #[test]
    fn test_frame_clamps_dt() {
        let level = LevelDef::new("T", "Timed", (0.0, 1.0), QuestionKind::Basic)
            .questions(1, 0.05)
            .timed(5.0);
        let mut state = one_level(level, &[0.5]);
        frame(&mut state, &TickInput::default(), 3.0);
        assert!((state.elapsed_in_level - 0.05).abs() < 1e-6);
        assert!((state.time_left - 4.95).abs() < 1e-5);
    }

    #[test]
    fn test_frame_ignores_non_finite_dt() {
        let level = LevelDef::new("T", "Timed", (0.0, 1.0), QuestionKind::Basic)
            .questions(2, 0.05)
            .timed(1.0)
            .moving(1.0, 0.1);
        let mut state = one_level(level, &[0.5, 0.25]);
        frame(&mut state, &TickInput::default(), f32::NAN);
        frame(&mut state, &TickInput::default(), f32::INFINITY);
        assert_eq!(state.elapsed_in_level, 0.0);
        assert_eq!(state.time_left, 1.0);

        for _ in 0..25 {
            frame(&mut state, &TickInput::default(), 0.05);
        }
        assert!(state.line_shift.is_finite());
        assert!(state.value_to_x(state.marker_value).is_finite());
        assert_eq!(state.question_index, 1);
        assert_eq!(state.lives, 3);
    }

    #[test]
    fn test_timeout_on_last_life() {
        let level = LevelDef::new("T", "Timed", (0.0, 1.0), QuestionKind::Basic)
            .questions(3, 0.05)
            .timed(1.0);
        let mut state = one_level(level, &[0.2, 0.4, 0.6]);
        state.lives = 1;

        advance_time(&mut state, 1200.0);
        assert_eq!(state.lives, 0);
        assert_eq!(state.mode, GameMode::Menu);
        assert_eq!(state.question_index, 0);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::Timeout));
        assert!(events.contains(&GameEvent::LivesDepleted));

        // Nothing keeps ticking once the run is over
        advance_time(&mut state, 2000.0);
        assert_eq!(state.lives, 0);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_menu_does_not_advance_timers() {
        let mut state = GameState::new(1);
        advance_time(&mut state, 2000.0);
        assert_eq!(state.elapsed_in_level, 0.0);
        assert_eq!(state.mode, GameMode::Menu);
    }

    #[test]
    fn test_feedback_ttl_counts_down() {
        let mut state = GameState::new(1);
        state.start_campaign();
        assert!(state.feedback.ttl > 0.0);
        advance_time(&mut state, 5000.0);
        assert_eq!(state.feedback.ttl, 0.0);
    }

    #[test]
    fn test_pointer_input_and_submit() {
        let level = LevelDef::new("P", "Pointer", (0.0, 1.0), QuestionKind::Basic).questions(2, 0.05);
        let mut state = one_level(level, &[0.5, 0.25]);
        let line = state.line_geometry();
        let input = TickInput {
            pointer_x: Some(line.x + line.width * 0.5),
            submit: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.question_index, 1);
        assert!(state.score >= 140);
    }

    #[test]
    fn test_camera_dwell_submits_once() {
        let level = LevelDef::new("C", "Camera", (0.0, 1.0), QuestionKind::Basic).questions(3, 0.05);
        // Mirrored pointer at 0.3 lands on 0.7
        let state = one_level(level, &[0.7, 0.2, 0.9]);
        let mut state = with_camera(state, 0.3);

        let mut submits = Vec::new();
        for step in 0..20 {
            let frame = CameraFrame::new(&[], 0, 0, step as f64 * 60.0);
            let input = TickInput {
                camera_frame: Some(frame),
                ..Default::default()
            };
            tick(&mut state, &input, 0.06);
            if state.drain_events().contains(&GameEvent::CameraSubmit) {
                submits.push(step);
            }
        }

        assert_eq!(submits.len(), 1, "submits at {submits:?}");
        assert!(submits[0] >= 15);
        assert_eq!(state.question_index, 1);
        assert!(state.score > 0);
    }

    #[test]
    fn test_camera_dwell_counts_ticks_without_frames() {
        let level = LevelDef::new("C", "Camera", (0.0, 1.0), QuestionKind::Basic).questions(3, 0.05);
        let state = one_level(level, &[0.7, 0.2, 0.9]);
        let mut state = with_camera(state, 0.3);

        // 60 Hz ticks, camera delivering a frame only on every other tick
        let mut first_submit = None;
        for step in 0..100u32 {
            let frame = (step % 2 == 0).then(|| CameraFrame::new(&[], 0, 0, f64::from(step) * 1000.0 / 60.0));
            let input = TickInput {
                camera_frame: frame,
                ..Default::default()
            };
            tick(&mut state, &input, SIM_DT);
            if first_submit.is_none() && state.drain_events().contains(&GameEvent::CameraSubmit) {
                first_submit = Some(step as f32 * SIM_DT);
            }
        }

        let at = first_submit.expect("held pointer submits");
        assert!(at > 0.9 && at < 1.2, "submitted after {at} s");
        assert_eq!(state.question_index, 1);
    }

    #[test]
    fn test_pointer_ignored_in_camera_mode() {
        let level = LevelDef::new("C", "Camera", (0.0, 1.0), QuestionKind::Basic).questions(1, 0.05);
        let state = one_level(level, &[0.5]);
        let mut state = with_camera(state, 0.5);
        let before = state.marker_value;
        let input = TickInput {
            pointer_x: Some(0.0),
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.marker_value, before);
    }

    #[test]
    fn test_landmark_failure_falls_back() {
        let level = LevelDef::new("C", "Camera", (0.0, 1.0), QuestionKind::Basic).questions(1, 0.05);
        let state = one_level(level, &[0.5]);
        let mut state = with_camera(state, 0.4);
        assert!(state.camera.landmark.request_load());
        state.landmark_loaded(Ok(LandmarkBackend::Local(Box::new(Broken))));
        assert!(state.camera.landmark.is_loaded());

        let input = TickInput {
            camera_frame: Some(CameraFrame::new(&[], 0, 0, 100.0)),
            ..Default::default()
        };
        tick(&mut state, &input, 0.06);

        assert!(state.camera.landmark.is_disabled());
        assert_eq!(state.camera.tracker, TrackerKind::Heuristic);
        assert!((state.camera.pointer.pos.x - 0.4).abs() < 1e-6);
        assert!(state.feedback.text.contains("Hand tracking paused"));
        assert_eq!(state.mode, GameMode::Playing);

        // Stays disabled even if another load result shows up
        state.landmark_loaded(Ok(LandmarkBackend::Host));
        assert!(state.camera.landmark.is_disabled());
    }

    #[test]
    fn test_landmark_load_failure_reports() {
        let mut state = GameState::new(3);
        assert!(state.camera.landmark.request_load());
        assert!(!state.camera.landmark.request_load());
        state.landmark_loaded(Err(CameraError::TrackerLoad("404".into())));
        assert!(state.camera.landmark.is_disabled());
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.feedback.kind, crate::sim::state::FeedbackKind::Warning);
    }

    #[test]
    fn test_determinism() {
        let run = |seed| {
            let mut state = GameState::new(seed);
            state.start_campaign_from_level(2).unwrap();
            advance_time(&mut state, 30_000.0);
            (
                state.questions.iter().map(|q| q.label.clone()).collect::<Vec<_>>(),
                state.lives,
                state.question_index,
                state.line_shift,
            )
        };
        assert_eq!(run(4242), run(4242));
    }
}
