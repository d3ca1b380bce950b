//! Fraction Explorer entry point
//!
//! The browser build is driven through `fraction_explorer::web`. Natively
//! this plays a headless campaign (marker placed on every target) and prints
//! the final diagnostic snapshot.
//!
//! Usage: `fraction-explorer [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() -> fraction_explorer::GameResult<()> {
    use fraction_explorer::Settings;
    use fraction_explorer::sim::{GameMode, GameState, SubmitSource, advance_time, catalog};
    use fraction_explorer::snapshot::render_game_to_text;

    env_logger::init();
    log::info!("Fraction Explorer (headless) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let seed = settings.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    });
    log::info!("Seed: {seed}");

    let mut state = GameState::with_levels(catalog(), &settings, seed)?;
    state.start_campaign();

    loop {
        match state.mode {
            GameMode::Playing => {
                let Some(target) = state.current_question().map(|q| q.value) else {
                    break;
                };
                state.set_marker_value(target);
                // Think time; keeps the drifting levels drifting
                advance_time(&mut state, 400.0);
                if state.mode == GameMode::Playing {
                    state.submit_guess(SubmitSource::Button);
                }
            }
            GameMode::LevelClear => state.begin_next_level(),
            GameMode::Menu | GameMode::GameComplete => break,
        }
    }

    log::info!("Finished in mode {} with {} points", state.mode.as_str(), state.score);
    println!("{}", render_game_to_text(&state)?);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is fraction_explorer::web::start, this is just to satisfy the compiler
}
