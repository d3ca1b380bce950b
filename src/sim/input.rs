//! Keyboard commands
//!
//! Keys are mapped to commands once, so hosts only forward key names.

use super::state::{GameMode, GameState, InputMode, SubmitSource};
use crate::camera::CameraDevice;

/// A keyboard intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Start the campaign at this level (0-based)
    SelectLevel(usize),
    Menu,
    ToggleCamera,
    /// Move the marker by this many steps
    Nudge(i32),
    /// Start / advance / submit depending on the mode
    Confirm,
    /// Continue after a cleared level or completed campaign
    Advance,
}

impl KeyCommand {
    /// Map a DOM-style key name. Digits only select levels that exist.
    pub fn from_key(key: &str, level_count: usize) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        match key.as_str() {
            "c" => Some(KeyCommand::ToggleCamera),
            "0" | "r" => Some(KeyCommand::Menu),
            "n" => Some(KeyCommand::Advance),
            " " | "space" | "enter" => Some(KeyCommand::Confirm),
            "arrowleft" => Some(KeyCommand::Nudge(-1)),
            "arrowright" => Some(KeyCommand::Nudge(1)),
            "arrowup" => Some(KeyCommand::Nudge(2)),
            "arrowdown" => Some(KeyCommand::Nudge(-2)),
            _ => {
                let digit = key.parse::<usize>().ok().filter(|d| (1..=9).contains(d))?;
                (digit <= level_count).then_some(KeyCommand::SelectLevel(digit - 1))
            }
        }
    }
}

impl GameState {
    /// Apply a keyboard command. Returns the input mode after the command.
    pub fn apply_key(&mut self, command: KeyCommand, device: &mut dyn CameraDevice) -> InputMode {
        match command {
            KeyCommand::ToggleCamera => return self.toggle_camera_mode(device),
            KeyCommand::SelectLevel(index) => {
                if let Err(err) = self.start_campaign_from_level(index) {
                    log::warn!("Ignoring level shortcut: {err}");
                }
            }
            KeyCommand::Menu => self.return_to_menu(),
            KeyCommand::Advance => self.begin_next_level(),
            KeyCommand::Nudge(steps) => self.nudge_marker(steps),
            KeyCommand::Confirm => match self.mode {
                GameMode::Menu => self.start_campaign(),
                GameMode::LevelClear | GameMode::GameComplete => self.begin_next_level(),
                GameMode::Playing => {
                    self.submit_guess(SubmitSource::Keyboard);
                }
            },
        }
        self.input_mode
    }
}
