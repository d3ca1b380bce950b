//! Error types for the game core.

/// Errors raised while building a game or loading its configuration.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// A game needs at least one level.
    #[error("level catalog is empty")]
    EmptyCatalog,

    /// A level definition cannot be played.
    #[error("invalid level '{id}': {reason}")]
    InvalidLevel { id: String, reason: String },

    /// A level index outside the catalog was requested.
    #[error("level index {index} out of range (catalog has {count} levels)")]
    LevelOutOfRange { index: usize, count: usize },

    /// Settings failed validation.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings JSON could not be parsed.
    #[error("settings parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file could not be read.
    #[error("settings read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for game operations.
pub type GameResult<T> = Result<T, GameError>;

/// Recoverable camera and tracker failures.
///
/// None of these stop the game: they become feedback messages and the
/// pointer / heuristic tracker path keeps working.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CameraError {
    /// The host has no media-capture facility.
    #[error("camera API is not available")]
    Unavailable,

    /// The user or the environment refused the stream.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    /// The optional landmark tracker could not be loaded.
    #[error("hand tracker failed to load: {0}")]
    TrackerLoad(String),

    /// A landmark inference call was rejected.
    #[error("hand tracker inference failed: {0}")]
    Inference(String),

    /// A sampled frame does not match the tracker's buffer size.
    #[error("camera frame has {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },
}
