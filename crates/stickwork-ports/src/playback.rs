use crate::types::*;
use serde::{Deserialize, Serialize};

/// Playback-clock position notification.
///
/// `at_ms` is the wall time the notification was observed, on the same clock
/// as [`crate::midi::PlayerEvent::timestamp_ms`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionChanged {
    pub at_ms: Millis,
    pub current_time_ms: Millis,
    pub current_tick: Tick,
}

#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    #[error("no score loaded")]
    NoScore,
    #[error("backend error: {0}")]
    Backend(String),
}

pub trait PlaybackPort: Send + Sync {
    fn play(&self) -> Result<(), PlaybackError>;
    fn pause(&self) -> Result<(), PlaybackError>;
    fn stop(&self) -> Result<(), PlaybackError>;
    fn is_playing(&self) -> bool;
}
