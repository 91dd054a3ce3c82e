use crate::types::NoteHandle;
use serde::{Deserialize, Serialize};

/// Presentation signal for a resolved note; the color is the UI's choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteMark {
    Hit,
    Miss,
}

#[derive(thiserror::Error, Debug)]
pub enum HighlightError {
    #[error("note not found: {0}")]
    NotFound(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Fire-and-forget recolor requests against the notation engine.
///
/// Implementations look the note up on demand; callers only pass handles of
/// the currently loaded score.
pub trait NoteHighlightPort: Send + Sync {
    fn mark(&self, handle: NoteHandle, mark: NoteMark) -> Result<(), HighlightError>;
    fn clear(&self, handle: NoteHandle) -> Result<(), HighlightError>;
    fn request_render(&self);
}
