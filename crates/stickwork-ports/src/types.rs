use serde::{Deserialize, Serialize};
use std::fmt;

pub type Tick = i64; // notation engine timeline unit, monotonic in score
pub type Millis = f64; // sub-millisecond precision, as delivered by MIDI timestamps

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MidiInputDevice {
    pub id: DeviceId,
    pub name: String,
    pub manufacturer: String,
    pub is_available: bool,
}

/// Structural position of a note inside the score tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotePath {
    pub track: usize,
    pub stave: usize,
    pub bar: usize,
    pub voice: usize,
    pub beat: usize,
    pub note: usize,
}

/// Opaque back-reference to an engine-owned note.
///
/// The generation ties the handle to one loaded score: once a new score is
/// loaded every older handle is stale and must be rejected, never resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteHandle {
    pub generation: u64,
    pub path: NotePath,
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}-{}",
            self.track, self.stave, self.bar, self.voice, self.beat, self.note
        )
    }
}
