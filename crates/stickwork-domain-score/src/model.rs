use stickwork_ports::types::Tick;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreMeta {
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// Read-only view of a loaded score, mirrored from the notation engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub meta: ScoreMeta,
    pub tracks: Vec<Track>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub index: u32,
    pub name: String,
    pub staves: Vec<Stave>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stave {
    pub is_percussion: bool,
    pub bars: Vec<Bar>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub voices: Vec<Voice>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub beats: Vec<Beat>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    /// Absolute playback start, shared by every note of the beat.
    pub playback_start: Tick,
    pub duration: Tick,
    pub notes: Vec<Note>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Percussion code of the note; zero or negative for rests and placeholders.
    pub real_value: i32,
}

impl Score {
    pub fn title(&self) -> &str {
        self.meta.title.as_deref().unwrap_or("Unknown Song")
    }
}
