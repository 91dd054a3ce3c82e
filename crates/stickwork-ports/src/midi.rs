use crate::types::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MidiMessageKind {
    NoteOn,
    NoteOff,
    ControlChange,
    Unknown,
}

/// Parsed channel message. `note`/`velocity` are absent when the raw
/// message was too short to carry them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiMessage {
    pub kind: MidiMessageKind,
    pub note: Option<u8>,
    pub velocity: Option<u8>,
    pub channel: u8,
}

impl MidiMessage {
    pub fn note_on(note: u8, velocity: u8) -> Self {
        Self {
            kind: MidiMessageKind::NoteOn,
            note: Some(note),
            velocity: Some(velocity),
            channel: 9,
        }
    }

    /// Pitch of a well-formed note-on, `None` for anything else.
    pub fn struck_note(&self) -> Option<u8> {
        match self.kind {
            MidiMessageKind::NoteOn => self.note,
            _ => None,
        }
    }
}

/// Input message tagged with its receipt time, in the same wall clock the
/// playback position notifications use. `id` increases monotonically per
/// delivered message.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerEvent {
    pub id: u64,
    pub timestamp_ms: Millis,
    pub message: MidiMessage,
}

#[derive(thiserror::Error, Debug)]
pub enum MidiError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// MIDI input stream handle: drop closes it.
pub trait MidiInputStream: Send {
    fn close(self: Box<Self>);
}

pub type PlayerEventCallback = Arc<dyn Fn(PlayerEvent) + Send + Sync + 'static>;

pub trait MidiInputPort: Send + Sync {
    fn list_inputs(&self) -> Result<Vec<MidiInputDevice>, MidiError>;

    /// Open input stream: implementation should invoke cb from a background thread/callback.
    fn open_input(
        &self,
        device_id: &DeviceId,
        cb: PlayerEventCallback,
    ) -> Result<Box<dyn MidiInputStream>, MidiError>;
}
