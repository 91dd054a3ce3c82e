use crate::model::Score;
use crate::percussion::{canonical_pitch, HIHAT_CLOSED, HIHAT_OPEN, KICK, SNARE};
use serde::{Deserialize, Serialize};
use stickwork_ports::types::{Millis, NoteHandle, NotePath, Tick};

pub const SYNTHETIC_NOTE_COUNT: usize = 10;
pub const SYNTHETIC_SPACING_MS: Millis = 1000.0;
const SYNTHETIC_PITCHES: [u8; 4] = [KICK, SNARE, HIHAT_CLOSED, HIHAT_OPEN];

/// Timeline position of an expected note in its native unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "camelCase")]
pub enum NoteStart {
    Tick(Tick),
    Millisecond(Millis),
}

impl NoteStart {
    fn sort_key(self) -> f64 {
        match self {
            NoteStart::Tick(tick) => tick as f64,
            NoteStart::Millisecond(ms) => ms,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpectedNote {
    pub id: String,
    pub pitch: u8,
    pub start: NoteStart,
    /// Engine note to recolor; synthetic notes have none.
    pub source: Option<NoteHandle>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extraction {
    pub notes: Vec<ExpectedNote>,
    /// True when the score yielded nothing and the evenly spaced fallback
    /// sequence was produced instead.
    pub synthetic: bool,
}

/// Walks the percussion staves of `score` and returns the expected notes in
/// ascending start order.
///
/// `visible_tracks` restricts the walk to tracks whose `index` is listed.
/// `generation` stamps every note handle so recolor requests made against a
/// later score can be told apart.
pub fn extract_expected_notes(
    score: &Score,
    visible_tracks: Option<&[u32]>,
    generation: u64,
) -> Extraction {
    let mut notes = Vec::new();

    for (track_idx, track) in score.tracks.iter().enumerate() {
        if let Some(visible) = visible_tracks {
            if !visible.contains(&track.index) {
                continue;
            }
        }
        for (stave_idx, stave) in track.staves.iter().enumerate() {
            if !stave.is_percussion {
                continue;
            }
            for (bar_idx, bar) in stave.bars.iter().enumerate() {
                for (voice_idx, voice) in bar.voices.iter().enumerate() {
                    for (beat_idx, beat) in voice.beats.iter().enumerate() {
                        for (note_idx, note) in beat.notes.iter().enumerate() {
                            if note.real_value <= 0 {
                                continue;
                            }
                            let path = NotePath {
                                track: track_idx,
                                stave: stave_idx,
                                bar: bar_idx,
                                voice: voice_idx,
                                beat: beat_idx,
                                note: note_idx,
                            };
                            let Some(pitch) = canonical_pitch(note.real_value) else {
                                log::debug!(
                                    "skipping note {path}: code {} outside MIDI range",
                                    note.real_value
                                );
                                continue;
                            };
                            notes.push(ExpectedNote {
                                id: path.to_string(),
                                pitch,
                                start: NoteStart::Tick(beat.playback_start),
                                source: Some(NoteHandle { generation, path }),
                            });
                        }
                    }
                }
            }
        }
    }

    if notes.is_empty() {
        log::warn!("no percussion notes in score, using synthetic sequence");
        return Extraction {
            notes: synthetic_notes(),
            synthetic: true,
        };
    }

    // Stable: equal starts keep discovery order.
    notes.sort_by(|a, b| a.start.sort_key().total_cmp(&b.start.sort_key()));
    log::info!("extracted {} expected notes", notes.len());
    Extraction {
        notes,
        synthetic: false,
    }
}

pub fn synthetic_notes() -> Vec<ExpectedNote> {
    (0..SYNTHETIC_NOTE_COUNT)
        .map(|i| ExpectedNote {
            id: format!("synthetic-{i}"),
            pitch: SYNTHETIC_PITCHES[i % SYNTHETIC_PITCHES.len()],
            start: NoteStart::Millisecond(i as Millis * SYNTHETIC_SPACING_MS),
            source: None,
        })
        .collect()
}
