use serde::Serialize;
use std::fs;
use std::path::Path;
use stickwork_domain_eval::{NoteTimeline, Resolution, SessionStats};
use stickwork_domain_score::NoteStart;
use stickwork_ports::midi::MidiMessage;
use stickwork_ports::storage::{SettingsDto, StorageError};
use stickwork_ports::types::MidiInputDevice;

#[derive(Serialize)]
struct AppVersion {
    name: String,
    version: String,
}

#[derive(Serialize)]
struct RecentEvents<'a> {
    events: &'a [MidiMessage],
}

#[derive(Serialize)]
struct NoteSnapshot<'a> {
    id: &'a str,
    pitch: u8,
    start: NoteStart,
    resolution: Option<Resolution>,
}

#[derive(Serialize)]
struct TimelineSnapshot<'a> {
    ms_per_tick: Option<f64>,
    stats: &'a SessionStats,
    notes: Vec<NoteSnapshot<'a>>,
}

pub struct DiagnosticsInput<'a> {
    pub settings: &'a SettingsDto,
    pub midi_inputs: Vec<MidiInputDevice>,
    pub recent_events: &'a [MidiMessage],
    pub timeline: &'a NoteTimeline,
    pub ms_per_tick: Option<f64>,
    pub stats: &'a SessionStats,
}

pub fn export_diagnostics(dir: &Path, input: DiagnosticsInput<'_>) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(|e| StorageError::Io(e.to_string()))?;

    let app_version = AppVersion {
        name: "stickwork".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let timeline = TimelineSnapshot {
        ms_per_tick: input.ms_per_tick,
        stats: input.stats,
        notes: input
            .timeline
            .slots()
            .iter()
            .map(|slot| NoteSnapshot {
                id: &slot.note.id,
                pitch: slot.note.pitch,
                start: slot.note.start,
                resolution: slot.resolution(),
            })
            .collect(),
    };

    write_json(&dir.join("app_version.json"), &app_version)?;
    write_json(&dir.join("settings.json"), input.settings)?;
    write_json(&dir.join("midi_inputs.json"), &input.midi_inputs)?;
    write_json(
        &dir.join("recent_events.json"),
        &RecentEvents {
            events: input.recent_events,
        },
    )?;
    write_json(&dir.join("timeline.json"), &timeline)?;

    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let data = serde_json::to_vec_pretty(value).map_err(|e| StorageError::Serde(e.to_string()))?;
    fs::write(path, data).map_err(|e| StorageError::Io(e.to_string()))
}
