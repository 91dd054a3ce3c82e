use serde::{Deserialize, Serialize};
use stickwork_domain_eval::{Grade, SessionStats};
use stickwork_domain_score::Score;
use stickwork_ports::midi::MidiMessage;
use stickwork_ports::storage::{ScoreValuesDto, SessionRecord, SettingsDto, TimingWindowsDto};
use stickwork_ports::types::{DeviceId, MidiInputDevice, Millis};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    ListMidiInputs,
    SelectMidiInput { device_id: DeviceId },
    LoadScore { score: Score },
    SetVisibleTracks { tracks: Option<Vec<u32>> },
    SetPracticeMode { enabled: bool },
    StartGame { at_ms: Millis },
    PauseGame { at_ms: Millis },
    ResumeGame { at_ms: Millis },
    StopGame { at_ms: Millis },
    SetTimingWindows { windows: TimingWindowsDto },
    SetScoreValues { values: ScoreValuesDto },
    SetInputOffsetMs { ms: i32 },
    SetSweepIntervalMs { ms: u32 },
    LoadRecentScores,
    DeleteScore { id: u64 },
    ClearScores,
    ExportDiagnostics { path: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Playing,
    Paused,
    Ended,
}

impl SessionState {
    /// Results stay visible while a session is running or paused.
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Playing | SessionState::Paused)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Warning,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    MidiInputsUpdated {
        devices: Vec<MidiInputDevice>,
    },
    SessionStateUpdated {
        state: SessionState,
        practice: bool,
        settings: SettingsDto,
    },
    NotesLoaded {
        total: usize,
        synthetic: bool,
    },
    NoteResolved {
        note_id: String,
        grade: Grade,
        delta_ms: Option<Millis>,
    },
    ExtraNote {
        pitch: u8,
        hit_ms: Millis,
    },
    StatsUpdated {
        stats: SessionStats,
        progress: f64,
    },
    SessionEnded {
        stats: SessionStats,
        duration_ms: u64,
        saved_id: Option<u64>,
    },
    RecentScoresUpdated {
        records: Vec<SessionRecord>,
    },
    RecentInputEvents {
        events: Vec<MidiMessage>,
    },
    Notice {
        level: NoticeLevel,
        message: String,
    },
}
