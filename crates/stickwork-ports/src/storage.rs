use crate::types::*;
use serde::{Deserialize, Serialize};

fn default_sweep_interval_ms() -> u32 {
    50
}

fn default_recent_scores_limit() -> usize {
    5
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("record not found: {0}")]
    NotFound(u64),
}

/// Acceptance bands around an expected note, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingWindowsDto {
    pub perfect_ms: Millis,
    pub good_ms: Millis,
    pub early_ms: Millis,
    pub late_ms: Millis,
}

impl Default for TimingWindowsDto {
    fn default() -> Self {
        Self {
            perfect_ms: 50.0,
            good_ms: 100.0,
            early_ms: 150.0,
            late_ms: 150.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreValuesDto {
    pub perfect: i64,
    pub good: i64,
    pub early: i64,
    pub late: i64,
    pub miss: i64,
    pub extra: i64,
    pub score_floor: Option<i64>,
}

impl Default for ScoreValuesDto {
    fn default() -> Self {
        Self {
            perfect: 100,
            good: 75,
            early: 50,
            late: 50,
            miss: 0,
            extra: -25,
            score_floor: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDto {
    pub selected_midi_in: Option<DeviceId>,
    pub input_offset_ms: i32,
    pub timing_windows: TimingWindowsDto,
    pub score_values: ScoreValuesDto,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u32,
    #[serde(default = "default_recent_scores_limit")]
    pub recent_scores_limit: usize,
}

impl Default for SettingsDto {
    fn default() -> Self {
        Self {
            selected_midi_in: None,
            input_offset_ms: 0,
            timing_windows: TimingWindowsDto::default(),
            score_values: ScoreValuesDto::default(),
            sweep_interval_ms: default_sweep_interval_ms(),
            recent_scores_limit: default_recent_scores_limit(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameMode {
    Practice,
    Score,
}

/// Finalized result of one session, as written to the history store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Assigned by the store on save; ignored on input.
    pub id: u64,
    pub song_name: String,
    pub song_hash: String,
    pub timestamp: u64,
    pub duration_ms: u64,
    pub game_mode: GameMode,
    pub total_score: i64,
    pub accuracy: f64,
    pub stars: u8,
    pub total_notes: u32,
    pub hit_notes: u32,
    pub perfect_hits: u32,
    pub good_hits: u32,
    pub early_hits: u32,
    pub late_hits: u32,
    pub missed_notes: u32,
    pub extra_notes: u32,
    pub max_streak: u32,
    pub device: Option<String>,
}

pub trait StoragePort: Send + Sync {
    fn load_settings(&self) -> Result<SettingsDto, StorageError>;
    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError>;

    /// Stores the record under a fresh id and returns that id.
    fn save_session(&self, record: &SessionRecord) -> Result<u64, StorageError>;
    /// Newest first.
    fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, StorageError>;
    /// Newest first.
    fn sessions_for_song(&self, song_hash: &str) -> Result<Vec<SessionRecord>, StorageError>;
    fn delete_session(&self, id: u64) -> Result<(), StorageError>;
    fn clear_sessions(&self) -> Result<(), StorageError>;

    /// Highest total score recorded for a song.
    fn best_session(&self, song_hash: &str) -> Result<Option<SessionRecord>, StorageError> {
        let sessions = self.sessions_for_song(song_hash)?;
        Ok(sessions.into_iter().reduce(|best, candidate| {
            if candidate.total_score > best.total_score {
                candidate
            } else {
                best
            }
        }))
    }

    fn average_accuracy(&self, song_hash: &str) -> Result<Option<f64>, StorageError> {
        let sessions = self.sessions_for_song(song_hash)?;
        if sessions.is_empty() {
            return Ok(None);
        }
        let total: f64 = sessions.iter().map(|s| s.accuracy).sum();
        Ok(Some(total / sessions.len() as f64))
    }
}
