use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use stickwork_ports::storage::{SessionRecord, SettingsDto, StorageError, StoragePort};

/// On-disk layout of the score history.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScoresFile {
    next_id: u64,
    sessions: Vec<SessionRecord>,
}

/// JSON files under one directory: `settings.json` and `scores.json`.
pub struct FsStorage {
    base_dir: PathBuf,
    // serializes read-modify-write of scores.json
    scores_lock: Mutex<()>,
}

impl FsStorage {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            scores_lock: Mutex::new(()),
        }
    }

    pub fn default_base_dir() -> Result<PathBuf, StorageError> {
        let base = dirs_next::config_dir()
            .ok_or_else(|| StorageError::Io("config dir not found".to_string()))?;
        Ok(base.join("Stickwork"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn settings_path(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    fn scores_path(&self) -> PathBuf {
        self.base_dir.join("scores.json")
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
        let data = fs::read(path).map_err(|e| StorageError::Io(e.to_string()))?;
        serde_json::from_slice(&data).map_err(|e| StorageError::Serde(e.to_string()))
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        let data =
            serde_json::to_vec_pretty(value).map_err(|e| StorageError::Serde(e.to_string()))?;
        fs::write(path, data).map_err(|e| StorageError::Io(e.to_string()))
    }

    fn load_scores(&self) -> Result<ScoresFile, StorageError> {
        let path = self.scores_path();
        if !path.exists() {
            return Ok(ScoresFile::default());
        }
        Self::read_json(&path)
    }

    fn store_scores(&self, scores: &ScoresFile) -> Result<(), StorageError> {
        Self::write_json(&self.scores_path(), scores)
    }

    /// Newest first; ties on timestamp fall back to the later id.
    fn newest_first(mut sessions: Vec<SessionRecord>) -> Vec<SessionRecord> {
        sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        sessions
    }
}

impl Default for FsStorage {
    fn default() -> Self {
        let base_dir = Self::default_base_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(base_dir)
    }
}

impl StoragePort for FsStorage {
    fn load_settings(&self) -> Result<SettingsDto, StorageError> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(SettingsDto::default());
        }
        Self::read_json(&path)
    }

    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError> {
        let path = self.settings_path();
        Self::write_json(&path, s)
    }

    fn save_session(&self, record: &SessionRecord) -> Result<u64, StorageError> {
        let _guard = self.scores_lock.lock();
        let mut scores = self.load_scores()?;
        let highest = scores.sessions.iter().map(|s| s.id).max().unwrap_or(0);
        let id = scores.next_id.max(highest + 1);
        scores.next_id = id + 1;
        scores.sessions.push(SessionRecord {
            id,
            ..record.clone()
        });
        self.store_scores(&scores)?;
        log::info!("saved session {id} for {}", record.song_name);
        Ok(id)
    }

    fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, StorageError> {
        let _guard = self.scores_lock.lock();
        let scores = self.load_scores()?;
        let mut sessions = Self::newest_first(scores.sessions);
        sessions.truncate(limit);
        Ok(sessions)
    }

    fn sessions_for_song(&self, song_hash: &str) -> Result<Vec<SessionRecord>, StorageError> {
        let _guard = self.scores_lock.lock();
        let scores = self.load_scores()?;
        let matching = scores
            .sessions
            .into_iter()
            .filter(|s| s.song_hash == song_hash)
            .collect();
        Ok(Self::newest_first(matching))
    }

    fn delete_session(&self, id: u64) -> Result<(), StorageError> {
        let _guard = self.scores_lock.lock();
        let mut scores = self.load_scores()?;
        let before = scores.sessions.len();
        scores.sessions.retain(|s| s.id != id);
        if scores.sessions.len() == before {
            return Err(StorageError::NotFound(id));
        }
        self.store_scores(&scores)
    }

    fn clear_sessions(&self) -> Result<(), StorageError> {
        let _guard = self.scores_lock.lock();
        let mut scores = self.load_scores()?;
        scores.sessions.clear();
        self.store_scores(&scores)
    }
}
