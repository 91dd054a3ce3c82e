use pretty_assertions::assert_eq;
use stickwork_infra_storage_fs::FsStorage;
use stickwork_ports::storage::{GameMode, SessionRecord, SettingsDto, StorageError, StoragePort};

fn record(song_hash: &str, timestamp: u64, total_score: i64, accuracy: f64) -> SessionRecord {
    SessionRecord {
        id: 0,
        song_name: "Groove".to_string(),
        song_hash: song_hash.to_string(),
        timestamp,
        duration_ms: 60_000,
        game_mode: GameMode::Score,
        total_score,
        accuracy,
        stars: 3,
        total_notes: 10,
        hit_notes: 8,
        perfect_hits: 5,
        good_hits: 3,
        early_hits: 0,
        late_hits: 0,
        missed_notes: 2,
        extra_notes: 0,
        max_streak: 6,
        device: Some("Drum Pads".to_string()),
    }
}

fn storage() -> (tempfile::TempDir, FsStorage) {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = FsStorage::new(dir.path().join("store"));
    (dir, storage)
}

#[test]
fn missing_settings_fall_back_to_defaults() {
    let (_dir, storage) = storage();
    let settings = storage.load_settings().expect("settings");
    assert_eq!(settings.sweep_interval_ms, 50);
    assert_eq!(settings.timing_windows.perfect_ms, 50.0);
}

#[test]
fn settings_round_trip_and_partial_files() {
    let (_dir, storage) = storage();
    let mut settings = SettingsDto::default();
    settings.input_offset_ms = 25;
    storage.save_settings(&settings).expect("save");
    assert_eq!(storage.load_settings().expect("load").input_offset_ms, 25);

    std::fs::write(
        storage.base_dir().join("settings.json"),
        r#"{ "input_offset_ms": -8 }"#,
    )
    .expect("write");
    let loaded = storage.load_settings().expect("partial");
    assert_eq!(loaded.input_offset_ms, -8);
    assert_eq!(loaded.recent_scores_limit, 5);
}

#[test]
fn sessions_get_fresh_ids_and_list_newest_first() {
    let (_dir, storage) = storage();
    let first = storage.save_session(&record("a", 1_000, 500, 80.0)).expect("save");
    let second = storage.save_session(&record("b", 3_000, 700, 90.0)).expect("save");
    let third = storage.save_session(&record("a", 2_000, 900, 70.0)).expect("save");
    assert_eq!((first, second, third), (1, 2, 3));

    let recent = storage.recent_sessions(2).expect("recent");
    let ids: Vec<u64> = recent.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 3]);

    let for_song: Vec<u64> = storage
        .sessions_for_song("a")
        .expect("song")
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(for_song, vec![3, 1]);
}

#[test]
fn best_and_average_per_song() {
    let (_dir, storage) = storage();
    storage.save_session(&record("a", 1, 500, 80.0)).expect("save");
    storage.save_session(&record("a", 2, 900, 60.0)).expect("save");
    storage.save_session(&record("b", 3, 1_000, 100.0)).expect("save");

    let best = storage.best_session("a").expect("best").expect("some");
    assert_eq!(best.total_score, 900);
    assert_eq!(storage.average_accuracy("a").expect("avg"), Some(70.0));
    assert_eq!(storage.average_accuracy("missing").expect("avg"), None);
}

#[test]
fn delete_and_clear() {
    let (_dir, storage) = storage();
    let id = storage.save_session(&record("a", 1, 500, 80.0)).expect("save");
    storage.save_session(&record("a", 2, 600, 80.0)).expect("save");

    storage.delete_session(id).expect("delete");
    assert_eq!(storage.recent_sessions(10).expect("recent").len(), 1);
    assert!(matches!(
        storage.delete_session(id),
        Err(StorageError::NotFound(missing)) if missing == id
    ));

    storage.clear_sessions().expect("clear");
    assert!(storage.recent_sessions(10).expect("recent").is_empty());

    let next = storage.save_session(&record("a", 3, 700, 80.0)).expect("save");
    assert_eq!(next, 3);
}

#[test]
fn corrupt_history_is_a_serde_error() {
    let (_dir, storage) = storage();
    std::fs::create_dir_all(storage.base_dir()).expect("dir");
    std::fs::write(storage.base_dir().join("scores.json"), "not json").expect("write");

    assert!(matches!(
        storage.recent_sessions(5),
        Err(StorageError::Serde(_))
    ));
}
