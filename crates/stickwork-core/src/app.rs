use crate::diagnostics::{export_diagnostics, DiagnosticsInput};
use crate::ipc::{Command, Event, NoticeLevel};
use crate::session::{Session, SessionSummary};
use parking_lot::Mutex;
use rtrb::{Consumer, RingBuffer};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use stickwork_domain_eval::{Grade, JudgeConfig, JudgeEvent, ScoreValues, TimingWindows};
use stickwork_domain_score::{extract_expected_notes, song_identity, Score, SongIdentity};
use stickwork_ports::highlight::{NoteHighlightPort, NoteMark};
use stickwork_ports::midi::{MidiError, MidiInputPort, MidiInputStream, MidiMessage, PlayerEvent};
use stickwork_ports::playback::{PlaybackError, PlaybackPort, PositionChanged};
use stickwork_ports::storage::{GameMode, SessionRecord, SettingsDto, StorageError, StoragePort};
use stickwork_ports::types::{DeviceId, Millis, NoteHandle};

const RECENT_INPUT_CAPACITY: usize = 20;
const RECENT_INPUT_EMIT_MS: Millis = 50.0;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("midi error: {0}")]
    Midi(#[from] MidiError),
    #[error("playback error: {0}")]
    Playback(#[from] PlaybackError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("no score loaded")]
    NoScore,
}

struct LoadedScore {
    score: Score,
    identity: Option<SongIdentity>,
}

pub struct GameCore {
    playback: Box<dyn PlaybackPort>,
    highlighter: Box<dyn NoteHighlightPort>,
    midi_port: Option<Box<dyn MidiInputPort>>,
    storage: Option<Box<dyn StoragePort>>,
    settings: SettingsDto,
    session: Session,
    loaded: Option<LoadedScore>,
    generation: u64,
    visible_tracks: Option<Vec<u32>>,
    events: VecDeque<Event>,
    recent_inputs: VecDeque<MidiMessage>,
    midi_stream: Option<Box<dyn MidiInputStream>>,
    midi_queue_rx: Option<Consumer<PlayerEvent>>,
    device_name: Option<String>,
    last_input_emit: Option<Millis>,
}

impl GameCore {
    pub fn new(
        playback: Box<dyn PlaybackPort>,
        highlighter: Box<dyn NoteHighlightPort>,
        midi_port: Option<Box<dyn MidiInputPort>>,
        storage: Option<Box<dyn StoragePort>>,
    ) -> Self {
        let settings = match storage.as_ref().map(|s| s.load_settings()) {
            Some(Ok(settings)) => settings,
            Some(Err(err)) => {
                log::warn!("settings not loaded, using defaults: {err}");
                SettingsDto::default()
            }
            None => SettingsDto::default(),
        };

        let mut session = Session::new(judge_config(&settings));
        session.set_input_offset_ms(settings.input_offset_ms as Millis);
        session.set_sweep_interval_ms(settings.sweep_interval_ms as Millis);

        Self {
            playback,
            highlighter,
            midi_port,
            storage,
            settings,
            session,
            loaded: None,
            generation: 0,
            visible_tracks: None,
            events: VecDeque::new(),
            recent_inputs: VecDeque::with_capacity(RECENT_INPUT_CAPACITY),
            midi_stream: None,
            midi_queue_rx: None,
            device_name: None,
            last_input_emit: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &SettingsDto {
        &self.settings
    }

    pub fn handle_command(&mut self, cmd: Command) -> Result<(), AppError> {
        match cmd {
            Command::ListMidiInputs => {
                let devices = match self.midi_port.as_ref() {
                    Some(port) => port.list_inputs()?,
                    None => Vec::new(),
                };
                self.events.push_back(Event::MidiInputsUpdated { devices });
            }
            Command::SelectMidiInput { device_id } => {
                self.open_midi_input(device_id)?;
            }
            Command::LoadScore { score } => {
                self.load_score(score);
            }
            Command::SetVisibleTracks { tracks } => {
                if self.session.state().is_active() {
                    self.notice(
                        NoticeLevel::Warning,
                        "visible tracks cannot change during a session".to_string(),
                    );
                    return Ok(());
                }
                self.visible_tracks = tracks;
                self.extract_notes();
            }
            Command::SetPracticeMode { enabled } => {
                if !self.session.set_practice(enabled) {
                    self.notice(
                        NoticeLevel::Warning,
                        "practice mode cannot change during a session".to_string(),
                    );
                }
                self.emit_session_state();
            }
            Command::StartGame { at_ms } => {
                self.start_game(at_ms)?;
            }
            Command::PauseGame { at_ms } => {
                if self.session.pause(at_ms) {
                    self.playback.pause()?;
                    self.emit_session_state();
                }
            }
            Command::ResumeGame { at_ms } => {
                if self.session.resume(at_ms) {
                    self.playback.play()?;
                    self.emit_session_state();
                }
            }
            Command::StopGame { at_ms } => {
                self.end_session(at_ms);
            }
            Command::SetTimingWindows { windows } => {
                self.settings.timing_windows = windows;
                self.session.set_judge_config(judge_config(&self.settings));
                self.save_settings();
                self.emit_session_state();
            }
            Command::SetScoreValues { values } => {
                self.settings.score_values = values;
                self.session.set_judge_config(judge_config(&self.settings));
                self.save_settings();
                self.emit_session_state();
            }
            Command::SetInputOffsetMs { ms } => {
                self.settings.input_offset_ms = ms;
                self.session.set_input_offset_ms(ms as Millis);
                self.save_settings();
            }
            Command::SetSweepIntervalMs { ms } => {
                self.settings.sweep_interval_ms = ms;
                self.session.set_sweep_interval_ms(ms as Millis);
                self.save_settings();
            }
            Command::LoadRecentScores => {
                self.refresh_recent_scores()?;
            }
            Command::DeleteScore { id } => {
                if let Some(storage) = self.storage.as_ref() {
                    storage.delete_session(id)?;
                }
                self.refresh_recent_scores()?;
            }
            Command::ClearScores => {
                if let Some(storage) = self.storage.as_ref() {
                    storage.clear_sessions()?;
                }
                self.refresh_recent_scores()?;
            }
            Command::ExportDiagnostics { path } => {
                let midi_inputs = match self.midi_port.as_ref() {
                    Some(port) => port.list_inputs()?,
                    None => Vec::new(),
                };
                let recent: Vec<MidiMessage> = self.recent_inputs.iter().copied().collect();
                let judge = self.session.judge();
                export_diagnostics(
                    Path::new(&path),
                    DiagnosticsInput {
                        settings: &self.settings,
                        midi_inputs,
                        recent_events: &recent,
                        timeline: judge.timeline(),
                        ms_per_tick: judge.calibrator().ms_per_tick(),
                        stats: judge.stats(),
                    },
                )?;
            }
        }
        Ok(())
    }

    /// Playback-clock position notification.
    pub fn on_position_changed(&mut self, pos: PositionChanged) {
        // queued hits are matched before the sweep can expire their notes
        self.process_midi_inputs();
        let judge_events = self.session.on_position(&pos);
        self.handle_judge_events(judge_events);
    }

    /// Feeds one input event directly, bypassing the device queue.
    pub fn push_player_event(&mut self, event: PlayerEvent) {
        self.record_recent_input(event.message);
        let judge_events = self.session.on_player_event(&event);
        self.handle_judge_events(judge_events);
    }

    /// Song reached its end: finalize like an explicit stop.
    pub fn on_playback_finished(&mut self, at_ms: Millis) {
        self.end_session(at_ms);
    }

    /// Timer entry point: drains device input, then re-evaluates pending notes.
    pub fn tick(&mut self, now_ms: Millis) {
        self.process_midi_inputs();
        let judge_events = self.session.on_timer(now_ms);
        self.handle_judge_events(judge_events);
        self.emit_recent_inputs(now_ms);
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    fn open_midi_input(&mut self, device_id: DeviceId) -> Result<(), AppError> {
        let Some(port) = self.midi_port.as_ref() else {
            return Err(MidiError::DeviceUnavailable("no midi backend".to_string()).into());
        };
        if let Some(stream) = self.midi_stream.take() {
            stream.close();
        }

        let (producer, consumer) = RingBuffer::new(2048);
        let producer = Arc::new(Mutex::new(producer));
        let cb = Arc::new(move |event: PlayerEvent| {
            if let Some(mut guard) = producer.try_lock() {
                let _ = guard.push(event);
            }
        });

        let stream = port.open_input(&device_id, cb)?;
        self.device_name = port
            .list_inputs()
            .ok()
            .and_then(|devices| devices.into_iter().find(|d| d.id == device_id))
            .map(|d| d.name);
        self.midi_stream = Some(stream);
        self.midi_queue_rx = Some(consumer);
        self.settings.selected_midi_in = Some(device_id);
        self.emit_session_state();
        self.save_settings();
        Ok(())
    }

    fn load_score(&mut self, score: Score) {
        if self.session.state().is_active() {
            if let Err(err) = self.playback.pause() {
                log::warn!("pause before score change failed: {err}");
            }
            self.session.abandon();
            self.emit_session_state();
        }

        self.generation += 1;
        self.session.reset_calibration();
        self.visible_tracks = None;
        let identity = match song_identity(&score) {
            Ok(identity) => Some(identity),
            Err(err) => {
                log::warn!("song identity unavailable: {err}");
                None
            }
        };
        self.loaded = Some(LoadedScore { score, identity });
        self.extract_notes();
    }

    fn extract_notes(&mut self) {
        let Some(loaded) = self.loaded.as_ref() else {
            return;
        };
        let extraction =
            extract_expected_notes(&loaded.score, self.visible_tracks.as_deref(), self.generation);

        let stale = self.marked_handles();
        self.clear_marks(stale);

        let total = extraction.notes.len();
        self.session.load_notes(extraction.notes);
        self.events.push_back(Event::NotesLoaded {
            total,
            synthetic: extraction.synthetic,
        });
        self.emit_stats();
    }

    fn start_game(&mut self, at_ms: Millis) -> Result<(), AppError> {
        if self.loaded.is_none() {
            return Err(AppError::NoScore);
        }
        let cleared: Vec<NoteHandle> = self
            .session
            .start(at_ms)
            .into_iter()
            .filter_map(|note| note.source)
            .collect();
        self.clear_marks(cleared);
        self.playback.play()?;
        self.emit_session_state();
        self.emit_stats();
        Ok(())
    }

    fn end_session(&mut self, at_ms: Millis) {
        let Some(summary) = self.session.end(at_ms) else {
            return;
        };
        if let Err(err) = self.playback.pause() {
            log::warn!("pause at session end failed: {err}");
        }
        let saved_id = self.persist(&summary);
        self.events.push_back(Event::SessionEnded {
            stats: summary.stats,
            duration_ms: summary.duration_ms,
            saved_id,
        });
        self.emit_session_state();
    }

    fn persist(&mut self, summary: &SessionSummary) -> Option<u64> {
        if summary.practice || summary.stats.resolved() == 0 {
            return None;
        }
        let storage = self.storage.as_ref()?;
        let (song_name, song_hash) = match self.loaded.as_ref() {
            Some(LoadedScore {
                identity: Some(identity),
                ..
            }) => (identity.name.clone(), identity.hash.clone()),
            Some(loaded) => (loaded.score.title().to_string(), String::new()),
            None => return None,
        };

        let stats = &summary.stats;
        let record = SessionRecord {
            id: 0,
            song_name,
            song_hash,
            timestamp: epoch_millis(),
            duration_ms: summary.duration_ms,
            game_mode: GameMode::Score,
            total_score: stats.score,
            accuracy: stats.accuracy,
            stars: stats.stars,
            total_notes: stats.total_notes,
            hit_notes: stats.hit_notes,
            perfect_hits: stats.perfect_hits,
            good_hits: stats.good_hits,
            early_hits: stats.early_hits,
            late_hits: stats.late_hits,
            missed_notes: stats.missed_notes,
            extra_notes: stats.extra_notes,
            max_streak: stats.max_streak,
            device: self.device_name.clone(),
        };

        match storage.save_session(&record) {
            Ok(id) => {
                self.notice(
                    NoticeLevel::Info,
                    format!(
                        "score saved: {:.1}% accuracy, {} stars",
                        stats.accuracy, stats.stars
                    ),
                );
                if let Err(err) = self.refresh_recent_scores() {
                    log::warn!("recent scores not refreshed: {err}");
                }
                Some(id)
            }
            Err(err) => {
                log::warn!("failed to save score: {err}");
                self.notice(
                    NoticeLevel::Warning,
                    "score could not be saved to storage".to_string(),
                );
                None
            }
        }
    }

    fn refresh_recent_scores(&mut self) -> Result<(), AppError> {
        let Some(storage) = self.storage.as_ref() else {
            return Ok(());
        };
        let records = storage.recent_sessions(self.settings.recent_scores_limit)?;
        self.events.push_back(Event::RecentScoresUpdated { records });
        Ok(())
    }

    fn process_midi_inputs(&mut self) {
        let Some(mut consumer) = self.midi_queue_rx.take() else {
            return;
        };

        let mut pending = Vec::new();
        while let Ok(event) = consumer.pop() {
            pending.push(event);
        }
        self.midi_queue_rx = Some(consumer);

        for event in pending {
            self.push_player_event(event);
        }
    }

    fn handle_judge_events(&mut self, judge_events: Vec<JudgeEvent>) {
        let mut marked = false;
        for event in judge_events {
            match event {
                JudgeEvent::Hit {
                    note_id,
                    source,
                    grade,
                    delta_ms,
                    ..
                } => {
                    if let Some(handle) = source {
                        marked |= self.mark(handle, NoteMark::Hit);
                    }
                    self.events.push_back(Event::NoteResolved {
                        note_id,
                        grade,
                        delta_ms: Some(delta_ms),
                    });
                }
                JudgeEvent::Miss { note_id, source } => {
                    if let Some(handle) = source {
                        marked |= self.mark(handle, NoteMark::Miss);
                    }
                    self.events.push_back(Event::NoteResolved {
                        note_id,
                        grade: Grade::Miss,
                        delta_ms: None,
                    });
                }
                JudgeEvent::Extra { pitch, hit_ms } => {
                    self.events.push_back(Event::ExtraNote { pitch, hit_ms });
                }
                JudgeEvent::Stats(stats) => {
                    self.events.push_back(Event::StatsUpdated {
                        stats,
                        progress: self.session.progress(),
                    });
                }
            }
        }
        if marked {
            self.highlighter.request_render();
        }
    }

    fn mark(&self, handle: NoteHandle, mark: NoteMark) -> bool {
        if handle.generation != self.generation {
            log::debug!("skipping stale note handle {}", handle.path);
            return false;
        }
        match self.highlighter.mark(handle, mark) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("recolor failed for {}: {err}", handle.path);
                false
            }
        }
    }

    fn marked_handles(&self) -> Vec<NoteHandle> {
        self.session
            .judge()
            .timeline()
            .slots()
            .iter()
            .filter(|slot| slot.is_resolved())
            .filter_map(|slot| slot.note.source)
            .collect()
    }

    fn clear_marks(&self, handles: Vec<NoteHandle>) {
        let current: Vec<NoteHandle> = handles
            .into_iter()
            .filter(|handle| handle.generation == self.generation)
            .collect();
        if current.is_empty() {
            return;
        }
        for handle in current {
            if let Err(err) = self.highlighter.clear(handle) {
                log::debug!("clear failed for {}: {err}", handle.path);
            }
        }
        self.highlighter.request_render();
    }

    fn record_recent_input(&mut self, message: MidiMessage) {
        if self.recent_inputs.len() >= RECENT_INPUT_CAPACITY {
            self.recent_inputs.pop_front();
        }
        self.recent_inputs.push_back(message);
    }

    fn emit_recent_inputs(&mut self, now_ms: Millis) {
        if self
            .last_input_emit
            .is_some_and(|last| now_ms - last < RECENT_INPUT_EMIT_MS)
        {
            return;
        }
        if !self.recent_inputs.is_empty() {
            self.events.push_back(Event::RecentInputEvents {
                events: self.recent_inputs.iter().copied().collect(),
            });
        }
        self.last_input_emit = Some(now_ms);
    }

    fn emit_stats(&mut self) {
        self.events.push_back(Event::StatsUpdated {
            stats: self.session.stats().clone(),
            progress: self.session.progress(),
        });
    }

    fn emit_session_state(&mut self) {
        self.events.push_back(Event::SessionStateUpdated {
            state: self.session.state(),
            practice: self.session.is_practice(),
            settings: self.settings.clone(),
        });
    }

    fn notice(&mut self, level: NoticeLevel, message: String) {
        self.events.push_back(Event::Notice { level, message });
    }

    fn save_settings(&self) {
        if let Some(storage) = self.storage.as_ref() {
            if let Err(err) = storage.save_settings(&self.settings) {
                log::warn!("settings not saved: {err}");
            }
        }
    }
}

pub fn judge_config(settings: &SettingsDto) -> JudgeConfig {
    JudgeConfig {
        windows: TimingWindows::from(settings.timing_windows),
        values: ScoreValues::from(settings.score_values),
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

