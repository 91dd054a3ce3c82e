use crate::clock::PlaybackClock;
use crate::ipc::SessionState;
use stickwork_domain_eval::{Judge, JudgeConfig, JudgeEvent, PlayerNoteOn, SessionStats};
use stickwork_domain_score::{canonical_pitch, ExpectedNote};
use stickwork_ports::midi::PlayerEvent;
use stickwork_ports::playback::PositionChanged;
use stickwork_ports::types::Millis;

#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub stats: SessionStats,
    pub duration_ms: u64,
    pub practice: bool,
}

/// One play-through: owns the note timeline (through the judge), the
/// playback projection, and the idle → playing ⇄ paused → ended state
/// machine. Every input source funnels through here.
pub struct Session {
    state: SessionState,
    practice: bool,
    judge: Judge,
    clock: PlaybackClock,
    started_at_ms: Millis,
    last_event_id: Option<u64>,
    last_sweep_ms: Option<Millis>,
    input_offset_ms: Millis,
    sweep_interval_ms: Millis,
}

impl Session {
    pub fn new(cfg: JudgeConfig) -> Self {
        Self {
            state: SessionState::Idle,
            practice: false,
            judge: Judge::new(cfg),
            clock: PlaybackClock::new(),
            started_at_ms: 0.0,
            last_event_id: None,
            last_sweep_ms: None,
            input_offset_ms: 0.0,
            sweep_interval_ms: 50.0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_practice(&self) -> bool {
        self.practice
    }

    pub fn judge(&self) -> &Judge {
        &self.judge
    }

    pub fn stats(&self) -> &SessionStats {
        self.judge.stats()
    }

    /// Practice mode is fixed for the duration of a running session.
    pub fn set_practice(&mut self, enabled: bool) -> bool {
        if self.state.is_active() {
            return false;
        }
        self.practice = enabled;
        true
    }

    pub fn set_judge_config(&mut self, cfg: JudgeConfig) {
        self.judge.set_config(cfg);
    }

    pub fn set_input_offset_ms(&mut self, ms: Millis) {
        self.input_offset_ms = ms;
    }

    pub fn set_sweep_interval_ms(&mut self, ms: Millis) {
        self.sweep_interval_ms = ms.max(1.0);
    }

    /// Installs a freshly extracted timeline, replacing all resolution state.
    pub fn load_notes(&mut self, notes: Vec<ExpectedNote>) {
        self.judge.load_notes(notes);
    }

    /// A different score invalidates the tick rate.
    pub fn reset_calibration(&mut self) {
        self.judge.reset_calibration();
    }

    /// Begins a new session. Returns the notes whose previous resolution was
    /// cleared, for the caller to undo their recoloring.
    pub fn start(&mut self, at_ms: Millis) -> Vec<ExpectedNote> {
        let cleared = self.judge.reset();
        self.clock.start(at_ms);
        self.started_at_ms = at_ms;
        self.last_sweep_ms = None;
        self.state = SessionState::Playing;
        log::info!(
            "session started ({} notes, practice={})",
            self.judge.timeline().len(),
            self.practice
        );
        cleared
    }

    /// Drops a running session without producing a result, e.g. when the
    /// score it was playing is replaced.
    pub fn abandon(&mut self) {
        if self.state.is_active() {
            log::info!("session abandoned");
        }
        self.clock.stop();
        self.state = SessionState::Idle;
    }

    pub fn pause(&mut self, at_ms: Millis) -> bool {
        if self.state != SessionState::Playing {
            return false;
        }
        self.clock.pause(at_ms);
        self.state = SessionState::Paused;
        true
    }

    pub fn resume(&mut self, at_ms: Millis) -> bool {
        if self.state != SessionState::Paused {
            return false;
        }
        self.clock.resume(at_ms);
        self.last_sweep_ms = None;
        self.state = SessionState::Playing;
        true
    }

    pub fn end(&mut self, at_ms: Millis) -> Option<SessionSummary> {
        if !self.state.is_active() {
            return None;
        }
        self.clock.stop();
        self.state = SessionState::Ended;
        let summary = SessionSummary {
            stats: self.judge.stats().clone(),
            duration_ms: (at_ms - self.started_at_ms).max(0.0).round() as u64,
            practice: self.practice,
        };
        log::info!(
            "session ended: score={} accuracy={:.1}% stars={}",
            summary.stats.score,
            summary.stats.accuracy,
            summary.stats.stars
        );
        Some(summary)
    }

    /// Calibrates from every notification, and sweeps against the reported
    /// playback time while playing.
    pub fn on_position(&mut self, pos: &PositionChanged) -> Vec<JudgeEvent> {
        self.judge.calibrate(pos.current_time_ms, pos.current_tick);
        self.clock.observe(pos);
        if self.state != SessionState::Playing {
            return Vec::new();
        }
        self.last_sweep_ms = Some(pos.at_ms);
        self.judge.advance_to(pos.current_time_ms)
    }

    /// Events arriving outside the playing state are dropped, not queued.
    pub fn on_player_event(&mut self, event: &PlayerEvent) -> Vec<JudgeEvent> {
        if self.state != SessionState::Playing {
            return Vec::new();
        }
        if self.last_event_id.is_some_and(|last| event.id <= last) {
            log::trace!("duplicate input event {}", event.id);
            return Vec::new();
        }
        self.last_event_id = Some(event.id);

        let Some(struck) = event.message.struck_note() else {
            return Vec::new();
        };
        // kit variants fold the same way notated codes do
        let note = canonical_pitch(struck as i32).unwrap_or(struck);
        let time_ms = self.clock.project(event.timestamp_ms) + self.input_offset_ms;
        self.judge.on_note_on(PlayerNoteOn {
            time_ms,
            note,
            velocity: event.message.velocity.unwrap_or(0),
        })
    }

    /// Periodic re-evaluation between position notifications.
    pub fn on_timer(&mut self, now_ms: Millis) -> Vec<JudgeEvent> {
        if self.state != SessionState::Playing {
            return Vec::new();
        }
        if self
            .last_sweep_ms
            .is_some_and(|last| now_ms - last < self.sweep_interval_ms)
        {
            return Vec::new();
        }
        self.last_sweep_ms = Some(now_ms);
        let playback_ms = self.clock.project(now_ms);
        self.judge.advance_to(playback_ms)
    }

    pub fn progress(&self) -> f64 {
        let stats = self.judge.stats();
        if stats.total_notes == 0 {
            return 0.0;
        }
        stats.resolved() as f64 / stats.total_notes as f64
    }
}
