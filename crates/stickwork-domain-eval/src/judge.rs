use crate::calibration::ClockCalibrator;
use crate::grading::{Grade, ScoreValues, TimingWindows};
use crate::matcher::{match_hit, MatchOutcome};
use crate::stats::SessionStats;
use crate::sweeper::expired_notes;
use crate::timeline::NoteTimeline;
use stickwork_domain_score::ExpectedNote;
use stickwork_ports::types::{Millis, NoteHandle, Tick};

#[derive(Clone, Copy, Debug, Default)]
pub struct JudgeConfig {
    pub windows: TimingWindows,
    pub values: ScoreValues,
}

#[derive(Clone, Debug, PartialEq)]
pub enum JudgeEvent {
    Hit {
        note_id: String,
        source: Option<NoteHandle>,
        grade: Grade,
        delta_ms: Millis,
        /// Resolved as a duplicate onset of another note.
        sibling: bool,
    },
    Miss {
        note_id: String,
        source: Option<NoteHandle>,
    },
    Extra {
        pitch: u8,
        hit_ms: Millis,
    },
    Stats(SessionStats),
}

#[derive(Clone, Copy, Debug)]
pub struct PlayerNoteOn {
    /// Position of the hit on the playback millisecond timeline.
    pub time_ms: Millis,
    pub note: u8,
    pub velocity: u8,
}

pub struct Judge {
    cfg: JudgeConfig,
    timeline: NoteTimeline,
    calibrator: ClockCalibrator,
    stats: SessionStats,
}

impl Judge {
    pub fn new(cfg: JudgeConfig) -> Self {
        Self {
            cfg,
            timeline: NoteTimeline::default(),
            calibrator: ClockCalibrator::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn set_config(&mut self, cfg: JudgeConfig) {
        self.cfg = cfg;
    }

    /// Replaces the timeline. Previous resolutions are discarded; calibration
    /// is kept because the score itself has not changed.
    pub fn load_notes(&mut self, notes: Vec<ExpectedNote>) {
        self.timeline = NoteTimeline::new(notes);
        self.stats = SessionStats::new(self.timeline.len() as u32);
    }

    /// Clears resolutions and counters for a new session. Returns the notes
    /// that carried a resolution so their recoloring can be undone.
    pub fn reset(&mut self) -> Vec<ExpectedNote> {
        self.stats = SessionStats::new(self.timeline.len() as u32);
        self.timeline.reset()
    }

    pub fn reset_calibration(&mut self) {
        self.calibrator.reset();
    }

    pub fn calibrate(&mut self, current_time_ms: Millis, current_tick: Tick) {
        if self.calibrator.observe(current_time_ms, current_tick) {
            log::trace!("calibration: {:?} ms/tick", self.calibrator.ms_per_tick());
        }
    }

    pub fn calibrator(&self) -> &ClockCalibrator {
        &self.calibrator
    }

    pub fn timeline(&self) -> &NoteTimeline {
        &self.timeline
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn on_note_on(&mut self, e: PlayerNoteOn) -> Vec<JudgeEvent> {
        let mut events = Vec::new();
        let outcome = match_hit(
            &self.timeline,
            &self.calibrator,
            &self.cfg.windows,
            e.note,
            e.time_ms,
        );

        match outcome {
            MatchOutcome::Extra => {
                log::debug!("extra note {} at {:.1}ms", e.note, e.time_ms);
                self.stats.record_extra(&self.cfg.values);
                events.push(JudgeEvent::Extra {
                    pitch: e.note,
                    hit_ms: e.time_ms,
                });
            }
            MatchOutcome::Matched(proposal) => {
                let resolved = std::iter::once((proposal.primary, false))
                    .chain(proposal.siblings.iter().map(|idx| (*idx, true)));
                for (idx, sibling) in resolved {
                    let Some(note) = self.timeline.resolve(idx, proposal.grade, e.time_ms) else {
                        continue;
                    };
                    log::debug!(
                        "{} {:?} ({:+.1}ms){}",
                        note.id,
                        proposal.grade,
                        proposal.delta_ms,
                        if sibling { " [duplicate onset]" } else { "" }
                    );
                    events.push(JudgeEvent::Hit {
                        note_id: note.id.clone(),
                        source: note.source,
                        grade: proposal.grade,
                        delta_ms: proposal.delta_ms,
                        sibling,
                    });
                    self.stats.record_hit(proposal.grade, &self.cfg.values);
                }
            }
        }

        events.push(self.stats_event());
        events
    }

    /// Finalizes every pending note whose window closed before `now_ms`.
    pub fn advance_to(&mut self, now_ms: Millis) -> Vec<JudgeEvent> {
        let mut events = Vec::new();
        let expired = expired_notes(&self.timeline, &self.calibrator, &self.cfg.windows, now_ms);
        for idx in expired {
            // A match may have landed since the scan; resolve() re-checks.
            let Some(note) = self.timeline.resolve(idx, Grade::Miss, now_ms) else {
                continue;
            };
            let event = JudgeEvent::Miss {
                note_id: note.id.clone(),
                source: note.source,
            };
            if !self.stats.record_miss(&self.cfg.values) {
                log::warn!("miss count already at bound, not counting {}", idx);
            }
            events.push(event);
        }

        if !events.is_empty() {
            events.push(self.stats_event());
        }
        events
    }

    fn stats_event(&self) -> JudgeEvent {
        JudgeEvent::Stats(self.stats.clone())
    }
}
