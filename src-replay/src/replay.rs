use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use stickwork_core::{AppError, Command, Event, GameCore};
use stickwork_domain_eval::{Grade, SessionStats};
use stickwork_domain_score::{Beat, Score};
use stickwork_ports::highlight::{HighlightError, NoteHighlightPort, NoteMark};
use stickwork_ports::midi::{MidiMessage, PlayerEvent};
use stickwork_ports::playback::{PlaybackError, PlaybackPort, PositionChanged};
use stickwork_ports::storage::StoragePort;
use stickwork_ports::types::{Millis, NoteHandle, Tick};

/// 120 BPM at 960 ticks per quarter note.
pub const DEFAULT_MS_PER_TICK: f64 = 500.0 / 960.0;
const POSITION_STEP_MS: Millis = 50.0;
const CALIBRATION_TICKS: Tick = 960;
const TAIL_MS: Millis = 500.0;

#[derive(thiserror::Error, Debug)]
pub enum ReplayError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error("session did not produce a result")]
    NoResult,
}

/// One line of a recorded hit log.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedHit {
    pub timestamp_ms: Millis,
    pub note: u8,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

fn default_velocity() -> u8 {
    100
}

#[derive(Clone, Copy, Debug)]
pub struct ReplayOptions {
    pub practice: bool,
    pub ms_per_tick: f64,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            practice: false,
            ms_per_tick: DEFAULT_MS_PER_TICK,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedNote {
    pub note_id: String,
    pub grade: Grade,
    pub delta_ms: Option<Millis>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutcome {
    pub song: String,
    pub synthetic: bool,
    pub stats: SessionStats,
    pub duration_ms: u64,
    pub saved_id: Option<u64>,
    pub notes: Vec<ResolvedNote>,
}

#[derive(Default)]
struct NullPlayback {
    playing: AtomicBool,
}

impl PlaybackPort for NullPlayback {
    fn play(&self) -> Result<(), PlaybackError> {
        self.playing.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn pause(&self) -> Result<(), PlaybackError> {
        self.playing.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn stop(&self) -> Result<(), PlaybackError> {
        self.pause()
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

struct LogHighlighter;

impl NoteHighlightPort for LogHighlighter {
    fn mark(&self, handle: NoteHandle, mark: NoteMark) -> Result<(), HighlightError> {
        log::debug!("mark {} as {:?}", handle.path, mark);
        Ok(())
    }

    fn clear(&self, handle: NoteHandle) -> Result<(), HighlightError> {
        log::debug!("clear {}", handle.path);
        Ok(())
    }

    fn request_render(&self) {}
}

/// Plays `hits` against `score` with wall time equal to playback time,
/// emitting position notifications every [`POSITION_STEP_MS`].
pub fn replay(
    score: Score,
    mut hits: Vec<RecordedHit>,
    storage: Option<Box<dyn StoragePort>>,
    opts: ReplayOptions,
) -> Result<ReplayOutcome, ReplayError> {
    hits.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
    let end_ms = score_end_ms(&score, opts.ms_per_tick)
        .max(hits.last().map_or(0.0, |h| h.timestamp_ms))
        + TAIL_MS;
    let song = score.title().to_string();

    let mut core = GameCore::new(
        Box::new(NullPlayback::default()),
        Box::new(LogHighlighter),
        None,
        storage,
    );
    let mut collector = Collector::default();

    core.handle_command(Command::SetPracticeMode {
        enabled: opts.practice,
    })?;
    core.handle_command(Command::LoadScore { score })?;
    // an idle notification only calibrates, so the first hits already see a rate
    core.on_position_changed(PositionChanged {
        at_ms: 0.0,
        current_time_ms: CALIBRATION_TICKS as Millis * opts.ms_per_tick,
        current_tick: CALIBRATION_TICKS,
    });
    core.handle_command(Command::StartGame { at_ms: 0.0 })?;
    collector.absorb(core.drain_events());

    let mut pending = hits.into_iter().peekable();
    let mut next_id = 1;
    let mut now = 0.0;
    while now <= end_ms {
        // hits first: the position notification sweeps up to `now`
        while let Some(hit) = pending.next_if(|h| h.timestamp_ms <= now) {
            core.push_player_event(PlayerEvent {
                id: next_id,
                timestamp_ms: hit.timestamp_ms,
                message: MidiMessage::note_on(hit.note, hit.velocity),
            });
            next_id += 1;
        }
        core.on_position_changed(PositionChanged {
            at_ms: now,
            current_time_ms: now,
            current_tick: (now / opts.ms_per_tick).round() as Tick,
        });
        core.tick(now);
        collector.absorb(core.drain_events());
        now += POSITION_STEP_MS;
    }

    core.on_playback_finished(end_ms);
    collector.absorb(core.drain_events());

    let (stats, duration_ms, saved_id) = collector.ended.ok_or(ReplayError::NoResult)?;
    Ok(ReplayOutcome {
        song,
        synthetic: collector.synthetic,
        stats,
        duration_ms,
        saved_id,
        notes: collector.notes,
    })
}

#[derive(Default)]
struct Collector {
    synthetic: bool,
    notes: Vec<ResolvedNote>,
    ended: Option<(SessionStats, u64, Option<u64>)>,
}

impl Collector {
    fn absorb(&mut self, events: Vec<Event>) {
        for event in events {
            match event {
                Event::NotesLoaded { total, synthetic } => {
                    log::info!("{total} notes loaded (synthetic={synthetic})");
                    self.synthetic = synthetic;
                }
                Event::NoteResolved {
                    note_id,
                    grade,
                    delta_ms,
                } => self.notes.push(ResolvedNote {
                    note_id,
                    grade,
                    delta_ms,
                }),
                Event::ExtraNote { pitch, hit_ms } => {
                    log::debug!("extra note {pitch} at {hit_ms:.1}ms");
                }
                Event::SessionEnded {
                    stats,
                    duration_ms,
                    saved_id,
                } => self.ended = Some((stats, duration_ms, saved_id)),
                Event::Notice { level, message } => log::info!("{level:?}: {message}"),
                _ => {}
            }
        }
    }
}

/// Latest beat start in milliseconds; synthetic fallbacks run ten seconds.
fn score_end_ms(score: &Score, ms_per_tick: f64) -> Millis {
    let last_tick = score
        .tracks
        .iter()
        .flat_map(|t| &t.staves)
        .flat_map(|s| &s.bars)
        .flat_map(|b| &b.voices)
        .flat_map(|v| &v.beats)
        .map(|beat: &Beat| beat.playback_start)
        .max()
        .unwrap_or(0);
    (last_tick as f64 * ms_per_tick).max(10_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stickwork_domain_score::{Bar, Note, ScoreMeta, Stave, Track, Voice};
    use stickwork_infra_storage_fs::FsStorage;

    fn snare_score() -> Score {
        Score {
            meta: ScoreMeta {
                title: Some("Backbeat".to_string()),
                artist: None,
            },
            tracks: vec![Track {
                index: 0,
                name: "Drums".to_string(),
                staves: vec![Stave {
                    is_percussion: true,
                    bars: vec![Bar {
                        voices: vec![Voice {
                            beats: [960, 1920, 2880]
                                .into_iter()
                                .map(|tick| Beat {
                                    playback_start: tick,
                                    duration: 960,
                                    notes: vec![Note { real_value: 38 }],
                                })
                                .collect(),
                        }],
                    }],
                }],
            }],
        }
    }

    fn hit(timestamp_ms: f64) -> RecordedHit {
        RecordedHit {
            timestamp_ms,
            note: 38,
            velocity: 90,
        }
    }

    #[test]
    fn replays_hits_and_persists_the_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FsStorage::new(dir.path().to_path_buf());
        let opts = ReplayOptions {
            practice: false,
            ms_per_tick: 1.0,
        };

        let outcome = replay(
            snare_score(),
            vec![hit(1950.0), hit(965.0)],
            Some(Box::new(storage)),
            opts,
        )
        .expect("replay");

        assert_eq!(outcome.song, "Backbeat");
        assert_eq!(outcome.stats.hit_notes, 2);
        assert_eq!(outcome.stats.perfect_hits, 2);
        assert_eq!(outcome.stats.missed_notes, 1);
        assert_eq!(outcome.saved_id, Some(1));
        let grades: Vec<Grade> = outcome.notes.iter().map(|n| n.grade).collect();
        assert_eq!(grades, vec![Grade::Perfect, Grade::Perfect, Grade::Miss]);

        let reopened = FsStorage::new(dir.path().to_path_buf());
        assert_eq!(reopened.recent_sessions(5).expect("recent").len(), 1);
    }

    #[test]
    fn late_hit_inside_the_window_is_not_swept() {
        let opts = ReplayOptions {
            practice: false,
            ms_per_tick: 1.0,
        };

        let outcome = replay(snare_score(), vec![hit(1105.0)], None, opts).expect("replay");

        assert_eq!(outcome.stats.late_hits, 1);
        assert_eq!(outcome.stats.extra_notes, 0);
        assert_eq!(outcome.notes[0].note_id, "0-0-0-0-0-0");
        assert_eq!(outcome.notes[0].grade, Grade::Late);
    }

    #[test]
    fn hits_before_the_first_step_are_matched() {
        let score = Score {
            tracks: vec![Track {
                index: 0,
                name: "Drums".to_string(),
                staves: vec![Stave {
                    is_percussion: true,
                    bars: vec![Bar {
                        voices: vec![Voice {
                            beats: vec![Beat {
                                playback_start: 20,
                                duration: 960,
                                notes: vec![Note { real_value: 36 }],
                            }],
                        }],
                    }],
                }],
            }],
            ..Score::default()
        };
        let opts = ReplayOptions {
            practice: false,
            ms_per_tick: 1.0,
        };
        let kick = RecordedHit {
            timestamp_ms: 30.0,
            note: 36,
            velocity: 100,
        };

        let outcome = replay(score, vec![kick], None, opts).expect("replay");

        assert_eq!(outcome.stats.perfect_hits, 1);
        assert_eq!(outcome.stats.extra_notes, 0);
    }

    #[test]
    fn practice_replay_is_not_saved() {
        let dir = tempfile::tempdir().expect("tempdir");
        let opts = ReplayOptions {
            practice: true,
            ms_per_tick: 1.0,
        };

        let outcome = replay(
            snare_score(),
            vec![hit(960.0)],
            Some(Box::new(FsStorage::new(dir.path().to_path_buf()))),
            opts,
        )
        .expect("replay");

        assert_eq!(outcome.saved_id, None);
        assert_eq!(outcome.stats.hit_notes, 1);
    }

    #[test]
    fn empty_score_falls_back_to_synthetic_notes() {
        let outcome = replay(Score::default(), Vec::new(), None, ReplayOptions::default())
            .expect("replay");

        assert!(outcome.synthetic);
        assert_eq!(outcome.stats.missed_notes, outcome.stats.total_notes);
    }
}
