use pretty_assertions::assert_eq;
use stickwork_domain_eval::{
    Grade, Judge, JudgeConfig, JudgeEvent, PlayerNoteOn, ScoreValues, TimingWindows,
};
use stickwork_domain_score::{ExpectedNote, NoteStart};

fn tick_note(id: &str, pitch: u8, tick: i64) -> ExpectedNote {
    ExpectedNote {
        id: id.to_string(),
        pitch,
        start: NoteStart::Tick(tick),
        source: None,
    }
}

fn ms_note(id: &str, pitch: u8, ms: f64) -> ExpectedNote {
    ExpectedNote {
        id: id.to_string(),
        pitch,
        start: NoteStart::Millisecond(ms),
        source: None,
    }
}

fn hit(time_ms: f64, note: u8) -> PlayerNoteOn {
    PlayerNoteOn {
        time_ms,
        note,
        velocity: 100,
    }
}

fn judge_with(notes: Vec<ExpectedNote>) -> Judge {
    let mut judge = Judge::new(JudgeConfig::default());
    judge.load_notes(notes);
    judge
}

fn grades(events: &[JudgeEvent]) -> Vec<(String, Grade)> {
    events
        .iter()
        .filter_map(|event| match event {
            JudgeEvent::Hit { note_id, grade, .. } => Some((note_id.clone(), *grade)),
            _ => None,
        })
        .collect()
}

#[test]
fn calibrated_tick_note_graded_good() {
    let mut judge = judge_with(vec![tick_note("a", 38, 480)]);
    judge.calibrate(2000.0, 1000);

    let events = judge.on_note_on(hit(1030.0, 38));

    assert_eq!(grades(&events), vec![("a".to_string(), Grade::Good)]);
    assert_eq!(judge.stats().hit_notes, 1);
    assert_eq!(judge.stats().good_hits, 1);
    assert_eq!(judge.stats().streak, 1);
    assert_eq!(judge.stats().score, 75);
}

#[test]
fn unmatched_hit_counts_as_extra() {
    let mut judge = judge_with(vec![ms_note("a", 36, 1000.0)]);
    judge.on_note_on(hit(1000.0, 36));
    assert_eq!(judge.stats().streak, 1);
    let before = judge.stats().score;

    let events = judge.on_note_on(hit(1000.0, 42));

    assert!(events
        .iter()
        .any(|e| matches!(e, JudgeEvent::Extra { pitch: 42, .. })));
    assert_eq!(judge.stats().extra_notes, 1);
    assert_eq!(judge.stats().streak, 0);
    assert_eq!(judge.stats().score, before - 25);
}

#[test]
fn score_floor_clamps_extra_penalty() {
    let cfg = JudgeConfig {
        windows: TimingWindows::default(),
        values: ScoreValues {
            floor: Some(0),
            ..ScoreValues::default()
        },
    };
    let mut judge = Judge::new(cfg);
    judge.load_notes(vec![ms_note("a", 36, 1000.0)]);

    judge.on_note_on(hit(0.0, 42));

    assert_eq!(judge.stats().score, 0);
    assert_eq!(judge.stats().extra_notes, 1);
}

#[test]
fn sweep_marks_expired_note_missed() {
    let mut judge = judge_with(vec![ms_note("a", 38, 1000.0)]);
    judge.on_note_on(hit(500.0, 36));

    let events = judge.advance_to(1200.0);

    assert!(events
        .iter()
        .any(|e| matches!(e, JudgeEvent::Miss { note_id, .. } if note_id == "a")));
    assert_eq!(judge.stats().missed_notes, 1);
    assert_eq!(judge.stats().streak, 0);
    let slot = judge.timeline().by_id("a").expect("slot");
    assert_eq!(slot.resolution().map(|r| r.grade), Some(Grade::Miss));
}

#[test]
fn sweep_waits_for_window_to_close() {
    let mut judge = judge_with(vec![ms_note("a", 38, 1000.0)]);
    assert!(judge.advance_to(1150.0).is_empty());
    assert_eq!(judge.stats().missed_notes, 0);
}

#[test]
fn duplicate_onset_resolves_both_notes() {
    let mut judge = judge_with(vec![ms_note("a", 38, 1000.0), ms_note("b", 38, 1000.0)]);

    let events = judge.on_note_on(hit(1010.0, 38));

    assert_eq!(
        grades(&events),
        vec![
            ("a".to_string(), Grade::Perfect),
            ("b".to_string(), Grade::Perfect)
        ]
    );
    assert_eq!(judge.stats().hit_notes, 2);
    assert!(judge.advance_to(5000.0).is_empty());
}

#[test]
fn equidistant_candidates_pick_earlier_slot() {
    // 200ms apart, so "b" is outside the duplicate-onset range of "a".
    let mut judge = judge_with(vec![ms_note("a", 36, 900.0), ms_note("b", 36, 1100.0)]);

    let events = judge.on_note_on(hit(1000.0, 36));

    assert_eq!(grades(&events), vec![("a".to_string(), Grade::Good)]);
    assert!(!judge.timeline().by_id("b").expect("slot").is_resolved());
}

#[test]
fn closest_candidate_wins() {
    let mut judge = judge_with(vec![ms_note("a", 36, 880.0), ms_note("b", 36, 1050.0)]);
    let events = judge.on_note_on(hit(1000.0, 36));
    assert_eq!(grades(&events), vec![("b".to_string(), Grade::Perfect)]);
    assert!(!judge.timeline().by_id("a").expect("slot").is_resolved());
}

#[test]
fn calibrated_tick_note_close_hit_is_perfect() {
    let mut judge = judge_with(vec![tick_note("a", 38, 480)]);
    judge.calibrate(2000.0, 1000);

    let events = judge.on_note_on(hit(970.0, 38));

    assert_eq!(grades(&events), vec![("a".to_string(), Grade::Perfect)]);
}

#[test]
fn early_and_late_break_streak() {
    let mut judge = judge_with(vec![
        ms_note("a", 36, 1000.0),
        ms_note("b", 36, 2000.0),
        ms_note("c", 36, 3000.0),
    ]);
    judge.on_note_on(hit(1000.0, 36));
    assert_eq!(judge.stats().streak, 1);

    let events = judge.on_note_on(hit(1880.0, 36));
    assert_eq!(grades(&events), vec![("b".to_string(), Grade::Early)]);
    assert_eq!(judge.stats().streak, 0);

    let events = judge.on_note_on(hit(3130.0, 36));
    assert_eq!(grades(&events), vec![("c".to_string(), Grade::Late)]);
    assert_eq!(judge.stats().early_hits, 1);
    assert_eq!(judge.stats().late_hits, 1);
    assert_eq!(judge.stats().max_streak, 1);
    assert_eq!(judge.stats().score, 100 + 50 + 50);
}

#[test]
fn uncalibrated_tick_notes_are_never_missed() {
    let mut judge = judge_with(vec![tick_note("a", 36, 10), tick_note("b", 38, 20)]);

    for now in (0..100).map(|i| i as f64 * 1000.0) {
        assert!(judge.advance_to(now).is_empty());
    }
    assert_eq!(judge.stats().missed_notes, 0);

    let events = judge.on_note_on(hit(20.0, 36));
    assert!(events.iter().any(|e| matches!(e, JudgeEvent::Extra { .. })));
    assert!(judge.timeline().slots().iter().all(|s| !s.is_resolved()));
}

#[test]
fn resolutions_are_final() {
    let mut judge = judge_with(vec![ms_note("a", 36, 1000.0), ms_note("b", 36, 3000.0)]);
    judge.on_note_on(hit(1020.0, 36));
    let first = judge.timeline().by_id("a").and_then(|s| s.resolution());

    judge.advance_to(10_000.0);
    judge.on_note_on(hit(1000.0, 36));

    assert_eq!(judge.timeline().by_id("a").and_then(|s| s.resolution()), first);
    assert_eq!(
        judge.timeline().by_id("b").and_then(|s| s.resolution()).map(|r| r.grade),
        Some(Grade::Miss)
    );
    let stats = judge.stats();
    assert_eq!(stats.hit_notes + stats.missed_notes, 2);
    assert_eq!(stats.accuracy, 50.0);
    assert_eq!(stats.stars, 1);
}

#[test]
fn conservation_holds_across_mixed_traffic() {
    let notes = (0..20)
        .map(|i| ms_note(&format!("n{i}"), 36 + (i % 3) as u8, i as f64 * 250.0))
        .collect();
    let mut judge = judge_with(notes);
    let mut last_resolved = 0;

    for step in 0..60 {
        let now = step as f64 * 100.0;
        if step % 3 == 0 {
            judge.on_note_on(hit(now + 7.0, 36 + (step % 3) as u8));
        }
        judge.advance_to(now);
        let stats = judge.stats();
        assert!(stats.resolved() <= stats.total_notes);
        assert!(stats.resolved() >= last_resolved);
        assert!((0.0..=100.0).contains(&stats.accuracy));
        last_resolved = stats.resolved();
    }
}

#[test]
fn reset_clears_resolutions_and_counters() {
    let mut judge = judge_with(vec![ms_note("a", 36, 1000.0), ms_note("b", 38, 1000.0)]);
    judge.on_note_on(hit(1000.0, 36));
    judge.advance_to(2000.0);

    let cleared = judge.reset();

    assert_eq!(cleared.len(), 2);
    assert_eq!(judge.stats().hit_notes, 0);
    assert_eq!(judge.stats().missed_notes, 0);
    assert_eq!(judge.stats().total_notes, 2);
    assert!(judge.timeline().slots().iter().all(|s| !s.is_resolved()));
}
