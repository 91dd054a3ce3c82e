use crate::calibration::ClockCalibrator;
use crate::grading::{Grade, TimingWindows};
use crate::timeline::NoteTimeline;
use stickwork_ports::types::Millis;

#[derive(Clone, Debug, PartialEq)]
pub struct HitProposal {
    pub primary: usize,
    /// Duplicate-onset notes resolved together with the primary one.
    pub siblings: Vec<usize>,
    pub grade: Grade,
    /// Signed: negative when the hit came before the note.
    pub delta_ms: Millis,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MatchOutcome {
    Matched(HitProposal),
    Extra,
}

/// Picks the pending note a live hit belongs to.
///
/// Candidates share the hit's pitch and accept it within the timing windows.
/// The closest start wins; on equal distance the earlier slot wins. Tick-unit
/// notes are skipped while the calibrator has no rate.
pub fn match_hit(
    timeline: &NoteTimeline,
    calibrator: &ClockCalibrator,
    windows: &TimingWindows,
    pitch: u8,
    hit_ms: Millis,
) -> MatchOutcome {
    let mut best: Option<(usize, Millis)> = None;
    for (idx, slot) in timeline.pending() {
        if slot.note.pitch != pitch {
            continue;
        }
        let Some(start_ms) = calibrator.to_millis(slot.note.start) else {
            continue;
        };
        if !windows.accepts(start_ms, hit_ms) {
            continue;
        }
        let closer = match best {
            Some((_, best_ms)) => (start_ms - hit_ms).abs() < (best_ms - hit_ms).abs(),
            None => true,
        };
        if closer {
            best = Some((idx, start_ms));
        }
    }

    let Some((primary, start_ms)) = best else {
        return MatchOutcome::Extra;
    };

    let siblings = timeline
        .pending()
        .filter(|(idx, slot)| *idx != primary && slot.note.pitch == pitch)
        .filter_map(|(idx, slot)| {
            let sibling_ms = calibrator.to_millis(slot.note.start)?;
            ((sibling_ms - start_ms).abs() <= windows.late).then_some(idx)
        })
        .collect();

    MatchOutcome::Matched(HitProposal {
        primary,
        siblings,
        grade: windows.classify(start_ms, hit_ms),
        delta_ms: hit_ms - start_ms,
    })
}
