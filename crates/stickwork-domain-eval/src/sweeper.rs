use crate::calibration::ClockCalibrator;
use crate::grading::TimingWindows;
use crate::timeline::NoteTimeline;
use stickwork_ports::types::Millis;

/// Pending notes whose acceptance window closed before `now_ms`.
///
/// Notes that cannot be placed on the millisecond timeline yet (tick-unit
/// notes without a calibration rate) are never reported.
pub fn expired_notes(
    timeline: &NoteTimeline,
    calibrator: &ClockCalibrator,
    windows: &TimingWindows,
    now_ms: Millis,
) -> Vec<usize> {
    timeline
        .pending()
        .filter_map(|(idx, slot)| {
            let start_ms = calibrator.to_millis(slot.note.start)?;
            (now_ms > start_ms + windows.late).then_some(idx)
        })
        .collect()
}
