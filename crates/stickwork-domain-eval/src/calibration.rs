use stickwork_domain_score::NoteStart;
use stickwork_ports::types::{Millis, Tick};

/// Best-effort milliseconds-per-tick estimate taken from playback position
/// samples.
///
/// Until the first usable sample arrives the rate is unknown and tick-based
/// notes cannot be placed on the millisecond timeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClockCalibrator {
    ms_per_tick: Option<f64>,
}

impl ClockCalibrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one `(time, tick)` sample. Returns whether the rate changed.
    pub fn observe(&mut self, current_time_ms: Millis, current_tick: Tick) -> bool {
        if current_tick <= 0 || current_time_ms == 0.0 {
            return false;
        }
        let rate = current_time_ms / current_tick as f64;
        if !rate.is_finite() || rate <= 0.0 {
            return false;
        }
        let changed = self.ms_per_tick != Some(rate);
        self.ms_per_tick = Some(rate);
        changed
    }

    pub fn ms_per_tick(&self) -> Option<f64> {
        self.ms_per_tick
    }

    pub fn is_calibrated(&self) -> bool {
        self.ms_per_tick.is_some()
    }

    /// Forget the rate; the next loaded score starts uncalibrated.
    pub fn reset(&mut self) {
        self.ms_per_tick = None;
    }

    pub fn to_millis(&self, start: NoteStart) -> Option<Millis> {
        match start {
            NoteStart::Millisecond(ms) => Some(ms),
            NoteStart::Tick(tick) => self.ms_per_tick.map(|rate| tick as f64 * rate),
        }
    }
}
