use stickwork_ports::playback::PositionChanged;
use stickwork_ports::types::Millis;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Playing,
    Paused,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Anchor {
    wall_ms: Millis,
    playback_ms: Millis,
}

/// Maps wall-clock timestamps onto the playback millisecond timeline.
///
/// The anchor is the latest known `(wall, playback)` pair: the session start,
/// a position notification, or the pause/resume point. While paused the
/// projection is frozen at the pause position.
#[derive(Clone, Debug)]
pub struct PlaybackClock {
    state: ClockState,
    anchor: Anchor,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self {
            state: ClockState::Stopped,
            anchor: Anchor {
                wall_ms: 0.0,
                playback_ms: 0.0,
            },
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn start(&mut self, at_ms: Millis) {
        self.state = ClockState::Playing;
        self.anchor = Anchor {
            wall_ms: at_ms,
            playback_ms: 0.0,
        };
    }

    pub fn pause(&mut self, at_ms: Millis) {
        if self.state != ClockState::Playing {
            return;
        }
        self.anchor = Anchor {
            wall_ms: at_ms,
            playback_ms: self.project(at_ms),
        };
        self.state = ClockState::Paused;
    }

    pub fn resume(&mut self, at_ms: Millis) {
        if self.state != ClockState::Paused {
            return;
        }
        self.anchor.wall_ms = at_ms;
        self.state = ClockState::Playing;
    }

    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
    }

    /// Position notifications re-anchor only while playing; a late
    /// notification must not move a paused clock.
    pub fn observe(&mut self, pos: &PositionChanged) {
        if self.state != ClockState::Playing {
            return;
        }
        self.anchor = Anchor {
            wall_ms: pos.at_ms,
            playback_ms: pos.current_time_ms,
        };
    }

    pub fn project(&self, wall_ms: Millis) -> Millis {
        match self.state {
            ClockState::Playing => self.anchor.playback_ms + (wall_ms - self.anchor.wall_ms),
            ClockState::Paused | ClockState::Stopped => self.anchor.playback_ms,
        }
    }
}
