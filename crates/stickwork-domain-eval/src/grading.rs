use serde::{Deserialize, Serialize};
use stickwork_ports::storage::{ScoreValuesDto, TimingWindowsDto};
use stickwork_ports::types::Millis;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Grade {
    Perfect,
    Good,
    Early,
    Late,
    Miss,
}

impl Grade {
    pub fn keeps_streak(self) -> bool {
        matches!(self, Grade::Perfect | Grade::Good)
    }
}

/// Early and late bound the acceptance window; perfect and good are
/// symmetric bands inside it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingWindows {
    pub perfect: Millis,
    pub good: Millis,
    pub early: Millis,
    pub late: Millis,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreValues {
    pub perfect: i64,
    pub good: i64,
    pub early: i64,
    pub late: i64,
    pub miss: i64,
    pub extra: i64,
    pub floor: Option<i64>,
}

impl Default for TimingWindows {
    fn default() -> Self {
        TimingWindowsDto::default().into()
    }
}

impl From<TimingWindowsDto> for TimingWindows {
    fn from(dto: TimingWindowsDto) -> Self {
        Self {
            perfect: dto.perfect_ms,
            good: dto.good_ms,
            early: dto.early_ms,
            late: dto.late_ms,
        }
    }
}

impl TimingWindows {
    /// Whether a hit at `hit_ms` may be matched to a note starting at `start_ms`.
    pub fn accepts(&self, start_ms: Millis, hit_ms: Millis) -> bool {
        hit_ms >= start_ms - self.early && hit_ms <= start_ms + self.late
    }

    pub fn classify(&self, start_ms: Millis, hit_ms: Millis) -> Grade {
        let diff = (hit_ms - start_ms).abs();
        if diff <= self.perfect {
            Grade::Perfect
        } else if diff <= self.good {
            Grade::Good
        } else if hit_ms < start_ms {
            Grade::Early
        } else {
            Grade::Late
        }
    }
}

impl Default for ScoreValues {
    fn default() -> Self {
        ScoreValuesDto::default().into()
    }
}

impl From<ScoreValuesDto> for ScoreValues {
    fn from(dto: ScoreValuesDto) -> Self {
        Self {
            perfect: dto.perfect,
            good: dto.good,
            early: dto.early,
            late: dto.late,
            miss: dto.miss,
            extra: dto.extra,
            floor: dto.score_floor,
        }
    }
}

impl ScoreValues {
    pub fn points(&self, grade: Grade) -> i64 {
        match grade {
            Grade::Perfect => self.perfect,
            Grade::Good => self.good,
            Grade::Early => self.early,
            Grade::Late => self.late,
            Grade::Miss => self.miss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_bands() {
        let w = TimingWindows::default();
        assert_eq!(w.classify(1000.0, 1050.0), Grade::Perfect);
        assert_eq!(w.classify(1000.0, 950.0), Grade::Perfect);
        assert_eq!(w.classify(1000.0, 1100.0), Grade::Good);
        assert_eq!(w.classify(1000.0, 880.0), Grade::Early);
        assert_eq!(w.classify(1000.0, 1120.0), Grade::Late);
    }

    #[test]
    fn acceptance_edges_are_inclusive() {
        let w = TimingWindows::default();
        assert!(w.accepts(1000.0, 850.0));
        assert!(w.accepts(1000.0, 1150.0));
        assert!(!w.accepts(1000.0, 849.9));
        assert!(!w.accepts(1000.0, 1150.1));
    }
}
