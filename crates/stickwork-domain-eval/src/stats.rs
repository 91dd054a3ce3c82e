use crate::grading::{Grade, ScoreValues};
use serde::{Deserialize, Serialize};

const STAR_BANDS: [(f64, u8); 5] = [(95.0, 5), (85.0, 4), (75.0, 3), (60.0, 2), (40.0, 1)];

/// Percentage of resolved notes that were hit; 0 before anything resolves.
pub fn accuracy(hit_notes: u32, missed_notes: u32) -> f64 {
    let processed = hit_notes + missed_notes;
    if processed == 0 {
        return 0.0;
    }
    hit_notes as f64 / processed as f64 * 100.0
}

pub fn star_rating(accuracy: f64) -> u8 {
    STAR_BANDS
        .iter()
        .find(|(threshold, _)| accuracy >= *threshold)
        .map(|(_, stars)| *stars)
        .unwrap_or(0)
}

/// Running counters of one session. Accuracy and stars are recomputed after
/// every mutation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub score: i64,
    pub streak: u32,
    pub max_streak: u32,
    pub total_notes: u32,
    pub hit_notes: u32,
    pub perfect_hits: u32,
    pub good_hits: u32,
    pub early_hits: u32,
    pub late_hits: u32,
    pub missed_notes: u32,
    pub extra_notes: u32,
    pub accuracy: f64,
    pub stars: u8,
}

impl SessionStats {
    pub fn new(total_notes: u32) -> Self {
        Self {
            total_notes,
            ..Self::default()
        }
    }

    pub fn resolved(&self) -> u32 {
        self.hit_notes + self.missed_notes
    }

    pub fn record_hit(&mut self, grade: Grade, values: &ScoreValues) {
        match grade {
            Grade::Perfect => self.perfect_hits += 1,
            Grade::Good => self.good_hits += 1,
            Grade::Early => self.early_hits += 1,
            Grade::Late => self.late_hits += 1,
            Grade::Miss => {
                self.record_miss(values);
                return;
            }
        }
        self.hit_notes += 1;
        self.add_points(values.points(grade), values);
        if grade.keeps_streak() {
            self.streak += 1;
            self.max_streak = self.max_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
        self.recompute();
    }

    /// Returns false when the miss would push resolved notes past the total.
    pub fn record_miss(&mut self, values: &ScoreValues) -> bool {
        if self.missed_notes >= self.total_notes.saturating_sub(self.hit_notes) {
            return false;
        }
        self.missed_notes += 1;
        self.add_points(values.miss, values);
        self.streak = 0;
        self.recompute();
        true
    }

    pub fn record_extra(&mut self, values: &ScoreValues) {
        self.extra_notes += 1;
        self.add_points(values.extra, values);
        self.streak = 0;
        self.recompute();
    }

    fn add_points(&mut self, points: i64, values: &ScoreValues) {
        self.score += points;
        if let Some(floor) = values.floor {
            self.score = self.score.max(floor);
        }
    }

    fn recompute(&mut self) {
        self.accuracy = accuracy(self.hit_notes, self.missed_notes);
        self.stars = star_rating(self.accuracy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_bands() {
        assert_eq!(star_rating(100.0), 5);
        assert_eq!(star_rating(95.0), 5);
        assert_eq!(star_rating(94.9), 4);
        assert_eq!(star_rating(75.0), 3);
        assert_eq!(star_rating(60.0), 2);
        assert_eq!(star_rating(40.0), 1);
        assert_eq!(star_rating(39.9), 0);
    }

    #[test]
    fn accuracy_without_resolutions_is_zero() {
        assert_eq!(accuracy(0, 0), 0.0);
        assert_eq!(accuracy(3, 1), 75.0);
    }
}
