//! Session achievements. Once unlocked, a badge stays unlocked for the session.

use indexmap::IndexSet;
use tracing::info;
use waive_domain::{AchievementProgress, Attempt};

/// Inputs the badges are judged on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AchievementStats {
    pub correct_inputs: u32,
    pub total_inputs: u32,
    pub accuracy_percent: f64,
    pub mastered_letters: usize,
    pub alphabet_len: usize,
    pub words_completed: u32,
}

const ACCURACY_MASTER_MIN_ATTEMPTS: u32 = 20;
const ACCURACY_MASTER_PERCENT: f64 = 95.0;
const QUICK_FINGERS_SECS: f64 = 1.0;
const WORD_WARRIOR_WORDS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Badge {
    FirstSteps,
    AccuracyMaster,
    QuickFingers,
    AlphabetMaster,
    WordWarrior,
}

impl Badge {
    const ALL: [Badge; 5] = [
        Badge::FirstSteps,
        Badge::AccuracyMaster,
        Badge::QuickFingers,
        Badge::AlphabetMaster,
        Badge::WordWarrior,
    ];

    const fn id(self) -> &'static str {
        match self {
            Badge::FirstSteps => "first_steps",
            Badge::AccuracyMaster => "accuracy_master",
            Badge::QuickFingers => "quick_fingers",
            Badge::AlphabetMaster => "alphabet_master",
            Badge::WordWarrior => "word_warrior",
        }
    }

    const fn title(self) -> &'static str {
        match self {
            Badge::FirstSteps => "First Steps",
            Badge::AccuracyMaster => "Accuracy Master",
            Badge::QuickFingers => "Quick Fingers",
            Badge::AlphabetMaster => "Alphabet Master",
            Badge::WordWarrior => "Word Warrior",
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Badge::FirstSteps => "Complete your first letter correctly",
            Badge::AccuracyMaster => "Reach 95% accuracy over at least 20 attempts",
            Badge::QuickFingers => "Answer correctly in under one second",
            Badge::AlphabetMaster => "Master every letter of the alphabet",
            Badge::WordWarrior => "Spell 50 practice words",
        }
    }
}

/// Tracks which badges are unlocked and how close the rest are.
#[derive(Debug, Clone, Default)]
pub struct AchievementBoard {
    unlocked: IndexSet<Badge>,
    fastest_correct_secs: Option<f64>,
}

impl AchievementBoard {
    /// Note a judged attempt; only correct ones with a measured latency count for speed.
    pub fn observe(&mut self, attempt: &Attempt) {
        if !attempt.is_correct || attempt.response_time_ms == 0 {
            return;
        }
        let secs = attempt.response_time_secs();
        self.fastest_correct_secs = Some(match self.fastest_correct_secs {
            Some(best) => best.min(secs),
            None => secs,
        });
    }

    /// Unlock whatever `stats` now qualifies for. Returns the titles unlocked by this call.
    pub fn evaluate(&mut self, stats: &AchievementStats) -> Vec<&'static str> {
        let mut fresh = Vec::new();
        for badge in Badge::ALL {
            if !self.unlocked.contains(&badge) && self.qualifies(badge, stats) {
                info!(achievement = badge.title(), "Achievement unlocked");
                self.unlocked.insert(badge);
                fresh.push(badge.title());
            }
        }
        fresh
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|b| b.id() == id)
    }

    /// Progress for every badge in display order.
    pub fn progress(&self, stats: &AchievementStats) -> Vec<AchievementProgress> {
        Badge::ALL
            .into_iter()
            .map(|badge| {
                let (current, target) = self.measure(badge, stats);
                AchievementProgress {
                    id: badge.id(),
                    title: badge.title(),
                    description: badge.description(),
                    unlocked: self.unlocked.contains(&badge),
                    current,
                    target,
                }
            })
            .collect()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn qualifies(&self, badge: Badge, stats: &AchievementStats) -> bool {
        match badge {
            Badge::FirstSteps => stats.correct_inputs >= 1,
            Badge::AccuracyMaster => {
                stats.total_inputs >= ACCURACY_MASTER_MIN_ATTEMPTS
                    && stats.accuracy_percent >= ACCURACY_MASTER_PERCENT
            }
            Badge::QuickFingers => self
                .fastest_correct_secs
                .is_some_and(|secs| secs < QUICK_FINGERS_SECS),
            Badge::AlphabetMaster => {
                stats.alphabet_len > 0 && stats.mastered_letters >= stats.alphabet_len
            }
            Badge::WordWarrior => stats.words_completed >= WORD_WARRIOR_WORDS,
        }
    }

    fn measure(&self, badge: Badge, stats: &AchievementStats) -> (f64, f64) {
        match badge {
            Badge::FirstSteps => (stats.correct_inputs.min(1) as f64, 1.0),
            Badge::AccuracyMaster => {
                if stats.total_inputs >= ACCURACY_MASTER_MIN_ATTEMPTS {
                    (stats.accuracy_percent, ACCURACY_MASTER_PERCENT)
                } else {
                    (
                        stats.total_inputs as f64,
                        ACCURACY_MASTER_MIN_ATTEMPTS as f64,
                    )
                }
            }
            Badge::QuickFingers => (
                self.fastest_correct_secs.unwrap_or(0.0),
                QUICK_FINGERS_SECS,
            ),
            Badge::AlphabetMaster => (stats.mastered_letters as f64, stats.alphabet_len as f64),
            Badge::WordWarrior => (stats.words_completed as f64, WORD_WARRIOR_WORDS as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use waive_domain::{FoldSet, LearningMode};

    fn attempt(ok: bool, ms: u64) -> Attempt {
        Attempt {
            letter: 'a',
            required_folds: FoldSet::EMPTY,
            observed_folds: FoldSet::EMPTY,
            is_correct: ok,
            response_time_ms: ms,
            timestamp: Utc::now(),
            mode: LearningMode::Learning,
        }
    }

    #[test]
    fn unlocks_are_sticky() {
        let mut board = AchievementBoard::default();
        let stats = AchievementStats {
            correct_inputs: 1,
            total_inputs: 1,
            accuracy_percent: 100.0,
            alphabet_len: 26,
            ..AchievementStats::default()
        };
        assert_eq!(board.evaluate(&stats), vec!["First Steps"]);
        assert!(board.evaluate(&stats).is_empty());
        assert!(board.is_unlocked("first_steps"));
    }

    #[test]
    fn accuracy_master_needs_volume() {
        let mut board = AchievementBoard::default();
        let mut stats = AchievementStats {
            correct_inputs: 19,
            total_inputs: 19,
            accuracy_percent: 100.0,
            alphabet_len: 26,
            ..AchievementStats::default()
        };
        board.evaluate(&stats);
        assert!(!board.is_unlocked("accuracy_master"));

        stats.correct_inputs = 19;
        stats.total_inputs = 21;
        stats.accuracy_percent = 19.0 / 21.0 * 100.0;
        board.evaluate(&stats);
        assert!(!board.is_unlocked("accuracy_master"));

        stats.correct_inputs = 40;
        stats.total_inputs = 42;
        stats.accuracy_percent = 40.0 / 42.0 * 100.0;
        board.evaluate(&stats);
        assert!(board.is_unlocked("accuracy_master"));
    }

    #[test]
    fn quick_fingers_uses_fastest_correct() {
        let mut board = AchievementBoard::default();
        board.observe(&attempt(false, 300));
        board.observe(&attempt(true, 1800));
        assert!(board.evaluate(&AchievementStats::default()).is_empty());
        board.observe(&attempt(true, 900));
        assert_eq!(board.evaluate(&AchievementStats::default()), vec!["Quick Fingers"]);

        let progress = board.progress(&AchievementStats::default());
        let quick = progress
            .iter()
            .find(|p| p.id == "quick_fingers")
            .expect("quick fingers listed");
        assert!((quick.current - 0.9).abs() < 1e-9);
    }
}
