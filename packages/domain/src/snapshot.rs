//! Read-only view state pushed to the display/reporting collaborator.
use crate::attempt::{Attempt, FocusArea};
use crate::fold_set::FoldSet;
use crate::mode::LearningMode;
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a teaching session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No glove connected.
    #[default]
    Idle,
    /// Finger-mapping tutorial in progress.
    Introducing,
    /// Waiting for the learner's gesture.
    Prompting,
    /// A gesture is being judged; the next prompt is pending.
    Judging,
    Paused,
    /// Glove released; a fresh connect is required.
    Disconnected,
}

/// How a letter tile is shown on the mastery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryStatus {
    Current,
    Mastered,
    Difficult,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterMastery {
    pub letter: char,
    pub status: MasteryStatus,
}

/// Direction of recent accuracy compared with the window before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    #[default]
    Stable,
}

/// The letter (and word, in practice mode) currently being asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptView {
    pub letter: char,
    pub word: Option<String>,
    pub folds: FoldSet,
}

/// Unlock state of one achievement badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
    pub current: f64,
    pub target: f64,
}

/// Everything a renderer needs, recomputed after every state change.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub mode: LearningMode,
    pub phase: SessionPhase,
    pub prompt: Option<PromptView>,
    pub paused: bool,
    pub voice_listening: bool,
    pub session_elapsed_seconds: u64,
    pub accuracy_percent: f64,
    pub total_inputs: u32,
    pub correct_inputs: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub words_completed: u32,
    pub average_response_seconds: f64,
    pub trend: Trend,
    pub mastery: Vec<LetterMastery>,
    pub recent_attempts: Vec<Attempt>,
    pub focus_areas: Vec<FocusArea>,
    pub achievements: Vec<AchievementProgress>,
}

impl SessionSnapshot {
    /// Letters shown as mastered on the path.
    pub fn mastered_count(&self) -> usize {
        self.mastery
            .iter()
            .filter(|m| m.status == MasteryStatus::Mastered)
            .count()
    }
}

/// `MMm SSs` timer label.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}m {:02}s", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_label_pads_minutes_and_seconds() {
        assert_eq!(format_elapsed(0), "00m 00s");
        assert_eq!(format_elapsed(65), "01m 05s");
        assert_eq!(format_elapsed(3725), "62m 05s");
    }

    #[test]
    fn mastered_count_ignores_other_statuses() {
        let snapshot = SessionSnapshot {
            mastery: vec![
                LetterMastery { letter: 'a', status: MasteryStatus::Mastered },
                LetterMastery { letter: 'b', status: MasteryStatus::Difficult },
                LetterMastery { letter: 'c', status: MasteryStatus::Mastered },
            ],
            ..SessionSnapshot::default()
        };
        assert_eq!(snapshot.mastered_count(), 2);
    }
}
