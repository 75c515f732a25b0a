//! Mutable learner state owned by the session controller.

use indexmap::IndexSet;
use tokio::time::Instant;
use waive_domain::LearningMode;

/// Curriculum position, counters and streaks for one session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub mode: LearningMode,
    pub is_paused: bool,
    pub current_letter_index: usize,
    pub current_word_index: usize,
    pub current_word_letter_index: usize,
    pub correct_streak: u32,
    pub best_streak: u32,
    pub correct_inputs: u32,
    pub total_inputs: u32,
    /// Insertion order is the order letters were mastered.
    pub mastered_letters: IndexSet<char>,
    pub words_completed: u32,
    pub session_start: Option<Instant>,
}

impl SessionState {
    /// Fresh state for a new connection, keeping the chosen mode.
    pub fn restart(&mut self) {
        *self = Self {
            mode: self.mode,
            session_start: Some(Instant::now()),
            ..Self::default()
        };
    }

    /// Rewind every curriculum index to the start.
    pub fn reset_indices(&mut self) {
        self.current_letter_index = 0;
        self.current_word_index = 0;
        self.current_word_letter_index = 0;
    }

    pub fn record_correct(&mut self) {
        self.total_inputs += 1;
        self.correct_inputs += 1;
        self.correct_streak += 1;
        self.best_streak = self.best_streak.max(self.correct_streak);
    }

    pub fn record_incorrect(&mut self) {
        self.total_inputs += 1;
        self.correct_streak = 0;
    }

    /// Overall accuracy in percent, 0 before any input.
    pub fn accuracy_percent(&self) -> f64 {
        if self.total_inputs == 0 {
            return 0.0;
        }
        self.correct_inputs as f64 / self.total_inputs as f64 * 100.0
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.session_start
            .map(|start| start.elapsed().as_secs())
            .unwrap_or(0)
    }
}
