//! Per-letter outcome statistics and the bounded recent-attempt history.

use std::collections::VecDeque;

use chrono::Utc;
use indexmap::IndexMap;
use tokio::time::Instant;
use tracing::{debug, warn};
use waive_domain::{
    Attempt, ErrorRate, ExportRow, FocusArea, FoldSet, LearningMode, LetterStat, Trend,
};

/// Default bounded history length.
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Width of each window compared by [`AttemptTracker::trend`].
const TREND_WINDOW: usize = 5;

/// Accuracy difference (percentage points) a trend must exceed.
const TREND_BAND: f64 = 10.0;

/// What was asked for and what the glove reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub required: FoldSet,
    pub observed: FoldSet,
    pub mode: LearningMode,
}

/// Records judged gestures for one session.
///
/// Letters are kept in first-encounter order, which is also the tie-break
/// order for [`focus_areas`](Self::focus_areas).
#[derive(Debug)]
pub struct AttemptTracker {
    session_id: i64,
    capacity: usize,
    letters: IndexMap<char, LetterStat>,
    pending: Option<(char, Instant)>,
    /// Oldest first.
    history: VecDeque<Attempt>,
    /// Latest outcomes, oldest first, enough for two trend windows.
    outcomes: VecDeque<bool>,
}

impl Default for AttemptTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl AttemptTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            session_id: Utc::now().timestamp_millis(),
            capacity: capacity.max(1),
            letters: IndexMap::new(),
            pending: None,
            history: VecDeque::with_capacity(capacity.max(1)),
            outcomes: VecDeque::with_capacity(TREND_WINDOW * 2),
        }
    }

    /// Millisecond timestamp identifying this session in exports.
    #[inline]
    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    /// Start the response clock for `letter`, replacing any pending start.
    pub fn begin_attempt(&mut self, letter: char) {
        let letter = letter.to_ascii_lowercase();
        self.letters.entry(letter).or_default();
        self.pending = Some((letter, Instant::now()));
    }

    /// Record a judged gesture and return the stored attempt.
    ///
    /// Without a matching [`begin_attempt`](Self::begin_attempt) the response
    /// time is 0 and a warning is logged. The clock restarts for the same
    /// letter, so a retry made before the next prompt is timed from this one.
    pub fn record_attempt(
        &mut self,
        letter: char,
        is_correct: bool,
        observation: Observation,
    ) -> Attempt {
        let letter = letter.to_ascii_lowercase();
        let response_time_ms = match self.pending.take() {
            Some((pending, started)) if pending == letter => {
                started.elapsed().as_millis() as u64
            }
            other => {
                warn!(
                    %letter,
                    pending = ?other.map(|(l, _)| l),
                    "Attempt recorded without a matching start, latency set to 0"
                );
                0
            }
        };

        let stat = self.letters.entry(letter).or_default();
        stat.attempts += 1;
        if !is_correct {
            stat.errors += 1;
        }

        let attempt = Attempt {
            letter,
            required_folds: observation.required,
            observed_folds: observation.observed,
            is_correct,
            response_time_ms,
            timestamp: Utc::now(),
            mode: observation.mode,
        };

        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(attempt.clone());
        if self.outcomes.len() == TREND_WINDOW * 2 {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(is_correct);
        self.pending = Some((letter, Instant::now()));

        debug!(%letter, is_correct, response_time_ms, "Attempt recorded");
        attempt
    }

    /// Counters for `letter`.
    pub fn letter_stat(&self, letter: char) -> LetterStat {
        self.letters
            .get(&letter.to_ascii_lowercase())
            .copied()
            .unwrap_or_default()
    }

    /// `100 * errors / attempts`, all zeros for unseen letters.
    pub fn error_rate(&self, letter: char) -> ErrorRate {
        let stat = self.letter_stat(letter);
        if stat.attempts == 0 {
            return ErrorRate::default();
        }
        ErrorRate {
            rate: stat.errors as f64 / stat.attempts as f64 * 100.0,
            attempts: stat.attempts,
            errors: stat.errors,
        }
    }

    /// Letters with at least one error, worst first, at most `limit` entries.
    pub fn focus_areas(&self, limit: usize) -> Vec<FocusArea> {
        let mut areas: Vec<FocusArea> = self
            .letters
            .iter()
            .filter(|(_, stat)| stat.errors > 0)
            .map(|(&letter, stat)| FocusArea {
                letter,
                attempts: stat.attempts,
                errors: stat.errors,
                error_rate: stat.errors as f64 / stat.attempts as f64 * 100.0,
            })
            .collect();
        // Stable sort keeps first-encounter order for ties
        areas.sort_by(|a, b| b.error_rate.total_cmp(&a.error_rate));
        areas.truncate(limit);
        areas
    }

    /// Bounded history, newest first.
    pub fn recent(&self) -> impl Iterator<Item = &Attempt> {
        self.history.iter().rev()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Bounded history as export rows, oldest first.
    pub fn export_rows(&self) -> Vec<ExportRow> {
        self.history
            .iter()
            .map(|a| ExportRow {
                timestamp: a.timestamp,
                letter: a.letter,
                is_correct: a.is_correct,
                response_time_seconds: a.response_time_secs(),
            })
            .collect()
    }

    /// Mean response time over the bounded history, in seconds.
    pub fn average_response_secs(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let total: f64 = self.history.iter().map(Attempt::response_time_secs).sum();
        total / self.history.len() as f64
    }

    /// Compares the last five outcomes with the five before them.
    pub fn trend(&self) -> Trend {
        if self.outcomes.len() < TREND_WINDOW * 2 {
            return Trend::Stable;
        }
        let accuracy = |skip: usize| {
            let correct = self
                .outcomes
                .iter()
                .skip(skip)
                .take(TREND_WINDOW)
                .filter(|ok| **ok)
                .count();
            correct as f64 / TREND_WINDOW as f64 * 100.0
        };
        let previous = accuracy(0);
        let recent = accuracy(TREND_WINDOW);

        if recent > previous + TREND_BAND {
            Trend::Improving
        } else if recent < previous - TREND_BAND {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }

    /// Per-letter error counts, first-encounter order.
    pub fn error_counts(&self) -> impl Iterator<Item = (char, u32)> + '_ {
        self.letters
            .iter()
            .filter(|(_, s)| s.errors > 0)
            .map(|(&l, s)| (l, s.errors))
    }

    /// Clear everything and start a new session id.
    pub fn reset(&mut self) {
        *self = Self::new(self.capacity);
    }
}
