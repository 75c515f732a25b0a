//! Judged gesture records.
use crate::fold_set::FoldSet;
use crate::mode::LearningMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One judged gesture. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub letter: char,
    pub required_folds: FoldSet,
    pub observed_folds: FoldSet,
    pub is_correct: bool,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub mode: LearningMode,
}

impl Attempt {
    /// Response time in seconds, as shown in history lists and exports.
    #[inline]
    pub fn response_time_secs(&self) -> f64 {
        self.response_time_ms as f64 / 1000.0
    }
}

/// Per-letter counters. `errors <= attempts` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LetterStat {
    pub attempts: u32,
    pub errors: u32,
}

/// Error rate report for a single letter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorRate {
    /// Percentage in 0.0–100.0.
    pub rate: f64,
    pub attempts: u32,
    pub errors: u32,
}

/// A letter that keeps tripping the learner up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusArea {
    pub letter: char,
    pub attempts: u32,
    pub errors: u32,
    pub error_rate: f64,
}

/// Flat row handed to CSV/JSON exporters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub timestamp: DateTime<Utc>,
    pub letter: char,
    pub is_correct: bool,
    pub response_time_seconds: f64,
}
