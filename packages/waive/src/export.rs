//! CSV and JSON hand-off of session data.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use waive_domain::{ExportRow, LearningMode, TeachError};

use crate::attempt_tracker::AttemptTracker;
use crate::session::state::SessionState;

/// CSV header, one row per bounded-history attempt.
pub const CSV_HEADER: [&str; 4] = ["Timestamp", "Letter", "IsCorrect", "ResponseTime(s)"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Serialize `rows` oldest first with 2-decimal response times.
pub fn to_csv(rows: &[ExportRow]) -> Result<String, TeachError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .map_err(|e| TeachError::Export(e.to_string()))?;

    for row in rows {
        writer
            .write_record([
                row.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                row.letter.to_ascii_uppercase().to_string(),
                row.is_correct.to_string(),
                format!("{:.2}", row.response_time_seconds),
            ])
            .map_err(|e| TeachError::Export(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TeachError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TeachError::Export(e.to_string()))
}

/// Top-level JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonExport {
    pub session_id: i64,
    pub export_timestamp: DateTime<Utc>,
    pub summary: ExportSummary,
    pub sessions: Vec<SessionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub average_accuracy: f64,
    pub average_response_time_seconds: f64,
    pub best_streak: u32,
    pub mastered_letters: Vec<char>,
    pub words_completed: u32,
}

/// One session entry. `latency` is the mean response time in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub timestamp: DateTime<Utc>,
    pub mode: LearningMode,
    pub accuracy: f64,
    pub latency: u64,
    pub attempts: u32,
    pub errors: BTreeMap<char, u32>,
}

impl JsonExport {
    /// Summarize the current session.
    pub fn collect(
        tracker: &AttemptTracker,
        state: &SessionState,
        started_at: DateTime<Utc>,
    ) -> Self {
        let accuracy = state.accuracy_percent();
        let average_response = tracker.average_response_secs();
        Self {
            session_id: tracker.session_id(),
            export_timestamp: Utc::now(),
            summary: ExportSummary {
                total_attempts: state.total_inputs,
                correct_attempts: state.correct_inputs,
                average_accuracy: accuracy,
                average_response_time_seconds: average_response,
                best_streak: state.best_streak,
                mastered_letters: state
                    .mastered_letters
                    .iter()
                    .map(|l| l.to_ascii_uppercase())
                    .collect(),
                words_completed: state.words_completed,
            },
            sessions: vec![SessionRecord {
                timestamp: started_at,
                mode: state.mode,
                accuracy,
                latency: (average_response * 1000.0).round() as u64,
                attempts: state.total_inputs,
                errors: tracker.error_counts().collect(),
            }],
        }
    }

    pub fn to_pretty_string(&self) -> Result<String, TeachError> {
        serde_json::to_string_pretty(self).map_err(|e| TeachError::Export(e.to_string()))
    }
}
