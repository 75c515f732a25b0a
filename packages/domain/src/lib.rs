//! # Waive Domain
//!
//! Shared domain objects for the waive glove teaching system: finger and
//! fold-set values, curriculum modes, attempt records, the snapshot handed to
//! renderers and the unified error.

pub mod attempt;
pub mod error;
pub mod finger;
pub mod fold_set;
pub mod mode;
pub mod prosody;
pub mod snapshot;

pub use attempt::{Attempt, ErrorRate, ExportRow, FocusArea, LetterStat};
pub use error::TeachError;
pub use finger::FingerId;
pub use fold_set::FoldSet;
pub use mode::LearningMode;
pub use prosody::{Emphasis, Prosody};
pub use snapshot::{
    AchievementProgress, LetterMastery, MasteryStatus, PromptView, SessionPhase,
    SessionSnapshot, Trend, format_elapsed,
};

/// Prelude module containing commonly used types.
pub mod prelude {
    pub use crate::{
        Attempt, Emphasis, FingerId, FoldSet, LearningMode, Prosody, SessionPhase,
        SessionSnapshot, TeachError,
    };
}
