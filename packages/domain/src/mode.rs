//! Curriculum modes.
use crate::error::TeachError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which curriculum the session walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningMode {
    /// Sequential A–Z path.
    #[default]
    Learning,
    /// Spelling over a fixed word list.
    Practice,
}

impl LearningMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Practice => "practice",
        }
    }
}

impl fmt::Display for LearningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LearningMode {
    type Err = TeachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "learning" => Ok(Self::Learning),
            "practice" => Ok(Self::Practice),
            other => Err(TeachError::Configuration(format!("unknown mode: {other}"))),
        }
    }
}
