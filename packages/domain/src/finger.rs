//! Glove finger identifiers (1–6, left ring through right ring).
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six fingers the glove can sense and buzz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FingerId(u8);

impl FingerId {
    /// Every finger in glove order.
    pub const ALL: [FingerId; 6] = [
        FingerId(1),
        FingerId(2),
        FingerId(3),
        FingerId(4),
        FingerId(5),
        FingerId(6),
    ];

    /// Build a finger id, `None` outside 1..=6.
    pub const fn new(number: u8) -> Option<Self> {
        if number >= 1 && number <= 6 {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Finger number as printed on the glove.
    #[inline]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// ASCII byte written to the glove to buzz this finger.
    #[inline]
    pub const fn cue_byte(self) -> u8 {
        b'0' + self.0
    }

    /// Spoken name used by the introduction.
    pub const fn description(self) -> &'static str {
        match self.0 {
            1 => "left ring finger",
            2 => "left middle finger",
            3 => "left index finger",
            4 => "right index finger",
            5 => "right middle finger",
            _ => "right ring finger",
        }
    }
}

impl TryFrom<u8> for FingerId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("finger id must be 1-6, got {value}"))
    }
}

impl From<FingerId> for u8 {
    fn from(finger: FingerId) -> Self {
        finger.0
    }
}

impl fmt::Display for FingerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
