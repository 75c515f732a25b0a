//! Emphasis variants and the prosody they map to.
use serde::{Deserialize, Serialize};

/// Delivery style of a spoken line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    #[default]
    Normal,
    Excited,
    Encouraging,
    Gentle,
}

/// Rate multiplier (1.0 = normal), pitch multiplier and volume (0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prosody {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Prosody {
    pub const fn new(rate: f32, pitch: f32, volume: f32) -> Self {
        Self {
            rate,
            pitch,
            volume,
        }
    }
}

impl Default for Prosody {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}
