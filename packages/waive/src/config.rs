//! Session configuration loaded from TOML.
//!
//! Every section has a `Default` matching the reference glove setup, so an
//! empty file (or no file at all) yields a working configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use waive_domain::{Emphasis, Prosody, TeachError};

/// Top-level configuration for a teaching session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeacherConfig {
    pub serial: SerialConfig,
    pub timing: TimingConfig,
    pub curriculum: CurriculumConfig,
    pub speech: SpeechConfig,
    pub voice: VoiceConfig,
}

/// Glove transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path; `None` picks the first port the host reports.
    pub port: Option<String>,
    pub baud_rate: u32,
    /// Read timeout that bounds how long the reader thread takes to notice a disconnect.
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 9600,
            read_timeout_ms: 100,
        }
    }
}

impl SerialConfig {
    #[inline]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Pacing between judging, prompting and haptic cues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause between judging a gesture and the next prompt.
    pub settle_delay_ms: u64,
    /// Gap between consecutive finger cues after a prompt.
    pub haptic_finger_gap_ms: u64,
    /// Gap after each finger during the introduction.
    pub intro_finger_gap_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1200,
            haptic_finger_gap_ms: 150,
            intro_finger_gap_ms: 500,
        }
    }
}

impl TimingConfig {
    #[inline]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[inline]
    pub fn haptic_finger_gap(&self) -> Duration {
        Duration::from_millis(self.haptic_finger_gap_ms)
    }

    #[inline]
    pub fn intro_finger_gap(&self) -> Duration {
        Duration::from_millis(self.intro_finger_gap_ms)
    }
}

/// Curriculum content and statistics tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurriculumConfig {
    /// Practice-mode spelling list.
    pub words: Vec<String>,
    /// A letter is mastered when its first success comes within this many attempts.
    pub mastery_threshold: u32,
    /// Size of the recent-attempt history.
    pub history_capacity: usize,
    /// Letters reported by progress queries and the snapshot.
    pub focus_limit: usize,
    /// Play the finger-mapping tutorial on connect.
    pub introduction: bool,
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            words: ["cat", "bat", "sun", "moon", "star", "tree", "ice", "bee"]
                .into_iter()
                .map(String::from)
                .collect(),
            mastery_threshold: 2,
            history_capacity: 5,
            focus_limit: 3,
            introduction: true,
        }
    }
}

/// Prosody presets per emphasis, ordered gentle < encouraging < normal < excited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub gentle: Prosody,
    pub encouraging: Prosody,
    pub normal: Prosody,
    pub excited: Prosody,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            gentle: Prosody::new(0.8, 0.8, 0.8),
            encouraging: Prosody::new(0.9, 0.9, 1.0),
            normal: Prosody::new(1.0, 1.0, 1.0),
            excited: Prosody::new(1.2, 1.1, 1.0),
        }
    }
}

impl SpeechConfig {
    /// Preset for an emphasis variant.
    pub fn prosody(&self, emphasis: Emphasis) -> Prosody {
        match emphasis {
            Emphasis::Gentle => self.gentle,
            Emphasis::Encouraging => self.encouraging,
            Emphasis::Normal => self.normal,
            Emphasis::Excited => self.excited,
        }
    }

    fn validate(&self) -> Result<(), TeachError> {
        let ladder = [
            ("gentle", self.gentle),
            ("encouraging", self.encouraging),
            ("normal", self.normal),
            ("excited", self.excited),
        ];

        for (name, p) in ladder {
            if !(p.rate > 0.0 && p.rate <= 10.0) {
                return Err(TeachError::Configuration(format!(
                    "speech.{name}.rate must be in (0, 10], got {}",
                    p.rate
                )));
            }
            if !(0.0..=2.0).contains(&p.pitch) {
                return Err(TeachError::Configuration(format!(
                    "speech.{name}.pitch must be in [0, 2], got {}",
                    p.pitch
                )));
            }
            if !(0.0..=1.0).contains(&p.volume) {
                return Err(TeachError::Configuration(format!(
                    "speech.{name}.volume must be in [0, 1], got {}",
                    p.volume
                )));
            }
        }

        for pair in ladder.windows(2) {
            let (lo_name, lo) = pair[0];
            let (hi_name, hi) = pair[1];
            if lo.rate >= hi.rate || lo.pitch > hi.pitch || lo.volume > hi.volume {
                return Err(TeachError::Configuration(format!(
                    "speech.{lo_name} must be slower and softer than speech.{hi_name}"
                )));
            }
        }
        Ok(())
    }
}

/// Voice-command recognition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub language: String,
    /// Start listening as soon as the session loop starts.
    pub listen_on_start: bool,
    /// Consecutive failed restarts before the listener gives up.
    pub max_restart_attempts: u32,
    pub restart_backoff_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            listen_on_start: false,
            max_restart_attempts: 5,
            restart_backoff_ms: 250,
        }
    }
}

impl VoiceConfig {
    #[inline]
    pub fn restart_backoff(&self) -> Duration {
        Duration::from_millis(self.restart_backoff_ms)
    }
}

impl TeacherConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, TeachError> {
        let config: Self = toml::from_str(source)
            .map_err(|e| TeachError::Configuration(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TeachError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            TeachError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Validate ranges and curriculum content.
    pub fn validate(&self) -> Result<(), TeachError> {
        if self.serial.baud_rate == 0 {
            return Err(TeachError::Configuration(
                "serial.baud_rate must be greater than 0".to_string(),
            ));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(TeachError::Configuration(
                "serial.read_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.timing.settle_delay_ms == 0 {
            return Err(TeachError::Configuration(
                "timing.settle_delay_ms must be greater than 0".to_string(),
            ));
        }

        let curriculum = &self.curriculum;
        if curriculum.words.is_empty() {
            return Err(TeachError::Configuration(
                "curriculum.words cannot be empty".to_string(),
            ));
        }
        if let Some(word) = curriculum
            .words
            .iter()
            .find(|w| w.is_empty() || !w.chars().all(|c| c.is_ascii_lowercase()))
        {
            return Err(TeachError::Configuration(format!(
                "curriculum word {word:?} must be non-empty lowercase a-z"
            )));
        }
        if curriculum.mastery_threshold == 0 {
            return Err(TeachError::Configuration(
                "curriculum.mastery_threshold must be at least 1".to_string(),
            ));
        }
        if curriculum.history_capacity == 0 || curriculum.focus_limit == 0 {
            return Err(TeachError::Configuration(
                "curriculum.history_capacity and focus_limit must be at least 1".to_string(),
            ));
        }

        self.speech.validate()?;

        if self.voice.language.trim().is_empty() {
            return Err(TeachError::Configuration(
                "voice.language cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Use a specific serial device path.
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.serial.port = Some(port.into());
        self
    }

    /// Replace the practice word list.
    pub fn with_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.curriculum.words = words.into_iter().map(Into::into).collect();
        self
    }

    /// Set the mastery threshold.
    pub fn with_mastery_threshold(mut self, threshold: u32) -> Self {
        self.curriculum.mastery_threshold = threshold;
        self
    }

    /// Set the settle delay between judging and re-prompting.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.timing.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Enable or disable the finger-mapping introduction.
    pub fn with_introduction(mut self, enabled: bool) -> Self {
        self.curriculum.introduction = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        TeacherConfig::default()
            .validate()
            .expect("default config must be valid");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = TeacherConfig::from_toml_str(
            r#"
            [serial]
            port = "/dev/ttyACM0"

            [curriculum]
            words = ["dog", "fish"]
            mastery_threshold = 3
            "#,
        )
        .expect("valid config");

        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.curriculum.words, vec!["dog", "fish"]);
        assert_eq!(config.curriculum.mastery_threshold, 3);
        assert_eq!(config.curriculum.history_capacity, 5);
        assert_eq!(config.timing.settle_delay(), Duration::from_millis(1200));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("waive.toml");
        std::fs::write(
            &path,
            "[timing]\nsettle_delay_ms = 800\n\n[voice]\nlisten_on_start = true\n",
        )
        .expect("Failed to write config");

        let config = TeacherConfig::from_file(&path).expect("Failed to load config");
        assert_eq!(config.timing.settle_delay(), Duration::from_millis(800));
        assert!(config.voice.listen_on_start);

        let missing = TeacherConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(TeachError::Configuration(_))));
    }

    #[test]
    fn rejects_words_outside_alphabet() {
        let err = TeacherConfig::default()
            .with_words(["Cat"])
            .validate()
            .expect_err("uppercase word must be rejected");
        assert!(matches!(err, TeachError::Configuration(_)));
    }

    #[test]
    fn rejects_unordered_prosody() {
        let mut config = TeacherConfig::default();
        config.speech.gentle = Prosody::new(1.5, 0.8, 0.8);
        assert!(config.validate().is_err());
    }

    #[test]
    fn presets_are_ordered_gentle_to_excited() {
        let speech = SpeechConfig::default();
        let rates: Vec<f32> = [
            Emphasis::Gentle,
            Emphasis::Encouraging,
            Emphasis::Normal,
            Emphasis::Excited,
        ]
        .into_iter()
        .map(|e| speech.prosody(e).rate)
        .collect();
        assert!(rates.windows(2).all(|w| w[0] < w[1]));
    }
}
