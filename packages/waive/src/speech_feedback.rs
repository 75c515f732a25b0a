//! Spoken feedback with emphasis presets and an at-most-one utterance rule.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};
use waive_domain::{Emphasis, FoldSet, Prosody, TeachError};

use crate::config::SpeechConfig;
use crate::serial_channel::GloveWriter;

/// Text-to-speech capability.
pub trait SpeechEngine: Send + Sync {
    /// Speak `text`, resolving when playback ends or fails.
    fn speak(
        &self,
        text: &str,
        prosody: Prosody,
    ) -> Pin<Box<dyn Future<Output = Result<(), TeachError>> + Send + '_>>;

    /// Stop whatever is playing.
    fn cancel(&self);

    /// `false` when the host has no synthesizer; speech becomes a no-op.
    fn is_available(&self) -> bool {
        true
    }
}

/// Engine for hosts without speech output. Every call resolves immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeechEngine;

impl SpeechEngine for SilentSpeechEngine {
    fn speak(
        &self,
        _text: &str,
        _prosody: Prosody,
    ) -> Pin<Box<dyn Future<Output = Result<(), TeachError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }

    fn cancel(&self) {}

    fn is_available(&self) -> bool {
        false
    }
}

/// A line handed to the engine. Await [`finished`](Self::finished) to wait for it.
#[derive(Debug)]
pub struct Utterance {
    handle: JoinHandle<Result<(), TeachError>>,
}

impl Utterance {
    /// Resolves when the line ends. A line cut off by a newer one counts as finished.
    pub async fn finished(self) -> Result<(), TeachError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(TeachError::Speech(format!("utterance task failed: {e}"))),
        }
    }
}

/// Sequences speech so lines never overlap.
pub struct SpeechFeedback {
    engine: Arc<dyn SpeechEngine>,
    presets: SpeechConfig,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl std::fmt::Debug for SpeechFeedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechFeedback")
            .field("available", &self.engine.is_available())
            .finish()
    }
}

impl SpeechFeedback {
    pub fn new(engine: Arc<dyn SpeechEngine>, presets: SpeechConfig) -> Self {
        if !engine.is_available() {
            debug!("{}", TeachError::UnsupportedEnvironment("speech synthesis"));
        }
        Self {
            engine,
            presets,
            in_flight: Mutex::new(None),
        }
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_available()
    }

    /// Start speaking `text`, cutting off any line still playing.
    pub fn say(&self, text: impl Into<String>, emphasis: Emphasis) -> Utterance {
        self.start(text.into(), emphasis, None)
    }

    /// Like [`say`](Self::say), then buzz `folds` on the glove once the line ends.
    pub fn say_with_haptics(
        &self,
        text: impl Into<String>,
        emphasis: Emphasis,
        folds: FoldSet,
        writer: GloveWriter,
        gap: Duration,
    ) -> Utterance {
        self.start(text.into(), emphasis, Some((folds, writer, gap)))
    }

    /// Speak and wait for the line to finish.
    pub async fn speak(&self, text: impl Into<String>, emphasis: Emphasis) -> Result<(), TeachError> {
        self.say(text, emphasis).finished().await
    }

    /// Silence the current line, if any.
    pub fn cancel(&self) {
        if let Some(current) = self.in_flight.lock().take() {
            if !current.is_finished() {
                current.abort();
                self.engine.cancel();
            }
        }
    }

    fn start(
        &self,
        text: String,
        emphasis: Emphasis,
        haptics: Option<(FoldSet, GloveWriter, Duration)>,
    ) -> Utterance {
        let mut in_flight = self.in_flight.lock();
        if let Some(previous) = in_flight.take() {
            if !previous.is_finished() {
                debug!("Cutting off previous utterance");
                previous.abort();
                self.engine.cancel();
            }
        }

        let engine = Arc::clone(&self.engine);
        let prosody = self.presets.prosody(emphasis);
        debug!(?emphasis, %text, "Speaking");

        let handle = tokio::spawn(async move {
            let spoken = engine.speak(&text, prosody).await;
            if let Err(e) = &spoken {
                warn!("Speech failed: {e}");
            }
            if let Some((folds, writer, gap)) = haptics {
                if let Err(e) = writer.pulse(folds, gap).await {
                    debug!("Haptic cue skipped: {e}");
                }
            }
            spoken
        });
        *in_flight = Some(handle.abort_handle());
        Utterance { handle }
    }
}
