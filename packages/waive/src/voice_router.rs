//! Hands-free commands: phrase routing and a self-restarting listener.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::Stream;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use waive_domain::TeachError;

use crate::config::VoiceConfig;

/// Why the recognizer reported an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionFault {
    /// Microphone permission was refused.
    NotAllowed,
    Other(String),
}

/// Output of a recognition session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Transcript { text: String, is_final: bool },
    Error(RecognitionFault),
    /// The engine stopped on its own.
    Ended,
}

pub type RecognitionStream = Pin<Box<dyn Stream<Item = RecognitionEvent> + Send>>;

/// Continuous speech recognizer.
pub trait RecognitionEngine: Send + Sync {
    /// Begin a recognition session.
    fn start(
        &self,
        language: &str,
    ) -> Pin<Box<dyn Future<Output = Result<RecognitionStream, TeachError>> + Send + '_>>;

    /// Stop recognition and release the microphone.
    fn stop(&self);
}

type Action = Arc<dyn Fn() + Send + Sync>;

struct Intent {
    name: String,
    phrases: Vec<String>,
    action: Action,
}

/// Maps final transcripts to registered intents.
///
/// Phrases match by substring; the first intent in registration order wins.
#[derive(Default)]
pub struct VoiceCommandRouter {
    intents: Vec<Intent>,
}

impl std::fmt::Debug for VoiceCommandRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.intents.iter().map(|i| &i.name))
            .finish()
    }
}

impl VoiceCommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<I, S, F>(&mut self, name: impl Into<String>, phrases: I, action: F) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn() + Send + Sync + 'static,
    {
        self.intents.push(Intent {
            name: name.into(),
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            action: Arc::new(action),
        });
        self
    }

    /// Registered intent names in priority order.
    pub fn intents(&self) -> impl Iterator<Item = &str> {
        self.intents.iter().map(|i| i.name.as_str())
    }

    /// Run the first matching intent. Returns its name.
    pub fn process_transcript(&self, text: &str) -> Option<&str> {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        let intent = self
            .intents
            .iter()
            .find(|i| i.phrases.iter().any(|p| normalized.contains(p.as_str())))?;
        debug!(intent = %intent.name, transcript = %normalized, "Voice command matched");
        (intent.action)();
        Some(intent.name.as_str())
    }

    /// Route a recognition event. Only final transcripts are acted on.
    pub fn handle(&self, event: &RecognitionEvent) -> Option<&str> {
        match event {
            RecognitionEvent::Transcript {
                text,
                is_final: true,
            } => self.process_transcript(text),
            _ => None,
        }
    }
}

/// Listener state changes the session reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerNotice {
    PermissionDenied,
    /// A new recognition session replaced one that ended.
    Restarted,
    /// Restarts kept failing; listening is off.
    GaveUp,
}

/// Keeps a recognition session alive while listening is wanted.
pub struct VoiceListener {
    engine: Arc<dyn RecognitionEngine>,
    config: VoiceConfig,
    wanted: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for VoiceListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceListener")
            .field("listening", &self.is_listening())
            .finish()
    }
}

impl VoiceListener {
    pub fn new(engine: Arc<dyn RecognitionEngine>, config: VoiceConfig) -> Self {
        Self {
            engine,
            config,
            wanted: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.wanted.load(Ordering::Acquire) && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Start listening. Final transcripts go through `router`; notices go to `notify`.
    ///
    /// Returns `false` when already listening.
    #[instrument(skip_all)]
    pub fn start<N>(&mut self, router: Arc<VoiceCommandRouter>, notify: N) -> bool
    where
        N: Fn(ListenerNotice) + Send + Sync + 'static,
    {
        if self.is_listening() {
            return false;
        }
        self.stop_task();
        let wanted = Arc::new(AtomicBool::new(true));
        self.wanted = Arc::clone(&wanted);

        let engine = Arc::clone(&self.engine);
        let config = self.config.clone();
        info!(language = %config.language, "Voice listening started");
        self.task = Some(tokio::spawn(listen(engine, config, wanted, router, notify)));
        true
    }

    /// Stop the engine and the restart loop. Returns whether it was listening.
    #[instrument(skip_all)]
    pub fn stop(&mut self) -> bool {
        let was_listening = self.is_listening();
        if self.wanted.swap(false, Ordering::AcqRel) {
            info!("Voice listening stopped");
        }
        self.engine.stop();
        self.stop_task();
        was_listening
    }

    fn stop_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for VoiceListener {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.stop();
        }
    }
}

async fn listen<N>(
    engine: Arc<dyn RecognitionEngine>,
    config: VoiceConfig,
    wanted: Arc<AtomicBool>,
    router: Arc<VoiceCommandRouter>,
    notify: N,
) where
    N: Fn(ListenerNotice),
{
    // Failed starts and engine faults in a row; a clean end is not a failure
    let mut failures = 0u32;
    let mut restarting = false;

    while wanted.load(Ordering::Acquire) {
        let mut faulted = false;
        match engine.start(&config.language).await {
            Ok(mut stream) => {
                if restarting {
                    notify(ListenerNotice::Restarted);
                }
                while let Some(event) = stream.next().await {
                    match &event {
                        RecognitionEvent::Transcript { .. } => {
                            failures = 0;
                            router.handle(&event);
                        }
                        RecognitionEvent::Error(RecognitionFault::NotAllowed) => {
                            warn!("Microphone permission denied");
                            wanted.store(false, Ordering::Release);
                            notify(ListenerNotice::PermissionDenied);
                            return;
                        }
                        RecognitionEvent::Error(RecognitionFault::Other(reason)) => {
                            warn!("Recognition error: {reason}");
                            faulted = true;
                        }
                        RecognitionEvent::Ended => break,
                    }
                }
            }
            Err(e) => {
                warn!("Recognition failed to start: {e}");
                faulted = true;
            }
        }

        if !wanted.load(Ordering::Acquire) {
            break;
        }

        if faulted {
            failures += 1;
            if failures >= config.max_restart_attempts {
                error!(failures, "Recognition keeps failing, giving up");
                wanted.store(false, Ordering::Release);
                notify(ListenerNotice::GaveUp);
                return;
            }
        } else {
            failures = 0;
        }

        debug!("{}, restarting", TeachError::StaleRecognitionSession);
        restarting = true;
        tokio::time::sleep(config.restart_backoff()).await;
    }
}
