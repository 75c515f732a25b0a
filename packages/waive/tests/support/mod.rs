//! Test doubles for the glove, the synthesizer and the recognizer.
#![allow(dead_code)]

use std::future::Future;
use std::io::{self, Read, Write};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::UnboundedReceiverStream;
use waive::config::SerialConfig;
use waive::domain::{Prosody, SessionSnapshot, TeachError};
use waive::{
    RecognitionEngine, RecognitionEvent, RecognitionStream, SerialBackend, SerialLink,
    SpeechEngine, TeacherConfig,
};

pub const WAIT: Duration = Duration::from_secs(5);

/// Config with short real-time delays and no introduction.
pub fn fast_config() -> TeacherConfig {
    let mut config = TeacherConfig::default()
        .with_settle_delay(Duration::from_millis(60))
        .with_introduction(false);
    config.timing.haptic_finger_gap_ms = 1;
    config.timing.intro_finger_gap_ms = 1;
    config.voice.restart_backoff_ms = 5;
    config
}

/* ───────────────────────────── glove ───────────────────────────── */

/// Scripted glove. Each `open` creates a fresh line the test can write to.
#[derive(Clone, Default)]
pub struct FakeGlove {
    line: Arc<Mutex<Option<std_mpsc::Sender<Vec<u8>>>>>,
    cues: Arc<Mutex<Vec<u8>>>,
    opens: Arc<Mutex<u32>>,
    failures_left: Arc<Mutex<u32>>,
}

impl FakeGlove {
    /// Glove whose first `n` opens fail with a connection error.
    pub fn failing(n: u32) -> Self {
        let glove = Self::default();
        *glove.failures_left.lock() = n;
        glove
    }

    pub fn backend(&self) -> Arc<dyn SerialBackend> {
        Arc::new(self.clone())
    }

    /// Send one newline-terminated token.
    pub fn send(&self, token: &str) {
        self.send_raw(format!("{token}\n").as_bytes());
    }

    pub fn send_raw(&self, bytes: &[u8]) {
        if let Some(line) = self.line.lock().as_ref() {
            // The reader is gone once the session disconnects
            let _ = line.send(bytes.to_vec());
        }
    }

    /// Simulate the device going away.
    pub fn unplug(&self) {
        self.line.lock().take();
    }

    /// Haptic cue bytes written so far, as text.
    pub fn cues(&self) -> String {
        String::from_utf8_lossy(&self.cues.lock()).into_owned()
    }

    pub fn opens(&self) -> u32 {
        *self.opens.lock()
    }
}

impl SerialBackend for FakeGlove {
    fn open(&self, _config: &SerialConfig) -> Result<SerialLink, TeachError> {
        {
            let mut failures = self.failures_left.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(TeachError::Connection("permission denied".to_string()));
            }
        }
        let (tx, rx) = std_mpsc::channel();
        *self.line.lock() = Some(tx);
        *self.opens.lock() += 1;
        Ok(SerialLink {
            name: "fake-glove".to_string(),
            reader: Box::new(LineReader {
                rx,
                pending: Vec::new(),
            }),
            writer: Box::new(CueWriter(Arc::clone(&self.cues))),
        })
    }
}

struct LineReader {
    rx: std_mpsc::Receiver<Vec<u8>>,
    pending: Vec<u8>,
}

impl Read for LineReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.rx.recv_timeout(Duration::from_millis(10)) {
                Ok(bytes) => self.pending = bytes,
                Err(std_mpsc::RecvTimeoutError::Timeout) => {
                    return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
                }
                Err(std_mpsc::RecvTimeoutError::Disconnected) => return Ok(0),
            }
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

struct CueWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CueWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/* ───────────────────────────── speech ───────────────────────────── */

/// Synthesizer that records every line and finishes instantly.
#[derive(Default)]
pub struct RecordingSpeech {
    lines: Mutex<Vec<(String, Prosody)>>,
}

impl RecordingSpeech {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn prosody_of(&self, needle: &str) -> Option<Prosody> {
        self.lines
            .lock()
            .iter()
            .rev()
            .find(|(t, _)| t.contains(needle))
            .map(|(_, p)| *p)
    }

    pub fn count(&self, needle: &str) -> usize {
        self.lines
            .lock()
            .iter()
            .filter(|(t, _)| t.contains(needle))
            .count()
    }

    /// Wait until some spoken line contains `needle`.
    pub async fn heard(&self, needle: &str) -> String {
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            if let Some(line) = self.lines().into_iter().find(|l| l.contains(needle)) {
                return line;
            }
            if tokio::time::Instant::now() > deadline {
                panic!("never heard {needle:?}; heard {:#?}", self.lines());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl SpeechEngine for RecordingSpeech {
    fn speak(
        &self,
        text: &str,
        prosody: Prosody,
    ) -> Pin<Box<dyn Future<Output = Result<(), TeachError>> + Send + '_>> {
        self.lines.lock().push((text.to_string(), prosody));
        Box::pin(async { Ok(()) })
    }

    fn cancel(&self) {}
}

/* ───────────────────────────── recognition ───────────────────────────── */

/// Recognizer driven by the test through [`emit`](Self::emit).
#[derive(Default)]
pub struct ScriptedRecognizer {
    current: Mutex<Option<mpsc::UnboundedSender<RecognitionEvent>>>,
    failing_starts: Mutex<u32>,
    starts: Mutex<u32>,
    stops: Mutex<u32>,
}

impl ScriptedRecognizer {
    pub fn emit(&self, event: RecognitionEvent) {
        if let Some(tx) = self.current.lock().as_ref() {
            let _ = tx.send(event);
        }
    }

    pub fn say(&self, text: &str) {
        self.emit(RecognitionEvent::Transcript {
            text: text.to_string(),
            is_final: true,
        });
    }

    /// Make the next `n` starts fail.
    pub fn fail_next_starts(&self, n: u32) {
        *self.failing_starts.lock() = n;
    }

    pub fn starts(&self) -> u32 {
        *self.starts.lock()
    }

    pub fn stops(&self) -> u32 {
        *self.stops.lock()
    }

    /// Wait until the engine has been started `n` times.
    pub async fn started(&self, n: u32) {
        let deadline = tokio::time::Instant::now() + WAIT;
        while self.starts() < n {
            if tokio::time::Instant::now() > deadline {
                panic!("recognizer started {} times, wanted {n}", self.starts());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl RecognitionEngine for ScriptedRecognizer {
    fn start(
        &self,
        _language: &str,
    ) -> Pin<Box<dyn Future<Output = Result<RecognitionStream, TeachError>> + Send + '_>> {
        *self.starts.lock() += 1;
        {
            let mut failing = self.failing_starts.lock();
            if *failing > 0 {
                *failing -= 1;
                self.current.lock().take();
                return Box::pin(async {
                    Err(TeachError::Recognition("audio-capture".to_string()))
                });
            }
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.current.lock() = Some(tx);
        Box::pin(async move { Ok(Box::pin(UnboundedReceiverStream::new(rx)) as RecognitionStream) })
    }

    fn stop(&self) {
        self.current.lock().take();
        *self.stops.lock() += 1;
    }
}

/* ───────────────────────────── snapshots ───────────────────────────── */

/// Wait for a snapshot satisfying `predicate`.
pub async fn wait_for<F>(rx: &mut watch::Receiver<SessionSnapshot>, predicate: F) -> SessionSnapshot
where
    F: FnMut(&SessionSnapshot) -> bool,
{
    tokio::time::timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("Timed out waiting for snapshot")
        .expect("Session dropped its snapshot sender")
        .clone()
}

/// Current prompt letter, if any.
pub fn prompt_letter(snapshot: &SessionSnapshot) -> Option<char> {
    snapshot.prompt.as_ref().map(|p| p.letter)
}
