//! Glove transport: open, haptic writes and the blocking read loop.
//!
//! Reads run on a dedicated OS thread because serial handles are blocking.
//! Tokens are handed to a callback; the caller decides how to forward them
//! (the session forwards them into its event channel).

use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};
use waive_domain::{FoldSet, TeachError};

use crate::config::SerialConfig;

/// Longest accepted frame; anything longer is dropped as line noise.
pub const MAX_FRAME_LEN: usize = 256;

/// An opened device split into independent read and write halves.
pub struct SerialLink {
    /// Human-readable port name for logs.
    pub name: String,
    pub reader: Box<dyn Read + Send>,
    pub writer: Box<dyn Write + Send>,
}

impl fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialLink").field("name", &self.name).finish()
    }
}

/// Capability that opens the glove.
pub trait SerialBackend: Send + Sync {
    /// Open the device. Permission or open failures map to [`TeachError::Connection`].
    fn open(&self, config: &SerialConfig) -> Result<SerialLink, TeachError>;
}

/// Host serial ports through the `serialport` crate.
#[cfg(feature = "serial")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSerialBackend;

#[cfg(feature = "serial")]
impl SystemSerialBackend {
    fn detect_port() -> Result<String, TeachError> {
        let ports = serialport::available_ports()
            .map_err(|e| TeachError::Connection(format!("cannot enumerate ports: {e}")))?;
        ports
            .into_iter()
            .next()
            .map(|p| p.port_name)
            .ok_or_else(|| TeachError::Connection("no serial ports found".to_string()))
    }
}

#[cfg(feature = "serial")]
impl SerialBackend for SystemSerialBackend {
    fn open(&self, config: &SerialConfig) -> Result<SerialLink, TeachError> {
        let path = match &config.port {
            Some(path) => path.clone(),
            None => {
                let detected = Self::detect_port()?;
                info!(port = %detected, "Auto-detected serial port");
                detected
            }
        };

        let port = serialport::new(&path, config.baud_rate)
            .timeout(config.read_timeout())
            .open()
            .map_err(|e| TeachError::Connection(format!("failed to open {path}: {e}")))?;
        let reader = port
            .try_clone()
            .map_err(|e| TeachError::Connection(format!("failed to clone {path}: {e}")))?;

        Ok(SerialLink {
            name: path,
            reader: Box::new(reader),
            writer: Box::new(port),
        })
    }
}

/// Backend for hosts without serial support. Every open fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSerialBackend;

impl SerialBackend for UnsupportedSerialBackend {
    fn open(&self, _config: &SerialConfig) -> Result<SerialLink, TeachError> {
        Err(TeachError::UnsupportedEnvironment("serial ports"))
    }
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Last connect or read failed; `connect()` may be retried.
    Error,
}

/// Delivered to the read-loop callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialEvent {
    /// One trimmed, non-empty frame.
    Token(String),
    /// The device went away without `disconnect()` being called.
    Closed { error: Option<String> },
}

/// Shared handle for haptic writes. Writes are best-effort.
#[derive(Clone, Default)]
pub struct GloveWriter {
    inner: Arc<Mutex<Option<Box<dyn Write + Send>>>>,
}

impl fmt::Debug for GloveWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GloveWriter")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl GloveWriter {
    fn attach(&self, writer: Box<dyn Write + Send>) {
        *self.inner.lock() = Some(writer);
    }

    fn detach(&self) {
        self.inner.lock().take();
    }

    pub fn is_attached(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Write and flush `bytes`. Failures are logged and returned, never panics.
    pub fn write(&self, bytes: &[u8]) -> Result<(), TeachError> {
        let mut guard = self.inner.lock();
        let Some(writer) = guard.as_mut() else {
            return Err(TeachError::TransportWrite("glove not connected".to_string()));
        };
        writer
            .write_all(bytes)
            .and_then(|()| writer.flush())
            .map_err(|e| {
                warn!("Haptic write failed: {e}");
                TeachError::TransportWrite(e.to_string())
            })
    }

    /// Buzz each finger of `folds` in glove order with `gap` between cues.
    pub async fn pulse(&self, folds: FoldSet, gap: Duration) -> Result<(), TeachError> {
        for (i, finger) in folds.fingers().enumerate() {
            if i > 0 {
                tokio::time::sleep(gap).await;
            }
            self.write(&[finger.cue_byte()])?;
        }
        Ok(())
    }
}

/// Owns one glove connection at a time.
pub struct SerialChannel {
    backend: Arc<dyn SerialBackend>,
    config: SerialConfig,
    state: Arc<Mutex<ChannelState>>,
    writer: GloveWriter,
    reader: Option<Box<dyn Read + Send>>,
    port_name: Option<String>,
    shutdown: Arc<AtomicBool>,
}

impl fmt::Debug for SerialChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialChannel")
            .field("state", &self.state())
            .field("port", &self.port_name)
            .finish()
    }
}

impl SerialChannel {
    pub fn new(backend: Arc<dyn SerialBackend>, config: SerialConfig) -> Self {
        Self {
            backend,
            config,
            state: Arc::new(Mutex::new(ChannelState::Disconnected)),
            writer: GloveWriter::default(),
            reader: None,
            port_name: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// Handle used for haptic cues. Stays valid across reconnects.
    pub fn writer(&self) -> GloveWriter {
        self.writer.clone()
    }

    /// Open the glove. An existing connection is closed first.
    #[instrument(skip(self), fields(port = ?self.config.port))]
    pub fn connect(&mut self) -> Result<String, TeachError> {
        if self.state() == ChannelState::Connected {
            self.disconnect();
        }
        *self.state.lock() = ChannelState::Connecting;

        match self.backend.open(&self.config) {
            Ok(link) => {
                info!(port = %link.name, baud = self.config.baud_rate, "Glove connected");
                self.writer.attach(link.writer);
                self.reader = Some(link.reader);
                self.port_name = Some(link.name.clone());
                self.shutdown = Arc::new(AtomicBool::new(false));
                *self.state.lock() = ChannelState::Connected;
                Ok(link.name)
            }
            Err(e) => {
                error!("Glove connection failed: {e}");
                *self.state.lock() = ChannelState::Error;
                Err(e)
            }
        }
    }

    /// Spawn the reader thread. Tokens and the final close go to `on_event`.
    #[instrument(skip(self, on_event))]
    pub fn start_read_loop<F>(&mut self, on_event: F) -> Result<(), TeachError>
    where
        F: FnMut(SerialEvent) + Send + 'static,
    {
        let reader = self.reader.take().ok_or_else(|| {
            TeachError::Connection("read loop needs an open connection".to_string())
        })?;
        let shutdown = Arc::clone(&self.shutdown);
        let state = Arc::clone(&self.state);
        let writer = self.writer.clone();

        std::thread::Builder::new()
            .name("glove-serial-reader".to_string())
            .spawn(move || read_loop(reader, shutdown, state, writer, on_event))
            .map_err(|e| TeachError::Connection(format!("failed to spawn reader thread: {e}")))?;
        Ok(())
    }

    /// Stop the read loop and release the device.
    #[instrument(skip(self))]
    pub fn disconnect(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.writer.detach();
        self.reader = None;
        if let Some(name) = self.port_name.take() {
            info!(port = %name, "Glove disconnected");
        }
        *self.state.lock() = ChannelState::Disconnected;
    }
}

impl Drop for SerialChannel {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

/* ───────────────────────────── reader thread ───────────────────────────── */

fn read_loop<F>(
    mut reader: Box<dyn Read + Send>,
    shutdown: Arc<AtomicBool>,
    state: Arc<Mutex<ChannelState>>,
    writer: GloveWriter,
    mut on_event: F,
) where
    F: FnMut(SerialEvent),
{
    debug!("Serial read loop started");
    let mut framer = LineFramer::default();
    let mut buf = [0u8; 64];

    let failure = loop {
        if shutdown.load(Ordering::Acquire) {
            break None;
        }
        match reader.read(&mut buf) {
            Ok(0) => break None,
            Ok(n) => {
                for token in framer.push(&buf[..n]) {
                    if shutdown.load(Ordering::Acquire) {
                        break;
                    }
                    on_event(SerialEvent::Token(token));
                }
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) => {}
            Err(e) => break Some(e.to_string()),
        }
    };

    if shutdown.load(Ordering::Acquire) {
        debug!("Serial read loop stopped on request");
        return;
    }

    writer.detach();
    match &failure {
        Some(e) => {
            error!("Serial read failed: {e}");
            *state.lock() = ChannelState::Error;
        }
        None => {
            info!("Glove closed the connection");
            *state.lock() = ChannelState::Disconnected;
        }
    }
    on_event(SerialEvent::Closed { error: failure });
}

/// Splits a byte stream on CR/LF into trimmed UTF-8 tokens.
#[derive(Debug, Default)]
struct LineFramer {
    partial: Vec<u8>,
    overflowed: bool,
}

impl LineFramer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut tokens = Vec::new();
        for &byte in bytes {
            if byte == b'\n' || byte == b'\r' {
                let frame = std::mem::take(&mut self.partial);
                if std::mem::take(&mut self.overflowed) {
                    continue;
                }
                match std::str::from_utf8(&frame) {
                    Ok(text) => {
                        let text = text.trim();
                        if !text.is_empty() {
                            tokens.push(text.to_string());
                        }
                    }
                    Err(_) => warn!(len = frame.len(), "Skipping non-UTF-8 serial frame"),
                }
            } else if self.overflowed {
                continue;
            } else if self.partial.len() >= MAX_FRAME_LEN {
                warn!("Skipping serial frame longer than {MAX_FRAME_LEN} bytes");
                self.partial.clear();
                self.overflowed = true;
            } else {
                self.partial.push(byte);
            }
        }
        tokens
    }
}
