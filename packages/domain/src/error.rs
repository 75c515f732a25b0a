//! Unified error for every teaching component.
use thiserror::Error;

/// Top-level error covering device, speech and curriculum failures.
///
/// Transport and speech variants are contained at their component boundary:
/// the session controller logs or speaks them, it never bubbles them up.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TeachError {
    /// The glove could not be opened (permission denial, missing port, open failure).
    #[error("connection: {0}")]
    Connection(String),
    /// A haptic cue could not be written to the glove.
    #[error("transport write: {0}")]
    TransportWrite(String),
    /// Letter outside the supported alphabet.
    #[error("unknown letter: {0:?}")]
    UnknownLetter(char),
    /// Token from the device that does not describe a fold set.
    #[error("unrecognized gesture: {0:?}")]
    UnrecognizedGesture(String),
    /// Serial or speech capability missing on this host.
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(&'static str),
    /// Recognition engine ended while listening was still wanted.
    #[error("stale recognition session")]
    StaleRecognitionSession,
    /// Speech synthesis failure reason.
    #[error("speech: {0}")]
    Speech(String),
    /// Speech recognition failure reason.
    #[error("recognition: {0}")]
    Recognition(String),
    /// Configuration-related failure reason.
    #[error("configuration: {0}")]
    Configuration(String),
    /// Export formatting failure.
    #[error("export: {0}")]
    Export(String),
    /// The session loop is no longer receiving commands.
    #[error("session closed")]
    SessionClosed,
}
