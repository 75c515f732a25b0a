//! # Waive
//!
//! Glove-driven teaching sessions for a six-finger fold alphabet. A
//! [`TeachingSession`] prompts for a letter, reads the learner's fold gesture
//! from a serial glove, judges it, speaks feedback, buzzes haptic cues and
//! walks through an A–Z or spelling curriculum while tracking statistics.
//!
//! ```no_run
//! use std::sync::Arc;
//! use waive::prelude::*;
//!
//! # async fn demo() -> Result<(), TeachError> {
//! waive::telemetry::init_tracing("waive=info")?;
//! let session = TeachingSession::builder()
//!     .config(TeacherConfig::from_file("waive.toml")?)
//!     .serial_backend(Arc::new(SystemSerialBackend))
//!     .build()?;
//! let (handle, _task) = session.spawn();
//! handle.connect()?;
//! # Ok(())
//! # }
//! ```

pub mod achievements;
pub mod attempt_tracker;
pub mod config;
pub mod export;
pub mod gesture_codec;
pub mod serial_channel;
pub mod session;
pub mod speech_feedback;
pub mod telemetry;
pub mod voice_router;

pub use waive_domain as domain;

pub use attempt_tracker::{AttemptTracker, Observation};
pub use config::TeacherConfig;
pub use export::ExportFormat;
pub use gesture_codec::{Gesture, GestureCodec};
#[cfg(feature = "serial")]
pub use serial_channel::SystemSerialBackend;
pub use serial_channel::{
    ChannelState, GloveWriter, SerialBackend, SerialChannel, SerialEvent, SerialLink,
    UnsupportedSerialBackend,
};
pub use session::{SessionHandle, TeachingSession};
pub use speech_feedback::{SilentSpeechEngine, SpeechEngine, SpeechFeedback};
pub use voice_router::{
    RecognitionEngine, RecognitionEvent, RecognitionFault, RecognitionStream,
    VoiceCommandRouter, VoiceListener,
};

/// Commonly used types.
pub mod prelude {
    #[cfg(feature = "serial")]
    pub use crate::SystemSerialBackend;
    pub use crate::{
        ExportFormat, SessionHandle, SpeechEngine, TeacherConfig, TeachingSession,
        UnsupportedSerialBackend,
    };
    pub use waive_domain::prelude::*;
}
