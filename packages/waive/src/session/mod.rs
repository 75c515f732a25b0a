//! The teaching session: learner state, curricula, the re-prompt timer and the
//! controller that ties serial input, voice commands and feedback together.

pub mod commands;
pub mod controller;
pub mod curriculum;
pub mod prompt_timer;
pub mod state;

pub use commands::SessionCommand;
pub use controller::{SessionEvent, SessionHandle, TeachingSession, TeachingSessionBuilder};
pub use curriculum::{Advance, Curriculum, Target};
pub use state::SessionState;
