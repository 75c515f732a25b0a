//! The single pending re-prompt timer.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

use super::controller::SessionEvent;

/// What to do when the timer fires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingPrompt {
    /// Spoken before the prompt itself.
    pub preface: Option<String>,
}

/// At most one scheduled prompt. Scheduling or cancelling invalidates the
/// previous one, including a firing already queued on the event channel.
#[derive(Debug, Default)]
pub struct PromptTimer {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl PromptTimer {
    /// Deliver `pending` as [`SessionEvent::PromptDue`] after `delay`.
    pub fn schedule(
        &mut self,
        delay: Duration,
        pending: PendingPrompt,
        events: &UnboundedSender<SessionEvent>,
    ) {
        self.cancel();
        let generation = self.generation;
        let events = events.clone();
        trace!(generation, ?delay, "Prompt scheduled");
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(SessionEvent::PromptDue {
                generation,
                pending,
            });
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// `true` once for the firing that matches the live schedule.
    pub fn accept(&mut self, generation: u64) -> bool {
        if self.handle.is_some() && generation == self.generation {
            self.handle = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.is_some()
    }
}
