//! Session commands and the spoken phrases that trigger them.

use tokio::sync::{mpsc::UnboundedSender, oneshot};
use waive_domain::{LearningMode, TeachError};

use super::controller::SessionEvent;
use crate::export::ExportFormat;
use crate::voice_router::VoiceCommandRouter;

/// Everything a caller or a voice phrase can ask the session to do.
#[derive(Debug)]
pub enum SessionCommand {
    Connect,
    Disconnect,
    SwitchMode(LearningMode),
    ProgressQuery,
    Repeat,
    Remaining,
    Hint,
    Skip,
    Pause,
    Resume,
    SetListening(bool),
    ToggleListening,
    Export {
        format: ExportFormat,
        reply: oneshot::Sender<Result<String, TeachError>>,
    },
    Shutdown,
}

/// Phrase table in match priority order.
const VOICE_COMMANDS: &[(&str, &[&str])] = &[
    ("learning", &["learning"]),
    ("practice", &["practice"]),
    ("progress", &["accuracy", "how am i doing"]),
    ("repeat", &["repeat"]),
    ("remaining", &["remaining", "left"]),
    ("hint", &["hint"]),
    ("skip", &["skip"]),
    ("pause", &["pause"]),
    ("resume", &["resume", "continue"]),
];

fn command_for(intent: &str) -> Option<SessionCommand> {
    Some(match intent {
        "learning" => SessionCommand::SwitchMode(LearningMode::Learning),
        "practice" => SessionCommand::SwitchMode(LearningMode::Practice),
        "progress" => SessionCommand::ProgressQuery,
        "repeat" => SessionCommand::Repeat,
        "remaining" => SessionCommand::Remaining,
        "hint" => SessionCommand::Hint,
        "skip" => SessionCommand::Skip,
        "pause" => SessionCommand::Pause,
        "resume" => SessionCommand::Resume,
        _ => return None,
    })
}

/// Router whose intents post commands into the session event channel.
pub fn command_router(events: UnboundedSender<SessionEvent>) -> VoiceCommandRouter {
    let mut router = VoiceCommandRouter::new();
    for &(intent, phrases) in VOICE_COMMANDS {
        let events = events.clone();
        router.register(intent, phrases.iter().copied(), move || {
            if let Some(command) = command_for(intent) {
                let _ = events.send(SessionEvent::Command(command));
            }
        });
    }
    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn phrases_map_to_commands_in_priority_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let router = command_router(tx);
        let intents: Vec<&str> = router.intents().collect();
        assert_eq!(
            intents,
            vec![
                "learning", "practice", "progress", "repeat", "remaining", "hint", "skip",
                "pause", "resume"
            ]
        );

        assert_eq!(router.process_transcript("Continue please"), Some("resume"));
        assert_eq!(router.process_transcript("how many are left"), Some("remaining"));
        assert_eq!(router.process_transcript("switch to practice"), Some("practice"));

        let received: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| format!("{e:?}"))
            .collect();
        assert_eq!(received.len(), 3);
        assert!(received[0].contains("Resume"));
        assert!(received[1].contains("Remaining"));
        assert!(received[2].contains("Practice"));
    }
}
