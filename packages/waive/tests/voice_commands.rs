mod support;

use std::sync::Arc;
use std::time::Duration;

use support::{FakeGlove, RecordingSpeech, ScriptedRecognizer, fast_config, wait_for};
use tokio::sync::watch;
use waive::domain::{LearningMode, SessionPhase, SessionSnapshot};
use waive::{RecognitionEvent, RecognitionFault, SessionHandle, TeacherConfig, TeachingSession};

struct Rig {
    glove: FakeGlove,
    speech: Arc<RecordingSpeech>,
    recognizer: Arc<ScriptedRecognizer>,
    handle: SessionHandle,
    rx: watch::Receiver<SessionSnapshot>,
}

fn rig(config: TeacherConfig) -> Rig {
    let glove = FakeGlove::default();
    let speech = Arc::new(RecordingSpeech::default());
    let recognizer = Arc::new(ScriptedRecognizer::default());
    let session = TeachingSession::builder()
        .config(config)
        .serial_backend(glove.backend())
        .speech_engine(speech.clone())
        .recognition_engine(recognizer.clone())
        .build()
        .expect("Failed to build session");
    let (handle, _task) = session.spawn();
    let rx = handle.subscribe();
    Rig {
        glove,
        speech,
        recognizer,
        handle,
        rx,
    }
}

async fn listening_rig() -> Rig {
    let mut rig = rig(fast_config());
    rig.handle.connect().expect("Failed to send connect");
    wait_for(&mut rig.rx, |s| s.phase == SessionPhase::Prompting).await;
    rig.handle
        .set_listening(true)
        .expect("Failed to enable listening");
    rig.recognizer.started(1).await;
    wait_for(&mut rig.rx, |s| s.voice_listening).await;
    rig.speech.heard("Voice commands activated.").await;
    rig
}

#[tokio::test]
async fn spoken_phrases_drive_the_session() {
    let mut rig = listening_rig().await;

    rig.recognizer.say("Switch to practice please");
    let snap = wait_for(&mut rig.rx, |s| s.mode == LearningMode::Practice).await;
    assert_eq!(
        snap.prompt.and_then(|p| p.word).as_deref(),
        Some("cat")
    );

    rig.recognizer.say("pause");
    wait_for(&mut rig.rx, |s| s.paused).await;
    rig.recognizer.say("okay continue");
    wait_for(&mut rig.rx, |s| !s.paused).await;
    rig.speech.heard("Resuming session. For cat, next is C.").await;
}

#[tokio::test]
async fn interim_transcripts_do_nothing() {
    let mut rig = listening_rig().await;

    rig.recognizer.emit(RecognitionEvent::Transcript {
        text: "skip".to_string(),
        is_final: false,
    });
    rig.recognizer.say("hint");
    rig.speech.heard("Hint: For A, fold 1.").await;

    let snap = wait_for(&mut rig.rx, |s| s.voice_listening).await;
    assert_eq!(snap.prompt.map(|p| p.letter), Some('a'));
    assert_eq!(rig.speech.count("Skipping"), 0);
}

#[tokio::test]
async fn progress_query_reports_accuracy_and_focus() {
    let mut rig = listening_rig().await;

    rig.glove.send("2");
    wait_for(&mut rig.rx, |s| s.total_inputs == 1).await;
    rig.glove.send("1");
    wait_for(&mut rig.rx, |s| s.total_inputs == 2).await;

    rig.recognizer.say("How am I doing?");
    let report = rig.speech.heard("Your current accuracy is").await;
    assert_eq!(
        report,
        "Your current accuracy is 50 percent. You might want to focus a little more on \
         letters like A. You're doing a great job!"
    );
}

#[tokio::test]
async fn ended_recognition_restarts() {
    let rig = listening_rig().await;

    rig.recognizer.emit(RecognitionEvent::Ended);
    rig.recognizer.started(2).await;

    rig.recognizer.say("repeat that");
    rig.speech
        .heard("Repeating the instruction. Next is A. Fold 1.")
        .await;
    assert!(rig.handle.snapshot().voice_listening);
}

#[tokio::test]
async fn denied_microphone_stops_listening() {
    let mut rig = listening_rig().await;

    rig.recognizer
        .emit(RecognitionEvent::Error(RecognitionFault::NotAllowed));
    rig.speech.heard("Microphone access denied.").await;
    wait_for(&mut rig.rx, |s| !s.voice_listening).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(rig.recognizer.starts(), 1);
}

#[tokio::test]
async fn silent_sessions_keep_listening() {
    let mut rig = listening_rig().await;

    // Well past the give-up limit
    for n in 1..=8 {
        rig.recognizer.emit(RecognitionEvent::Ended);
        rig.recognizer.started(n + 1).await;
    }

    rig.recognizer.say("hint");
    rig.speech.heard("Hint: For A, fold 1.").await;
    let snap = wait_for(&mut rig.rx, |s| s.voice_listening).await;
    assert!(snap.voice_listening);
    assert_eq!(rig.speech.count("Voice commands deactivated."), 0);
}

#[tokio::test]
async fn recognizer_that_keeps_failing_is_given_up() {
    let mut config = fast_config();
    config.voice.max_restart_attempts = 2;
    let mut rig = rig(config);

    rig.handle
        .set_listening(true)
        .expect("Failed to enable listening");
    rig.recognizer.started(1).await;
    rig.recognizer.fail_next_starts(2);
    rig.recognizer.emit(RecognitionEvent::Ended);

    wait_for(&mut rig.rx, |s| !s.voice_listening).await;
    tokio::time::timeout(support::WAIT, async {
        while rig.speech.count("Voice commands deactivated.") == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("give-up was not announced");
    assert_eq!(rig.recognizer.starts(), 3);
}

#[tokio::test]
async fn engine_faults_count_toward_giving_up() {
    let mut config = fast_config();
    config.voice.max_restart_attempts = 2;
    let mut rig = rig(config);

    rig.handle
        .set_listening(true)
        .expect("Failed to enable listening");
    for n in 1..=2 {
        rig.recognizer.started(n).await;
        rig.recognizer.emit(RecognitionEvent::Error(RecognitionFault::Other(
            "network".to_string(),
        )));
        rig.recognizer.emit(RecognitionEvent::Ended);
    }

    wait_for(&mut rig.rx, |s| !s.voice_listening).await;
    assert_eq!(rig.recognizer.starts(), 2);
}

#[tokio::test]
async fn enabling_twice_announces_once() {
    let rig = listening_rig().await;

    rig.handle
        .set_listening(true)
        .expect("Failed to enable listening");
    rig.handle.repeat().expect("Failed to send repeat");
    rig.speech.heard("Repeating the instruction.").await;

    assert_eq!(rig.speech.count("Voice commands activated."), 1);
    assert_eq!(rig.recognizer.starts(), 1);
    assert!(rig.handle.snapshot().voice_listening);
}

#[tokio::test]
async fn toggling_off_stops_the_engine() {
    let mut rig = listening_rig().await;

    rig.handle
        .toggle_listening()
        .expect("Failed to toggle listening");
    wait_for(&mut rig.rx, |s| !s.voice_listening).await;
    rig.speech.heard("Voice commands deactivated.").await;
    assert!(rig.recognizer.stops() >= 1);

    rig.recognizer.say("skip");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(rig.speech.count("Skipping"), 0);
}

#[tokio::test]
async fn listening_without_a_recognizer_is_unsupported() {
    let glove = FakeGlove::default();
    let speech = Arc::new(RecordingSpeech::default());
    let session = TeachingSession::builder()
        .config(fast_config())
        .serial_backend(glove.backend())
        .speech_engine(speech.clone())
        .build()
        .expect("Failed to build session");
    let (handle, _task) = session.spawn();

    handle
        .set_listening(true)
        .expect("Failed to enable listening");
    handle.repeat().expect("Failed to send repeat");
    speech.heard("Repeating the instruction.").await;
    assert!(!handle.snapshot().voice_listening);
    assert_eq!(speech.count("Voice commands activated."), 0);
}
