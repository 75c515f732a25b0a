//! Teaching session state machine.
//!
//! All state lives on one task. Serial tokens, voice intents, caller commands
//! and settle timers all arrive as [`SessionEvent`]s on a single channel and
//! are handled in order, so no state is shared across threads.

use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};
use waive_domain::{
    Emphasis, FingerId, LearningMode, LetterMastery, MasteryStatus, PromptView, SessionPhase,
    SessionSnapshot, TeachError,
};

use super::commands::{SessionCommand, command_router};
use super::curriculum::{Advance, Curriculum, Target};
use super::prompt_timer::{PendingPrompt, PromptTimer};
use super::state::SessionState;
use crate::achievements::{AchievementBoard, AchievementStats};
use crate::attempt_tracker::{AttemptTracker, Observation};
use crate::config::TeacherConfig;
use crate::export::{ExportFormat, JsonExport, to_csv};
use crate::gesture_codec::{Gesture, GestureCodec};
use crate::serial_channel::{SerialBackend, SerialChannel, SerialEvent};
use crate::speech_feedback::{SilentSpeechEngine, SpeechEngine, SpeechFeedback};
use crate::voice_router::{ListenerNotice, RecognitionEngine, VoiceCommandRouter, VoiceListener};

/* ───────────────────────────── spoken lines ───────────────────────────── */

const GREETING: &str = "Device connected. Let's begin!";
const INTRO_WELCOME: &str = "Welcome to Waive! Let me introduce the finger mappings.";
const INTRO_DONE: &str = "Introduction complete. Let's begin!";
const CORRECT: &str = "Correct!";
const RETRY: &str = "Not quite. Let's try that letter again.";
const PAUSED: &str = "Session paused.";
const RESUMING: &str = "Resuming session.";
const REPEATING: &str = "Repeating the instruction.";
const SKIPPING: &str = "Skipping to the next one.";
const LEARNING_ONLY: &str = "This command is only available in learning mode.";
const VOICE_ON: &str = "Voice commands activated.";
const VOICE_OFF: &str = "Voice commands deactivated.";
const MIC_DENIED: &str =
    "Microphone access denied. Please enable microphone permissions to use voice commands.";
const CONNECT_FAILED: &str = "Could not connect to the glove. Please check the connection and try again.";
const DISCONNECTED: &str = "Device disconnected.";
const CONNECTION_LOST: &str = "Connection to the glove was lost. Please reconnect.";

/// Everything the session loop reacts to.
#[derive(Debug)]
pub enum SessionEvent {
    /// Output of the read loop for connection number `connection`.
    Serial { connection: u64, event: SerialEvent },
    Command(SessionCommand),
    /// A settle timer fired.
    PromptDue {
        generation: u64,
        pending: PendingPrompt,
    },
    IntroductionFinished { connection: u64 },
    Voice(ListenerNotice),
}

/// Cloneable front door for callers: commands in, snapshots out.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: UnboundedSender<SessionEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    fn send(&self, command: SessionCommand) -> Result<(), TeachError> {
        self.events
            .send(SessionEvent::Command(command))
            .map_err(|_| TeachError::SessionClosed)
    }

    pub fn connect(&self) -> Result<(), TeachError> {
        self.send(SessionCommand::Connect)
    }

    pub fn disconnect(&self) -> Result<(), TeachError> {
        self.send(SessionCommand::Disconnect)
    }

    pub fn switch_mode(&self, mode: LearningMode) -> Result<(), TeachError> {
        self.send(SessionCommand::SwitchMode(mode))
    }

    pub fn pause(&self) -> Result<(), TeachError> {
        self.send(SessionCommand::Pause)
    }

    pub fn resume(&self) -> Result<(), TeachError> {
        self.send(SessionCommand::Resume)
    }

    pub fn skip(&self) -> Result<(), TeachError> {
        self.send(SessionCommand::Skip)
    }

    pub fn hint(&self) -> Result<(), TeachError> {
        self.send(SessionCommand::Hint)
    }

    pub fn repeat(&self) -> Result<(), TeachError> {
        self.send(SessionCommand::Repeat)
    }

    pub fn query_progress(&self) -> Result<(), TeachError> {
        self.send(SessionCommand::ProgressQuery)
    }

    pub fn query_remaining(&self) -> Result<(), TeachError> {
        self.send(SessionCommand::Remaining)
    }

    pub fn set_listening(&self, listening: bool) -> Result<(), TeachError> {
        self.send(SessionCommand::SetListening(listening))
    }

    pub fn toggle_listening(&self) -> Result<(), TeachError> {
        self.send(SessionCommand::ToggleListening)
    }

    /// Stop the session loop. The handle is unusable afterwards.
    pub fn shutdown(&self) -> Result<(), TeachError> {
        self.send(SessionCommand::Shutdown)
    }

    /// Render the session in `format`.
    pub async fn export(&self, format: ExportFormat) -> Result<String, TeachError> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Export { format, reply })?;
        response.await.map_err(|_| TeachError::SessionClosed)?
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// Collaborators injected into a [`TeachingSession`].
#[derive(typed_builder::TypedBuilder)]
#[builder(
    builder_method(vis = ""),
    builder_type(name = TeachingSessionBuilder, vis = "pub"),
    build_method(into = Result<TeachingSession, TeachError>, vis = "pub")
)]
struct TeachingSessionParts {
    #[builder(default)]
    config: TeacherConfig,
    #[builder(default)]
    codec: GestureCodec,
    serial_backend: Arc<dyn SerialBackend>,
    #[builder(default = Arc::new(SilentSpeechEngine) as Arc<dyn SpeechEngine>)]
    speech_engine: Arc<dyn SpeechEngine>,
    #[builder(default, setter(strip_option))]
    recognition_engine: Option<Arc<dyn RecognitionEngine>>,
}

impl From<TeachingSessionParts> for Result<TeachingSession, TeachError> {
    fn from(parts: TeachingSessionParts) -> Self {
        let TeachingSessionParts {
            config,
            codec,
            serial_backend,
            speech_engine,
            recognition_engine,
        } = parts;

        config.validate()?;
        let curriculum = Curriculum::new(codec, config.curriculum.words.clone())?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());
        let router = Arc::new(command_router(events_tx.clone()));
        let listener = recognition_engine.map(|engine| VoiceListener::new(engine, config.voice.clone()));
        if listener.is_none() {
            debug!("{}", TeachError::UnsupportedEnvironment("speech recognition"));
        }

        Ok(TeachingSession {
            serial: SerialChannel::new(serial_backend, config.serial.clone()),
            speech: Arc::new(SpeechFeedback::new(speech_engine, config.speech.clone())),
            tracker: AttemptTracker::new(config.curriculum.history_capacity),
            achievements: AchievementBoard::default(),
            state: SessionState::default(),
            phase: SessionPhase::Idle,
            timer: PromptTimer::default(),
            introduction: None,
            last_gesture: None,
            connection: 0,
            started_at: None,
            config,
            curriculum,
            router,
            listener,
            events_tx,
            events_rx,
            snapshot_tx,
        })
    }
}

/// The teaching state machine. Build it, take a [`SessionHandle`], then `run` it.
pub struct TeachingSession {
    config: TeacherConfig,
    curriculum: Curriculum,
    state: SessionState,
    phase: SessionPhase,
    tracker: AttemptTracker,
    achievements: AchievementBoard,
    serial: SerialChannel,
    speech: Arc<SpeechFeedback>,
    listener: Option<VoiceListener>,
    router: Arc<VoiceCommandRouter>,
    timer: PromptTimer,
    introduction: Option<JoinHandle<()>>,
    /// Digits of the last judged gesture; cleared by a release frame.
    last_gesture: Option<String>,
    /// Bumped on every successful connect so stale reader output is dropped.
    connection: u64,
    started_at: Option<DateTime<Utc>>,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl std::fmt::Debug for TeachingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeachingSession")
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("serial", &self.serial)
            .finish_non_exhaustive()
    }
}

impl TeachingSession {
    pub fn builder() -> TeachingSessionBuilder {
        TeachingSessionParts::builder()
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            events: self.events_tx.clone(),
            snapshots: self.snapshot_tx.subscribe(),
        }
    }

    /// Run the loop on a new task.
    pub fn spawn(self) -> (SessionHandle, JoinHandle<()>) {
        let handle = self.handle();
        (handle, tokio::spawn(self.run()))
    }

    /// Process events until [`SessionHandle::shutdown`].
    #[instrument(skip_all)]
    pub async fn run(mut self) {
        info!("Teaching session started");
        if self.config.voice.listen_on_start {
            self.set_listening(true);
        }
        self.publish();

        while let Some(event) = self.events_rx.recv().await {
            if self.dispatch(event).is_break() {
                break;
            }
        }

        self.teardown();
        info!("Teaching session stopped");
    }

    fn dispatch(&mut self, event: SessionEvent) -> ControlFlow<()> {
        match event {
            SessionEvent::Serial { connection, event } => {
                if connection != self.connection {
                    trace!(connection, "Dropping output of a closed connection");
                } else {
                    match event {
                        SerialEvent::Token(token) => self.handle_gesture_input(&token),
                        SerialEvent::Closed { error } => self.connection_lost(error),
                    }
                }
            }
            SessionEvent::PromptDue {
                generation,
                pending,
            } => {
                if self.timer.accept(generation) {
                    self.next_prompt_with(pending.preface);
                }
            }
            SessionEvent::IntroductionFinished { connection } => {
                if connection == self.connection && self.phase == SessionPhase::Introducing {
                    self.introduction = None;
                    self.begin_teaching();
                }
            }
            SessionEvent::Voice(notice) => self.listener_notice(notice),
            SessionEvent::Command(command) => return self.command(command),
        }
        ControlFlow::Continue(())
    }

    fn command(&mut self, command: SessionCommand) -> ControlFlow<()> {
        let during_intro = self.phase == SessionPhase::Introducing;
        match command {
            SessionCommand::Connect => self.connect(),
            SessionCommand::Disconnect => self.disconnect(),
            SessionCommand::SetListening(on) => self.set_listening(on),
            SessionCommand::ToggleListening => {
                let on = !self.is_listening();
                self.set_listening(on);
            }
            SessionCommand::Export { format, reply } => {
                let _ = reply.send(self.export(format));
            }
            SessionCommand::Shutdown => return ControlFlow::Break(()),
            other if during_intro => {
                debug!(command = ?other, "Ignoring command during the introduction");
            }
            SessionCommand::SwitchMode(mode) => self.switch_mode(mode),
            SessionCommand::ProgressQuery => self.progress_query(),
            SessionCommand::Repeat => self.next_prompt_with(Some(REPEATING.to_string())),
            SessionCommand::Remaining => self.remaining_query(),
            SessionCommand::Hint => self.hint(),
            SessionCommand::Skip => self.skip(),
            SessionCommand::Pause => self.pause(),
            SessionCommand::Resume => self.resume(),
        }
        ControlFlow::Continue(())
    }

    /* ───────────────────────────── connection ───────────────────────────── */

    #[instrument(skip(self))]
    fn connect(&mut self) {
        if self.is_connected() {
            self.release_device();
        }

        if let Err(e) = self.serial.connect() {
            warn!("Connect failed: {e}");
            self.phase = SessionPhase::Idle;
            self.speech.say(CONNECT_FAILED, Emphasis::Gentle);
            self.publish();
            return;
        }

        self.connection += 1;
        let connection = self.connection;
        let events = self.events_tx.clone();
        let started = self.serial.start_read_loop(move |event| {
            let _ = events.send(SessionEvent::Serial { connection, event });
        });
        if let Err(e) = started {
            error!("Read loop failed to start: {e}");
            self.serial.disconnect();
            self.phase = SessionPhase::Idle;
            self.speech.say(CONNECT_FAILED, Emphasis::Gentle);
            self.publish();
            return;
        }

        self.state.restart();
        self.tracker.reset();
        self.achievements.reset();
        self.last_gesture = None;
        self.started_at = Some(Utc::now());

        if self.config.curriculum.introduction {
            self.phase = SessionPhase::Introducing;
            self.introduction = Some(self.spawn_introduction());
            self.publish();
        } else {
            self.begin_teaching();
        }
    }

    fn spawn_introduction(&self) -> JoinHandle<()> {
        let speech = Arc::clone(&self.speech);
        let writer = self.serial.writer();
        let gap = self.config.timing.intro_finger_gap();
        let events = self.events_tx.clone();
        let connection = self.connection;

        tokio::spawn(async move {
            let say = |text: String| {
                let speech = Arc::clone(&speech);
                async move {
                    if let Err(e) = speech.speak(text, Emphasis::Normal).await {
                        debug!("Introduction line not spoken: {e}");
                    }
                }
            };

            say(INTRO_WELCOME.to_string()).await;
            for finger in FingerId::ALL {
                say(format!("Finger {finger} is your {}.", finger.description())).await;
                if let Err(e) = writer.write(&[finger.cue_byte()]) {
                    debug!("Introduction cue skipped: {e}");
                }
                tokio::time::sleep(gap).await;
            }
            say(INTRO_DONE.to_string()).await;
            let _ = events.send(SessionEvent::IntroductionFinished { connection });
        })
    }

    fn begin_teaching(&mut self) {
        self.phase = SessionPhase::Prompting;
        self.next_prompt_with(Some(GREETING.to_string()));
    }

    #[instrument(skip(self))]
    fn disconnect(&mut self) {
        if !self.is_connected() {
            debug!("Disconnect requested without a device");
            return;
        }
        self.release_device();
        self.phase = SessionPhase::Disconnected;
        self.speech.say(DISCONNECTED, Emphasis::Normal);
        self.publish();
    }

    fn connection_lost(&mut self, error: Option<String>) {
        match &error {
            Some(e) => error!("Glove connection lost: {e}"),
            None => warn!("Glove closed the connection"),
        }
        self.release_device();
        self.phase = SessionPhase::Disconnected;
        self.speech.say(CONNECTION_LOST, Emphasis::Gentle);
        self.publish();
    }

    /// Stop reading, drop pending work and close the port.
    fn release_device(&mut self) {
        self.timer.cancel();
        if let Some(intro) = self.introduction.take() {
            intro.abort();
        }
        self.speech.cancel();
        self.serial.disconnect();
        self.connection += 1;
        self.last_gesture = None;
    }

    fn is_connected(&self) -> bool {
        !matches!(self.phase, SessionPhase::Idle | SessionPhase::Disconnected)
    }

    fn is_teaching(&self) -> bool {
        matches!(self.phase, SessionPhase::Prompting | SessionPhase::Judging)
    }

    /* ───────────────────────────── prompting ───────────────────────────── */

    /// Ask for the current target, speaking `preface` first.
    ///
    /// Without a device or while paused only the preface is spoken.
    fn next_prompt_with(&mut self, preface: Option<String>) {
        self.timer.cancel();

        if !self.is_teaching() || self.state.is_paused {
            if let Some(preface) = preface {
                self.speech.say(preface, Emphasis::Normal);
            }
            self.publish();
            return;
        }

        let target = match self.curriculum.target(&self.state) {
            Ok(target) => target,
            Err(e) => {
                error!("No prompt target: {e}");
                return;
            }
        };
        self.tracker.begin_attempt(target.letter);

        let upper = target.letter.to_ascii_uppercase();
        let folds = target.folds.spoken();
        let instruction = match &target.word {
            None => format!("Next is {upper}. Fold {folds}."),
            Some(word) => format!("For {word}, next is {upper}. Fold {folds}."),
        };
        let text = match preface {
            Some(preface) => format!("{preface} {instruction}"),
            None => instruction,
        };

        debug!(letter = %target.letter, word = ?target.word, "Prompting");
        self.speech.say_with_haptics(
            text,
            Emphasis::Normal,
            target.folds,
            self.serial.writer(),
            self.config.timing.haptic_finger_gap(),
        );
        self.phase = SessionPhase::Prompting;
        self.publish();
    }

    fn schedule_prompt(&mut self, preface: Option<String>) {
        self.timer.schedule(
            self.config.timing.settle_delay(),
            PendingPrompt { preface },
            &self.events_tx,
        );
    }

    /* ───────────────────────────── judging ───────────────────────────── */

    fn handle_gesture_input(&mut self, token: &str) {
        if !self.is_teaching() || self.state.is_paused {
            trace!(%token, phase = ?self.phase, "Gesture ignored");
            return;
        }

        let observed = match self.curriculum.codec().parse_gesture(token) {
            Ok(Gesture::Release) => {
                self.last_gesture = None;
                return;
            }
            Ok(Gesture::Folds(folds)) => folds,
            Err(e) => {
                debug!("Ignoring token: {e}");
                return;
            }
        };

        let digits = observed.to_digits();
        if self.last_gesture.as_deref() == Some(digits.as_str()) {
            trace!(%digits, "Debounced repeated gesture");
            return;
        }
        self.last_gesture = Some(digits);

        self.timer.cancel();

        let target = match self.curriculum.target(&self.state) {
            Ok(target) => target,
            Err(e) => {
                error!("No target to judge against: {e}");
                return;
            }
        };
        self.phase = SessionPhase::Judging;

        let is_correct = self.curriculum.codec().matches(target.folds, observed);
        let attempt = self.tracker.record_attempt(
            target.letter,
            is_correct,
            Observation {
                required: target.folds,
                observed,
                mode: self.state.mode,
            },
        );
        self.achievements.observe(&attempt);
        debug!(letter = %target.letter, %observed, is_correct, "Gesture judged");

        if is_correct {
            self.state.record_correct();
            self.correct_answer(&target);
        } else {
            self.state.record_incorrect();
            self.speech.say(RETRY, Emphasis::Gentle);
            self.schedule_prompt(None);
        }

        let stats = self.achievement_stats();
        self.achievements.evaluate(&stats);
        self.publish();
    }

    fn correct_answer(&mut self, target: &Target) {
        let attempts = self.tracker.letter_stat(target.letter).attempts;
        if self.state.mode == LearningMode::Learning
            && attempts <= self.config.curriculum.mastery_threshold
            && self.state.mastered_letters.insert(target.letter)
        {
            info!(letter = %target.letter, attempts, "Letter mastered");
        }

        match self.curriculum.advance(&mut self.state) {
            Advance::WordCompleted { word, next_word } => {
                self.state.words_completed += 1;
                self.speech
                    .say(format!("{CORRECT} Excellent! You spelled {word}."), Emphasis::Excited);
                self.schedule_prompt(Some(format!("Your next word is {next_word}.")));
            }
            Advance::NextLetter | Advance::NextInWord => {
                self.speech.say(CORRECT, Emphasis::Excited);
                self.schedule_prompt(None);
            }
        }
    }

    /* ───────────────────────────── commands ───────────────────────────── */

    #[instrument(skip(self))]
    fn switch_mode(&mut self, mode: LearningMode) {
        if mode == self.state.mode {
            self.speech
                .say(format!("You are already in {mode} mode."), Emphasis::Gentle);
            return;
        }
        info!(from = %self.state.mode, to = %mode, "Switching mode");
        self.state.mode = mode;
        self.state.reset_indices();
        self.last_gesture = None;
        self.next_prompt_with(Some(format!("Switching to {mode} mode.")));
    }

    fn progress_query(&mut self) {
        let mut report = format!(
            "Your current accuracy is {:.0} percent. ",
            self.state.accuracy_percent()
        );
        let focus = self.tracker.focus_areas(self.config.curriculum.focus_limit);
        if !focus.is_empty() {
            let letters: Vec<String> = focus
                .iter()
                .map(|f| f.letter.to_ascii_uppercase().to_string())
                .collect();
            report.push_str(&format!(
                "You might want to focus a little more on letters like {}. ",
                letters.join(", ")
            ));
        }
        report.push_str("You're doing a great job!");
        self.speech.say(report, Emphasis::Encouraging);
    }

    fn remaining_query(&mut self) {
        if self.state.mode != LearningMode::Learning {
            self.speech.say(LEARNING_ONLY, Emphasis::Gentle);
            return;
        }
        let remaining = self
            .curriculum
            .alphabet_len()
            .saturating_sub(self.state.mastered_letters.len());
        self.speech.say(
            format!("You have {remaining} letters left to master. Keep going!"),
            Emphasis::Encouraging,
        );
    }

    fn hint(&mut self) {
        if !self.is_connected() {
            debug!("Hint requested without a device");
            return;
        }
        match self.curriculum.target(&self.state) {
            Ok(target) => {
                self.speech.say_with_haptics(
                    format!(
                        "Hint: For {}, fold {}.",
                        target.letter.to_ascii_uppercase(),
                        target.folds.spoken()
                    ),
                    Emphasis::Normal,
                    target.folds,
                    self.serial.writer(),
                    self.config.timing.haptic_finger_gap(),
                );
            }
            Err(e) => error!("No hint target: {e}"),
        }
    }

    fn skip(&mut self) {
        let advance = self.curriculum.advance(&mut self.state);
        debug!(?advance, "Skipped");
        self.last_gesture = None;
        self.next_prompt_with(Some(SKIPPING.to_string()));
    }

    fn pause(&mut self) {
        self.state.is_paused = true;
        self.timer.cancel();
        self.speech.say(PAUSED, Emphasis::Normal);
        self.publish();
    }

    fn resume(&mut self) {
        self.state.is_paused = false;
        if self.phase == SessionPhase::Judging {
            self.phase = SessionPhase::Prompting;
        }
        self.next_prompt_with(Some(RESUMING.to_string()));
    }

    /* ───────────────────────────── voice ───────────────────────────── */

    fn is_listening(&self) -> bool {
        self.listener.as_ref().is_some_and(VoiceListener::is_listening)
    }

    #[instrument(skip(self))]
    fn set_listening(&mut self, on: bool) {
        let Some(listener) = self.listener.as_mut() else {
            warn!("{}", TeachError::UnsupportedEnvironment("speech recognition"));
            return;
        };

        let changed = if on {
            let events = self.events_tx.clone();
            listener.start(Arc::clone(&self.router), move |notice| {
                let _ = events.send(SessionEvent::Voice(notice));
            })
        } else {
            listener.stop()
        };
        if !changed {
            debug!(on, "Listening state unchanged");
            return;
        }
        self.speech
            .say(if on { VOICE_ON } else { VOICE_OFF }, Emphasis::Normal);
        self.publish();
    }

    fn listener_notice(&mut self, notice: ListenerNotice) {
        match notice {
            ListenerNotice::PermissionDenied => {
                if let Some(listener) = self.listener.as_mut() {
                    listener.stop();
                }
                self.speech.say(MIC_DENIED, Emphasis::Gentle);
            }
            ListenerNotice::GaveUp => {
                if let Some(listener) = self.listener.as_mut() {
                    listener.stop();
                }
                self.speech.say(VOICE_OFF, Emphasis::Gentle);
            }
            ListenerNotice::Restarted => debug!("Recognition session restarted"),
        }
        self.publish();
    }

    /* ───────────────────────────── reporting ───────────────────────────── */

    fn export(&self, format: ExportFormat) -> Result<String, TeachError> {
        match format {
            ExportFormat::Csv => to_csv(&self.tracker.export_rows()),
            ExportFormat::Json => JsonExport::collect(
                &self.tracker,
                &self.state,
                self.started_at.unwrap_or_else(Utc::now),
            )
            .to_pretty_string(),
        }
    }

    fn achievement_stats(&self) -> AchievementStats {
        AchievementStats {
            correct_inputs: self.state.correct_inputs,
            total_inputs: self.state.total_inputs,
            accuracy_percent: self.state.accuracy_percent(),
            mastered_letters: self.state.mastered_letters.len(),
            alphabet_len: self.curriculum.alphabet_len(),
            words_completed: self.state.words_completed,
        }
    }

    fn mastery_path(&self) -> Vec<LetterMastery> {
        let threshold = self.config.curriculum.mastery_threshold;
        let current = self.state.current_letter_index % self.curriculum.alphabet_len().max(1);
        self.curriculum
            .codec()
            .alphabet()
            .enumerate()
            .map(|(index, letter)| {
                let stat = self.tracker.letter_stat(letter);
                let status = if self.state.mode == LearningMode::Learning && index == current {
                    MasteryStatus::Current
                } else if self.state.mastered_letters.contains(&letter) {
                    MasteryStatus::Mastered
                } else if stat.attempts > threshold && stat.errors > 0 {
                    MasteryStatus::Difficult
                } else {
                    MasteryStatus::Pending
                };
                LetterMastery { letter, status }
            })
            .collect()
    }

    fn snapshot(&self) -> SessionSnapshot {
        let prompt = if self.is_connected() {
            self.curriculum
                .target(&self.state)
                .ok()
                .map(|target| PromptView {
                    letter: target.letter,
                    word: target.word,
                    folds: target.folds,
                })
        } else {
            None
        };
        let phase = if self.state.is_paused && self.is_teaching() {
            SessionPhase::Paused
        } else {
            self.phase
        };
        let stats = self.achievement_stats();

        SessionSnapshot {
            mode: self.state.mode,
            phase,
            prompt,
            paused: self.state.is_paused,
            voice_listening: self.is_listening(),
            session_elapsed_seconds: self.state.elapsed_seconds(),
            accuracy_percent: self.state.accuracy_percent(),
            total_inputs: self.state.total_inputs,
            correct_inputs: self.state.correct_inputs,
            current_streak: self.state.correct_streak,
            best_streak: self.state.best_streak,
            words_completed: self.state.words_completed,
            average_response_seconds: self.tracker.average_response_secs(),
            trend: self.tracker.trend(),
            mastery: self.mastery_path(),
            recent_attempts: self.tracker.recent().cloned().collect(),
            focus_areas: self.tracker.focus_areas(self.config.curriculum.focus_limit),
            achievements: self.achievements.progress(&stats),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn teardown(&mut self) {
        if self.is_connected() {
            self.release_device();
        }
        if let Some(listener) = self.listener.as_mut() {
            listener.stop();
        }
        self.speech.cancel();
        self.phase = SessionPhase::Disconnected;
        self.publish();
    }
}
