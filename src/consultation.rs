use crate::prompts::compose_prompt;
use crate::provider::CompletionGateway;
use crate::shared::logging::EventLog;
use crate::transcript::{Session, TranscriptStore, Turn};
use serde_json::Value;
use std::path::PathBuf;

pub const NEW_CONSULTATION_NOTICE: &str = "🆕 Nouvelle consultation démarrée.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    AwaitingCompletion,
    Error,
}

/// Rendering side of a consultation. The controller pushes every turn,
/// error and notice here as it happens.
pub trait ConsultationView {
    fn show_turn(&mut self, turn: &Turn);

    fn show_error(&mut self, message: &str);

    fn show_notice(&mut self, message: &str);

    fn state_changed(&mut self, _state: ControllerState) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Replied {
        reply: String,
        transcript: Option<PathBuf>,
    },
    Failed {
        error: String,
    },
    Ignored,
}

pub fn format_gateway_error(error: &str) -> String {
    format!("❌ Erreur : {error}")
}

/// Drives one consultation: owns the session transcript and the gateway,
/// runs exchanges synchronously and handles resets.
pub struct SessionController<G> {
    gateway: G,
    store: TranscriptStore,
    log: EventLog,
    state: ControllerState,
}

impl<G: CompletionGateway> SessionController<G> {
    pub fn new(gateway: G, store: TranscriptStore, log: EventLog) -> Self {
        log.info(
            "session.started",
            "consultation session started",
            &[
                (
                    "transcripts_dir",
                    Value::from(store.dir().display().to_string()),
                ),
                ("layout", Value::from(store.layout().as_str())),
            ],
        );
        Self {
            gateway,
            store,
            log,
            state: ControllerState::Idle,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn session(&self) -> &Session {
        self.store.session()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Runs one exchange. The user turn is recorded and shown before the
    /// gateway is called and stays in the session even if the call fails.
    pub fn submit(&mut self, text: &str, view: &mut dyn ConsultationView) -> ExchangeOutcome {
        if text.trim().is_empty() {
            return ExchangeOutcome::Ignored;
        }

        let user_turn = Turn::user(text);
        view.show_turn(&user_turn);
        self.store.append(user_turn);
        self.transition(ControllerState::AwaitingCompletion, view);

        let prompt = compose_prompt(text);
        match self.gateway.run(&prompt) {
            Ok(reply) => {
                let assistant_turn = Turn::assistant(reply.as_str());
                self.store.append(assistant_turn.clone());
                view.show_turn(&assistant_turn);
                self.log.info(
                    "exchange.completed",
                    "assistant reply received",
                    &[("turns", Value::from(self.session().len()))],
                );
                let transcript = self.persist_transcript(view);
                self.transition(ControllerState::Idle, view);
                ExchangeOutcome::Replied { reply, transcript }
            }
            Err(err) => {
                let error = err.to_string();
                self.transition(ControllerState::Error, view);
                self.log.error(
                    "exchange.failed",
                    &error,
                    &[("turns", Value::from(self.session().len()))],
                );
                view.show_error(&format_gateway_error(&error));
                self.transition(ControllerState::Idle, view);
                ExchangeOutcome::Failed { error }
            }
        }
    }

    /// Starts a new consultation: forgets gateway memory and the session.
    pub fn reset(&mut self, view: &mut dyn ConsultationView) {
        let dropped = self.session().len();
        self.gateway.clear();
        self.store.clear();
        self.log.info(
            "session.reset",
            "new consultation started",
            &[("dropped_turns", Value::from(dropped))],
        );
        view.show_notice(NEW_CONSULTATION_NOTICE);
        self.transition(ControllerState::Idle, view);
    }

    fn persist_transcript(&mut self, view: &mut dyn ConsultationView) -> Option<PathBuf> {
        match self.store.persist() {
            Ok(Some(path)) => {
                self.log.info(
                    "transcript.persisted",
                    "transcript saved",
                    &[
                        ("path", Value::from(path.display().to_string())),
                        ("turns", Value::from(self.session().len())),
                    ],
                );
                Some(path)
            }
            Ok(None) => None,
            Err(err) => {
                let message = err.to_string();
                self.log.warn("transcript.persist_failed", &message, &[]);
                view.show_notice(&format!("transcript not saved: {message}"));
                None
            }
        }
    }

    fn transition(&mut self, state: ControllerState, view: &mut dyn ConsultationView) {
        if self.state != state {
            self.state = state;
            view.state_changed(state);
        }
    }
}
