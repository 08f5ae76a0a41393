//! The ask cycle: one question in, one answer or error out.
//!
//! `Idle -> Sending -> {Success, ServerError, NetworkError} -> Idle`. While a
//! cycle is `Sending` the chat input and submit control are disabled, so the
//! log holds at most one placeholder at a time.

use tracing::{info, warn};

use crate::chat::{MessageId, MessageLog, Sender};
use crate::error::ClientError;
use crate::input::TextInput;

pub const PLACEHOLDER_TEXT: &str = "KMS TENESA is processing...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AskState {
    #[default]
    Idle,
    Sending { placeholder: MessageId },
}

/// A request ready to go out on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskRequest {
    pub question: String,
    pub platform: String,
}

/// How a settled ask cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    Success(String),
    ServerError(String),
    NetworkError(String),
}

impl AskOutcome {
    pub fn from_result(result: Result<String, ClientError>) -> Self {
        match result {
            Ok(answer) => AskOutcome::Success(answer),
            Err(err) if err.is_transport() => AskOutcome::NetworkError(err.to_string()),
            Err(err) => AskOutcome::ServerError(err.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, AskOutcome::Success(_))
    }

    pub fn text(&self) -> &str {
        match self {
            AskOutcome::Success(t) | AskOutcome::ServerError(t) | AskOutcome::NetworkError(t) => t,
        }
    }
}

#[derive(Debug, Default)]
pub struct AskCycle {
    state: AskState,
}

impl AskCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input and submit are usable only between cycles.
    pub fn controls_enabled(&self) -> bool {
        self.state == AskState::Idle
    }

    pub fn placeholder(&self) -> Option<MessageId> {
        match self.state {
            AskState::Sending { placeholder } => Some(placeholder),
            AskState::Idle => None,
        }
    }

    /// `Idle -> Sending`. Returns `None` (and touches nothing) when a cycle is
    /// already running or the trimmed input is empty.
    pub fn begin(&mut self, log: &mut MessageLog, input: &mut TextInput, platform: &str) -> Option<AskRequest> {
        if !self.controls_enabled() {
            return None;
        }

        let question = input.value().trim().to_string();
        if question.is_empty() {
            return None;
        }

        log.render(question.clone(), Sender::User, false);
        input.clear();
        let placeholder = log.render(PLACEHOLDER_TEXT, Sender::Assistant, false);
        self.state = AskState::Sending { placeholder };

        info!(platform, "sending question");
        Some(AskRequest {
            question,
            platform: platform.to_string(),
        })
    }

    /// `Sending -> terminal -> Idle`. Removes the placeholder, renders the
    /// outcome and re-enables the controls whatever the result was.
    pub fn finish(&mut self, log: &mut MessageLog, result: Result<String, ClientError>) -> AskOutcome {
        if let Some(placeholder) = self.placeholder() {
            log.remove(placeholder);
        }

        let outcome = AskOutcome::from_result(result);
        match &outcome {
            AskOutcome::Success(_) => info!("answer received"),
            AskOutcome::ServerError(e) => warn!(error = %e, "ask failed on the server"),
            AskOutcome::NetworkError(e) => warn!(error = %e, "ask failed to reach the server"),
        }

        log.render(outcome.text(), Sender::Assistant, outcome.is_error());
        self.state = AskState::Idle;
        outcome
    }
}
