//! Session state for the Lyra front-end
//!
//! The controller owns the user's input and the status of the current
//! request. It is the only thing that mutates either. The state sits behind a
//! mutex so a renderer can read `Loading` while a request is in flight.

use futures::FutureExt;
use parking_lot::Mutex;
use providers::PromptOptimizer;
use shared::attachment::{AttachError, Attachment, AttachmentKind, SessionInput};
use shared::output::{is_error_text, parse_output, ParsedOutput};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

pub const VALIDATION_MESSAGE: &str = "Please provide some input before optimizing.";
const UNEXPECTED_FAILURE_PREFIX: &str = "Failed to get response from AI:";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Idle,
    Loading,
    /// Raw model text, parsed when rendered.
    Success(String),
    Error(String),
}

impl SessionStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionStatus::Loading)
    }

    pub fn raw_output(&self) -> Option<&str> {
        match self {
            SessionStatus::Success(raw) => Some(raw),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionStatus::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("an optimization request is already in progress")]
    InFlight,
    #[error("Please provide some input before optimizing.")]
    EmptyInput,
}

#[derive(Debug, Default)]
struct Session {
    input: SessionInput,
    status: SessionStatus,
}

/// Session input from raw text and the optional file for each slot.
pub fn build_input(
    text: impl Into<String>,
    files: impl IntoIterator<Item = (AttachmentKind, Option<PathBuf>)>,
) -> Result<SessionInput, AttachError> {
    let mut input = SessionInput::new(text);
    for (kind, path) in files {
        if let Some(path) = path {
            input.set_attachment(kind, Some(Attachment::for_slot(kind, path)?));
        }
    }
    Ok(input)
}

/// The status a submit of `input` ends in without contacting the model, if any.
pub fn validate_input(input: &SessionInput) -> Option<SessionStatus> {
    if input.has_content() {
        None
    } else {
        Some(SessionStatus::Error(VALIDATION_MESSAGE.to_string()))
    }
}

pub struct SessionController<O> {
    optimizer: O,
    session: Mutex<Session>,
}

impl<O: PromptOptimizer> SessionController<O> {
    pub fn new(optimizer: O) -> Self {
        Self {
            optimizer,
            session: Mutex::new(Session::default()),
        }
    }

    pub fn with_input(optimizer: O, input: SessionInput) -> Self {
        Self {
            optimizer,
            session: Mutex::new(Session {
                input,
                status: SessionStatus::Idle,
            }),
        }
    }

    pub fn input(&self) -> SessionInput {
        self.session.lock().input.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.session.lock().status.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.session.lock().status.is_loading()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.session.lock().input.text = text.into();
    }

    /// Put a file in the `kind` slot, replacing any previous one.
    pub fn attach(&self, kind: AttachmentKind, path: impl Into<PathBuf>) -> Result<(), AttachError> {
        let attachment = Attachment::for_slot(kind, path)?;
        tracing::debug!(%kind, file = %attachment.file_name(), mime_type = %attachment.mime_type, "attached file");
        self.session.lock().input.set_attachment(kind, Some(attachment));
        Ok(())
    }

    pub fn detach(&self, kind: AttachmentKind) {
        self.session.lock().input.set_attachment(kind, None);
    }

    /// Whether the submit action should be enabled.
    pub fn can_submit(&self) -> bool {
        let s = self.session.lock();
        s.input.has_content() && !s.status.is_loading()
    }

    /// Sections of the last successful response, if it follows the format.
    pub fn parsed_output(&self) -> Option<ParsedOutput> {
        self.session
            .lock()
            .status
            .raw_output()
            .and_then(parse_output)
    }

    /// Send the current input to the optimizer and record the outcome.
    ///
    /// Rejected while another request is loading, or when there is neither
    /// text nor a file (the status then carries the validation message).
    pub async fn submit(&self) -> Result<SessionStatus, SubmitError> {
        let input = {
            let mut s = self.session.lock();
            if s.status.is_loading() {
                tracing::warn!("submit ignored: request already in flight");
                return Err(SubmitError::InFlight);
            }
            if let Some(rejected) = validate_input(&s.input) {
                s.status = rejected;
                return Err(SubmitError::EmptyInput);
            }
            s.status = SessionStatus::Loading;
            s.input.clone()
        };
        let attachments = input.attachments().count();
        tracing::info!(text_chars = input.text.len(), attachments, "optimizing prompt");

        let guard = LoadingGuard {
            session: &self.session,
        };
        let outcome = AssertUnwindSafe(self.optimizer.optimize(&input))
            .catch_unwind()
            .await;

        let status = match outcome {
            Ok(Ok(text)) if is_error_text(&text) => SessionStatus::Error(text),
            Ok(Ok(text)) => SessionStatus::Success(text),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "optimization failed");
                SessionStatus::Error(e.user_message())
            }
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                tracing::error!(error = %msg, "optimizer panicked");
                SessionStatus::Error(format!("{} {}", UNEXPECTED_FAILURE_PREFIX, msg))
            }
        };
        if let SessionStatus::Success(_) = status {
            tracing::info!("optimization complete");
        }
        guard.settle(status.clone());
        Ok(status)
    }
}

/// Leaves `Loading` when dropped, even if the submit future is dropped mid-request.
struct LoadingGuard<'a> {
    session: &'a Mutex<Session>,
}

impl LoadingGuard<'_> {
    fn settle(self, status: SessionStatus) {
        self.session.lock().status = status;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut s = self.session.lock();
        if s.status.is_loading() {
            s.status = SessionStatus::Idle;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "An unexpected error occurred.".to_string()
    }
}
