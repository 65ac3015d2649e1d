//! The controller behind the "create exam" and "edit exam" screens
//!
//! Both screens share the same life cycle:
//! ```text
//! (edit only) Loading ──> Idle ──> Validating ──> Idle (field errors)
//!                                     │
//!                                     └──> Submitting ──> Idle (server errors)
//!                                                    └──> Left (navigate away)
//! ```
//! Errors only exist inside the `Idle` state, so that e.g. "loading with an error" cannot be represented.

use std::fmt::{Display, Formatter};

use crate::client::ExamClient;
use crate::exam::{AddExamRequest, DraftField, ExamDraft, ExamId, UpdateExamRequest};
use crate::gateway::GatewayError;
use crate::response::{self, error_messages};
use crate::traits::{SessionStore, Transport};
use crate::validation::{self, ExamErrors};

/// Where the front end should go next. History is always replaced, so that "back" does not return to the form
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Login,
    ExamList,
}

impl Navigation {
    pub fn path(&self) -> &'static str {
        match self {
            Navigation::Login => "/login",
            Navigation::ExamList => "/exams",
        }
    }
}

/// Whether a form creates a new exam, or edits an existing one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(ExamId),
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormState {
    /// Fetching the exam to edit
    Loading,
    /// Waiting for the user. Errors are the ones of the last submission attempt
    Idle { errors: ExamErrors, server_errors: Vec<String> },
    /// Checking the draft locally
    Validating,
    /// Waiting for the server
    Submitting,
    /// The exam to edit could not be fetched. There is no retry from this state
    LoadFailed(Vec<String>),
    /// The form has been left
    Left(Navigation),
}

impl FormState {
    fn idle() -> Self {
        FormState::Idle { errors: ExamErrors::new(), server_errors: Vec::new() }
    }

    pub fn is_idle(&self) -> bool {
        match self {
            FormState::Idle { .. } => true,
            _ => false,
        }
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::idle()
    }
}

impl Display for FormState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormState::Loading => write!(f, "Loading exam details..."),
            FormState::Idle { errors, server_errors } => {
                if errors.is_empty() && server_errors.is_empty() {
                    write!(f, "Ready")
                } else {
                    write!(f, "{} error(s)", errors.len() + server_errors.len())
                }
            },
            FormState::Validating => write!(f, "Checking..."),
            FormState::Submitting => write!(f, "Saving..."),
            FormState::LoadFailed(messages) => write!(f, "Unable to load the exam: {}", messages.join(", ")),
            FormState::Left(nav) => write!(f, "Leaving for {}", nav.path()),
        }
    }
}


/// See [`feedback_channel`]
pub type FormFeedbackSender = tokio::sync::watch::Sender<FormState>;
/// See [`feedback_channel`]
pub type FormFeedbackReceiver = tokio::sync::watch::Receiver<FormState>;

/// Create a feedback channel, that can be used to follow the state of a form (e.g. to disable a "save" button while submitting)
pub fn feedback_channel() -> (FormFeedbackSender, FormFeedbackReceiver) {
    tokio::sync::watch::channel(FormState::default())
}


/// An exam form, bound to a client
///
/// A form has at most one request in flight: [`Self::submit`] does nothing unless the form is idle.
pub struct ExamForm<'c, S, T>
where
    S: SessionStore,
    T: Transport,
{
    client: &'c ExamClient<S, T>,
    mode: FormMode,
    draft: ExamDraft,
    state: FormState,
    feedback: Option<FormFeedbackSender>,
}

impl<'c, S, T> ExamForm<'c, S, T>
where
    S: SessionStore,
    T: Transport,
{
    /// An empty form to create a new exam
    pub fn create(client: &'c ExamClient<S, T>) -> Self {
        Self::new(client, FormMode::Create, FormState::idle())
    }

    /// A form to edit an existing exam. Call [`Self::load`] before anything else
    pub fn edit(client: &'c ExamClient<S, T>, id: ExamId) -> Self {
        Self::new(client, FormMode::Edit(id), FormState::Loading)
    }

    fn new(client: &'c ExamClient<S, T>, mode: FormMode, state: FormState) -> Self {
        Self { client, mode, draft: ExamDraft::default(), state, feedback: None }
    }

    /// Publish every state change to this channel
    pub fn with_feedback(mut self, sender: FormFeedbackSender) -> Self {
        let _ = sender.send(self.state.clone());
        self.feedback = Some(sender);
        self
    }

    pub fn mode(&self) -> FormMode      { self.mode }
    pub fn draft(&self) -> &ExamDraft   { &self.draft }
    pub fn state(&self) -> &FormState   { &self.state }

    /// Whether the "save" action should be enabled
    pub fn can_submit(&self) -> bool {
        self.state.is_idle()
    }

    pub fn field_error(&self, field: DraftField) -> Option<&str> {
        match &self.state {
            FormState::Idle { errors, .. } => errors.get(field),
            _ => None,
        }
    }

    /// Messages to display above the form
    pub fn server_errors(&self) -> &[String] {
        match &self.state {
            FormState::Idle { server_errors, .. } => server_errors.as_slice(),
            FormState::LoadFailed(messages) => messages.as_slice(),
            _ => &[],
        }
    }

    fn transition(&mut self, new_state: FormState) {
        log::debug!("Exam form ({:?}): {} -> {}", self.mode, self.state, new_state);
        self.state = new_state;
        if let Some(sender) = &self.feedback {
            let _ = sender.send(self.state.clone());
        }
    }

    fn leave(&mut self, navigation: Navigation) -> Option<Navigation> {
        self.draft = ExamDraft::default();
        self.transition(FormState::Left(navigation));
        Some(navigation)
    }

    /// Fetch the exam being edited and fill the draft with it.
    ///
    /// Returns where to go instead, in case the user must log in again
    pub async fn load(&mut self) -> Option<Navigation> {
        let id = match (self.mode, &self.state) {
            (FormMode::Edit(id), FormState::Loading) => id,
            _ => return None,
        };

        match self.client.get_exam(id).await {
            Ok(exam) => {
                self.draft = ExamDraft::from_exam(&exam);
                self.transition(FormState::idle());
                None
            },
            Err(err) if err.requires_login() => self.leave(Navigation::Login),
            Err(err) => {
                log::warn!("Unable to load exam {}: {}", id, err);
                let messages = error_messages(&err, response::FETCH_EXAM_FALLBACK);
                self.transition(FormState::LoadFailed(messages));
                None
            },
        }
    }

    /// Change a field of the draft.
    ///
    /// This clears the error of this field, and every server error: errors only describe the last attempt
    pub fn set_field<V: ToString>(&mut self, field: DraftField, value: V) {
        let (mut errors, _) = match std::mem::take(&mut self.state) {
            FormState::Idle { errors, server_errors } => (errors, server_errors),
            other => {
                log::debug!("Ignoring an edit of {} while the form is not idle", field);
                self.state = other;
                return;
            },
        };

        self.draft.set(field, value.to_string());
        errors.remove(field);
        self.transition(FormState::Idle { errors, server_errors: Vec::new() });
    }

    /// Validate the draft, and send it to the server if it is valid.
    ///
    /// Returns where to go next in case the form has been left, or `None` if the user stays on the form (errors are then available from the state)
    pub async fn submit(&mut self) -> Option<Navigation> {
        if self.can_submit() == false {
            log::debug!("Ignoring a submission while the form is {}", self.state);
            return None;
        }

        self.transition(FormState::Validating);
        let errors = validation::validate(&self.draft);
        if errors.is_empty() == false {
            self.transition(FormState::Idle { errors, server_errors: Vec::new() });
            return None;
        }

        let (result, fallback) = match self.mode {
            FormMode::Create => {
                let request = AddExamRequest::from(&self.draft);
                self.transition(FormState::Submitting);
                (self.client.add_exam(&request).await, response::ADD_EXAM_FALLBACK)
            },
            FormMode::Edit(id) => {
                let request = match UpdateExamRequest::from_draft(&self.draft) {
                    Some(req) => req,
                    None => {
                        let mut errors = ExamErrors::new();
                        errors.insert(DraftField::Time, validation::TIME_NONEXISTENT);
                        self.transition(FormState::Idle { errors, server_errors: Vec::new() });
                        return None;
                    },
                };
                self.transition(FormState::Submitting);
                (self.client.update_exam(id, &request).await, response::UPDATE_EXAM_FALLBACK)
            },
        };

        match result {
            Ok(()) => {
                log::info!("Exam saved");
                self.leave(Navigation::ExamList)
            },
            Err(err) => self.handle_failure(err, fallback),
        }
    }

    fn handle_failure(&mut self, err: GatewayError, fallback: &str) -> Option<Navigation> {
        if err.requires_login() {
            return self.leave(Navigation::Login);
        }
        log::warn!("Unable to save the exam: {}", err);
        let server_errors = error_messages(&err, fallback);
        self.transition(FormState::Idle { errors: ExamErrors::new(), server_errors });
        None
    }
}
