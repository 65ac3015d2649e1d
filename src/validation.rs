//! Client-side validation of forms, before anything is sent to the server
//!
//! The exam rules are shared by the create and the edit forms.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::exam::{DraftField, ExamDraft};

pub const SUBJECT_BLANK: &str = "Subject cannot be blank";
pub const DATE_REQUIRED: &str = "Exam date is required";
pub const DATE_IN_PAST: &str = "Exam date cannot be in the past";
pub const DATE_INVALID: &str = "Exam date is invalid";
pub const TIME_REQUIRED: &str = "Time is required";
pub const TIME_INVALID: &str = "Time is invalid";
/// The local time is skipped on that date, e.g. by a daylight saving change
pub const TIME_NONEXISTENT: &str = "This time does not exist on that date";
pub const LOCATION_BLANK: &str = "Location cannot be left blank";

pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Invalid email";
pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const PASSWORD_TOO_SHORT: &str = "Min 8 characters";
pub const PASSWORDS_MISMATCH: &str = "Passwords must match";

const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\S+@\S+\.\S+").expect("Failed to compile email regex")
});


/// At most one error message per field. An empty set means the form can be submitted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationErrors<F: Ord> {
    errors: BTreeMap<F, String>,
}

impl<F: Ord> Default for ValidationErrors<F> {
    fn default() -> Self {
        Self { errors: BTreeMap::new() }
    }
}

impl<F: Ord + Copy> ValidationErrors<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error of a field, replacing any previous one
    pub fn insert(&mut self, field: F, message: &str) {
        self.errors.insert(field, message.to_string());
    }

    /// Forget the error of a field, e.g. because the user has just edited it
    pub fn remove(&mut self, field: F) {
        self.errors.remove(&field);
    }

    pub fn get(&self, field: F) -> Option<&str> {
        self.errors.get(&field).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn fields(&self) -> Vec<F> {
        self.errors.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &str)> + '_ {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl<F: Ord + Copy + Display> Display for ValidationErrors<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.iter().map(|(field, msg)| format!("{}: {}", field, msg)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

pub type ExamErrors = ValidationErrors<DraftField>;


/// Validate an exam draft against the current local date
pub fn validate(draft: &ExamDraft) -> ExamErrors {
    validate_on(draft, Local::now().date_naive())
}

/// Validate an exam draft, `today` being the current local calendar date.
///
/// Every field is checked, even when another one is already invalid.
pub fn validate_on(draft: &ExamDraft, today: NaiveDate) -> ExamErrors {
    let mut errors = ExamErrors::new();

    if draft.subject.is_empty() {
        errors.insert(DraftField::Subject, SUBJECT_BLANK);
    }

    if draft.date.is_empty() {
        errors.insert(DraftField::Date, DATE_REQUIRED);
    } else {
        match draft.parsed_date() {
            None => errors.insert(DraftField::Date, DATE_INVALID),
            // Day granularity: today is fine, whatever the time
            Some(date) if date < today => errors.insert(DraftField::Date, DATE_IN_PAST),
            Some(_) => {},
        }
    }

    if draft.time.is_empty() {
        errors.insert(DraftField::Time, TIME_REQUIRED);
    } else if draft.parsed_time().is_none() {
        errors.insert(DraftField::Time, TIME_INVALID);
    }

    if draft.location.is_empty() {
        errors.insert(DraftField::Location, LOCATION_BLANK);
    }

    errors
}


/// The fields of the login and signup forms
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CredentialField {
    Email,
    Password,
    Confirm,
}

impl Display for CredentialField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialField::Email => write!(f, "email"),
            CredentialField::Password => write!(f, "password"),
            CredentialField::Confirm => write!(f, "confirm"),
        }
    }
}

pub type CredentialErrors = ValidationErrors<CredentialField>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm: String,
}

pub fn validate_login(form: &LoginForm) -> CredentialErrors {
    let mut errors = CredentialErrors::new();
    if form.email.is_empty() {
        errors.insert(CredentialField::Email, EMAIL_REQUIRED);
    }
    if form.password.is_empty() {
        errors.insert(CredentialField::Password, PASSWORD_REQUIRED);
    }
    errors
}

pub fn validate_signup(form: &SignupForm) -> CredentialErrors {
    let mut errors = CredentialErrors::new();

    if form.email.is_empty() {
        errors.insert(CredentialField::Email, EMAIL_REQUIRED);
    } else if EMAIL_REGEX.is_match(&form.email) == false {
        errors.insert(CredentialField::Email, EMAIL_INVALID);
    }

    if form.password.is_empty() {
        errors.insert(CredentialField::Password, PASSWORD_REQUIRED);
    } else if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.insert(CredentialField::Password, PASSWORD_TOO_SHORT);
    }

    if form.password != form.confirm {
        errors.insert(CredentialField::Confirm, PASSWORDS_MISMATCH);
    }

    errors
}
