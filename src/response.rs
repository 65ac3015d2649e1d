//! Turn failed responses into messages that can be shown to a user
//!
//! The server reports errors in several shapes. They are tried in this order, the first one that matches wins:
//! 1. `{"errors": [...]}`: the list, verbatim
//! 2. `{"message": ...}`: that single message
//! 3. `{"error": ...}`: that single message
//! 4. any other JSON: every value, flattened
//! 5. not JSON: the raw text, or a route-specific fallback when the body is empty
//!
//! This precedence is what users see on every failure, it must be kept as is.

use serde_json::{Map, Value};

use crate::gateway::GatewayError;

pub const ADD_EXAM_FALLBACK: &str = "Failed to add exam";
pub const UPDATE_EXAM_FALLBACK: &str = "Failed to update exam";
pub const FETCH_EXAM_FALLBACK: &str = "Failed to fetch exam details";
pub const FETCH_EXAMS_FALLBACK: &str = "Failed to fetch exams";
pub const DELETE_EXAM_FALLBACK: &str = "Failed to delete exam";
pub const SIGNUP_FALLBACK: &str = "Signup failed";
pub const LOGIN_FALLBACK: &str = "Login failed";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Shown when the server could not be reached at all
pub const UNREACHABLE: &str = "Unable to reach the server. Please try again later";
/// Shown when a successful response cannot be understood
pub const MALFORMED: &str = "The server sent an unexpected response";
/// Shown for authentication errors, in case a front end wants to display them rather than redirecting
pub const LOGIN_REQUIRED: &str = "Please log in";


/// Extract the messages of a failed response body. This never returns an empty list.
pub fn extract_messages(body: &str, fallback: &str) -> Vec<String> {
    let messages = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => from_object(&map),
        Ok(Value::Array(values)) => flatten(values.iter()),
        Ok(Value::String(s)) if s.is_empty() == false => vec![s],
        _ => Vec::new(),
    };

    if messages.is_empty() == false {
        return messages;
    }

    if body.is_empty() {
        vec![fallback.to_string()]
    } else {
        vec![body.to_string()]
    }
}

fn from_object(map: &Map<String, Value>) -> Vec<String> {
    if let Some(Value::Array(errors)) = map.get("errors") {
        return errors.iter().map(value_to_string).collect();
    }
    if let Some(message) = non_empty(map.get("message")) {
        return vec![message];
    }
    if let Some(error) = non_empty(map.get("error")) {
        return vec![error];
    }
    flatten(map.values())
}

/// `null` and `""` count as absent
fn non_empty(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(v) => Some(value_to_string(v)),
    }
}

/// Every value as a string, arrays being expanded one level
fn flatten<'a, I: Iterator<Item = &'a Value>>(values: I) -> Vec<String> {
    let mut messages = Vec::new();
    for value in values {
        match value {
            Value::Array(inner) => messages.extend(inner.iter().map(value_to_string)),
            other => messages.push(value_to_string(other)),
        }
    }
    messages
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}


/// The messages a front end should display for a failed call.
///
/// Authentication errors are normally not displayed (the user is redirected to the login screen instead).
pub fn error_messages(err: &GatewayError, fallback: &str) -> Vec<String> {
    match err {
        GatewayError::RequestFailed(response) => extract_messages(&response.body, fallback),
        GatewayError::Transport(_) => vec![UNREACHABLE.to_string()],
        GatewayError::Malformed(_) => vec![MALFORMED.to_string()],
        GatewayError::Unauthenticated | GatewayError::SessionExpired => vec![LOGIN_REQUIRED.to_string()],
    }
}
