//! This module provides a client to the exam-scheduling API
//!
//! Every authenticated operation goes through the [`Gateway`], so that an expired session is handled the same way everywhere.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use thiserror::Error;

use crate::config::Settings;
use crate::exam::{AddExamRequest, Exam, ExamId, UpdateExamRequest};
use crate::gateway::{json_body, Gateway, GatewayError};
use crate::response;
use crate::session::{FileSessionStore, SessionToken};
use crate::traits::{SessionStore, Transport};
use crate::transport::HttpTransport;
use crate::validation::{validate_login, validate_signup, CredentialErrors, LoginForm, SignupForm};

pub const SIGNUP_PATH: &str = "/api/auth/signup";
pub const ALL_EXAMS_PATH: &str = "/api/exams/all";
pub const ADD_EXAM_PATH: &str = "/api/exams/add";

/// `/api/exams/{id}`
pub fn exam_path(id: ExamId) -> String {
    format!("/api/exams/{}", id)
}


/// Why a login or a signup did not succeed
#[derive(Debug, Error)]
pub enum AuthError {
    /// The form is invalid, nothing has been sent
    #[error("Invalid form: {0}")]
    Invalid(CredentialErrors),
    /// The server refused the credentials
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl AuthError {
    /// The messages to show to the user
    pub fn messages(&self) -> Vec<String> {
        match self {
            AuthError::Invalid(errors) => errors.iter().map(|(_, msg)| msg.to_string()).collect(),
            AuthError::Rejected(msg) => vec![msg.clone()],
            AuthError::Gateway(err) => response::error_messages(err, response::LOGIN_FALLBACK),
        }
    }
}


#[derive(serde::Serialize)]
struct SignupRequest<'a> {
    username: &'a str,
    password: &'a str,
}


/// A client to the exam-scheduling API
pub struct ExamClient<S, T>
where
    S: SessionStore,
    T: Transport,
{
    gateway: Gateway<S, T>,
}

impl ExamClient<FileSessionStore, HttpTransport> {
    /// Create a client that talks over HTTP, and keeps its session in a file. This does not start a connection
    pub fn from_settings(settings: &Settings) -> Self {
        let session = FileSessionStore::new(&settings.session_file);
        let transport = HttpTransport::new(settings.api_url.clone());
        Self::new(Arc::new(session), transport)
    }
}

impl<S, T> ExamClient<S, T>
where
    S: SessionStore,
    T: Transport,
{
    pub fn new(session: Arc<S>, transport: T) -> Self {
        Self { gateway: Gateway::new(session, transport) }
    }

    pub fn gateway(&self) -> &Gateway<S, T> {
        &self.gateway
    }

    pub fn session(&self) -> &Arc<S> {
        self.gateway.session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    /// Create an account, and log in with it
    pub async fn signup(&self, form: &SignupForm) -> Result<(), AuthError> {
        let errors = validate_signup(form);
        if errors.is_empty() == false {
            return Err(AuthError::Invalid(errors));
        }

        let body = json_body(&SignupRequest { username: &form.email, password: &form.password })?;
        match self.gateway.call_anonymous(Method::POST, SIGNUP_PATH, Some(body)).await {
            Ok(_) => {},
            Err(GatewayError::RequestFailed(response)) => {
                let text = if response.body.is_empty() { response::SIGNUP_FALLBACK.to_string() } else { response.body };
                return Err(AuthError::Rejected(text));
            },
            Err(err) => return Err(err.into()),
        }

        log::info!("Account {} created, logging in", form.email);
        self.session().set(SessionToken::from_credentials(&form.email, &form.password));
        Ok(())
    }

    /// Check the credentials against a protected route, and keep them as the session if they are accepted
    pub async fn login(&self, form: &LoginForm) -> Result<(), AuthError> {
        let errors = validate_login(form);
        if errors.is_empty() == false {
            return Err(AuthError::Invalid(errors));
        }

        let candidate = SessionToken::from_credentials(&form.email, &form.password);
        match self.gateway.call_with_token(Method::GET, ALL_EXAMS_PATH, None, &candidate).await {
            Ok(_) => {},
            Err(GatewayError::RequestFailed(response)) if response.status == StatusCode::UNAUTHORIZED => {
                return Err(AuthError::Rejected(response::INVALID_CREDENTIALS.to_string()));
            },
            Err(GatewayError::RequestFailed(_)) => {
                return Err(AuthError::Rejected(response::LOGIN_FALLBACK.to_string()));
            },
            Err(err) => return Err(err.into()),
        }

        log::info!("Logged in as {}", form.email);
        self.session().set(candidate);
        Ok(())
    }

    pub fn logout(&self) {
        log::info!("Logging out");
        self.session().clear();
    }

    pub async fn list_exams(&self) -> Result<Vec<Exam>, GatewayError> {
        self.gateway.call_json(Method::GET, ALL_EXAMS_PATH, None).await
    }

    pub async fn get_exam(&self, id: ExamId) -> Result<Exam, GatewayError> {
        self.gateway.call_json(Method::GET, &exam_path(id), None).await
    }

    pub async fn add_exam(&self, request: &AddExamRequest) -> Result<(), GatewayError> {
        let body = json_body(request)?;
        self.gateway.call(Method::POST, ADD_EXAM_PATH, Some(body)).await?;
        Ok(())
    }

    pub async fn update_exam(&self, id: ExamId, request: &UpdateExamRequest) -> Result<(), GatewayError> {
        let body = json_body(request)?;
        self.gateway.call(Method::PUT, &exam_path(id), Some(body)).await?;
        Ok(())
    }

    pub async fn delete_exam(&self, id: ExamId) -> Result<(), GatewayError> {
        self.gateway.call(Method::DELETE, &exam_path(id), None).await?;
        log::info!("Exam {} deleted", id);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::ExamDraft;
    use crate::mock_transport::MockTransport;
    use crate::session::MemorySessionStore;

    fn client(logged_in: bool) -> ExamClient<MemorySessionStore, MockTransport> {
        let store = if logged_in {
            MemorySessionStore::with_token(SessionToken::from_credentials("alice@example.com", "hunter22"))
        } else {
            MemorySessionStore::new()
        };
        ExamClient::new(Arc::new(store), MockTransport::new())
    }

    fn transport(client: &ExamClient<MemorySessionStore, MockTransport>) -> &MockTransport {
        client.gateway().transport()
    }

    fn signup_form() -> SignupForm {
        SignupForm {
            email: "bob@example.com".to_string(),
            password: "correct horse".to_string(),
            confirm: "correct horse".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_logs_in() {
        let client = client(false);
        transport(&client).respond(StatusCode::OK, "User registered successfully");

        client.signup(&signup_form()).await.unwrap();

        let sent = transport(&client).last_request().unwrap();
        assert_eq!(sent.path, SIGNUP_PATH);
        assert_eq!(sent.authorization, None);
        assert_eq!(sent.body, Some(serde_json::json!({"username": "bob@example.com", "password": "correct horse"})));
        assert_eq!(client.session().get(), Some(SessionToken::from_credentials("bob@example.com", "correct horse")));
    }

    #[tokio::test]
    async fn test_signup_rejected() {
        let client = client(false);
        transport(&client)
            .respond(StatusCode::BAD_REQUEST, "Username already taken")
            .respond(StatusCode::BAD_REQUEST, "");

        let err = client.signup(&signup_form()).await.unwrap_err();
        assert_eq!(err.messages(), vec!["Username already taken"]);
        let err = client.signup(&signup_form()).await.unwrap_err();
        assert_eq!(err.messages(), vec![response::SIGNUP_FALLBACK]);
        assert!(client.is_authenticated() == false);
    }

    #[tokio::test]
    async fn test_invalid_signup_is_not_sent() {
        let client = client(false);
        let form = SignupForm { email: "bob".to_string(), ..signup_form() };
        assert!(matches!(client.signup(&form).await, Err(AuthError::Invalid(_))));
        assert_eq!(transport(&client).request_count(), 0);
    }

    #[tokio::test]
    async fn test_login() {
        let client = client(false);
        transport(&client)
            .respond(StatusCode::UNAUTHORIZED, "")
            .respond(StatusCode::INTERNAL_SERVER_ERROR, "")
            .respond(StatusCode::OK, "[]");
        let form = LoginForm { email: "alice@example.com".to_string(), password: "hunter22".to_string() };

        let err = client.login(&form).await.unwrap_err();
        assert_eq!(err.messages(), vec![response::INVALID_CREDENTIALS]);
        assert!(client.is_authenticated() == false);

        let err = client.login(&form).await.unwrap_err();
        assert_eq!(err.messages(), vec![response::LOGIN_FALLBACK]);

        client.login(&form).await.unwrap();
        let sent = transport(&client).last_request().unwrap();
        assert_eq!(sent.path, ALL_EXAMS_PATH);
        assert_eq!(client.session().get(), Some(SessionToken::from_credentials("alice@example.com", "hunter22")));

        client.logout();
        assert!(client.is_authenticated() == false);
    }

    #[tokio::test]
    async fn test_exam_routes() {
        let client = client(true);
        transport(&client)
            .respond(StatusCode::OK, r#"[{"id": 1, "subject": "CS101", "examDate": "2030-01-01T09:00:00Z", "location": "Room 1"}]"#)
            .respond(StatusCode::OK, r#"{"id": 1, "subject": "CS101", "examDate": "2030-01-01T09:00:00Z", "location": "Room 1"}"#)
            .respond(StatusCode::OK, "Exam added successfully")
            .respond(StatusCode::OK, "Exam updated successfully")
            .respond(StatusCode::NO_CONTENT, "");

        let exams = client.list_exams().await.unwrap();
        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].subject(), "CS101");

        let exam = client.get_exam(ExamId::from(1)).await.unwrap();
        assert_eq!(exam, exams[0]);

        let draft = ExamDraft::new("CS101", "2030-01-02", "10:00", "Room 2");
        client.add_exam(&AddExamRequest::from(&draft)).await.unwrap();
        client.update_exam(ExamId::from(1), &UpdateExamRequest::from_draft(&draft).unwrap()).await.unwrap();
        client.delete_exam(ExamId::from(1)).await.unwrap();

        let sent: Vec<(Method, String)> = transport(&client).requests().into_iter()
            .map(|r| (r.method, r.path))
            .collect();
        assert_eq!(sent, vec![
            (Method::GET, "/api/exams/all".to_string()),
            (Method::GET, "/api/exams/1".to_string()),
            (Method::POST, "/api/exams/add".to_string()),
            (Method::PUT, "/api/exams/1".to_string()),
            (Method::DELETE, "/api/exams/1".to_string()),
        ]);
    }

    #[tokio::test]
    async fn test_every_route_handles_expired_sessions() {
        let draft = ExamDraft::new("CS101", "2030-01-02", "10:00", "Room 2");

        for route in 0..5 {
            let client = client(true);
            transport(&client).respond(StatusCode::UNAUTHORIZED, "");

            let res = match route {
                0 => client.list_exams().await.map(|_| ()),
                1 => client.get_exam(ExamId::from(1)).await.map(|_| ()),
                2 => client.add_exam(&AddExamRequest::from(&draft)).await,
                3 => client.update_exam(ExamId::from(1), &UpdateExamRequest::from_draft(&draft).unwrap()).await,
                _ => client.delete_exam(ExamId::from(1)).await,
            };
            assert!(matches!(res, Err(GatewayError::SessionExpired)), "route {}", route);
            assert!(client.is_authenticated() == false, "route {}", route);
        }
    }
}
