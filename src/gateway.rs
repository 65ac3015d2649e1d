//! The single path every API call goes through
//!
//! The gateway attaches the session token, and reacts to a rejected session (HTTP 401) the same way whatever the route:
//! the token is forgotten and the caller is told the user must log in again.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::session::SessionToken;
use crate::traits::{SessionStore, Transport};
use crate::transport::{ApiRequest, ApiResponse};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// There is no session at all. No request has been sent
    #[error("Not authenticated")]
    Unauthenticated,
    /// The server has rejected the session. It has been cleared
    #[error("Session expired")]
    SessionExpired,
    /// The server answered with an error status
    #[error("Request failed with HTTP status {}", .0.status)]
    RequestFailed(ApiResponse),
    /// No response has been received
    #[error("Unable to reach the server: {0}")]
    Transport(String),
    /// A successful response that cannot be understood
    #[error("Unexpected response from the server: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Whether the user must be sent back to the login screen
    pub fn requires_login(&self) -> bool {
        match self {
            GatewayError::Unauthenticated | GatewayError::SessionExpired => true,
            _ => false,
        }
    }
}

/// Serialize a request body
pub fn json_body<B: Serialize>(body: &B) -> Result<serde_json::Value, GatewayError> {
    serde_json::to_value(body)
        .map_err(|err| GatewayError::Malformed(format!("unable to serialize request: {}", err)))
}


pub struct Gateway<S, T>
where
    S: SessionStore,
    T: Transport,
{
    session: Arc<S>,
    transport: T,
}

impl<S, T> Gateway<S, T>
where
    S: SessionStore,
    T: Transport,
{
    pub fn new(session: Arc<S>, transport: T) -> Self {
        Self { session, transport }
    }

    pub fn session(&self) -> &Arc<S> { &self.session }
    pub fn transport(&self) -> &T   { &self.transport }

    /// Perform an authenticated call
    ///
    /// * without any session, this returns [`GatewayError::Unauthenticated`] and nothing is sent
    /// * a 401 clears the session and returns [`GatewayError::SessionExpired`]
    /// * any other non-2xx status returns [`GatewayError::RequestFailed`]
    pub async fn call(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> Result<ApiResponse, GatewayError> {
        let token = match self.session.get() {
            None => {
                log::info!("Not logged in, not sending {} {}", method, path);
                return Err(GatewayError::Unauthenticated);
            },
            Some(token) => token,
        };

        let response = self.send(method.clone(), path, body, Some(&token)).await?;
        if response.status == StatusCode::UNAUTHORIZED {
            log::warn!("The server rejected the session on {} {}. Logging out", method, path);
            self.session.clear();
            return Err(GatewayError::SessionExpired);
        }
        check_status(response)
    }

    /// Perform an authenticated call, and decode its JSON response
    pub async fn call_json<D: DeserializeOwned>(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> Result<D, GatewayError> {
        let response = self.call(method, path, body).await?;
        response.json()
            .map_err(|err| GatewayError::Malformed(err.to_string()))
    }

    /// Perform a call on a route that needs no authentication. No `Authorization` header is sent
    pub async fn call_anonymous(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> Result<ApiResponse, GatewayError> {
        let response = self.send(method, path, body, None).await?;
        check_status(response)
    }

    /// Perform a call with a token that is not (yet) the session token, e.g. to check credentials at login.
    ///
    /// The session store is left untouched, and a 401 is returned as [`GatewayError::RequestFailed`]
    pub async fn call_with_token(&self, method: Method, path: &str, body: Option<serde_json::Value>, token: &SessionToken) -> Result<ApiResponse, GatewayError> {
        let response = self.send(method, path, body, Some(token)).await?;
        check_status(response)
    }

    async fn send(&self, method: Method, path: &str, body: Option<serde_json::Value>, token: Option<&SessionToken>) -> Result<ApiResponse, GatewayError> {
        let mut request = ApiRequest::new(method, path);
        request.authorization = token.map(|t| t.authorization_value());
        if let Some(body) = body {
            request = request.with_body(body);
        }

        self.transport.send(request).await
            .map_err(|err| {
                log::warn!("No response from the server: {}", err);
                GatewayError::Transport(err.to_string())
            })
    }
}

fn check_status(response: ApiResponse) -> Result<ApiResponse, GatewayError> {
    if response.is_success() {
        Ok(response)
    } else {
        log::debug!("Request failed with status {}", response.status);
        Err(GatewayError::RequestFailed(response))
    }
}
