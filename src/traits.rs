use std::error::Error;

use async_trait::async_trait;

use crate::session::SessionToken;
use crate::transport::{ApiRequest, ApiResponse};

/// Where the authentication token of the current user is kept.
///
/// The presence of a token is the only thing that tells whether a user is logged in.
/// Whether the token is still accepted by the server is only known once a request returns a 401.
pub trait SessionStore: Send + Sync {
    /// Returns the current token, if any
    fn get(&self) -> Option<SessionToken>;
    /// Keep this token for the remainder of the session
    fn set(&self, token: SessionToken);
    /// Forget the current token (on logout, or once the server has rejected it)
    fn clear(&self);

    fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

/// Something that is able to send a request to the API and bring back its response
///
/// An `Err` means no response has been received at all (e.g. the server could not be reached). \
/// Any HTTP status, including errors, is an `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, Box<dyn Error + Send + Sync>>;
}
