//! A scripted [`Transport`] that replays canned responses, so that tests do not need a server

use std::collections::VecDeque;
use std::error::Error;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::traits::Transport;
use crate::transport::{ApiRequest, ApiResponse};

/// Replays scripted responses in order, and records every request it receives
///
/// A scripted failure stands for a request that never got any response (e.g. the server is unreachable).
#[derive(Debug, Default)]
pub struct MockTransport {
    scripted: Mutex<VecDeque<Result<ApiResponse, String>>>,
    received: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response to the next request
    pub fn respond<S: ToString>(&self, status: StatusCode, body: S) -> &Self {
        self.scripted.lock().unwrap().push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    /// Make the next request fail without any response
    pub fn fail<S: ToString>(&self, message: S) -> &Self {
        self.scripted.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.received.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.received.lock().unwrap().last().cloned()
    }

    /// Whether every scripted response has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.scripted.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, Box<dyn Error + Send + Sync>> {
        log::debug!("Mock transport: received {} {}", request.method, request.path);
        let descr = format!("{} {}", request.method, request.path);
        self.received.lock().unwrap().push(request);

        match self.scripted.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(message.into()),
            None => Err(format!("Mock transport has no response scripted for {}", descr).into()),
        }
    }
}
