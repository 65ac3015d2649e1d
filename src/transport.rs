//! Requests and responses exchanged with the API, and the HTTP implementation of [`Transport`]

use std::error::Error;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::traits::Transport;

/// A request, relative to the API base URL
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// e.g. `/api/exams/all`
    pub path: String,
    /// The full `Authorization` header value, if any
    pub authorization: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new<S: ToString>(method: Method, path: S) -> Self {
        Self { method, path: path.to_string(), authorization: None, body: None }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A response that has been received, whatever its status
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new<S: ToString>(status: StatusCode, body: S) -> Self {
        Self { status, body: body.to_string() }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}


/// Sends requests over HTTP(S) to a given server
#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport. This does not start a connection
    pub fn new(mut base_url: Url) -> Self {
        // So that joining a path keeps any prefix of the base URL
        if base_url.path().ends_with('/') == false {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { base_url, client: reqwest::Client::new() }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, Box<dyn Error + Send + Sync>> {
        let url = self.url_for(&request.path)?;
        log::debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), url.as_str());
        if let Some(authorization) = &request.authorization {
            builder = builder.header(AUTHORIZATION, authorization.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_string(body)?);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        log::debug!("{} {} -> {}", request.method, url, status);

        Ok(ApiResponse { status, body })
    }
}
