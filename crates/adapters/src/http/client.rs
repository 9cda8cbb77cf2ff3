//! REST client on top of `reqwest`.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use application::ports::RepositoryError;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::envelope::{ApiResponse, ErrorBody, PaginatedApiResponse};

/// Errors returned by [`ApiClient`].
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Invalid HTTP client configuration: {0}")]
    Config(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl HttpError {
    /// The response status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT.as_u16())
    }
}

impl From<HttpError> for RepositoryError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Status {
                status: 404,
                message,
                ..
            } => RepositoryError::NotFound(message),
            HttpError::Status {
                status: 409,
                message,
                ..
            } => RepositoryError::Conflict(message),
            HttpError::Decode(message) => RepositoryError::Serialization(message),
            other => RepositoryError::Transport(other.to_string()),
        }
    }
}

/// Settings for [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClientConfig {
    /// Base URL every path is resolved against.
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// JSON REST client.
///
/// Requests carry JSON `Accept` headers and, once set, a bearer token.
/// Successful bodies are unwrapped from their envelope; any other status
/// becomes [`HttpError::Status`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, HttpError> {
        if config.base_url.trim().is_empty() {
            return Err(HttpError::Config("base URL must not be empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| HttpError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sets or clears the bearer token sent with every request.
    pub fn set_auth_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Joins `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, HttpError> {
        let request = self.request(Method::GET, path).query(query);
        let envelope: ApiResponse<T> = self.send_json(request).await?;
        Ok(envelope.data)
    }

    pub async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<PaginatedApiResponse<T>, HttpError> {
        let request = self.request(Method::GET, path).query(query);
        self.send_json(request).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).json(body);
        let envelope: ApiResponse<T> = self.send_json(request).await?;
        Ok(envelope.data)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path).json(body);
        let envelope: ApiResponse<T> = self.send_json(request).await?;
        Ok(envelope.data)
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PATCH, path).json(body);
        let envelope: ApiResponse<T> = self.send_json(request).await?;
        Ok(envelope.data)
    }

    /// Sends a DELETE; any response body is ignored.
    pub async fn delete(&self, path: &str) -> Result<(), HttpError> {
        let request = self.request(Method::DELETE, path);
        self.send(request).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, self.url(path));
        match self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
        {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, HttpError> {
        let response = self.send(request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| HttpError::Decode(e.to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, HttpError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                metrics::counter!("http_client_requests", "outcome" => "transport_error").increment(1);
                tracing::error!(error = %err, "HTTP request could not be sent");
                return Err(err.into());
            }
        };

        let status = response.status();
        if status.is_success() {
            metrics::counter!("http_client_requests", "outcome" => "success").increment(1);
            return Ok(response);
        }

        metrics::counter!("http_client_requests", "outcome" => "error_status").increment(1);
        let url = response.url().to_string();
        let text = response.text().await.unwrap_or_default();
        let error = status_error(status, &text);
        tracing::warn!(status = status.as_u16(), %url, error = %error, "HTTP request failed");
        Err(error)
    }
}

/// Builds the error for a non-2xx response, preferring the server's message.
fn status_error(status: StatusCode, body: &str) -> HttpError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .map(|b| b.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| default_message(status));

    HttpError::Status {
        status: status.as_u16(),
        code: parsed.map(|b| b.code),
        message,
    }
}

fn default_message(status: StatusCode) -> String {
    match status {
        StatusCode::BAD_REQUEST => "Bad request".to_string(),
        StatusCode::UNAUTHORIZED => "Unauthorized access".to_string(),
        StatusCode::FORBIDDEN => "Access forbidden".to_string(),
        StatusCode::NOT_FOUND => "Resource not found".to_string(),
        StatusCode::CONFLICT => "Conflict occurred".to_string(),
        StatusCode::UNPROCESSABLE_ENTITY => "Validation failed".to_string(),
        StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
        other => format!("Server error: {other}"),
    }
}
