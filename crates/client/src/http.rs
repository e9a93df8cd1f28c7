//! Generic fetch layer.
//!
//! Every call to the backend goes through [`ApiClient::send`], which
//! attaches the session's bearer token, serializes JSON bodies, and turns
//! non-success responses into [`ApiError`] values with a readable message.

use std::sync::Arc;

use logibooks_core::Locale;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::SessionStore;

/// Successful (or 422) outcome of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// 2xx with a JSON body.
    Json(Value),
    /// 204, or 2xx with an empty body.
    Empty,
    /// 422 with the server's validation report.
    Unprocessable(Value),
}

impl Reply {
    /// Decode the body into `T`.
    ///
    /// A 422 report becomes [`ApiError::Unprocessable`], a missing body
    /// becomes [`ApiError::EmptyBody`].
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            Reply::Json(value) => Ok(serde_json::from_value(value)?),
            Reply::Empty => Err(ApiError::EmptyBody),
            Reply::Unprocessable(payload) => Err(ApiError::Unprocessable {
                message: message_field(&payload)
                    .unwrap_or_else(|| StatusCode::UNPROCESSABLE_ENTITY.to_string()),
                payload,
            }),
        }
    }
}

/// HTTP client for the Logibooks REST API.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    locale: Locale,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// Create a client with its own connection pool and the configured
    /// request timeout.
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config, session))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        config: &ClientConfig,
        session: Arc<SessionStore>,
    ) -> Self {
        Self {
            client,
            base_url: config.base_url().to_string(),
            locale: config.locale,
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Resolve `path` against the base URL. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Whether `url` points into the configured API, i.e. may receive the
    /// bearer token.
    pub fn is_api_url(&self, url: &str) -> bool {
        url == self.base_url
            || url
                .strip_prefix(&self.base_url)
                .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
    }

    /// Send a request and normalize the response.
    ///
    /// - 204 and empty 2xx bodies resolve to [`Reply::Empty`].
    /// - 422 resolves to [`Reply::Unprocessable`] for the caller to inspect.
    /// - Other non-2xx statuses fail with [`ApiError::Status`]; a 401 also
    ///   closes the active session.
    /// - Transport failures fail with [`ApiError::Unreachable`].
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Reply, ApiError> {
        let url = self.url(path);
        let mut request = self.client.request(method.clone(), &url);

        if self.is_api_url(&url) {
            if let Some(token) = self.session.token().await {
                request = request.header(AUTHORIZATION, format!("Bearer {token}"));
            }
        }

        if let Some(body) = body {
            // `json` also sets `Content-Type: application/json`.
            request = request.json(body);
        }

        tracing::debug!(%method, url = %url, "Sending API request");

        let response = request.send().await.map_err(|e| {
            if e.is_builder() {
                ApiError::Request(e)
            } else {
                tracing::warn!(url = %url, error = %e, "API server unreachable");
                ApiError::Unreachable(self.locale.labels().server_unreachable.to_string())
            }
        })?;

        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(Reply::Empty);
        }

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let text = response.text().await?;
            let payload = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Ok(Reply::Unprocessable(payload));
        }

        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED && self.session.close().await {
                tracing::warn!(url = %url, "Session rejected by server, logged out");
            }

            let text = response.text().await.unwrap_or_default();
            let (message, payload) = error_message(status, &text);
            tracing::debug!(url = %url, status = status.as_u16(), message = %message, "API request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
                payload,
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Reply::Empty);
        }
        Ok(Reply::Json(serde_json::from_str(&text)?))
    }

    /// `GET` a JSON resource.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::GET, path, None).await?.into_json()
    }

    /// `POST` an optional JSON body and decode the JSON reply.
    pub async fn post_json<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = body.map(serde_json::to_value).transpose()?;
        self.send(Method::POST, path, body.as_ref())
            .await?
            .into_json()
    }

    /// `DELETE` a resource, ignoring any reply body.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        match self.send(Method::DELETE, path, None).await? {
            Reply::Json(_) | Reply::Empty => Ok(()),
            unprocessable @ Reply::Unprocessable(_) => {
                unprocessable.into_json::<Value>().map(|_| ())
            }
        }
    }
}

/// Extract a user-facing message from an error body.
///
/// Prefers the `msg` field of a JSON body, then the raw body text, then
/// the status line. Returns the decoded JSON alongside when there was one.
pub fn error_message(status: StatusCode, body: &str) -> (String, Option<Value>) {
    let payload = serde_json::from_str::<Value>(body).ok();

    let message = payload
        .as_ref()
        .and_then(message_field)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| status.to_string());

    (message, payload)
}

fn message_field(payload: &Value) -> Option<String> {
    payload
        .get("msg")
        .and_then(Value::as_str)
        .map(str::to_string)
}
