//! HTTP transport for the signature API.
//!
//! [`HttpTransport`] authenticates every request with the API key as the
//! basic-auth user, maps non-success responses to [`ClientError::Api`], and
//! reports each request to an optional [`TransportObserver`].

use core::fmt;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::form::FormBuilder;

// ─────────────────────────────────────────────────────────────────────────────
// Observer
// ─────────────────────────────────────────────────────────────────────────────

/// A request that completed with a success status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestOutcome {
    /// HTTP method.
    pub method: String,
    /// Path relative to the base URL.
    pub path: String,
    /// Response status.
    pub status: u16,
}

/// A request that failed in transit, with an error status, or with an
/// unusable body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestFailure {
    /// HTTP method.
    pub method: String,
    /// Path relative to the base URL.
    pub path: String,
    /// Response status, if a response was received.
    pub status: Option<u16>,
    /// API error name, if the body carried one.
    pub error_name: Option<String>,
    /// Description of the failure.
    pub message: String,
}

/// Error name reported when a success response carries an unusable body.
pub const INVALID_RESPONSE: &str = "invalid_response";

/// Receives the outcome of every request made by a transport.
///
/// Exactly one of the two methods is called per request. A success status
/// whose body cannot be read or parsed into the requested type counts as a
/// failure. Checks a caller makes on an accepted body, such as looking up
/// an envelope key, are not reported.
pub trait TransportObserver: Send + Sync {
    /// Called once a success response has been read and accepted.
    fn on_success(&self, outcome: &RequestOutcome) {
        let _ = outcome;
    }

    /// Called after a request fails.
    fn on_error(&self, failure: &RequestFailure);
}

// ─────────────────────────────────────────────────────────────────────────────
// Error body
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_name: String,
    #[serde(default)]
    error_msg: String,
}

fn api_error(status: StatusCode, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => ClientError::Api {
            status: status.as_u16(),
            name: error.error_name,
            message: error.error_msg,
        },
        Err(_) => ClientError::Api {
            status: status.as_u16(),
            name: status
                .canonical_reason()
                .unwrap_or("unknown")
                .to_ascii_lowercase()
                .replace(' ', "_"),
            message: body.to_string(),
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HttpTransport
// ─────────────────────────────────────────────────────────────────────────────

/// Authenticated HTTP client for the signature API.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    observer: Option<Arc<dyn TransportObserver>>,
}

impl HttpTransport {
    /// Creates a transport from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key().to_string(),
            base_url: config.base_url().to_string(),
            observer: None,
        })
    }

    /// Reports every request to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn TransportObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a GET and decodes the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let request = self.request(Method::GET, path).query(query);
        let reply = self.execute(&Method::GET, path, request).await?;
        self.decode(&Method::GET, path, &reply)
    }

    /// Sends a url-encoded POST and decodes the JSON body.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &FormBuilder,
    ) -> Result<T, ClientError> {
        let request = self.request(Method::POST, path).form(form.fields());
        let reply = self.execute(&Method::POST, path, request).await?;
        self.decode(&Method::POST, path, &reply)
    }

    /// Sends a multipart POST and decodes the JSON body.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: FormBuilder,
    ) -> Result<T, ClientError> {
        let request = self
            .request(Method::POST, path)
            .multipart(form.into_multipart()?);
        let reply = self.execute(&Method::POST, path, request).await?;
        self.decode(&Method::POST, path, &reply)
    }

    /// Sends a POST with an empty body, discarding the response body.
    pub async fn post_empty(&self, path: &str) -> Result<(), ClientError> {
        let request = self.request(Method::POST, path);
        let reply = self.execute(&Method::POST, path, request).await?;
        self.report_success(&Method::POST, path, reply.status);
        Ok(())
    }

    /// Sends a GET and returns the raw body.
    pub async fn get_bytes(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<u8>, ClientError> {
        let request = self.request(Method::GET, path).query(query);
        let reply = self.execute(&Method::GET, path, request).await?;
        self.report_success(&Method::GET, path, reply.status);
        Ok(reply.body)
    }

    /// Sends a DELETE, discarding the response body.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, path);
        let reply = self.execute(&Method::DELETE, path, request).await?;
        self.report_success(&Method::DELETE, path, reply.status);
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.client
            .request(method, url)
            .basic_auth(&self.api_key, None::<&str>)
    }

    /// Sends `request` and reads the whole body of a success response.
    ///
    /// Failures in transit, error statuses and unreadable bodies are
    /// reported here. Success is reported by the caller once the body has
    /// been accepted.
    async fn execute(
        &self,
        method: &Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Reply, ClientError> {
        tracing::debug!(%method, path, "sending request");

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                self.report_failure(RequestFailure {
                    method: method.to_string(),
                    path: path.to_string(),
                    status: err.status().map(|status| status.as_u16()),
                    error_name: None,
                    message: err.to_string(),
                });
                return Err(err.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = api_error(status, &body);
            if let ClientError::Api { name, message, .. } = &err {
                self.report_failure(RequestFailure {
                    method: method.to_string(),
                    path: path.to_string(),
                    status: Some(status.as_u16()),
                    error_name: Some(name.clone()),
                    message: message.clone(),
                });
            }
            return Err(err);
        }

        match response.bytes().await {
            Ok(body) => Ok(Reply {
                status,
                body: body.to_vec(),
            }),
            Err(err) => {
                self.report_failure(RequestFailure {
                    method: method.to_string(),
                    path: path.to_string(),
                    status: Some(status.as_u16()),
                    error_name: None,
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Parses a JSON body, reporting a failure if it does not match `T`.
    fn decode<T: DeserializeOwned>(
        &self,
        method: &Method,
        path: &str,
        reply: &Reply,
    ) -> Result<T, ClientError> {
        match serde_json::from_slice(&reply.body) {
            Ok(value) => {
                self.report_success(method, path, reply.status);
                Ok(value)
            }
            Err(err) => {
                let message = format!(
                    "failed to parse response from '{path}': {err}; body: {}",
                    String::from_utf8_lossy(&reply.body)
                );
                self.report_failure(RequestFailure {
                    method: method.to_string(),
                    path: path.to_string(),
                    status: Some(reply.status.as_u16()),
                    error_name: Some(INVALID_RESPONSE.to_string()),
                    message: message.clone(),
                });
                Err(ClientError::InvalidResponse(message))
            }
        }
    }

    fn report_success(&self, method: &Method, path: &str, status: StatusCode) {
        if let Some(observer) = &self.observer {
            observer.on_success(&RequestOutcome {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
    }

    fn report_failure(&self, failure: RequestFailure) {
        tracing::warn!(
            method = %failure.method,
            path = %failure.path,
            status = ?failure.status,
            message = %failure.message,
            "request failed"
        );
        if let Some(observer) = &self.observer {
            observer.on_error(&failure);
        }
    }
}

/// A success response with its body read.
struct Reply {
    status: StatusCode,
    body: Vec<u8>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("observed", &self.observer.is_some())
            .finish()
    }
}
