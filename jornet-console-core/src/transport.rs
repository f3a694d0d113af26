//! HTTP transport abstraction.
//!
//! The console consumes the server through the [`Transport`] trait so the
//! session and sync logic never depend on a concrete HTTP stack.
//! [`HttpTransport`] is the reqwest-backed implementation.
//!
//! Non-success statuses are returned as ordinary [`ApiResponse`] values;
//! callers decide whether to turn them into errors with
//! [`ApiResponse::error_for_status`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::credential::Credential;
use crate::error::TransportError;

/// HTTP method subset used by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A request to one of the server endpoints.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,

    /// Path under the server base URL, e.g. `/api/v1/leaderboards`.
    pub path: String,

    /// Opaque path segments appended after `path`, escaped when sent.
    pub segments: Vec<String>,

    pub query: Vec<(String, String)>,

    /// Bearer credential for authenticated endpoints.
    pub bearer: Option<Credential>,

    /// JSON body.
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            segments: Vec::new(),
            query: Vec::new(),
            bearer: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append a single path segment, such as a server-assigned identifier.
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a bearer credential.
    pub fn with_bearer(mut self, credential: Credential) -> Self {
        self.bearer = Some(credential);
        self
    }

    /// Attach a JSON body.
    pub fn with_json(mut self, body: &impl Serialize) -> Result<Self, TransportError> {
        let value = serde_json::to_value(body).map_err(|e| TransportError::Decode {
            message: format!("failed to encode request body: {}", e),
        })?;
        self.body = Some(value);
        Ok(self)
    }
}

/// A response from the server.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-success status into [`TransportError::Status`].
    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                status: self.status,
            })
        }
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_slice(&self.body).map_err(|e| TransportError::Decode {
            message: e.to_string(),
        })
    }
}

/// Capability to perform requests against the console server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a request.
    ///
    /// Returns `Err` only when no response was obtained.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Perform a request and decode a successful JSON response.
pub async fn fetch_json<T: DeserializeOwned>(
    transport: &dyn Transport,
    request: ApiRequest,
) -> Result<T, TransportError> {
    transport.send(request).await?.error_for_status()?.json()
}

/// Perform a request where only the status matters.
pub async fn fetch_status(
    transport: &dyn Transport,
    request: ApiRequest,
) -> Result<(), TransportError> {
    transport.send(request).await?.error_for_status()?;
    Ok(())
}

/// reqwest-backed [`Transport`] rooted at a server origin.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the server at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a transport that sends the given user agent.
    pub fn with_user_agent(base_url: Url, user_agent: &str) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Network {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the request URL.
    ///
    /// `path` is appended to the base URL's own path, so a console served
    /// under a prefix keeps it.
    fn endpoint(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(request.path.split('/').filter(|s| !s.is_empty()))
            .extend(&request.segments);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.endpoint(&request)?;
        debug!(method = %request.method, path = %request.path, "Sending request");

        let mut builder = match request.method {
            Method::Get => self.http_client.get(url),
            Method::Post => self.http_client.post(url),
            Method::Delete => self.http_client.delete(url),
        };
        if let Some(credential) = &request.bearer {
            builder = builder.bearer_auth(credential.expose());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| TransportError::Network {
            message: e.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network {
                message: format!("failed to read response body: {}", e),
            })?
            .to_vec();

        debug!(method = %request.method, path = %request.path, status, "Request completed");
        Ok(ApiResponse { status, body })
    }
}
