//! Per-request state threaded through a route chain.

use axum::body::Bytes;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method};
use notekernel_core::error::CoreError;
use notekernel_core::roles::Role;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The authenticated caller, attached by the authentication guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub role: Role,
}

impl Identity {
    /// The implicit identity used when no access code is configured.
    pub fn local_owner() -> Self {
        Self {
            subject: "local".to_string(),
            role: Role::Administrator,
        }
    }
}

/// Everything a guard or handler may inspect about one request.
///
/// Guards receive `&mut RequestContext` so they can attach an [`Identity`];
/// the terminal handler takes ownership.
#[derive(Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// `x-request-id` set by the tower-http request-id layer.
    pub request_id: Option<String>,
    pub state: AppState,
    pub identity: Option<Identity>,
}

impl RequestContext {
    pub fn new(state: AppState, method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            request_id: None,
            state,
            identity: None,
        }
    }

    /// Build a context from the parts of an inbound HTTP request.
    pub fn from_parts(state: AppState, parts: Parts, body: Bytes) -> Self {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            headers: parts.headers,
            body,
            request_id,
            state,
            identity: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Deserialize the JSON body. An empty body is treated as `{}`.
    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        let raw: &[u8] = if self.body.is_empty() { b"{}" } else { &self.body };
        serde_json::from_slice(raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))
    }

    /// Deserialize the JSON body and run its `validator` rules.
    pub fn valid_json<T: DeserializeOwned + Validate>(&self) -> AppResult<T> {
        let input: T = self.json()?;
        input
            .validate()
            .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
        Ok(input)
    }

    /// The identity attached by the authentication guard.
    pub fn identity(&self) -> AppResult<&Identity> {
        self.identity
            .as_ref()
            .ok_or_else(|| AppError::unauthenticated("Authentication required"))
    }
}
