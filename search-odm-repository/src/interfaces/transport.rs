//! Transport trait definition.
//!
//! A transport executes one store request and returns the raw response. It
//! knows nothing about entities, mappings or queries.

use async_trait::async_trait;

use crate::errors::TransportError;

/// HTTP verbs used against the store's REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Head,
}

/// A request against the store's REST API.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRequest {
    pub method: HttpMethod,
    /// Absolute path, e.g. `/articles/_doc/1`.
    pub path: String,
    /// URL query parameters in insertion order.
    pub params: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl StoreRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Add the parameter only when a value is present.
    pub fn with_optional_param(
        self,
        name: impl Into<String>,
        value: Option<impl Into<String>>,
    ) -> Self {
        match value {
            Some(value) => self.with_param(name, value),
            None => self,
        }
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first parameter with the given name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response of the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl StoreResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }

    /// Body as text, lossy. Used for error messages.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes requests against the store.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one transport is shared by every
/// repository and used concurrently.
///
/// # Error Handling
///
/// A transport reports network and protocol failures as `TransportError`.
/// Non-success HTTP statuses are *not* errors at this level: they are returned
/// as a `StoreResponse` and interpreted by the repository.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a single request and await its response.
    async fn execute(&self, request: StoreRequest) -> Result<StoreResponse, TransportError>;
}
