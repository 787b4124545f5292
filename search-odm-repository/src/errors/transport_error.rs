//! Transport error types.
//!
//! Errors reported by a [`Transport`](crate::interfaces::Transport)
//! implementation. The repository treats them as opaque and never retries.

use thiserror::Error;

/// Errors that can occur while sending a request to the store.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request did not complete before its deadline.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Failed to establish a connection to the store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Any other network or protocol failure.
    #[error("Transport failure: {0}")]
    Other(String),
}

impl TransportError {
    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an unclassified transport error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
