//! Repository error types.
//!
//! This module defines the errors surfaced by mapping resolution, query
//! translation, result mapping and repository operations.

use thiserror::Error;

use crate::errors::TransportError;

/// Errors that can occur while mapping, translating or executing an operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OdmError {
    /// The entity type cannot be mapped. Never retried.
    #[error("Mapping error for {entity}: {reason}")]
    MappingError { entity: String, reason: String },

    /// A query references a field absent from the entity mapping.
    #[error("Unknown field '{field}' for {entity}")]
    UnknownFieldError { entity: String, field: String },

    /// The query is internally inconsistent.
    #[error("Invalid query: {0}")]
    InvalidQueryError(String),

    /// A response lacks a field the mapping requires.
    #[error("Incomplete result: {0}")]
    IncompleteResultError(String),

    /// The store rejected a write because of a version conflict.
    #[error("Optimistic lock failure for document {id}: {reason}")]
    OptimisticLockError { id: String, reason: String },

    /// The transport deadline was exceeded.
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// The transport failed for a reason other than a timeout.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The store answered with an unexpected status.
    #[error("Store returned status {status}: {body}")]
    StoreError { status: u16, body: String },

    /// Failed to serialize an entity or a request body.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Failed to parse a response from the store.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl OdmError {
    /// Create a mapping error.
    pub fn mapping(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MappingError {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown field error.
    pub fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownFieldError {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Create an invalid query error.
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQueryError(msg.into())
    }

    /// Create an incomplete result error.
    pub fn incomplete_result(msg: impl Into<String>) -> Self {
        Self::IncompleteResultError(msg.into())
    }

    /// Create an optimistic lock error.
    pub fn optimistic_lock(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OptimisticLockError {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::TimeoutError(msg.into())
    }

    /// Create a store error from an unexpected status.
    pub fn store(status: u16, body: impl Into<String>) -> Self {
        Self::StoreError {
            status,
            body: body.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Whether the caller may recover by reloading and retrying the operation.
    pub fn is_optimistic_lock(&self) -> bool {
        matches!(self, Self::OptimisticLockError { .. })
    }
}

impl From<TransportError> for OdmError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(msg) => Self::TimeoutError(msg),
            other => Self::TransportError(other.to_string()),
        }
    }
}
