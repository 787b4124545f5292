//! Repositories over entity indices.
//!
//! A [`DocumentRepository`] is the application-facing entry point: it wires a
//! transport, a serializer, the shared mapping registry and a routing resolver,
//! and exposes typed CRUD, search and streaming operations. [`IndexOperations`]
//! manages the index backing one entity type.

mod document_repository;
mod index_operations;
mod stream;

pub use document_repository::DocumentRepository;
pub use index_operations::IndexOperations;

use crate::errors::OdmError;
use crate::interfaces::StoreResponse;

/// Turn a non-success response into a `StoreError`.
pub(crate) fn expect_success(response: StoreResponse) -> Result<StoreResponse, OdmError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(OdmError::store(response.status, response.body_text()))
    }
}

/// A 404 about the document itself. A missing index is not a missing document.
pub(crate) fn is_missing_document(response: &StoreResponse) -> bool {
    response.is_not_found() && !response.body_text().contains("index_not_found_exception")
}

pub(crate) fn document_path(index: &str, id: &str) -> String {
    format!("/{}/_doc/{}", index, id)
}
