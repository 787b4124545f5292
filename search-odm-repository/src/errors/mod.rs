//! Error types for the search ODM repository.

mod odm_error;
mod transport_error;

pub use odm_error::OdmError;
pub use transport_error::TransportError;
