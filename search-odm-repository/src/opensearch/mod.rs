//! OpenSearch implementation of the transport.
//!
//! This module provides the `Transport` used against a real OpenSearch node.

mod transport;

pub use transport::{OpenSearchTransport, DEFAULT_OPENSEARCH_URL};
