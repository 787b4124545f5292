//! Interface definitions for the collaborators of the repository.
//!
//! The repository delegates network access to a `Transport`, byte encoding to
//! a `Serializer` and routing decisions to a `RoutingResolver`.

mod routing_resolver;
mod serializer;
mod transport;

pub use routing_resolver::{
    EntityRoutingResolver, JustRouting, Operation, RoutingContext, RoutingResolver,
};
pub use serializer::{JsonSerializer, Serializer};
pub use transport::{HttpMethod, StoreRequest, StoreResponse, Transport};
