//! Routing resolver trait definition.
//!
//! Routing decides which shard holds a document. The resolver is asked once
//! per operation; its answer is never cached.

use serde_json::Value;

use crate::mapping::{Document, EntityMapping};

/// The repository operation a routing value is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Save,
    Get,
    Exists,
    Delete,
    Search,
    Count,
}

/// What a resolver can see when deciding on routing.
#[derive(Debug, Clone, Copy)]
pub struct RoutingContext<'a> {
    pub operation: Operation,
    pub mapping: &'a EntityMapping,
    /// The store-side document being written, for save operations.
    pub document: Option<&'a Document>,
}

impl<'a> RoutingContext<'a> {
    pub fn new(operation: Operation, mapping: &'a EntityMapping) -> Self {
        Self {
            operation,
            mapping,
            document: None,
        }
    }

    pub fn with_document(mut self, document: &'a Document) -> Self {
        self.document = Some(document);
        self
    }

    /// Value of the mapping's routing field in the document, if both exist.
    pub fn entity_routing(&self) -> Option<String> {
        let field = self.mapping.routing_field()?;
        match self.document?.get(&field.store_name)? {
            Value::String(routing) => Some(routing.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Resolves the routing value for an operation.
pub trait RoutingResolver: Send + Sync {
    fn resolve(&self, context: &RoutingContext<'_>) -> Option<String>;
}

/// Routes writes by the entity's routing field; reads go unrouted.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityRoutingResolver;

impl RoutingResolver for EntityRoutingResolver {
    fn resolve(&self, context: &RoutingContext<'_>) -> Option<String> {
        context.entity_routing()
    }
}

/// Always routes with the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JustRouting(String);

impl JustRouting {
    pub fn new(routing: impl Into<String>) -> Self {
        Self(routing.into())
    }
}

impl RoutingResolver for JustRouting {
    fn resolve(&self, _context: &RoutingContext<'_>) -> Option<String> {
        Some(self.0.clone())
    }
}
