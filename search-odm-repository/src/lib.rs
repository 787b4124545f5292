//! # Search ODM Repository
//!
//! Maps application entities to documents of a search index and back. The
//! crate is organized in layers:
//!
//! - [`mapping`]: entity mapping descriptors, the mapping registry and the
//!   generated index settings
//! - [`translator`]: translation of [`Query`] values into store requests
//! - [`mapper`]: mapping of store responses into typed [`SearchHits`]
//! - [`repository`]: the typed repository and index operations
//! - [`interfaces`]: the transport, serializer and routing seams
//! - [`opensearch`]: the OpenSearch transport

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod mapper;
pub mod mapping;
pub mod opensearch;
pub mod repository;
pub mod translator;
pub mod types;

pub use config::{IncompleteHitPolicy, OdmConfig, RefreshPolicy};
pub use errors::{OdmError, TransportError};
pub use interfaces::{
    EntityRoutingResolver, HttpMethod, JsonSerializer, JustRouting, Operation, RoutingContext,
    RoutingResolver, Serializer, StoreRequest, StoreResponse, Transport,
};
pub use mapping::{
    Entity, EntityMapping, FieldDescriptor, FieldType, MappingBuilder, MappingRegistry, SubField,
};
pub use opensearch::OpenSearchTransport;
pub use repository::{DocumentRepository, IndexOperations};
pub use types::{BatchOperationResult, BatchOperationSummary, DeleteOutcome};

pub use search_odm_shared::{
    AggregationRequest, Aggregations, BoolFilter, Direction, HighlightField, HighlightQuery, Order,
    PageCursor, Pagination, Query, QueryFilter, RescorerQuery, SearchHit, SearchHits, SearchType,
    Sort, SourceFilter, TotalHitsRelation,
};
