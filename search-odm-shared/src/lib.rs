//! # Search ODM Shared
//!
//! Data types shared between application code and the search ODM repository.
//!
//! The query side describes *what* to ask the search engine for (filter,
//! pagination, sorting, projection, highlighting, rescoring, aggregations).
//! The result side carries typed hits back together with the metadata the
//! engine returned (scores, routing, sort values, highlight fragments,
//! aggregations and continuation cursors).

pub mod aggregation;
pub mod filter;
pub mod highlight;
pub mod hits;
pub mod query;
pub mod rescorer;
pub mod sort;

pub use aggregation::{AggregationKind, AggregationRequest, Aggregations, MetricKind};
pub use filter::{BoolFilter, QueryFilter};
pub use highlight::{HighlightField, HighlightQuery};
pub use hits::{PageCursor, SearchHit, SearchHits, TotalHitsRelation};
pub use query::{Pagination, Query, SearchType, SourceFilter, DEFAULT_PAGE_SIZE};
pub use rescorer::{RescorerQuery, ScoreMode};
pub use sort::{Direction, Order, Sort};
