//! The query model.
//!
//! A [`Query`] enumerates every option the repository understands, each with an
//! explicit default. Construction never validates cross-field consistency; the
//! translator does that when the query is turned into a store request.
//!
//! Setters replace the previous value, except `add_fields`, `add_rescorer` and
//! `add_aggregation`, which accumulate in insertion order.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregation::AggregationRequest;
use crate::filter::QueryFilter;
use crate::highlight::HighlightQuery;
use crate::rescorer::RescorerQuery;
use crate::sort::Sort;

/// Page size used when a query does not set pagination.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Offset based pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pagination {
    Paged { page: u32, size: u32 },
    /// No paging; the store's maximum result window applies.
    Unpaged,
}

impl Pagination {
    pub fn of(page: u32, size: u32) -> Self {
        Self::Paged { page, size }
    }

    /// Number of hits skipped before the first returned hit.
    pub fn offset(&self) -> u64 {
        match self {
            Self::Paged { page, size } => u64::from(*page) * u64::from(*size),
            Self::Unpaged => 0,
        }
    }

    pub fn page_size(&self) -> Option<u32> {
        match self {
            Self::Paged { size, .. } => Some(*size),
            Self::Unpaged => None,
        }
    }

    pub fn is_paged(&self) -> bool {
        matches!(self, Self::Paged { .. })
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::Paged {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Distributed scoring mode of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchType {
    #[default]
    QueryThenFetch,
    DfsQueryThenFetch,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::QueryThenFetch => "query_then_fetch",
            SearchType::DfsQueryThenFetch => "dfs_query_then_fetch",
        }
    }
}

/// Include/exclude patterns applied to the returned `_source`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceFilter {
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

impl SourceFilter {
    pub fn new<I, E>(includes: I, excludes: E) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            includes: includes.into_iter().map(Into::into).collect(),
            excludes: excludes.into_iter().map(Into::into).collect(),
        }
    }
}

/// A search request specification over logical field names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    pub filter: QueryFilter,
    pub pagination: Pagination,
    pub sort: Sort,
    /// Fields to retrieve through the `fields` API.
    pub fields: Vec<String>,
    pub source_filter: Option<SourceFilter>,
    pub min_score: Option<f32>,
    pub track_scores: bool,
    /// Restrict the hits to these document ids.
    pub ids: Vec<String>,
    /// Explicit routing; takes precedence over the routing resolver.
    pub route: Option<String>,
    pub search_type: SearchType,
    pub preference: Option<String>,
    pub track_total_hits: Option<bool>,
    pub track_total_hits_up_to: Option<u32>,
    pub search_after: Option<Vec<Value>>,
    pub rescorers: Vec<RescorerQuery>,
    pub highlight: Option<HighlightQuery>,
    /// Keep-alive of a scroll context. Mutually exclusive with `search_after`.
    pub scroll_time: Option<Duration>,
    pub timeout: Option<Duration>,
    pub explain: bool,
    /// Hard cap on the number of hits independent of pagination.
    pub limiting: bool,
    pub max_results: Option<u32>,
    pub aggregations: Vec<AggregationRequest>,
}

impl Query {
    pub fn new(filter: QueryFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// A query matching every document.
    pub fn find_all() -> Self {
        Self::new(QueryFilter::MatchAll)
    }

    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_page(self, page: u32, size: u32) -> Self {
        self.with_pagination(Pagination::of(page, size))
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn add_fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_source_filter(mut self, source_filter: SourceFilter) -> Self {
        self.source_filter = Some(source_filter);
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn with_track_scores(mut self, track_scores: bool) -> Self {
        self.track_scores = track_scores;
        self
    }

    pub fn with_ids<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    pub fn with_preference(mut self, preference: impl Into<String>) -> Self {
        self.preference = Some(preference.into());
        self
    }

    pub fn with_track_total_hits(mut self, track_total_hits: bool) -> Self {
        self.track_total_hits = Some(track_total_hits);
        self
    }

    pub fn with_track_total_hits_up_to(mut self, up_to: u32) -> Self {
        self.track_total_hits_up_to = Some(up_to);
        self
    }

    pub fn with_search_after(mut self, sort_values: Vec<Value>) -> Self {
        self.search_after = Some(sort_values);
        self
    }

    pub fn add_rescorer(mut self, rescorer: RescorerQuery) -> Self {
        self.rescorers.push(rescorer);
        self
    }

    /// Replace all rescoring stages.
    pub fn with_rescorers(mut self, rescorers: Vec<RescorerQuery>) -> Self {
        self.rescorers = rescorers;
        self
    }

    pub fn with_highlight(mut self, highlight: HighlightQuery) -> Self {
        self.highlight = Some(highlight);
        self
    }

    pub fn with_scroll_time(mut self, scroll_time: Duration) -> Self {
        self.scroll_time = Some(scroll_time);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    /// Cap the number of returned hits. Marks the query as limiting.
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.limiting = true;
        self.max_results = Some(max_results);
        self
    }

    pub fn add_aggregation(mut self, aggregation: AggregationRequest) -> Self {
        self.aggregations.push(aggregation);
        self
    }

    pub fn is_limiting(&self) -> bool {
        self.limiting
    }

    pub fn max_results(&self) -> Option<u32> {
        self.max_results
    }

    pub fn has_scroll_time(&self) -> bool {
        self.scroll_time.is_some()
    }

    pub fn offset(&self) -> u64 {
        self.pagination.offset()
    }
}
