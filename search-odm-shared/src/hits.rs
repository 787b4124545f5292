//! Typed search results.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregation::Aggregations;

/// One hit of a search response. Built once by the result mapper and read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit<T> {
    index: String,
    id: String,
    score: Option<f32>,
    sort_values: Vec<Value>,
    routing: Option<String>,
    highlight_fields: HashMap<String, Vec<String>>,
    content: T,
}

impl<T> SearchHit<T> {
    pub fn new(
        index: String,
        id: String,
        score: Option<f32>,
        sort_values: Vec<Value>,
        routing: Option<String>,
        highlight_fields: HashMap<String, Vec<String>>,
        content: T,
    ) -> Self {
        Self {
            index,
            id,
            score,
            sort_values,
            routing,
            highlight_fields,
            content,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn score(&self) -> Option<f32> {
        self.score
    }

    /// Sort values of this hit, usable as a search-after cursor.
    pub fn sort_values(&self) -> &[Value] {
        &self.sort_values
    }

    pub fn routing(&self) -> Option<&str> {
        self.routing.as_deref()
    }

    pub fn highlight_fields(&self) -> &HashMap<String, Vec<String>> {
        &self.highlight_fields
    }

    /// Fragments for one field, empty if the field was not highlighted.
    pub fn highlight_field(&self, field: &str) -> &[String] {
        self.highlight_fields
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn content(&self) -> &T {
        &self.content
    }

    pub fn into_content(self) -> T {
        self.content
    }
}

/// Whether `total_hits` is exact, a lower bound, or was not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TotalHitsRelation {
    #[default]
    #[serde(rename = "eq")]
    EqualTo,
    #[serde(rename = "gte")]
    GreaterThanOrEqualTo,
    #[serde(rename = "off")]
    Off,
}

/// Continuation point of a paged search.
///
/// A cursor is consumed when the next page is requested; the repository never
/// keeps a copy, so continuing twice from the same point means rebuilding the
/// query.
#[derive(Debug, PartialEq)]
pub enum PageCursor {
    /// Sort values of the last hit of a full page.
    SearchAfter(Vec<Value>),
    /// Open scroll context.
    Scroll { scroll_id: String, keep_alive: Duration },
}

/// One page of typed hits with the response metadata.
#[derive(Debug)]
pub struct SearchHits<T> {
    total_hits: u64,
    total_hits_relation: TotalHitsRelation,
    max_score: Option<f32>,
    hits: Vec<SearchHit<T>>,
    aggregations: Option<Aggregations>,
    cursor: Option<PageCursor>,
    skipped_hits: usize,
}

impl<T> SearchHits<T> {
    pub fn new(
        total_hits: u64,
        total_hits_relation: TotalHitsRelation,
        max_score: Option<f32>,
        hits: Vec<SearchHit<T>>,
        aggregations: Option<Aggregations>,
    ) -> Self {
        Self {
            total_hits,
            total_hits_relation,
            max_score,
            hits,
            aggregations,
            cursor: None,
            skipped_hits: 0,
        }
    }

    pub fn with_cursor(mut self, cursor: Option<PageCursor>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_skipped_hits(mut self, skipped_hits: usize) -> Self {
        self.skipped_hits = skipped_hits;
        self
    }

    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    pub fn total_hits_relation(&self) -> TotalHitsRelation {
        self.total_hits_relation
    }

    pub fn max_score(&self) -> Option<f32> {
        self.max_score
    }

    pub fn search_hits(&self) -> &[SearchHit<T>] {
        &self.hits
    }

    pub fn has_search_hits(&self) -> bool {
        !self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn aggregations(&self) -> Option<&Aggregations> {
        self.aggregations.as_ref()
    }

    pub fn cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    /// Take the continuation cursor out of the page.
    pub fn take_cursor(&mut self) -> Option<PageCursor> {
        self.cursor.take()
    }

    /// Hits dropped because they could not be mapped under the skip policy.
    pub fn skipped_hits(&self) -> usize {
        self.skipped_hits
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchHit<T>> {
        self.hits.iter()
    }

    /// Unwrap the hits into their typed contents, in hit order.
    pub fn into_contents(self) -> Vec<T> {
        self.hits.into_iter().map(SearchHit::into_content).collect()
    }
}

impl<T> IntoIterator for SearchHits<T> {
    type Item = SearchHit<T>;
    type IntoIter = std::vec::IntoIter<SearchHit<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}
