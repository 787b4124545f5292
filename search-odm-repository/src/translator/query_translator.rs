//! Query translation.
//!
//! Turns a [`Query`] over logical field names into a search request body and
//! URL parameters for one entity's index. Translation is pure: it only reads
//! the query, the mapping and the configuration.

use std::time::Duration;

use serde_json::{json, Map, Value};
use tracing::debug;

use search_odm_shared::{HighlightQuery, Pagination, Query, RescorerQuery, Sort, SourceFilter};

use crate::config::OdmConfig;
use crate::errors::OdmError;
use crate::interfaces::{Operation, RoutingContext, RoutingResolver};
use crate::mapping::EntityMapping;
use crate::translator::queries::{build_aggregations, build_filter, build_ids_query};

/// URL parameters of a search request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub routing: Option<String>,
    pub preference: Option<String>,
    pub search_type: Option<String>,
    /// Scroll keep-alive, e.g. `60000ms`.
    pub scroll: Option<String>,
}

impl RequestParams {
    /// The parameters that are set, in a stable order.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        [
            ("routing", &self.routing),
            ("preference", &self.preference),
            ("search_type", &self.search_type),
            ("scroll", &self.scroll),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|value| (name.to_string(), value.clone())))
        .collect()
    }
}

/// A translated search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub index: String,
    pub body: Value,
    pub params: RequestParams,
    /// Number of hits requested, used to tell whether a page is full.
    pub page_size: u32,
    /// Keep-alive of the scroll context the request opens, if any.
    pub scroll_time: Option<Duration>,
}

/// Translates queries against one entity mapping.
pub struct QueryTranslator<'a> {
    mapping: &'a EntityMapping,
    config: &'a OdmConfig,
}

impl<'a> QueryTranslator<'a> {
    pub fn new(mapping: &'a EntityMapping, config: &'a OdmConfig) -> Self {
        Self { mapping, config }
    }

    /// Translate a query into a search request.
    ///
    /// # Arguments
    ///
    /// * `query` - The query to translate
    /// * `resolver` - Consulted for routing when the query sets no explicit route
    ///
    /// # Returns
    ///
    /// * `Ok(SearchRequest)` - Body and parameters for `POST /{index}/_search`
    /// * `Err(OdmError::InvalidQueryError)` - If the query options contradict each other
    /// * `Err(OdmError::UnknownFieldError)` - If a field path is not in the mapping
    pub fn translate(
        &self,
        query: &Query,
        resolver: &dyn RoutingResolver,
    ) -> Result<SearchRequest, OdmError> {
        self.validate(query)?;

        let mut body = Map::new();
        body.insert("query".to_string(), self.build_query(query)?);

        let page_size = self.apply_pagination(query, &mut body);
        self.apply_total_hits(query, &mut body);

        if let Some(search_after) = &query.search_after {
            body.insert("search_after".to_string(), json!(search_after));
        }
        if let Some(min_score) = query.min_score {
            body.insert("min_score".to_string(), json!(min_score));
        }
        if query.track_scores {
            body.insert("track_scores".to_string(), json!(true));
        }
        if query.explain {
            body.insert("explain".to_string(), json!(true));
        }
        if let Some(timeout) = query.timeout {
            body.insert("timeout".to_string(), json!(as_millis(timeout)));
        }
        if let Some(source_filter) = &query.source_filter {
            body.insert("_source".to_string(), self.build_source_filter(source_filter)?);
        }
        if !query.fields.is_empty() {
            let fields = query
                .fields
                .iter()
                .map(|field| self.mapping.store_pattern(field))
                .collect::<Result<Vec<_>, _>>()?;
            body.insert("fields".to_string(), json!(fields));
        }
        if query.sort.is_sorted() {
            body.insert("sort".to_string(), self.build_sort(&query.sort)?);
        }
        if let Some(highlight) = &query.highlight {
            body.insert("highlight".to_string(), self.build_highlight(highlight)?);
        }
        if !query.rescorers.is_empty() {
            body.insert("rescore".to_string(), self.build_rescore(&query.rescorers)?);
        }
        if !query.aggregations.is_empty() {
            body.insert(
                "aggs".to_string(),
                build_aggregations(&query.aggregations, self.mapping)?,
            );
        }

        let params = RequestParams {
            routing: self.routing(query, Operation::Search, resolver),
            preference: query.preference.clone(),
            search_type: Some(query.search_type.as_str().to_string()),
            scroll: query.scroll_time.map(as_millis),
        };

        debug!(
            index = self.mapping.index_name(),
            page_size,
            routing = ?params.routing,
            "Translated search query"
        );

        Ok(SearchRequest {
            index: self.mapping.index_name().to_string(),
            body: Value::Object(body),
            params,
            page_size,
            scroll_time: query.scroll_time,
        })
    }

    /// Translate the filter part of a query into a `_count` request.
    ///
    /// Pagination, sorting and result shaping do not apply to counts.
    pub fn translate_count(
        &self,
        query: &Query,
        resolver: &dyn RoutingResolver,
    ) -> Result<SearchRequest, OdmError> {
        let body = json!({ "query": self.build_query(query)? });
        let params = RequestParams {
            routing: self.routing(query, Operation::Count, resolver),
            preference: query.preference.clone(),
            ..Default::default()
        };

        Ok(SearchRequest {
            index: self.mapping.index_name().to_string(),
            body,
            params,
            page_size: 0,
            scroll_time: None,
        })
    }

    fn validate(&self, query: &Query) -> Result<(), OdmError> {
        if query.is_limiting() && query.max_results().is_none() {
            return Err(OdmError::invalid_query(
                "query is limiting but sets no maximum number of results",
            ));
        }
        if query.search_after.is_some() {
            if query.has_scroll_time() {
                return Err(OdmError::invalid_query(
                    "search_after cannot be combined with a scroll",
                ));
            }
            if query.offset() != 0 {
                return Err(OdmError::invalid_query(format!(
                    "search_after requires offset 0, got {}",
                    query.offset()
                )));
            }
        }
        Ok(())
    }

    fn build_query(&self, query: &Query) -> Result<Value, OdmError> {
        let filter = build_filter(&query.filter, self.mapping)?;
        if query.ids.is_empty() {
            return Ok(filter);
        }
        Ok(build_ids_query(filter, &query.ids, query.filter.is_match_all()))
    }

    /// Write `from`/`size` and return the effective page size.
    fn apply_pagination(&self, query: &Query, body: &mut Map<String, Value>) -> u32 {
        let mut size = match query.pagination {
            Pagination::Paged { size, .. } => size,
            Pagination::Unpaged => self.config.max_result_window,
        };
        if let Some(max_results) = query.max_results().filter(|_| query.is_limiting()) {
            size = max_results;
        }

        if query.search_after.is_none() {
            body.insert("from".to_string(), json!(query.offset()));
        }
        body.insert("size".to_string(), json!(size));
        size
    }

    fn apply_total_hits(&self, query: &Query, body: &mut Map<String, Value>) {
        match (query.track_total_hits, query.track_total_hits_up_to) {
            (Some(track), _) => {
                body.insert("track_total_hits".to_string(), json!(track));
            }
            (None, Some(up_to)) => {
                body.insert("track_total_hits".to_string(), json!(up_to));
            }
            (None, None) => {}
        }
    }

    fn routing(
        &self,
        query: &Query,
        operation: Operation,
        resolver: &dyn RoutingResolver,
    ) -> Option<String> {
        query
            .route
            .clone()
            .or_else(|| resolver.resolve(&RoutingContext::new(operation, self.mapping)))
    }

    fn build_source_filter(&self, source_filter: &SourceFilter) -> Result<Value, OdmError> {
        let patterns = |patterns: &[String]| {
            patterns
                .iter()
                .map(|pattern| self.mapping.store_pattern(pattern))
                .collect::<Result<Vec<_>, _>>()
        };

        let mut source = Map::new();
        if !source_filter.includes.is_empty() {
            source.insert("includes".to_string(), json!(patterns(&source_filter.includes)?));
        }
        if !source_filter.excludes.is_empty() {
            source.insert("excludes".to_string(), json!(patterns(&source_filter.excludes)?));
        }
        Ok(Value::Object(source))
    }

    fn build_sort(&self, sort: &Sort) -> Result<Value, OdmError> {
        let orders = sort
            .orders()
            .iter()
            .map(|order| {
                let field = self.mapping.store_path(&order.field)?;
                Ok(json!({ field: { "order": order.direction.as_str() } }))
            })
            .collect::<Result<Vec<_>, OdmError>>()?;
        Ok(Value::Array(orders))
    }

    fn build_highlight(&self, highlight: &HighlightQuery) -> Result<Value, OdmError> {
        let mut fields = Map::new();
        for field in &highlight.fields {
            let mut options = Map::new();
            if let Some(fragment_size) = field.fragment_size {
                options.insert("fragment_size".to_string(), json!(fragment_size));
            }
            if let Some(number_of_fragments) = field.number_of_fragments {
                options.insert("number_of_fragments".to_string(), json!(number_of_fragments));
            }
            fields.insert(self.mapping.store_pattern(&field.name)?, Value::Object(options));
        }

        let mut body = Map::new();
        if !highlight.pre_tags.is_empty() {
            body.insert("pre_tags".to_string(), json!(highlight.pre_tags));
        }
        if !highlight.post_tags.is_empty() {
            body.insert("post_tags".to_string(), json!(highlight.post_tags));
        }
        if let Some(fragment_size) = highlight.fragment_size {
            body.insert("fragment_size".to_string(), json!(fragment_size));
        }
        if let Some(number_of_fragments) = highlight.number_of_fragments {
            body.insert("number_of_fragments".to_string(), json!(number_of_fragments));
        }
        body.insert("fields".to_string(), Value::Object(fields));
        Ok(Value::Object(body))
    }

    fn build_rescore(&self, rescorers: &[RescorerQuery]) -> Result<Value, OdmError> {
        let stages = rescorers
            .iter()
            .map(|rescorer| {
                let mut query = Map::new();
                query.insert(
                    "rescore_query".to_string(),
                    build_filter(&rescorer.query, self.mapping)?,
                );
                if let Some(weight) = rescorer.query_weight {
                    query.insert("query_weight".to_string(), json!(weight));
                }
                if let Some(weight) = rescorer.rescore_query_weight {
                    query.insert("rescore_query_weight".to_string(), json!(weight));
                }
                if let Some(score_mode) = rescorer.score_mode {
                    query.insert("score_mode".to_string(), json!(score_mode.as_str()));
                }

                let mut stage = Map::new();
                if let Some(window_size) = rescorer.window_size {
                    stage.insert("window_size".to_string(), json!(window_size));
                }
                stage.insert("query".to_string(), Value::Object(query));
                Ok(Value::Object(stage))
            })
            .collect::<Result<Vec<_>, OdmError>>()?;
        Ok(Value::Array(stages))
    }
}

/// Render a duration as a store time value.
pub(crate) fn as_millis(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}
