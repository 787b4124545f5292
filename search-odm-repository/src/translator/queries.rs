//! Store query builders.
//!
//! Filters and aggregations are written against logical field names; these
//! functions emit the store's query DSL with every field path rewritten through
//! the entity mapping. `Native` bodies are emitted as-is.

use serde_json::{json, Map, Value};

use search_odm_shared::{AggregationKind, AggregationRequest, BoolFilter, QueryFilter};

use crate::errors::OdmError;
use crate::mapping::EntityMapping;

/// Build the store query for a filter.
pub fn build_filter(filter: &QueryFilter, mapping: &EntityMapping) -> Result<Value, OdmError> {
    let query = match filter {
        QueryFilter::MatchAll => json!({ "match_all": {} }),
        QueryFilter::Term { field, value } => {
            json!({ "term": { mapping.store_path(field)?: value } })
        }
        QueryFilter::Terms { field, values } => {
            json!({ "terms": { mapping.store_path(field)?: values } })
        }
        QueryFilter::Match { field, text } => {
            json!({ "match": { mapping.store_path(field)?: { "query": text } } })
        }
        QueryFilter::Range {
            field,
            gt,
            gte,
            lt,
            lte,
        } => {
            let mut bounds = Map::new();
            for (name, bound) in [("gt", gt), ("gte", gte), ("lt", lt), ("lte", lte)] {
                if let Some(bound) = bound {
                    bounds.insert(name.to_string(), bound.clone());
                }
            }
            json!({ "range": { mapping.store_path(field)?: bounds } })
        }
        QueryFilter::Exists { field } => {
            json!({ "exists": { "field": mapping.store_path(field)? } })
        }
        QueryFilter::Bool(bool_filter) => build_bool(bool_filter, mapping)?,
        QueryFilter::Native(body) => body.clone(),
    };
    Ok(query)
}

fn build_bool(filter: &BoolFilter, mapping: &EntityMapping) -> Result<Value, OdmError> {
    let mut clauses = Map::new();
    for (occurrence, filters) in [
        ("must", &filter.must),
        ("should", &filter.should),
        ("must_not", &filter.must_not),
        ("filter", &filter.filter),
    ] {
        if filters.is_empty() {
            continue;
        }
        let built = filters
            .iter()
            .map(|clause| build_filter(clause, mapping))
            .collect::<Result<Vec<_>, _>>()?;
        clauses.insert(occurrence.to_string(), Value::Array(built));
    }
    if let Some(minimum) = filter.minimum_should_match {
        clauses.insert("minimum_should_match".to_string(), json!(minimum));
    }

    Ok(json!({ "bool": clauses }))
}

/// Combine a filter with an id restriction.
///
/// Under a match-all filter the ids become the whole query; otherwise the
/// filter stays scoring and the ids are a non-scoring `filter` clause.
pub fn build_ids_query(query: Value, ids: &[String], match_all: bool) -> Value {
    let ids_clause = json!({ "ids": { "values": ids } });
    if match_all {
        return ids_clause;
    }

    json!({
        "bool": {
            "must": [query],
            "filter": [ids_clause]
        }
    })
}

/// Build the `aggs` section. Aggregations keep their insertion order.
pub fn build_aggregations(
    aggregations: &[AggregationRequest],
    mapping: &EntityMapping,
) -> Result<Value, OdmError> {
    let mut aggs = Map::new();
    for aggregation in aggregations {
        let body = match &aggregation.kind {
            AggregationKind::Terms { field, size } => {
                let mut terms = Map::new();
                terms.insert("field".to_string(), json!(mapping.store_path(field)?));
                if let Some(size) = size {
                    terms.insert("size".to_string(), json!(size));
                }
                json!({ "terms": terms })
            }
            AggregationKind::Metric { kind, field } => {
                json!({ kind.as_str(): { "field": mapping.store_path(field)? } })
            }
            AggregationKind::Native(body) => body.clone(),
        };
        aggs.insert(aggregation.name.clone(), body);
    }
    Ok(Value::Object(aggs))
}
