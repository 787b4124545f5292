//! In-memory store speaking the subset of the REST API the repository uses.
//!
//! Documents live in per-shard maps; the shard of a document is derived from
//! its routing value (or its id when unrouted), so a lookup with the wrong
//! routing misses the document the same way a real cluster would.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

use search_odm_repository::{HttpMethod, StoreRequest, StoreResponse, Transport, TransportError};

#[derive(Debug, Clone)]
struct StoredDocument {
    source: Map<String, Value>,
    version: i64,
    routing: Option<String>,
}

#[derive(Debug)]
struct Index {
    shards: Vec<BTreeMap<String, StoredDocument>>,
}

impl Index {
    fn new(shards: usize) -> Self {
        Self {
            shards: (0..shards.max(1)).map(|_| BTreeMap::new()).collect(),
        }
    }

    fn shard_of(&self, key: &str) -> usize {
        let sum: usize = key.bytes().map(usize::from).sum();
        sum % self.shards.len()
    }
}

#[derive(Debug)]
struct ScrollContext {
    hits: Vec<Value>,
    position: usize,
    size: usize,
}

#[derive(Debug, Default)]
struct State {
    indices: HashMap<String, Index>,
    scrolls: HashMap<String, ScrollContext>,
}

/// A fake store implementing `Transport`.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    requests: Mutex<Vec<StoreRequest>>,
    time_out: AtomicBool,
    scroll_counter: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following request fail with a transport timeout.
    pub fn fail_with_timeout(&self, enabled: bool) {
        self.time_out.store(enabled, AtomicOrdering::SeqCst);
    }

    pub async fn requests(&self) -> Vec<StoreRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn open_scrolls(&self) -> usize {
        self.state.lock().await.scrolls.len()
    }

    /// Shard holding the document with the given id, if any.
    pub async fn shard_of_document(&self, index: &str, id: &str) -> Option<usize> {
        let state = self.state.lock().await;
        let index = state.indices.get(index)?;
        index.shards.iter().position(|shard| shard.contains_key(id))
    }

    async fn handle(&self, request: &StoreRequest) -> StoreResponse {
        let segments: Vec<&str> = request.path.split('/').filter(|s| !s.is_empty()).collect();
        let body: Value = request
            .body
            .as_ref()
            .map(|bytes| serde_json::from_slice(bytes).unwrap())
            .unwrap_or(Value::Null);
        let mut state = self.state.lock().await;

        match (request.method, segments.as_slice()) {
            (HttpMethod::Post, ["_search", "scroll"]) => continue_scroll(&mut state, &body),
            (HttpMethod::Delete, ["_search", "scroll"]) => clear_scroll(&mut state, &body),
            (HttpMethod::Put, [index]) => create_index(&mut state, index, &body),
            (HttpMethod::Head, [index]) => match state.indices.contains_key(*index) {
                true => status(200),
                false => status(404),
            },
            (HttpMethod::Delete, [index]) => match state.indices.remove(*index) {
                Some(_) => respond(200, json!({ "acknowledged": true })),
                None => index_not_found(index),
            },
            (HttpMethod::Post, [index, "_refresh"]) => match state.indices.contains_key(*index) {
                true => respond(200, json!({ "_shards": { "failed": 0 } })),
                false => index_not_found(index),
            },
            (HttpMethod::Post, [index, "_doc"]) => {
                if request.param("version").is_some() || request.param("version_type").is_some() {
                    return respond(
                        400,
                        json!({
                            "error": {
                                "type": "action_request_validation_exception",
                                "reason": "an id must be provided if version type or value are set"
                            },
                            "status": 400
                        }),
                    );
                }
                let id = uuid::Uuid::new_v4().to_string();
                index_document(&mut state, index, &id, request, body)
            }
            (HttpMethod::Put, [index, "_doc", id]) => {
                index_document(&mut state, index, id, request, body)
            }
            (HttpMethod::Get, [index, "_doc", id]) => get_document(&state, index, id, request),
            (HttpMethod::Head, [index, "_doc", id]) => {
                match get_document(&state, index, id, request).status {
                    200 => status(200),
                    _ => status(404),
                }
            }
            (HttpMethod::Delete, [index, "_doc", id]) => {
                delete_document(&mut state, index, id, request)
            }
            (HttpMethod::Post, [index, "_search"]) => {
                let scroll_id = request.param("scroll").map(|_| {
                    let next = self.scroll_counter.fetch_add(1, AtomicOrdering::SeqCst);
                    format!("scroll-{}", next)
                });
                search(&mut state, index, request, &body, scroll_id)
            }
            (HttpMethod::Post, [index, "_count"]) => count(&state, index, request, &body),
            (method, path) => panic!("unsupported request {:?} {:?}", method, path),
        }
    }
}

#[async_trait]
impl Transport for InMemoryStore {
    async fn execute(&self, request: StoreRequest) -> Result<StoreResponse, TransportError> {
        self.requests.lock().await.push(request.clone());
        if self.time_out.load(AtomicOrdering::SeqCst) {
            return Err(TransportError::timeout("request exceeded its deadline"));
        }
        Ok(self.handle(&request).await)
    }
}

fn respond(status: u16, body: Value) -> StoreResponse {
    StoreResponse::new(status, serde_json::to_vec(&body).unwrap())
}

fn status(status: u16) -> StoreResponse {
    StoreResponse::new(status, Vec::new())
}

fn index_not_found(index: &str) -> StoreResponse {
    respond(
        404,
        json!({ "error": { "type": "index_not_found_exception", "index": index }, "status": 404 }),
    )
}

fn create_index(state: &mut State, index: &str, body: &Value) -> StoreResponse {
    if state.indices.contains_key(index) {
        return respond(
            400,
            json!({
                "error": { "type": "resource_already_exists_exception", "index": index },
                "status": 400
            }),
        );
    }
    let shards = body["settings"]["number_of_shards"].as_u64().unwrap_or(1) as usize;
    state.indices.insert(index.to_string(), Index::new(shards));
    respond(200, json!({ "acknowledged": true, "index": index }))
}

fn index_document(
    state: &mut State,
    index_name: &str,
    id: &str,
    request: &StoreRequest,
    body: Value,
) -> StoreResponse {
    let index = state
        .indices
        .entry(index_name.to_string())
        .or_insert_with(|| Index::new(1));
    let routing = request.param("routing").map(str::to_string);
    let shard = index.shard_of(routing.as_deref().unwrap_or(id));
    let existing = index.shards[shard].get(id).map(|doc| doc.version);

    let version = match (request.param("version_type"), request.param("version")) {
        (Some("external"), Some(version)) => {
            let version: i64 = version.parse().unwrap();
            if existing.is_some_and(|current| current >= version) {
                return respond(
                    409,
                    json!({
                        "error": {
                            "type": "version_conflict_engine_exception",
                            "reason": format!(
                                "[{}]: version conflict, current version [{}] is higher or \
                                 equal to the one provided [{}]",
                                id,
                                existing.unwrap_or_default(),
                                version
                            )
                        },
                        "status": 409
                    }),
                );
            }
            version
        }
        _ => existing.map_or(1, |current| current + 1),
    };

    let Value::Object(source) = body else {
        return respond(400, json!({ "error": { "type": "mapper_parsing_exception" } }));
    };
    index.shards[shard].insert(
        id.to_string(),
        StoredDocument {
            source,
            version,
            routing,
        },
    );

    let (status_code, result) = match existing {
        Some(_) => (200, "updated"),
        None => (201, "created"),
    };
    respond(
        status_code,
        json!({ "_index": index_name, "_id": id, "_version": version, "result": result }),
    )
}

fn get_document(
    state: &State,
    index_name: &str,
    id: &str,
    request: &StoreRequest,
) -> StoreResponse {
    let Some(index) = state.indices.get(index_name) else {
        return index_not_found(index_name);
    };
    let shard = index.shard_of(request.param("routing").unwrap_or(id));

    match index.shards[shard].get(id) {
        Some(doc) => {
            let mut hit = json!({
                "_index": index_name,
                "_id": id,
                "_version": doc.version,
                "found": true,
                "_source": doc.source
            });
            if let Some(routing) = &doc.routing {
                hit["_routing"] = json!(routing);
            }
            respond(200, hit)
        }
        None => respond(404, json!({ "_index": index_name, "_id": id, "found": false })),
    }
}

fn delete_document(
    state: &mut State,
    index_name: &str,
    id: &str,
    request: &StoreRequest,
) -> StoreResponse {
    let Some(index) = state.indices.get_mut(index_name) else {
        return index_not_found(index_name);
    };
    let shard = index.shard_of(request.param("routing").unwrap_or(id));

    match index.shards[shard].remove(id) {
        Some(doc) => respond(
            200,
            json!({
                "_index": index_name,
                "_id": id,
                "_version": doc.version + 1,
                "result": "deleted"
            }),
        ),
        None => respond(404, json!({ "_index": index_name, "_id": id, "result": "not_found" })),
    }
}

/// Matching documents as `(id, document)` in shard then id order.
fn matching<'a>(
    index: &'a Index,
    request: &StoreRequest,
    query: &Value,
) -> Vec<(&'a String, &'a StoredDocument)> {
    let shards: Vec<usize> = match request.param("routing") {
        Some(routing) => vec![index.shard_of(routing)],
        None => (0..index.shards.len()).collect(),
    };
    shards
        .into_iter()
        .flat_map(|shard| index.shards[shard].iter())
        .filter(|(id, doc)| matches(query, id, &doc.source))
        .collect()
}

fn matches(query: &Value, id: &str, source: &Map<String, Value>) -> bool {
    let Some((kind, clause)) = query.as_object().and_then(|q| q.iter().next()) else {
        return true;
    };
    match kind.as_str() {
        "match_all" => true,
        "ids" => clause["values"]
            .as_array()
            .is_some_and(|values| values.iter().any(|value| value == id)),
        "term" => clause
            .as_object()
            .and_then(|c| c.iter().next())
            .is_some_and(|(field, value)| field_values(source, field).contains(value)),
        "match" => clause.as_object().and_then(|c| c.iter().next()).is_some_and(|(field, options)| {
            let needle = options["query"].as_str().unwrap_or_default().to_lowercase();
            field_values(source, field)
                .iter()
                .filter_map(Value::as_str)
                .any(|text| text.to_lowercase().split_whitespace().any(|word| word == needle))
        }),
        "bool" => {
            let all = |occurrence: &str| {
                clause[occurrence]
                    .as_array()
                    .map_or(true, |clauses| clauses.iter().all(|c| matches(c, id, source)))
            };
            let should = clause["should"].as_array().map_or(true, |clauses| {
                clauses.is_empty() || clauses.iter().any(|c| matches(c, id, source))
            });
            let must_not = clause["must_not"]
                .as_array()
                .map_or(true, |clauses| clauses.iter().all(|c| !matches(c, id, source)));
            all("must") && all("filter") && should && must_not
        }
        other => panic!("unsupported query {}", other),
    }
}

fn field_values(source: &Map<String, Value>, field: &str) -> Vec<Value> {
    match source.get(field) {
        Some(Value::Array(values)) => values.clone(),
        Some(value) => vec![value.clone()],
        None => Vec::new(),
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn search(
    state: &mut State,
    index_name: &str,
    request: &StoreRequest,
    body: &Value,
    scroll_id: Option<String>,
) -> StoreResponse {
    let Some(index) = state.indices.get(index_name) else {
        return index_not_found(index_name);
    };
    let matched = matching(index, request, &body["query"]);
    let total = matched.len();

    let sort = body["sort"].as_array().and_then(|orders| orders.first()).and_then(|order| {
        order.as_object().and_then(|o| o.iter().next()).map(|(field, options)| {
            (field.clone(), options["order"].as_str() == Some("desc"))
        })
    });

    let mut hits: Vec<(Value, Value)> = matched
        .into_iter()
        .map(|(id, doc)| {
            let sort_value = sort
                .as_ref()
                .map(|(field, _)| doc.source.get(field).cloned().unwrap_or(Value::Null))
                .unwrap_or(Value::Null);
            let mut hit = json!({
                "_index": index_name,
                "_id": id,
                "_score": 1.0,
                "_source": doc.source
            });
            if let Some(routing) = &doc.routing {
                hit["_routing"] = json!(routing);
            }
            if sort.is_some() {
                hit["sort"] = json!([sort_value]);
            }
            (sort_value, hit)
        })
        .collect();

    if let Some((_, descending)) = &sort {
        hits.sort_by(|(a, _), (b, _)| {
            let ordering = compare(a, b);
            if *descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
    if let (Some((_, descending)), Some(after)) = (&sort, body["search_after"].as_array()) {
        let after = after[0].clone();
        hits.retain(|(value, _)| match compare(value, &after) {
            Ordering::Greater => !descending,
            Ordering::Less => *descending,
            Ordering::Equal => false,
        });
    }

    let aggregations = aggregate(&body["aggs"], hits.iter().map(|(_, hit)| &hit["_source"]));
    let mut hits: Vec<Value> = hits.into_iter().map(|(_, hit)| hit).collect();

    let from = body["from"].as_u64().unwrap_or(0) as usize;
    let size = body["size"].as_u64().unwrap_or(10) as usize;

    let page: Vec<Value> = match &scroll_id {
        Some(scroll_id) => {
            let first: Vec<Value> = hits.drain(..size.min(hits.len())).collect();
            state.scrolls.insert(
                scroll_id.clone(),
                ScrollContext {
                    hits,
                    position: 0,
                    size,
                },
            );
            first
        }
        None => hits.into_iter().skip(from).take(size).collect(),
    };

    let mut response = json!({ "timed_out": false, "hits": { "max_score": 1.0, "hits": page } });
    if body["track_total_hits"] != json!(false) {
        response["hits"]["total"] = json!({ "value": total, "relation": "eq" });
    }
    if let Some(aggregations) = aggregations {
        response["aggregations"] = aggregations;
    }
    if let Some(scroll_id) = scroll_id {
        response["_scroll_id"] = json!(scroll_id);
    }
    respond(200, response)
}

fn aggregate<'a>(aggs: &Value, sources: impl Iterator<Item = &'a Value> + Clone) -> Option<Value> {
    let aggs = aggs.as_object()?;
    let mut results = Map::new();
    for (name, aggregation) in aggs {
        let field = aggregation["terms"]["field"]
            .as_str()
            .unwrap_or_else(|| panic!("unsupported aggregation {}", aggregation));
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for source in sources.clone() {
            let values = source
                .as_object()
                .map(|source| field_values(source, field))
                .unwrap_or_default();
            for value in values {
                let key = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
                *counts.entry(key).or_default() += 1;
            }
        }
        let mut buckets: Vec<(String, u64)> = counts.into_iter().collect();
        buckets.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let buckets: Vec<Value> = buckets
            .into_iter()
            .map(|(key, doc_count)| json!({ "key": key, "doc_count": doc_count }))
            .collect();
        results.insert(name.clone(), json!({ "buckets": buckets }));
    }
    Some(Value::Object(results))
}

fn continue_scroll(state: &mut State, body: &Value) -> StoreResponse {
    let scroll_id = body["scroll_id"].as_str().unwrap_or_default().to_string();
    let Some(context) = state.scrolls.get_mut(&scroll_id) else {
        return respond(404, json!({ "error": { "type": "search_context_missing_exception" } }));
    };

    let end = (context.position + context.size).min(context.hits.len());
    let page: Vec<Value> = context.hits[context.position..end].to_vec();
    context.position = end;

    respond(
        200,
        json!({ "_scroll_id": scroll_id, "timed_out": false, "hits": { "hits": page } }),
    )
}

fn clear_scroll(state: &mut State, body: &Value) -> StoreResponse {
    let freed = body["scroll_id"]
        .as_array()
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .filter(|id| state.scrolls.remove(*id).is_some())
                .count()
        })
        .unwrap_or_default();

    if freed == 0 {
        return respond(404, json!({ "succeeded": true, "num_freed": 0 }));
    }
    respond(200, json!({ "succeeded": true, "num_freed": freed }))
}

fn count(state: &State, index_name: &str, request: &StoreRequest, body: &Value) -> StoreResponse {
    let Some(index) = state.indices.get(index_name) else {
        return index_not_found(index_name);
    };
    let count = matching(index, request, &body["query"]).len();
    respond(200, json!({ "count": count }))
}
