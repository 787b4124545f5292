//! Wire shapes of store responses.
//!
//! Only the parts the repository reads are modeled; everything else in a
//! response is ignored on deserialization.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use search_odm_shared::TotalHitsRelation;

#[derive(Debug, Deserialize)]
pub struct RawSearchResponse {
    #[serde(rename = "_scroll_id")]
    pub scroll_id: Option<String>,
    #[serde(default)]
    pub timed_out: bool,
    pub hits: RawHits,
    pub aggregations: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct RawHits {
    pub total: Option<RawTotal>,
    pub max_score: Option<f32>,
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

/// `hits.total` is an object on current stores and a bare number on old ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawTotal {
    Object {
        value: u64,
        relation: TotalHitsRelation,
    },
    Count(u64),
}

impl RawTotal {
    pub fn value(&self) -> u64 {
        match self {
            RawTotal::Object { value, .. } => *value,
            RawTotal::Count(value) => *value,
        }
    }

    pub fn relation(&self) -> TotalHitsRelation {
        match self {
            RawTotal::Object { relation, .. } => *relation,
            RawTotal::Count(_) => TotalHitsRelation::EqualTo,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "_score")]
    pub score: Option<f32>,
    #[serde(rename = "_routing")]
    pub routing: Option<String>,
    #[serde(rename = "_version")]
    pub version: Option<i64>,
    #[serde(rename = "_source")]
    pub source: Option<Map<String, Value>>,
    /// Values retrieved through the `fields` API, always arrays.
    pub fields: Option<Map<String, Value>>,
    #[serde(default)]
    pub highlight: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub sort: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawGetResponse {
    #[serde(rename = "_index")]
    pub index: Option<String>,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub found: bool,
    #[serde(rename = "_version")]
    pub version: Option<i64>,
    #[serde(rename = "_routing")]
    pub routing: Option<String>,
    #[serde(rename = "_source")]
    pub source: Option<Map<String, Value>>,
}

/// Response to an index or delete request.
#[derive(Debug, Deserialize)]
pub struct RawWriteResponse {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version")]
    pub version: Option<i64>,
    pub result: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawCountResponse {
    pub count: u64,
}
