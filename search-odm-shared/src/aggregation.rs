//! Aggregation requests and results.
//!
//! Aggregation results are not modeled: the engine's response is surfaced as a
//! name-keyed map of JSON values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Single-value metric aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    Avg,
    Sum,
    Min,
    Max,
    Cardinality,
    ValueCount,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Avg => "avg",
            MetricKind::Sum => "sum",
            MetricKind::Min => "min",
            MetricKind::Max => "max",
            MetricKind::Cardinality => "cardinality",
            MetricKind::ValueCount => "value_count",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AggregationKind {
    /// Bucket by distinct field values.
    Terms { field: String, size: Option<u32> },
    Metric { kind: MetricKind, field: String },
    /// Store-native aggregation body, emitted verbatim.
    Native(Value),
}

/// A named aggregation to compute alongside the hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRequest {
    pub name: String,
    pub kind: AggregationKind,
}

impl AggregationRequest {
    pub fn terms(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AggregationKind::Terms {
                field: field.into(),
                size: None,
            },
        }
    }

    pub fn metric(name: impl Into<String>, kind: MetricKind, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AggregationKind::Metric {
                kind,
                field: field.into(),
            },
        }
    }

    pub fn native(name: impl Into<String>, body: Value) -> Self {
        Self {
            name: name.into(),
            kind: AggregationKind::Native(body),
        }
    }

    /// Limit the number of buckets of a terms aggregation. No effect on other kinds.
    pub fn with_size(mut self, bucket_count: u32) -> Self {
        if let AggregationKind::Terms { size, .. } = &mut self.kind {
            *size = Some(bucket_count);
        }
        self
    }
}

/// Aggregation results keyed by aggregation name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Aggregations(Map<String, Value>);

impl Aggregations {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
