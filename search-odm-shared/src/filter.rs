//! Query filters over logical field names.
//!
//! Filters reference fields by their logical (application-side) names; the
//! translator rewrites them to store names. `MatchAll` is the sentinel used by
//! `Query::find_all()` and `Native` passes a store query through untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A filter clause of a query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum QueryFilter {
    /// Matches every document.
    #[default]
    MatchAll,
    /// Exact value on a (usually keyword) field.
    Term { field: String, value: Value },
    /// Any of the given exact values.
    Terms { field: String, values: Vec<Value> },
    /// Analyzed full-text match.
    Match { field: String, text: String },
    /// Range over a field; unset bounds are omitted.
    Range {
        field: String,
        gt: Option<Value>,
        gte: Option<Value>,
        lt: Option<Value>,
        lte: Option<Value>,
    },
    /// Field has a non-null value.
    Exists { field: String },
    /// Boolean combination of filters.
    Bool(BoolFilter),
    /// A store-native query body, emitted verbatim and never field-checked.
    Native(Value),
}

impl QueryFilter {
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matching(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Match {
            field: field.into(),
            text: text.into(),
        }
    }

    /// Inclusive range; pass `None` for an open bound.
    pub fn between(field: impl Into<String>, gte: Option<Value>, lte: Option<Value>) -> Self {
        Self::Range {
            field: field.into(),
            gt: None,
            gte,
            lt: None,
            lte,
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists {
            field: field.into(),
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Self::MatchAll)
    }
}

impl From<BoolFilter> for QueryFilter {
    fn from(filter: BoolFilter) -> Self {
        Self::Bool(filter)
    }
}

/// `bool` compound filter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoolFilter {
    pub must: Vec<QueryFilter>,
    pub should: Vec<QueryFilter>,
    pub must_not: Vec<QueryFilter>,
    pub filter: Vec<QueryFilter>,
    pub minimum_should_match: Option<u32>,
}

impl BoolFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, clause: QueryFilter) -> Self {
        self.must.push(clause);
        self
    }

    pub fn should(mut self, clause: QueryFilter) -> Self {
        self.should.push(clause);
        self
    }

    pub fn must_not(mut self, clause: QueryFilter) -> Self {
        self.must_not.push(clause);
        self
    }

    pub fn filter(mut self, clause: QueryFilter) -> Self {
        self.filter.push(clause);
        self
    }

    pub fn minimum_should_match(mut self, minimum: u32) -> Self {
        self.minimum_should_match = Some(minimum);
        self
    }
}
