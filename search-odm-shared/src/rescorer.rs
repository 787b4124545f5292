//! Rescoring stages.

use serde::{Deserialize, Serialize};

use crate::filter::QueryFilter;

/// How the original and the rescore query scores are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreMode {
    Total,
    Multiply,
    Avg,
    Max,
    Min,
}

impl ScoreMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreMode::Total => "total",
            ScoreMode::Multiply => "multiply",
            ScoreMode::Avg => "avg",
            ScoreMode::Max => "max",
            ScoreMode::Min => "min",
        }
    }
}

/// A secondary scoring pass over the top `window_size` hits of the previous
/// stage. Stages run in the order they were added to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescorerQuery {
    pub query: QueryFilter,
    pub window_size: Option<u32>,
    pub query_weight: Option<f32>,
    pub rescore_query_weight: Option<f32>,
    pub score_mode: Option<ScoreMode>,
}

impl RescorerQuery {
    pub fn new(query: QueryFilter) -> Self {
        Self {
            query,
            window_size: None,
            query_weight: None,
            rescore_query_weight: None,
            score_mode: None,
        }
    }

    pub fn with_window_size(mut self, window_size: u32) -> Self {
        self.window_size = Some(window_size);
        self
    }

    pub fn with_query_weight(mut self, weight: f32) -> Self {
        self.query_weight = Some(weight);
        self
    }

    pub fn with_rescore_query_weight(mut self, weight: f32) -> Self {
        self.rescore_query_weight = Some(weight);
        self
    }

    pub fn with_score_mode(mut self, score_mode: ScoreMode) -> Self {
        self.score_mode = Some(score_mode);
        self
    }
}
