//! Result types of repository operations.

use crate::errors::OdmError;

/// Outcome of deleting a document by id.
///
/// Deleting an absent document is not an error; the caller is told which case
/// happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { id: String },
    NotFound { id: String },
}

impl DeleteOutcome {
    pub fn id(&self) -> &str {
        match self {
            DeleteOutcome::Deleted { id } | DeleteOutcome::NotFound { id } => id,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted { .. })
    }
}

/// Result of a batch operation for a single item.
///
/// Indicates whether the operation on one entity succeeded and carries the
/// error if it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOperationResult {
    /// Id of the item, when it is known (a save without id that failed has none).
    pub id: Option<String>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<OdmError>,
}

impl BatchOperationResult {
    pub fn succeeded(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            success: true,
            error: None,
        }
    }

    pub fn failed(id: Option<String>, error: OdmError) -> Self {
        Self {
            id,
            success: false,
            error: Some(error),
        }
    }
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// Results are in input order. A failed item does not stop the batch, so
/// callers can handle partial failures.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|result| result.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }
}
