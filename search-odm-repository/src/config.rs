//! Configuration types for repositories.

use std::env;

/// Default upper bound on hits returned by an unpaged query.
pub const DEFAULT_MAX_RESULT_WINDOW: u32 = 10_000;

/// Default limit on the number of entities in one batch operation.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// What to do with a hit that lacks a required field (its id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncompleteHitPolicy {
    /// Fail the whole page with `IncompleteResultError`.
    #[default]
    Abort,
    /// Drop the hit and count it in `SearchHits::skipped_hits`.
    Skip,
}

/// Refresh behaviour requested on writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Let the index refresh on its own schedule.
    #[default]
    None,
    /// Refresh the affected shards immediately.
    Immediate,
    /// Wait until a refresh makes the write visible.
    WaitUntil,
}

impl RefreshPolicy {
    /// Value of the `refresh` request parameter, if any.
    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            RefreshPolicy::None => None,
            RefreshPolicy::Immediate => Some("true"),
            RefreshPolicy::WaitUntil => Some("wait_for"),
        }
    }
}

/// Configuration shared by the repositories of an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OdmConfig {
    pub incomplete_hit_policy: IncompleteHitPolicy,
    pub refresh_policy: RefreshPolicy,
    /// Size requested for unpaged queries.
    pub max_result_window: u32,
    /// Maximum number of entities in a single batch operation.
    /// Set to None to disable the limit.
    pub max_batch_size: Option<usize>,
}

impl Default for OdmConfig {
    fn default() -> Self {
        Self {
            incomplete_hit_policy: IncompleteHitPolicy::Abort,
            refresh_policy: RefreshPolicy::None,
            max_result_window: DEFAULT_MAX_RESULT_WINDOW,
            max_batch_size: Some(DEFAULT_MAX_BATCH_SIZE),
        }
    }
}

impl OdmConfig {
    /// Read the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ODM_INCOMPLETE_HIT_POLICY`: `abort` or `skip` (default: abort)
    /// - `ODM_REFRESH_POLICY`: `none`, `immediate` or `wait_for` (default: none)
    /// - `ODM_MAX_RESULT_WINDOW`: size of unpaged queries (default: 10000)
    /// - `ODM_MAX_BATCH_SIZE`: batch limit, `0` disables it (default: 1000)
    ///
    /// Unrecognized values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let incomplete_hit_policy = match env::var("ODM_INCOMPLETE_HIT_POLICY").as_deref() {
            Ok("skip") => IncompleteHitPolicy::Skip,
            Ok("abort") => IncompleteHitPolicy::Abort,
            _ => defaults.incomplete_hit_policy,
        };
        let refresh_policy = match env::var("ODM_REFRESH_POLICY").as_deref() {
            Ok("immediate") | Ok("true") => RefreshPolicy::Immediate,
            Ok("wait_for") => RefreshPolicy::WaitUntil,
            Ok("none") => RefreshPolicy::None,
            _ => defaults.refresh_policy,
        };
        let max_result_window = env::var("ODM_MAX_RESULT_WINDOW")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(defaults.max_result_window);
        let max_batch_size = match env::var("ODM_MAX_BATCH_SIZE")
            .ok()
            .and_then(|value| value.parse().ok())
        {
            Some(0) => None,
            Some(limit) => Some(limit),
            None => defaults.max_batch_size,
        };

        Self {
            incomplete_hit_policy,
            refresh_policy,
            max_result_window,
            max_batch_size,
        }
    }

    pub fn with_incomplete_hit_policy(mut self, policy: IncompleteHitPolicy) -> Self {
        self.incomplete_hit_policy = policy;
        self
    }

    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    pub fn with_max_result_window(mut self, max_result_window: u32) -> Self {
        self.max_result_window = max_result_window;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = Some(max_batch_size);
        self
    }

    /// Remove the batch size limit.
    pub fn unlimited_batches(mut self) -> Self {
        self.max_batch_size = None;
        self
    }
}
