mod column_mask;
mod row_filter;

pub use column_mask::ColumnMaskEngine;
pub use row_filter::{PolicySummary, RowFilterEngine};

use crate::gateway::GatewayError;
use crate::policy::PolicyIdError;
use crate::sanitize::DEFAULT_MAX_VALUE_LEN;

/// Always-false predicate handed to the query layer for [`FilterResult::DenyAll`].
pub const DENY_ALL_EXPRESSION: &str = "1=0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterResult {
    NoFilter,
    Predicate(String),
    DenyAll,
}

impl FilterResult {
    pub fn expression(&self) -> Option<&str> {
        match self {
            FilterResult::NoFilter => None,
            FilterResult::Predicate(sql) => Some(sql),
            FilterResult::DenyAll => Some(DENY_ALL_EXPRESSION),
        }
    }

    pub fn has_filter(&self) -> bool {
        !matches!(self, FilterResult::NoFilter)
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            FilterResult::NoFilter => "no_filter",
            FilterResult::Predicate(_) => "predicate",
            FilterResult::DenyAll => "deny_all",
        }
    }
}

/// Failures that abort a resolution. Each one is turned into the fail-closed
/// decision by the engine before it returns.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    MalformedPolicyId(#[from] PolicyIdError),

    #[error("grant on policy '{policy_id}' is for attribute '{found}', expected '{expected}'")]
    AttributeMismatch {
        policy_id: String,
        expected: String,
        found: String,
    },
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_concurrent_lookups: usize,
    pub max_value_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: 16,
            max_value_len: DEFAULT_MAX_VALUE_LEN,
        }
    }
}
