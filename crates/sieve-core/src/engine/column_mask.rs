use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::gateway::GrantGateway;
use crate::resource::{CallerId, ColumnRef, TableRef};

/// Column masking decisions. Unlike row filters, uncertainty resolves to
/// "masked".
pub struct ColumnMaskEngine<G: GrantGateway> {
    gateway: Arc<G>,
}

impl<G: GrantGateway> ColumnMaskEngine<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn is_masked(&self, caller: &CallerId, column: &ColumnRef) -> bool {
        match self.gateway.get_mask_grant(caller, column).await {
            Ok(masked) => masked,
            Err(e) => {
                tracing::warn!(
                    target: "audit",
                    event = "fail_closed",
                    decision = "masked",
                    caller = %caller,
                    column = %column,
                    error = %e,
                    "column mask lookup failed"
                );
                true
            }
        }
    }

    /// Resolves every column with one store call. A column the store could
    /// not answer for is masked; the others keep their real decision.
    pub async fn resolve_batch(
        &self,
        caller: &CallerId,
        columns: &[ColumnRef],
    ) -> HashMap<ColumnRef, bool> {
        if columns.is_empty() {
            return HashMap::new();
        }

        let found = match self.gateway.get_mask_grants_batch(caller, columns).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    target: "audit",
                    event = "fail_closed",
                    decision = "masked",
                    caller = %caller,
                    columns = columns.len(),
                    error = %e,
                    "batch column mask lookup failed"
                );
                HashMap::new()
            }
        };

        columns
            .iter()
            .map(|column| {
                let masked = match found.get(column) {
                    Some(masked) => *masked,
                    None => {
                        tracing::debug!(caller = %caller, column = %column, "no mask answer, masking");
                        true
                    }
                };
                (column.clone(), masked)
            })
            .collect()
    }

    /// Same as [`resolve_batch`](Self::resolve_batch), index-aligned with `columns`.
    pub async fn resolve_batch_aligned(&self, caller: &CallerId, columns: &[ColumnRef]) -> Vec<bool> {
        let decisions = self.resolve_batch(caller, columns).await;
        columns
            .iter()
            .map(|column| decisions.get(column).copied().unwrap_or(true))
            .collect()
    }

    /// Names of the columns of `table` masked for `caller`. Introspection
    /// only; an unreadable store yields an empty set.
    pub async fn list_masked(&self, caller: &CallerId, table: &TableRef) -> BTreeSet<String> {
        match self.gateway.list_mask_grants(caller).await {
            Ok(columns) => columns
                .into_iter()
                .filter(|column| column.belongs_to(table))
                .map(|column| column.column().to_string())
                .collect(),
            Err(e) => {
                tracing::error!(caller = %caller, table = %table, error = %e, "failed to list masked columns");
                BTreeSet::new()
            }
        }
    }
}
