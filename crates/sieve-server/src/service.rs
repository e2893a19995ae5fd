use std::collections::BTreeSet;
use std::sync::Arc;

use sieve_core::{
    AttributeName, CallerId, ColumnMaskEngine, ColumnRef, EngineConfig, FilterResult,
    GrantGateway, GrantLifecycle, IdentifierError, PolicyId, PolicySummary, RowFilterEngine,
    TableRef, WILDCARD,
};

use crate::audit;
use crate::error::ApiError;
use crate::metrics::Metrics;

#[derive(Debug)]
pub struct GrantRowFilterInput {
    pub caller: String,
    pub table: String,
    pub attribute_name: String,
    pub allowed_values: Vec<String>,
}

#[derive(Debug)]
pub struct RowFilterChange {
    pub policy_id: PolicyId,
    pub table: TableRef,
    pub attribute_name: AttributeName,
}

/// Entry point shared by every inbound surface. Resolution methods always
/// return a decision and count it; administrative methods return errors.
pub struct AccessService<G: GrantGateway> {
    row_filters: RowFilterEngine<G>,
    column_masks: ColumnMaskEngine<G>,
    lifecycle: GrantLifecycle<G>,
    metrics: Arc<Metrics>,
}

impl<G: GrantGateway> AccessService<G> {
    pub fn new(gateway: Arc<G>, engine_config: EngineConfig) -> Self {
        Self {
            row_filters: RowFilterEngine::new(Arc::clone(&gateway), engine_config),
            column_masks: ColumnMaskEngine::new(Arc::clone(&gateway)),
            lifecycle: GrantLifecycle::new(gateway),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub async fn resolve_row_filter(&self, caller: &CallerId, table: &TableRef) -> FilterResult {
        let result = self.row_filters.resolve_row_filter(caller, table).await;
        self.metrics.record_row_filter(&result);
        result
    }

    /// Decision for a request whose caller or table could not be parsed.
    pub fn reject_row_filter(&self, reason: &IdentifierError) -> FilterResult {
        tracing::warn!(
            target: "audit",
            event = "fail_closed",
            decision = "deny_all",
            error = %reason,
            "unresolvable row filter request"
        );
        let result = FilterResult::DenyAll;
        self.metrics.record_row_filter(&result);
        result
    }

    pub async fn resolve_column_mask(&self, caller: &CallerId, column: &ColumnRef) -> bool {
        let masked = self.column_masks.is_masked(caller, column).await;
        self.metrics.record_mask(masked);
        masked
    }

    /// Decision for a column mask request that could not be parsed.
    pub fn reject_column_mask(&self, reason: &IdentifierError) -> bool {
        tracing::warn!(
            target: "audit",
            event = "fail_closed",
            decision = "masked",
            error = %reason,
            "unresolvable column mask request"
        );
        self.metrics.record_mask(true);
        true
    }

    /// Index-aligned decisions for `columns`. Entries that failed to parse
    /// are masked without reaching the store.
    pub async fn resolve_column_mask_batch(
        &self,
        caller: &CallerId,
        columns: &[Result<ColumnRef, IdentifierError>],
    ) -> Vec<bool> {
        let valid: Vec<ColumnRef> = columns
            .iter()
            .filter_map(|c| c.as_ref().ok().cloned())
            .collect();
        let mut resolved = self
            .column_masks
            .resolve_batch_aligned(caller, &valid)
            .await
            .into_iter();

        columns
            .iter()
            .map(|column| match column {
                Ok(_) => {
                    let masked = resolved.next().unwrap_or(true);
                    self.metrics.record_mask(masked);
                    masked
                }
                Err(e) => self.reject_column_mask(e),
            })
            .collect()
    }

    pub async fn list_row_filter_policies(
        &self,
        caller: &str,
        table: &str,
    ) -> Result<Vec<PolicySummary>, ApiError> {
        let caller = CallerId::new(caller)?;
        let table: TableRef = table.parse()?;
        Ok(self
            .row_filters
            .list_row_filter_policies(&caller, &table)
            .await)
    }

    pub async fn list_masked_columns(
        &self,
        caller: &str,
        table: &str,
    ) -> Result<BTreeSet<String>, ApiError> {
        let caller = CallerId::new(caller)?;
        let table: TableRef = table.parse()?;
        Ok(self.column_masks.list_masked(&caller, &table).await)
    }

    pub async fn grant_row_filter(
        &self,
        input: GrantRowFilterInput,
    ) -> Result<RowFilterChange, ApiError> {
        let caller = CallerId::new(input.caller)?;
        let table: TableRef = input.table.parse()?;
        let attribute_name = AttributeName::new(input.attribute_name)?;
        let wildcard = input.allowed_values.iter().any(|v| v == WILDCARD);
        let value_count = input.allowed_values.len();

        let policy_id = self
            .lifecycle
            .grant_row_filter(&caller, &table, &attribute_name, input.allowed_values)
            .await?;

        audit::audit_row_filter_grant(&caller, &table, &policy_id, value_count, wildcard);
        Ok(RowFilterChange {
            policy_id,
            table,
            attribute_name,
        })
    }

    pub async fn revoke_row_filter(
        &self,
        caller: &str,
        table: &str,
        attribute_name: &str,
    ) -> Result<RowFilterChange, ApiError> {
        let caller = CallerId::new(caller)?;
        let table: TableRef = table.parse()?;
        let attribute_name = AttributeName::new(attribute_name)?;

        let policy_id = self
            .lifecycle
            .revoke_row_filter(&caller, &table, &attribute_name)
            .await?;

        audit::audit_row_filter_revoke(&caller, &table, &policy_id);
        Ok(RowFilterChange {
            policy_id,
            table,
            attribute_name,
        })
    }

    pub async fn grant_column_mask(&self, caller: &str, column: &str) -> Result<ColumnRef, ApiError> {
        let caller = CallerId::new(caller)?;
        let column: ColumnRef = column.parse()?;

        self.lifecycle.grant_mask(&caller, &column).await?;

        audit::audit_column_mask_grant(&caller, &column);
        Ok(column)
    }

    pub async fn revoke_column_mask(
        &self,
        caller: &str,
        column: &str,
    ) -> Result<ColumnRef, ApiError> {
        let caller = CallerId::new(caller)?;
        let column: ColumnRef = column.parse()?;

        self.lifecycle.revoke_mask(&caller, &column).await?;

        audit::audit_column_mask_revoke(&caller, &column);
        Ok(column)
    }
}
