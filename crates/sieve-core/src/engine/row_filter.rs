use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;

use crate::gateway::GrantGateway;
use crate::grant::AttributeGrant;
use crate::policy::{AttributeName, PolicyId, parse_attribute};
use crate::resource::{CallerId, TableRef};
use crate::sanitize::in_clause;

use super::{EngineConfig, FilterResult, ResolveError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySummary {
    pub policy_id: PolicyId,
    pub attribute_name: AttributeName,
    pub allowed_values: Vec<String>,
}

pub struct RowFilterEngine<G: GrantGateway> {
    gateway: Arc<G>,
    config: EngineConfig,
}

impl<G: GrantGateway> RowFilterEngine<G> {
    pub fn new(gateway: Arc<G>, config: EngineConfig) -> Self {
        Self { gateway, config }
    }

    /// Resolves the predicate `caller` must satisfy to read `table`.
    ///
    /// Never fails: any error while resolving yields [`FilterResult::DenyAll`].
    pub async fn resolve_row_filter(&self, caller: &CallerId, table: &TableRef) -> FilterResult {
        match self.try_resolve(caller, table).await {
            Ok(result) => {
                tracing::debug!(
                    caller = %caller,
                    table = %table,
                    outcome = result.outcome(),
                    "row filter resolved"
                );
                result
            }
            Err(e) => {
                tracing::warn!(
                    target: "audit",
                    event = "fail_closed",
                    decision = "deny_all",
                    caller = %caller,
                    table = %table,
                    error = %e,
                    "row filter resolution failed"
                );
                FilterResult::DenyAll
            }
        }
    }

    async fn try_resolve(
        &self,
        caller: &CallerId,
        table: &TableRef,
    ) -> Result<FilterResult, ResolveError> {
        let policies: Vec<PolicyId> = self
            .gateway
            .list_policies_bound_to(table)
            .await?
            .into_iter()
            .collect();

        if policies.is_empty() {
            return Ok(FilterResult::NoFilter);
        }

        let grants = self.fetch_grants(caller, &policies).await?;

        let mut clauses = Vec::new();
        for (policy_id, grant) in &grants {
            let Some(grant) = grant else {
                tracing::info!(
                    caller = %caller,
                    table = %table,
                    policy_id = %policy_id,
                    required = policies.len(),
                    "caller lacks a grant for a bound policy, denying all rows"
                );
                return Ok(FilterResult::DenyAll);
            };

            let expected = parse_attribute(policy_id)?;
            if grant.attribute_name() != &expected {
                return Err(ResolveError::AttributeMismatch {
                    policy_id: policy_id.to_string(),
                    expected: expected.to_string(),
                    found: grant.attribute_name().to_string(),
                });
            }

            if grant.is_wildcard() {
                continue;
            }

            clauses.push(in_clause(
                grant.attribute_name(),
                grant.allowed_values(),
                self.config.max_value_len,
            ));
        }

        if clauses.is_empty() {
            return Ok(FilterResult::NoFilter);
        }

        Ok(FilterResult::Predicate(clauses.join(" AND ")))
    }

    /// Looks up every grant, at most `max_concurrent_lookups` at a time. The
    /// returned map is keyed by policy id so iteration order does not depend
    /// on completion order.
    async fn fetch_grants(
        &self,
        caller: &CallerId,
        policies: &[PolicyId],
    ) -> Result<BTreeMap<PolicyId, Option<AttributeGrant>>, ResolveError> {
        let chunk_size = self.config.max_concurrent_lookups.max(1);
        let mut grants = BTreeMap::new();

        for chunk in policies.chunks(chunk_size) {
            let fetched = try_join_all(chunk.iter().map(|policy_id| async move {
                let grant = self.gateway.get_grant(caller, policy_id).await?;
                Ok::<_, ResolveError>((policy_id.clone(), grant))
            }))
            .await?;
            grants.extend(fetched);
        }

        Ok(grants)
    }

    /// Lists the grants `caller` holds on policies bound to `table`.
    ///
    /// Introspection only: policies that cannot be read are skipped and a
    /// failed listing yields an empty result.
    pub async fn list_row_filter_policies(
        &self,
        caller: &CallerId,
        table: &TableRef,
    ) -> Vec<PolicySummary> {
        let policies = match self.gateway.list_policies_bound_to(table).await {
            Ok(policies) => policies,
            Err(e) => {
                tracing::error!(caller = %caller, table = %table, error = %e, "failed to list bound policies");
                return Vec::new();
            }
        };

        let mut summaries = Vec::new();
        for policy_id in policies {
            match self.gateway.get_grant(caller, &policy_id).await {
                Ok(Some(grant)) => summaries.push(PolicySummary {
                    policy_id,
                    attribute_name: grant.attribute_name().clone(),
                    allowed_values: grant.allowed_values().to_vec(),
                }),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        caller = %caller,
                        policy_id = %policy_id,
                        error = %e,
                        "skipping unreadable policy grant"
                    );
                }
            }
        }
        summaries
    }
}
