use std::sync::Arc;

use crate::gateway::{GatewayError, GrantGateway};
use crate::grant::{AttributeGrant, GrantError};
use crate::policy::{AttributeName, PolicyId, derive_policy_id};
use crate::resource::{CallerId, ColumnRef, TableRef};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Grant(#[from] GrantError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Administrative writes of bindings and grants.
///
/// `grant_row_filter` writes the binding before the grant, in two separate
/// store calls. If the second call never happens the table is left with a
/// binding nobody holds, which only denies rows.
pub struct GrantLifecycle<G: GrantGateway> {
    gateway: Arc<G>,
}

impl<G: GrantGateway> GrantLifecycle<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn grant_row_filter<I, V>(
        &self,
        caller: &CallerId,
        table: &TableRef,
        attribute: &AttributeName,
        allowed_values: I,
    ) -> Result<PolicyId, LifecycleError>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let grant = AttributeGrant::new(attribute.clone(), allowed_values)?;
        let policy_id = derive_policy_id(table, attribute);

        self.gateway.ensure_binding(table, &policy_id).await?;
        self.gateway.put_grant(caller, &policy_id, &grant).await?;
        Ok(policy_id)
    }

    /// Removes the caller's grant. The binding stays because other callers
    /// may hold grants on the same policy.
    pub async fn revoke_row_filter(
        &self,
        caller: &CallerId,
        table: &TableRef,
        attribute: &AttributeName,
    ) -> Result<PolicyId, LifecycleError> {
        let policy_id = derive_policy_id(table, attribute);

        self.gateway.delete_grant(caller, &policy_id).await?;
        Ok(policy_id)
    }

    pub async fn grant_mask(
        &self,
        caller: &CallerId,
        column: &ColumnRef,
    ) -> Result<(), LifecycleError> {
        self.gateway.put_mask_grant(caller, column).await?;
        Ok(())
    }

    pub async fn revoke_mask(
        &self,
        caller: &CallerId,
        column: &ColumnRef,
    ) -> Result<(), LifecycleError> {
        self.gateway.delete_mask_grant(caller, column).await?;
        Ok(())
    }
}
