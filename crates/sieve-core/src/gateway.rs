use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::time::Duration;

use crate::grant::AttributeGrant;
use crate::policy::PolicyId;
use crate::resource::{CallerId, ColumnRef, TableRef};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed grant context on policy '{policy_id}': {reason}")]
    MalformedGrantContext { policy_id: String, reason: String },
}

/// The operations this crate needs from the relationship store.
///
/// Implementations must apply their own deadline to every call and report an
/// expired deadline as [`GatewayError::Timeout`].
pub trait GrantGateway: Send + Sync {
    fn list_policies_bound_to(
        &self,
        table: &TableRef,
    ) -> impl Future<Output = Result<BTreeSet<PolicyId>, GatewayError>> + Send;

    fn get_grant(
        &self,
        caller: &CallerId,
        policy_id: &PolicyId,
    ) -> impl Future<Output = Result<Option<AttributeGrant>, GatewayError>> + Send;

    fn get_mask_grant(
        &self,
        caller: &CallerId,
        column: &ColumnRef,
    ) -> impl Future<Output = Result<bool, GatewayError>> + Send;

    /// One round trip for the whole set. Columns missing from the returned
    /// map could not be resolved.
    fn get_mask_grants_batch(
        &self,
        caller: &CallerId,
        columns: &[ColumnRef],
    ) -> impl Future<Output = Result<HashMap<ColumnRef, bool>, GatewayError>> + Send;

    fn list_mask_grants(
        &self,
        caller: &CallerId,
    ) -> impl Future<Output = Result<Vec<ColumnRef>, GatewayError>> + Send;

    fn ensure_binding(
        &self,
        table: &TableRef,
        policy_id: &PolicyId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn put_grant(
        &self,
        caller: &CallerId,
        policy_id: &PolicyId,
        grant: &AttributeGrant,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn delete_grant(
        &self,
        caller: &CallerId,
        policy_id: &PolicyId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn put_mask_grant(
        &self,
        caller: &CallerId,
        column: &ColumnRef,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn delete_mask_grant(
        &self,
        caller: &CallerId,
        column: &ColumnRef,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
