use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::gateway::{GatewayError, GrantGateway};
use crate::grant::AttributeGrant;
use crate::policy::PolicyId;
use crate::resource::{CallerId, ColumnRef, TableRef};

#[derive(Default)]
struct State {
    bindings: HashMap<TableRef, BTreeSet<PolicyId>>,
    grants: HashMap<(CallerId, PolicyId), AttributeGrant>,
    masks: BTreeSet<(CallerId, ColumnRef)>,
    listing_failure: Option<GatewayError>,
    policy_failures: HashMap<PolicyId, GatewayError>,
    column_failures: HashMap<ColumnRef, GatewayError>,
    batch_failure: Option<GatewayError>,
    write_failure: Option<GatewayError>,
}

/// In-memory gateway with injectable failures.
#[derive(Default)]
pub(crate) struct FakeGateway {
    state: Mutex<State>,
    batch_calls: AtomicUsize,
    single_mask_calls: AtomicUsize,
}

impl FakeGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bind(&self, table: &TableRef, policy_id: &PolicyId) {
        self.state
            .lock()
            .unwrap()
            .bindings
            .entry(table.clone())
            .or_default()
            .insert(policy_id.clone());
    }

    pub(crate) fn grant(&self, caller: &CallerId, policy_id: &PolicyId, grant: AttributeGrant) {
        self.state
            .lock()
            .unwrap()
            .grants
            .insert((caller.clone(), policy_id.clone()), grant);
    }

    pub(crate) fn mask(&self, caller: &CallerId, column: &ColumnRef) {
        self.state
            .lock()
            .unwrap()
            .masks
            .insert((caller.clone(), column.clone()));
    }

    pub(crate) fn bindings_for(&self, table: &TableRef) -> BTreeSet<PolicyId> {
        self.state
            .lock()
            .unwrap()
            .bindings
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn fail_listing(&self, error: GatewayError) {
        self.state.lock().unwrap().listing_failure = Some(error);
    }

    pub(crate) fn fail_policy(&self, policy_id: &PolicyId, error: GatewayError) {
        self.state
            .lock()
            .unwrap()
            .policy_failures
            .insert(policy_id.clone(), error);
    }

    /// Single lookups of `column` fail; batch lookups leave it out of the map.
    pub(crate) fn fail_column(&self, column: &ColumnRef, error: GatewayError) {
        self.state
            .lock()
            .unwrap()
            .column_failures
            .insert(column.clone(), error);
    }

    /// Fails batch lookups and mask listings.
    pub(crate) fn fail_batch(&self, error: GatewayError) {
        self.state.lock().unwrap().batch_failure = Some(error);
    }

    pub(crate) fn fail_writes(&self, error: GatewayError) {
        self.state.lock().unwrap().write_failure = Some(error);
    }

    pub(crate) fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn single_mask_calls(&self) -> usize {
        self.single_mask_calls.load(Ordering::SeqCst)
    }

    fn check_writes(&self) -> Result<(), GatewayError> {
        match &self.state.lock().unwrap().write_failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl GrantGateway for FakeGateway {
    async fn list_policies_bound_to(
        &self,
        table: &TableRef,
    ) -> Result<BTreeSet<PolicyId>, GatewayError> {
        let state = self.state.lock().unwrap();
        if let Some(e) = &state.listing_failure {
            return Err(e.clone());
        }
        Ok(state.bindings.get(table).cloned().unwrap_or_default())
    }

    async fn get_grant(
        &self,
        caller: &CallerId,
        policy_id: &PolicyId,
    ) -> Result<Option<AttributeGrant>, GatewayError> {
        let state = self.state.lock().unwrap();
        if let Some(e) = state.policy_failures.get(policy_id) {
            return Err(e.clone());
        }
        Ok(state
            .grants
            .get(&(caller.clone(), policy_id.clone()))
            .cloned())
    }

    async fn get_mask_grant(
        &self,
        caller: &CallerId,
        column: &ColumnRef,
    ) -> Result<bool, GatewayError> {
        self.single_mask_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if let Some(e) = state.column_failures.get(column) {
            return Err(e.clone());
        }
        Ok(state.masks.contains(&(caller.clone(), column.clone())))
    }

    async fn get_mask_grants_batch(
        &self,
        caller: &CallerId,
        columns: &[ColumnRef],
    ) -> Result<HashMap<ColumnRef, bool>, GatewayError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if let Some(e) = &state.batch_failure {
            return Err(e.clone());
        }
        Ok(columns
            .iter()
            .filter(|column| !state.column_failures.contains_key(*column))
            .map(|column| {
                let masked = state.masks.contains(&(caller.clone(), column.clone()));
                (column.clone(), masked)
            })
            .collect())
    }

    async fn list_mask_grants(&self, caller: &CallerId) -> Result<Vec<ColumnRef>, GatewayError> {
        let state = self.state.lock().unwrap();
        if let Some(e) = &state.batch_failure {
            return Err(e.clone());
        }
        Ok(state
            .masks
            .iter()
            .filter(|(holder, _)| holder == caller)
            .map(|(_, column)| column.clone())
            .collect())
    }

    async fn ensure_binding(
        &self,
        table: &TableRef,
        policy_id: &PolicyId,
    ) -> Result<(), GatewayError> {
        self.check_writes()?;
        self.bind(table, policy_id);
        Ok(())
    }

    async fn put_grant(
        &self,
        caller: &CallerId,
        policy_id: &PolicyId,
        grant: &AttributeGrant,
    ) -> Result<(), GatewayError> {
        self.check_writes()?;
        self.grant(caller, policy_id, grant.clone());
        Ok(())
    }

    async fn delete_grant(&self, caller: &CallerId, policy_id: &PolicyId) -> Result<(), GatewayError> {
        self.check_writes()?;
        self.state
            .lock()
            .unwrap()
            .grants
            .remove(&(caller.clone(), policy_id.clone()));
        Ok(())
    }

    async fn put_mask_grant(&self, caller: &CallerId, column: &ColumnRef) -> Result<(), GatewayError> {
        self.check_writes()?;
        self.mask(caller, column);
        Ok(())
    }

    async fn delete_mask_grant(
        &self,
        caller: &CallerId,
        column: &ColumnRef,
    ) -> Result<(), GatewayError> {
        self.check_writes()?;
        self.state
            .lock()
            .unwrap()
            .masks
            .remove(&(caller.clone(), column.clone()));
        Ok(())
    }
}
