use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sieve_core::{
    AttributeGrant, AttributeName, CallerId, ColumnRef, GatewayError, GrantGateway, PolicyId,
    TableRef, parse_attribute,
};
use sieve_storage::{ObjectRef, RelationshipStore, StorageError, SubjectRef, TupleFilter, TupleWrite};

pub const POLICY_TYPE: &str = "row_filter_policy";
pub const TABLE_TYPE: &str = "table";
pub const COLUMN_TYPE: &str = "column";
pub const USER_TYPE: &str = "user";

pub const APPLIES_TO: &str = "applies_to";
pub const VIEWER: &str = "viewer";
pub const MASK: &str = "mask";

/// JSON context stored on a `viewer` tuple.
#[derive(Debug, Serialize, Deserialize)]
struct GrantContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attribute_name: Option<String>,
    allowed_values: Vec<String>,
}

/// [`GrantGateway`] over a relationship tuple store.
///
/// | concept      | tuple                                               |
/// |--------------|-----------------------------------------------------|
/// | binding      | `row_filter_policy:<policy>#applies_to@table:<t>`   |
/// | grant        | `row_filter_policy:<policy>#viewer@user:<caller>`   |
/// | mask grant   | `column:<column>#mask@user:<caller>`                |
///
/// Every store call is bounded by `timeout`.
pub struct StoreGateway<S: RelationshipStore> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S: RelationshipStore> StoreGateway<S> {
    pub fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, GatewayError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(GatewayError::Unavailable(e.to_string())),
            Err(_) => Err(GatewayError::Timeout(self.timeout)),
        }
    }

    async fn write(&self, writes: &[TupleWrite], deletes: &[TupleFilter]) -> Result<(), GatewayError> {
        self.bounded(self.store.write(writes, deletes)).await
    }

    async fn mask_grants_of(&self, caller: &CallerId) -> Result<Vec<String>, GatewayError> {
        let filter = TupleFilter {
            object_type: Some(COLUMN_TYPE.to_string()),
            relation: Some(MASK.to_string()),
            subject_type: Some(USER_TYPE.to_string()),
            subject_id: Some(caller.as_str().to_string()),
            ..Default::default()
        };
        let tuples = self.bounded(self.store.read(&filter, None)).await?;
        Ok(tuples.into_iter().map(|t| t.object.object_id).collect())
    }
}

fn user(caller: &CallerId) -> SubjectRef {
    SubjectRef::new(USER_TYPE, caller.as_str())
}

fn policy_object(policy_id: &PolicyId) -> ObjectRef {
    ObjectRef::new(POLICY_TYPE, policy_id.as_str())
}

fn column_object(column: &ColumnRef) -> ObjectRef {
    ObjectRef::new(COLUMN_TYPE, column.to_string())
}

fn decode_grant(
    policy_id: &PolicyId,
    context: Option<serde_json::Value>,
) -> Result<AttributeGrant, GatewayError> {
    let malformed = |reason: String| GatewayError::MalformedGrantContext {
        policy_id: policy_id.to_string(),
        reason,
    };

    let context = context.ok_or_else(|| malformed("grant carries no context".to_string()))?;
    let context: GrantContext =
        serde_json::from_value(context).map_err(|e| malformed(e.to_string()))?;

    let attribute = match context.attribute_name {
        Some(name) => AttributeName::new(name).map_err(|e| malformed(e.to_string()))?,
        None => parse_attribute(policy_id).map_err(|e| malformed(e.to_string()))?,
    };

    AttributeGrant::new(attribute, context.allowed_values).map_err(|e| malformed(e.to_string()))
}

fn encode_grant(grant: &AttributeGrant) -> serde_json::Value {
    serde_json::json!({
        "attribute_name": grant.attribute_name().as_str(),
        "allowed_values": grant.allowed_values(),
    })
}

impl<S: RelationshipStore> GrantGateway for StoreGateway<S> {
    async fn list_policies_bound_to(
        &self,
        table: &TableRef,
    ) -> Result<BTreeSet<PolicyId>, GatewayError> {
        let filter = TupleFilter {
            object_type: Some(POLICY_TYPE.to_string()),
            relation: Some(APPLIES_TO.to_string()),
            subject_type: Some(TABLE_TYPE.to_string()),
            subject_id: Some(table.to_string()),
            ..Default::default()
        };
        let tuples = self.bounded(self.store.read(&filter, None)).await?;
        Ok(tuples
            .into_iter()
            .map(|t| PolicyId::from_raw(t.object.object_id))
            .collect())
    }

    async fn get_grant(
        &self,
        caller: &CallerId,
        policy_id: &PolicyId,
    ) -> Result<Option<AttributeGrant>, GatewayError> {
        let filter = TupleFilter::exact(&policy_object(policy_id), VIEWER, &user(caller));
        let tuple = self
            .bounded(self.store.read(&filter, Some(1)))
            .await?
            .into_iter()
            .next();

        match tuple {
            Some(tuple) => decode_grant(policy_id, tuple.context).map(Some),
            None => Ok(None),
        }
    }

    async fn get_mask_grant(
        &self,
        caller: &CallerId,
        column: &ColumnRef,
    ) -> Result<bool, GatewayError> {
        let filter = TupleFilter::exact(&column_object(column), MASK, &user(caller));
        let tuples = self.bounded(self.store.read(&filter, Some(1))).await?;
        Ok(!tuples.is_empty())
    }

    async fn get_mask_grants_batch(
        &self,
        caller: &CallerId,
        columns: &[ColumnRef],
    ) -> Result<HashMap<ColumnRef, bool>, GatewayError> {
        let granted: HashSet<String> = self.mask_grants_of(caller).await?.into_iter().collect();
        Ok(columns
            .iter()
            .map(|column| (column.clone(), granted.contains(&column.to_string())))
            .collect())
    }

    async fn list_mask_grants(&self, caller: &CallerId) -> Result<Vec<ColumnRef>, GatewayError> {
        let mut columns = Vec::new();
        for object_id in self.mask_grants_of(caller).await? {
            match object_id.parse::<ColumnRef>() {
                Ok(column) => columns.push(column),
                Err(e) => {
                    tracing::warn!(object_id = %object_id, error = %e, "skipping unparsable mask grant");
                }
            }
        }
        Ok(columns)
    }

    async fn ensure_binding(
        &self,
        table: &TableRef,
        policy_id: &PolicyId,
    ) -> Result<(), GatewayError> {
        let binding = TupleWrite::new(
            policy_object(policy_id),
            APPLIES_TO,
            SubjectRef::new(TABLE_TYPE, table.to_string()),
        );
        self.write(&[binding], &[]).await
    }

    async fn put_grant(
        &self,
        caller: &CallerId,
        policy_id: &PolicyId,
        grant: &AttributeGrant,
    ) -> Result<(), GatewayError> {
        let write = TupleWrite::new(policy_object(policy_id), VIEWER, user(caller))
            .with_context(encode_grant(grant));
        self.write(&[write], &[]).await
    }

    async fn delete_grant(&self, caller: &CallerId, policy_id: &PolicyId) -> Result<(), GatewayError> {
        let filter = TupleFilter::exact(&policy_object(policy_id), VIEWER, &user(caller));
        self.write(&[], &[filter]).await
    }

    async fn put_mask_grant(&self, caller: &CallerId, column: &ColumnRef) -> Result<(), GatewayError> {
        let write = TupleWrite::new(column_object(column), MASK, user(caller));
        self.write(&[write], &[]).await
    }

    async fn delete_mask_grant(
        &self,
        caller: &CallerId,
        column: &ColumnRef,
    ) -> Result<(), GatewayError> {
        let filter = TupleFilter::exact(&column_object(column), MASK, &user(caller));
        self.write(&[], &[filter]).await
    }
}
