use sieve_core::{CallerId, ColumnRef, PolicyId, TableRef};

pub fn audit_row_filter_grant(
    caller: &CallerId,
    table: &TableRef,
    policy_id: &PolicyId,
    value_count: usize,
    wildcard: bool,
) {
    tracing::info!(
        target: "audit",
        event = "row_filter_grant",
        caller = %caller,
        table = %table,
        policy_id = %policy_id,
        value_count = value_count,
        wildcard = wildcard,
        "row filter granted"
    );
}

pub fn audit_row_filter_revoke(caller: &CallerId, table: &TableRef, policy_id: &PolicyId) {
    tracing::info!(
        target: "audit",
        event = "row_filter_revoke",
        caller = %caller,
        table = %table,
        policy_id = %policy_id,
        "row filter revoked"
    );
}

pub fn audit_column_mask_grant(caller: &CallerId, column: &ColumnRef) {
    tracing::info!(
        target: "audit",
        event = "column_mask_grant",
        caller = %caller,
        column = %column,
        "column mask granted"
    );
}

pub fn audit_column_mask_revoke(caller: &CallerId, column: &ColumnRef) {
    tracing::info!(
        target: "audit",
        event = "column_mask_revoke",
        caller = %caller,
        column = %column,
        "column mask revoked"
    );
}
