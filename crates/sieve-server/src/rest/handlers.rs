use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use sieve_core::{CallerId, ColumnRef, FilterResult, GrantGateway, IdentifierError, TableRef};

use crate::adapter::{COLUMN_TYPE, MASK, POLICY_TYPE, VIEWER};
use crate::error::ApiError;
use crate::service::{GrantRowFilterInput, RowFilterChange};

use super::AppState;
use super::types::*;

/// Replacement expression handed back for a masked column.
const MASK_EXPRESSION: &str = "'*****'";

fn ok<T: Serialize>(body: T) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

fn api_error_to_response(err: ApiError) -> Response {
    let status = err.status();
    if status.is_server_error() {
        tracing::error!(error = %err, "administrative request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn row_filter_change_response(change: RowFilterChange) -> RowFilterChangeResponse {
    RowFilterChangeResponse {
        success: true,
        object_id: format!("{POLICY_TYPE}:{}", change.policy_id),
        policy_id: change.policy_id.to_string(),
        table: change.table.to_string(),
        attribute_name: change.attribute_name.to_string(),
        relation: VIEWER.to_string(),
    }
}

fn column_change_response(column: ColumnRef) -> ColumnMaskChangeResponse {
    ColumnMaskChangeResponse {
        success: true,
        object_id: format!("{COLUMN_TYPE}:{column}"),
        column: column.to_string(),
        relation: MASK.to_string(),
    }
}

/// Resolution endpoints answer every body. One the extractor refuses is
/// treated as an empty request, which identifier validation then rejects.
fn read_body<T: Default>(body: Result<Json<T>, JsonRejection>) -> T {
    match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable resolution request");
            T::default()
        }
    }
}

/// Like [`read_body`] for batch shapes. When the document does not decode,
/// the array at `entries` is still counted so `fallback` can return a request
/// holding that many unresolvable entries.
fn read_batch_body<T: DeserializeOwned>(
    body: Result<Json<Value>, JsonRejection>,
    entries: &str,
    fallback: impl FnOnce(usize) -> T,
) -> T {
    let value = match body {
        Ok(Json(value)) => value,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable resolution request");
            return fallback(0);
        }
    };
    let count = value
        .pointer(entries)
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::debug!(error = %e, count, "malformed batch resolution request");
        fallback(count)
    })
}

fn parse_table_request(caller: &str, table: &str) -> Result<(CallerId, TableRef), IdentifierError> {
    Ok((CallerId::new(caller)?, table.parse()?))
}

async fn resolve_or_reject<G: GrantGateway + 'static>(
    state: &AppState<G>,
    parsed: Result<(CallerId, TableRef), IdentifierError>,
) -> FilterResult {
    match parsed {
        Ok((caller, table)) => state.service.resolve_row_filter(&caller, &table).await,
        Err(e) => state.service.reject_row_filter(&e),
    }
}

pub async fn resolve_row_filter<G: GrantGateway + 'static>(
    State(state): State<AppState<G>>,
    body: Result<Json<TableRequest>, JsonRejection>,
) -> Response {
    let req = read_body(body);
    let result = resolve_or_reject(&state, parse_table_request(&req.caller, &req.table)).await;
    ok(ResolveRowFilterResponse {
        filter_expression: result.expression().map(str::to_string),
        has_filter: result.has_filter(),
    })
}

pub async fn query_row_filter<G: GrantGateway + 'static>(
    State(state): State<AppState<G>>,
    body: Result<Json<OpaRequest>, JsonRejection>,
) -> Response {
    let req = read_body(body);
    let input = req.input;
    let (user, table) = match (input.action.resource.and_then(|r| r.table), req.resource) {
        (None, Some(legacy)) => (req.user_id, Some(legacy)),
        (table, _) => (input.context.identity.user, table),
    };
    tracing::debug!(
        %user,
        operation = %input.action.operation,
        "row filter query"
    );

    let parsed = match table {
        Some(table) => CallerId::new(user).and_then(|caller| {
            let table = TableRef::new(table.catalog_name, table.schema_name, table.table_name)?;
            Ok((caller, table))
        }),
        None => Err(IdentifierError::Empty { kind: "table" }),
    };

    let result = resolve_or_reject(&state, parsed).await;
    let expressions = result
        .expression()
        .map(|expression| OpaExpression {
            expression: expression.to_string(),
        })
        .into_iter()
        .collect();
    ok(OpaRowFilterResponse {
        result: expressions,
    })
}

pub async fn list_row_filter_policies<G: GrantGateway + 'static>(
    State(state): State<AppState<G>>,
    Json(req): Json<TableRequest>,
) -> Response {
    match state
        .service
        .list_row_filter_policies(&req.caller, &req.table)
        .await
    {
        Ok(summaries) => {
            let policies: Vec<PolicyResponse> = summaries
                .into_iter()
                .map(|s| PolicyResponse {
                    policy_id: s.policy_id.to_string(),
                    attribute_name: s.attribute_name.to_string(),
                    allowed_values: s.allowed_values,
                })
                .collect();
            ok(ListPoliciesResponse {
                count: policies.len(),
                policies,
            })
        }
        Err(e) => api_error_to_response(e),
    }
}

pub async fn grant_row_filter<G: GrantGateway + 'static>(
    State(state): State<AppState<G>>,
    Json(req): Json<GrantRowFilterRequest>,
) -> Response {
    let input = GrantRowFilterInput {
        caller: req.caller,
        table: req.table,
        attribute_name: req.attribute_name,
        allowed_values: req.allowed_values,
    };

    match state.service.grant_row_filter(input).await {
        Ok(change) => ok(row_filter_change_response(change)),
        Err(e) => api_error_to_response(e),
    }
}

pub async fn revoke_row_filter<G: GrantGateway + 'static>(
    State(state): State<AppState<G>>,
    Json(req): Json<RevokeRowFilterRequest>,
) -> Response {
    match state
        .service
        .revoke_row_filter(&req.caller, &req.table, &req.attribute_name)
        .await
    {
        Ok(change) => ok(row_filter_change_response(change)),
        Err(e) => api_error_to_response(e),
    }
}

pub async fn check_column_mask<G: GrantGateway + 'static>(
    State(state): State<AppState<G>>,
    body: Result<Json<ColumnRequest>, JsonRejection>,
) -> Response {
    let req = read_body(body);
    let parsed = CallerId::new(req.caller)
        .and_then(|caller| Ok((caller, req.column.parse::<ColumnRef>()?)));

    let masked = match parsed {
        Ok((caller, column)) => state.service.resolve_column_mask(&caller, &column).await,
        Err(e) => state.service.reject_column_mask(&e),
    };
    ok(ColumnMaskResponse { masked })
}

async fn mask_batch<G: GrantGateway + 'static>(
    state: &AppState<G>,
    caller: String,
    columns: Vec<Result<ColumnRef, IdentifierError>>,
) -> Vec<bool> {
    match CallerId::new(caller) {
        Ok(caller) => {
            state
                .service
                .resolve_column_mask_batch(&caller, &columns)
                .await
        }
        Err(e) => columns
            .iter()
            .map(|_| state.service.reject_column_mask(&e))
            .collect(),
    }
}

pub async fn check_column_mask_batch<G: GrantGateway + 'static>(
    State(state): State<AppState<G>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let req: ColumnBatchRequest = read_batch_body(body, "/columns", |count| ColumnBatchRequest {
        caller: String::new(),
        columns: vec![String::new(); count],
    });
    let columns = req.columns.iter().map(|c| c.parse()).collect();
    let masked = mask_batch(&state, req.caller, columns).await;
    ok(ColumnMaskBatchResponse { masked })
}

pub async fn query_column_masks<G: GrantGateway + 'static>(
    State(state): State<AppState<G>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let req: OpaRequest = read_batch_body(body, "/input/action/filterResources", |count| {
        let mut req = OpaRequest::default();
        req.input
            .action
            .filter_resources
            .resize_with(count, OpaFilterResource::default);
        req
    });
    let input = req.input;
    let columns = input
        .action
        .filter_resources
        .into_iter()
        .map(|resource| match resource.column {
            Some(c) => ColumnRef::new(
                TableRef::new(c.catalog_name, c.schema_name, c.table_name)?,
                c.column_name,
            ),
            None => Err(IdentifierError::Empty { kind: "column" }),
        })
        .collect();

    let masked = mask_batch(&state, input.context.identity.user, columns).await;
    let result = masked
        .into_iter()
        .enumerate()
        .filter(|(_, masked)| *masked)
        .map(|(index, _)| OpaColumnMask {
            index,
            view_expression: OpaExpression {
                expression: MASK_EXPRESSION.to_string(),
            },
        })
        .collect();
    ok(OpaColumnMaskResponse { result })
}

pub async fn list_masked_columns<G: GrantGateway + 'static>(
    State(state): State<AppState<G>>,
    Json(req): Json<TableRequest>,
) -> Response {
    match state
        .service
        .list_masked_columns(&req.caller, &req.table)
        .await
    {
        Ok(columns) => {
            let columns: Vec<String> = columns.into_iter().collect();
            ok(MaskedColumnsResponse {
                table: req.table,
                count: columns.len(),
                columns,
            })
        }
        Err(e) => api_error_to_response(e),
    }
}

pub async fn grant_column_mask<G: GrantGateway + 'static>(
    State(state): State<AppState<G>>,
    Json(req): Json<ColumnRequest>,
) -> Response {
    match state
        .service
        .grant_column_mask(&req.caller, &req.column)
        .await
    {
        Ok(column) => ok(column_change_response(column)),
        Err(e) => api_error_to_response(e),
    }
}

pub async fn revoke_column_mask<G: GrantGateway + 'static>(
    State(state): State<AppState<G>>,
    Json(req): Json<ColumnRequest>,
) -> Response {
    match state
        .service
        .revoke_column_mask(&req.caller, &req.column)
        .await
    {
        Ok(column) => ok(column_change_response(column)),
        Err(e) => api_error_to_response(e),
    }
}

pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({"status": "ok"})),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use sieve_core::EngineConfig;
    use sieve_storage::InMemoryStore;

    use crate::adapter::StoreGateway;
    use crate::metrics::Metrics;
    use crate::rest::{AppState, create_router};
    use crate::service::AccessService;

    fn make_test_server() -> TestServer {
        let store = Arc::new(InMemoryStore::new());
        let gateway = Arc::new(StoreGateway::new(store, Duration::from_secs(1)));
        let metrics = Arc::new(Metrics::new());
        let service = Arc::new(
            AccessService::new(gateway, EngineConfig::default())
                .with_metrics(Arc::clone(&metrics)),
        );
        let app = create_router(AppState { service, metrics });
        TestServer::new(app).unwrap()
    }

    async fn grant_region(server: &TestServer, caller: &str, values: &[&str]) {
        let response = server
            .post("/v1/row-filter/grant")
            .json(&json!({
                "caller": caller,
                "table": "prod.public.customers",
                "attribute_name": "region",
                "allowed_values": values,
            }))
            .await;
        response.assert_status_ok();
    }

    async fn grant_mask(server: &TestServer, column: &str) {
        let response = server
            .post("/v1/column-mask/grant")
            .json(&json!({"caller": "alice", "column": column}))
            .await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn healthz_returns_200() {
        let server = make_test_server();
        let response = server.get("/healthz").await;

        response.assert_status_ok();
        response.assert_json(&json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn resolve_without_policies_has_no_filter() {
        let server = make_test_server();
        let response = server
            .post("/v1/row-filter/resolve")
            .json(&json!({"caller": "alice", "table": "prod.public.customers"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"filter_expression": null, "has_filter": false}));
    }

    #[tokio::test]
    async fn grant_returns_policy_and_object_ids() {
        let server = make_test_server();
        let response = server
            .post("/v1/row-filter/grant")
            .json(&json!({
                "caller": "alice",
                "table": "prod.public.customers",
                "attribute_name": "region",
                "allowed_values": ["north"],
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["policy_id"], "prod.public.customers.region");
        assert_eq!(
            body["object_id"],
            "row_filter_policy:prod.public.customers.region"
        );
        assert_eq!(body["relation"], "viewer");
    }

    #[tokio::test]
    async fn grant_then_resolve_returns_predicate() {
        let server = make_test_server();
        grant_region(&server, "alice", &["north", "south"]).await;

        let response = server
            .post("/v1/row-filter/resolve")
            .json(&json!({"caller": "alice", "table": "prod.public.customers"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "filter_expression": "region IN ('north', 'south')",
            "has_filter": true,
        }));
    }

    #[tokio::test]
    async fn caller_without_grant_is_denied() {
        let server = make_test_server();
        grant_region(&server, "alice", &["north"]).await;

        let response = server
            .post("/v1/row-filter/resolve")
            .json(&json!({"caller": "bob", "table": "prod.public.customers"}))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["filter_expression"], "1=0");
        assert_eq!(body["has_filter"], true);
    }

    #[tokio::test]
    async fn invalid_table_resolves_to_deny_all() {
        let server = make_test_server();
        let response = server
            .post("/v1/row-filter/resolve")
            .json(&json!({"caller": "alice", "table": "customers"}))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["filter_expression"], "1=0");
    }

    #[tokio::test]
    async fn grant_with_empty_values_returns_400() {
        let server = make_test_server();
        let response = server
            .post("/v1/row-filter/grant")
            .json(&json!({
                "caller": "alice",
                "table": "prod.public.customers",
                "attribute_name": "region",
                "allowed_values": [],
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("region"));
    }

    #[tokio::test]
    async fn grant_with_bad_attribute_returns_400() {
        let server = make_test_server();
        let response = server
            .post("/v1/row-filter/grant")
            .json(&json!({
                "caller": "alice",
                "table": "prod.public.customers",
                "attribute_name": "region; DROP",
                "allowed_values": ["north"],
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_policies_returns_grants() {
        let server = make_test_server();
        grant_region(&server, "alice", &["north"]).await;

        let response = server
            .post("/v1/row-filter/list")
            .json(&json!({"caller": "alice", "table": "prod.public.customers"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "policies": [{
                "policy_id": "prod.public.customers.region",
                "attribute_name": "region",
                "allowed_values": ["north"],
            }],
            "count": 1,
        }));
    }

    #[tokio::test]
    async fn opa_row_filter_query_returns_expression() {
        let server = make_test_server();
        grant_region(&server, "alice", &["north"]).await;

        let response = server
            .post("/v1/row-filter/query")
            .json(&json!({
                "input": {
                    "context": {"identity": {"user": "alice", "groups": []}},
                    "action": {
                        "operation": "GetRowFilters",
                        "resource": {"table": {
                            "catalogName": "prod",
                            "schemaName": "public",
                            "tableName": "customers",
                        }},
                    },
                },
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"result": [{"expression": "region IN ('north')"}]}));
    }

    #[tokio::test]
    async fn opa_row_filter_query_unrestricted_is_empty_list() {
        let server = make_test_server();
        let response = server
            .post("/v1/row-filter/query")
            .json(&json!({
                "input": {
                    "context": {"identity": {"user": "alice"}},
                    "action": {
                        "operation": "GetRowFilters",
                        "resource": {"table": {
                            "catalogName": "prod",
                            "schemaName": "public",
                            "tableName": "orders",
                        }},
                    },
                },
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"result": []}));
    }

    #[tokio::test]
    async fn opa_row_filter_query_without_table_denies() {
        let server = make_test_server();
        let response = server
            .post("/v1/row-filter/query")
            .json(&json!({"input": {"context": {"identity": {"user": "alice"}}}}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"result": [{"expression": "1=0"}]}));
    }

    #[tokio::test]
    async fn column_mask_check_reflects_grant() {
        let server = make_test_server();
        grant_mask(&server, "prod.public.customers.email").await;

        let masked = server
            .post("/v1/column-mask/check")
            .json(&json!({"caller": "alice", "column": "prod.public.customers.email"}))
            .await;
        masked.assert_json(&json!({"masked": true}));

        let unmasked = server
            .post("/v1/column-mask/check")
            .json(&json!({"caller": "alice", "column": "prod.public.customers.name"}))
            .await;
        unmasked.assert_json(&json!({"masked": false}));
    }

    #[tokio::test]
    async fn column_mask_batch_is_index_aligned() {
        let server = make_test_server();
        grant_mask(&server, "prod.public.customers.ssn").await;

        let response = server
            .post("/v1/column-mask/batch")
            .json(&json!({
                "caller": "alice",
                "columns": [
                    "prod.public.customers.name",
                    "prod.public.customers.ssn",
                    "bogus",
                ],
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"masked": [false, true, true]}));
    }

    #[tokio::test]
    async fn opa_column_mask_query_lists_masked_indices() {
        let server = make_test_server();
        grant_mask(&server, "prod.public.customers.email").await;

        let column = |name: &str| {
            json!({"column": {
                "catalogName": "prod",
                "schemaName": "public",
                "tableName": "customers",
                "columnName": name,
            }})
        };
        let response = server
            .post("/v1/column-mask/query")
            .json(&json!({
                "input": {
                    "context": {"identity": {"user": "alice"}},
                    "action": {
                        "operation": "GetColumnMask",
                        "filterResources": [column("id"), column("email")],
                    },
                },
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "result": [{"index": 1, "viewExpression": {"expression": "'*****'"}}],
        }));
    }

    #[tokio::test]
    async fn list_and_revoke_masked_columns() {
        let server = make_test_server();
        grant_mask(&server, "prod.public.customers.email").await;
        grant_mask(&server, "prod.public.customers.ssn").await;

        let listed = server
            .post("/v1/column-mask/list")
            .json(&json!({"caller": "alice", "table": "prod.public.customers"}))
            .await;
        listed.assert_json(&json!({
            "table": "prod.public.customers",
            "columns": ["email", "ssn"],
            "count": 2,
        }));

        let revoked = server
            .post("/v1/column-mask/revoke")
            .json(&json!({"caller": "alice", "column": "prod.public.customers.email"}))
            .await;
        revoked.assert_status_ok();
        let body: Value = revoked.json();
        assert_eq!(body["object_id"], "column:prod.public.customers.email");
        assert_eq!(body["relation"], "mask");

        let listed = server
            .post("/v1/column-mask/list")
            .json(&json!({"caller": "alice", "table": "prod.public.customers"}))
            .await;
        let body: Value = listed.json();
        assert_eq!(body["columns"], json!(["ssn"]));
    }

    #[tokio::test]
    async fn list_with_invalid_table_returns_400() {
        let server = make_test_server();
        let response = server
            .post("/v1/column-mask/list")
            .json(&json!({"caller": "alice", "table": "prod..customers"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn resolve_without_caller_denies_all() {
        let server = make_test_server();
        grant_region(&server, "alice", &["north"]).await;

        let response = server
            .post("/v1/row-filter/resolve")
            .json(&json!({"table": "prod.public.customers"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"filter_expression": "1=0", "has_filter": true}));
    }

    #[tokio::test]
    async fn resolve_with_non_json_body_denies_all() {
        let server = make_test_server();
        let response = server
            .post("/v1/row-filter/resolve")
            .text("caller=alice")
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"filter_expression": "1=0", "has_filter": true}));
    }

    #[tokio::test]
    async fn opa_row_filter_query_with_partial_table_denies() {
        let server = make_test_server();
        grant_region(&server, "alice", &["north"]).await;

        let response = server
            .post("/v1/row-filter/query")
            .json(&json!({
                "input": {
                    "context": {"identity": {"user": "alice"}},
                    "action": {
                        "operation": "GetRowFilters",
                        "resource": {"table": {
                            "schemaName": "public",
                            "tableName": "customers",
                        }},
                    },
                },
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"result": [{"expression": "1=0"}]}));
    }

    #[tokio::test]
    async fn row_filter_query_accepts_flat_user_and_resource() {
        let server = make_test_server();
        grant_region(&server, "alice", &["north"]).await;

        let response = server
            .post("/v1/row-filter/query")
            .json(&json!({
                "user_id": "alice",
                "resource": {
                    "catalog_name": "prod",
                    "schema_name": "public",
                    "table_name": "customers",
                },
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"result": [{"expression": "region IN ('north')"}]}));
    }

    #[tokio::test]
    async fn flat_row_filter_query_without_user_denies() {
        let server = make_test_server();
        let response = server
            .post("/v1/row-filter/query")
            .json(&json!({
                "resource": {
                    "catalog_name": "prod",
                    "schema_name": "public",
                    "table_name": "customers",
                },
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"result": [{"expression": "1=0"}]}));
    }

    #[tokio::test]
    async fn column_mask_check_without_column_is_masked() {
        let server = make_test_server();
        let response = server
            .post("/v1/column-mask/check")
            .json(&json!({"caller": "alice"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"masked": true}));
    }

    #[tokio::test]
    async fn column_mask_batch_with_wrong_types_masks_every_entry() {
        let server = make_test_server();
        let response = server
            .post("/v1/column-mask/batch")
            .json(&json!({"caller": 42, "columns": ["prod.public.customers.id", 7]}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"masked": [true, true]}));
    }

    #[tokio::test]
    async fn opa_column_mask_query_masks_incomplete_columns() {
        let server = make_test_server();
        let response = server
            .post("/v1/column-mask/query")
            .json(&json!({
                "input": {
                    "context": {"identity": {"user": "alice"}},
                    "action": {
                        "operation": "GetColumnMask",
                        "filterResources": [
                            {"column": {
                                "catalogName": "prod",
                                "schemaName": "public",
                                "tableName": "customers",
                                "columnName": "id",
                            }},
                            {"column": {
                                "catalogName": "prod",
                                "schemaName": "public",
                                "tableName": "customers",
                            }},
                        ],
                    },
                },
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "result": [{"index": 1, "viewExpression": {"expression": "'*****'"}}],
        }));
    }

    #[tokio::test]
    async fn opa_column_mask_query_with_wrong_types_masks_every_index() {
        let server = make_test_server();
        let response = server
            .post("/v1/column-mask/query")
            .json(&json!({
                "input": {
                    "context": {"identity": {"user": ["alice"]}},
                    "action": {"filterResources": [{"column": {}}, {"column": {}}]},
                },
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "result": [
                {"index": 0, "viewExpression": {"expression": "'*****'"}},
                {"index": 1, "viewExpression": {"expression": "'*****'"}},
            ],
        }));
    }

    #[tokio::test]
    async fn list_without_caller_returns_400() {
        let server = make_test_server();
        let response = server
            .post("/v1/row-filter/list")
            .json(&json!({"table": "prod.public.customers"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn metrics_count_requests() {
        let server = make_test_server();
        server.get("/healthz").await.assert_status_ok();

        let response = server.get("/metrics").await;
        response.assert_status_ok();
        assert!(response.text().contains("sieve_requests_total"));
    }
}
