use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TableRequest {
    pub caller: String,
    pub table: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveRowFilterResponse {
    pub filter_expression: Option<String>,
    pub has_filter: bool,
}

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub policy_id: String,
    pub attribute_name: String,
    pub allowed_values: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ListPoliciesResponse {
    pub policies: Vec<PolicyResponse>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct GrantRowFilterRequest {
    pub caller: String,
    pub table: String,
    pub attribute_name: String,
    #[serde(default)]
    pub allowed_values: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevokeRowFilterRequest {
    pub caller: String,
    pub table: String,
    pub attribute_name: String,
}

#[derive(Debug, Serialize)]
pub struct RowFilterChangeResponse {
    pub success: bool,
    pub policy_id: String,
    pub object_id: String,
    pub table: String,
    pub attribute_name: String,
    pub relation: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ColumnRequest {
    pub caller: String,
    pub column: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ColumnBatchRequest {
    pub caller: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ColumnMaskResponse {
    pub masked: bool,
}

#[derive(Debug, Serialize)]
pub struct ColumnMaskBatchResponse {
    pub masked: Vec<bool>,
}

#[derive(Debug, Serialize)]
pub struct MaskedColumnsResponse {
    pub table: String,
    pub columns: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ColumnMaskChangeResponse {
    pub success: bool,
    pub object_id: String,
    pub column: String,
    pub relation: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// Query-engine access-control shapes. Missing fields decode as empty and
// are rejected by identifier validation, so the handler still answers.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpaRequest {
    pub input: OpaInput,
    /// Older row-filter clients send `{user_id, resource}` at the top level.
    pub user_id: String,
    pub resource: Option<OpaTable>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpaInput {
    pub context: OpaContext,
    pub action: OpaAction,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpaContext {
    pub identity: OpaIdentity,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpaIdentity {
    pub user: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpaAction {
    pub operation: String,
    pub resource: Option<OpaResource>,
    pub filter_resources: Vec<OpaFilterResource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpaResource {
    pub table: Option<OpaTable>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpaTable {
    #[serde(alias = "catalog_name")]
    pub catalog_name: String,
    #[serde(alias = "schema_name")]
    pub schema_name: String,
    #[serde(alias = "table_name")]
    pub table_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpaFilterResource {
    pub column: Option<OpaColumn>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpaColumn {
    pub catalog_name: String,
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
}

#[derive(Debug, Serialize)]
pub struct OpaExpression {
    pub expression: String,
}

#[derive(Debug, Serialize)]
pub struct OpaRowFilterResponse {
    pub result: Vec<OpaExpression>,
}

#[derive(Debug, Serialize)]
pub struct OpaColumnMask {
    pub index: usize,
    #[serde(rename = "viewExpression")]
    pub view_expression: OpaExpression,
}

#[derive(Debug, Serialize)]
pub struct OpaColumnMaskResponse {
    pub result: Vec<OpaColumnMask>,
}
