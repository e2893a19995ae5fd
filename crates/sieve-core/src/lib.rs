pub mod engine;
pub mod gateway;
pub mod grant;
pub mod lifecycle;
pub mod policy;
pub mod resource;
pub mod sanitize;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{
    ColumnMaskEngine, DENY_ALL_EXPRESSION, EngineConfig, FilterResult, PolicySummary,
    ResolveError, RowFilterEngine,
};
pub use gateway::{GatewayError, GrantGateway};
pub use grant::{AttributeGrant, GrantError, WILDCARD};
pub use lifecycle::{GrantLifecycle, LifecycleError};
pub use policy::{
    AttributeName, PolicyId, PolicyIdError, derive_policy_id, parse_attribute, parse_policy_id,
};
pub use resource::{CallerId, ColumnRef, IdentifierError, TableRef};
