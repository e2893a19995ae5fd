use axum::http::StatusCode;
use sieve_core::{GatewayError, GrantError, IdentifierError, LifecycleError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid identifier: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("invalid grant: {0}")]
    Grant(#[from] GrantError),

    #[error("store error: {0}")]
    Gateway(#[from] GatewayError),
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Grant(e) => ApiError::Grant(e),
            LifecycleError::Gateway(e) => ApiError::Gateway(e),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Identifier(_) | ApiError::Grant(_) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
