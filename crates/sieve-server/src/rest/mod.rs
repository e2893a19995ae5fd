mod handlers;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::middleware;
use axum::response::Response;
use axum::routing::{get, post};
use sieve_core::GrantGateway;

const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024; // 1 MB

use crate::metrics::{self, Metrics};
use crate::service::AccessService;

pub struct AppState<G: GrantGateway> {
    pub service: Arc<AccessService<G>>,
    pub metrics: Arc<Metrics>,
}

impl<G: GrantGateway> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

async fn metrics_middleware<G: GrantGateway + 'static>(
    State(state): State<AppState<G>>,
    request: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> Response {
    state.metrics.record_request();

    let path = request.uri().path().to_string();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    if response.status().is_success() {
        state.metrics.record_success();
    } else {
        state.metrics.record_error();
    }

    tracing::debug!(
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request handled"
    );

    response
}

pub fn create_router<G>(state: AppState<G>) -> Router
where
    G: GrantGateway + 'static,
{
    Router::new()
        .route("/v1/row-filter/resolve", post(handlers::resolve_row_filter))
        .route("/v1/row-filter/query", post(handlers::query_row_filter))
        .route("/v1/row-filter/list", post(handlers::list_row_filter_policies))
        .route("/v1/row-filter/grant", post(handlers::grant_row_filter))
        .route("/v1/row-filter/revoke", post(handlers::revoke_row_filter))
        .route("/v1/column-mask/check", post(handlers::check_column_mask))
        .route("/v1/column-mask/batch", post(handlers::check_column_mask_batch))
        .route("/v1/column-mask/query", post(handlers::query_column_masks))
        .route("/v1/column-mask/list", post(handlers::list_masked_columns))
        .route("/v1/column-mask/grant", post(handlers::grant_column_mask))
        .route("/v1/column-mask/revoke", post(handlers::revoke_column_mask))
        .route("/healthz", get(handlers::healthz))
        .route(
            "/metrics",
            get(metrics::metrics_handler).with_state(Arc::clone(&state.metrics)),
        )
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_SIZE))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            metrics_middleware,
        ))
        .with_state(state)
}
