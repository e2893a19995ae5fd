use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sieve_core::FilterResult;

#[derive(Debug, Default)]
pub struct Metrics {
    request_total: AtomicU64,
    request_success: AtomicU64,
    request_error: AtomicU64,
    row_filter_no_filter: AtomicU64,
    row_filter_predicate: AtomicU64,
    row_filter_deny_all: AtomicU64,
    column_masked: AtomicU64,
    column_unmasked: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.request_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.request_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.request_error.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_row_filter(&self, result: &FilterResult) {
        let counter = match result {
            FilterResult::NoFilter => &self.row_filter_no_filter,
            FilterResult::Predicate(_) => &self.row_filter_predicate,
            FilterResult::DenyAll => &self.row_filter_deny_all,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mask(&self, masked: bool) {
        if masked {
            self.column_masked.fetch_add(1, Ordering::Relaxed);
        } else {
            self.column_unmasked.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn request_total(&self) -> u64 {
        self.request_total.load(Ordering::Relaxed)
    }

    pub fn request_success(&self) -> u64 {
        self.request_success.load(Ordering::Relaxed)
    }

    pub fn request_error(&self) -> u64 {
        self.request_error.load(Ordering::Relaxed)
    }

    pub fn row_filter_decisions(&self, outcome: &str) -> u64 {
        match outcome {
            "no_filter" => self.row_filter_no_filter.load(Ordering::Relaxed),
            "predicate" => self.row_filter_predicate.load(Ordering::Relaxed),
            "deny_all" => self.row_filter_deny_all.load(Ordering::Relaxed),
            _ => 0,
        }
    }

    pub fn column_masked(&self) -> u64 {
        self.column_masked.load(Ordering::Relaxed)
    }

    pub fn column_unmasked(&self) -> u64 {
        self.column_unmasked.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let mut output = String::new();
        output.push_str("# HELP sieve_requests_total Total number of requests.\n");
        output.push_str("# TYPE sieve_requests_total counter\n");
        output.push_str(&format!("sieve_requests_total {}\n", self.request_total()));
        output.push_str("# HELP sieve_requests_success_total Total successful requests.\n");
        output.push_str("# TYPE sieve_requests_success_total counter\n");
        output.push_str(&format!(
            "sieve_requests_success_total {}\n",
            self.request_success()
        ));
        output.push_str("# HELP sieve_requests_error_total Total failed requests.\n");
        output.push_str("# TYPE sieve_requests_error_total counter\n");
        output.push_str(&format!(
            "sieve_requests_error_total {}\n",
            self.request_error()
        ));
        output.push_str("# HELP sieve_row_filter_decisions_total Row filter decisions by outcome.\n");
        output.push_str("# TYPE sieve_row_filter_decisions_total counter\n");
        for outcome in ["no_filter", "predicate", "deny_all"] {
            output.push_str(&format!(
                "sieve_row_filter_decisions_total{{outcome=\"{outcome}\"}} {}\n",
                self.row_filter_decisions(outcome)
            ));
        }
        output.push_str("# HELP sieve_column_mask_decisions_total Column mask decisions.\n");
        output.push_str("# TYPE sieve_column_mask_decisions_total counter\n");
        output.push_str(&format!(
            "sieve_column_mask_decisions_total{{masked=\"true\"}} {}\n",
            self.column_masked()
        ));
        output.push_str(&format!(
            "sieve_column_mask_decisions_total{{masked=\"false\"}} {}\n",
            self.column_unmasked()
        ));
        output
    }
}

pub async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics.render_prometheus(),
    )
}
