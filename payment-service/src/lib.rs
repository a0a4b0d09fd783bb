use axum::{middleware, routing::{get, post}, Router};
use common_http_errors::http_error_metrics_layer;
use common_mpesa::PaymentVerifier;
use common_observability::VerificationMetrics;
use std::sync::Arc;

pub mod config;
pub mod plans;
pub mod verification_handlers;

use config::ServiceConfig;
use plans::PlanCatalog;

pub const SERVICE_NAME: &str = "payment-service";

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<PaymentVerifier>,
    pub plans: Arc<PlanCatalog>,
    pub metrics: VerificationMetrics,
}

impl AppState {
    pub fn new(verifier: PaymentVerifier, plans: PlanCatalog) -> Self {
        Self { verifier: Arc::new(verifier), plans: Arc::new(plans), metrics: VerificationMetrics::new() }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(PaymentVerifier::new(config.recipient_label.clone()), config.plans.clone())
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/metrics", get(verification_handlers::metrics_text))
        .route("/payments/mpesa/verify", post(verification_handlers::verify_mpesa_payment))
        .with_state(state)
        .layer(middleware::from_fn(http_error_metrics_layer(SERVICE_NAME)))
}
