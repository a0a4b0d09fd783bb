use crate::{plans::Plan, AppState};
use axum::{extract::{rejection::JsonRejection, State}, Json};
use common_http_errors::{ApiError, ApiResult};
use common_mpesa::{VerificationFailure, VerificationOutcome};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    /// Selected plan; absent when the user has not picked one yet.
    #[serde(rename = "planId")]
    pub plan_id: Option<u32>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct VerificationReason {
    pub code: &'static str,
    pub message: String,
}

impl From<&VerificationFailure> for VerificationReason {
    fn from(failure: &VerificationFailure) -> Self {
        Self { code: failure.code(), message: failure.to_string() }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub verified: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    pub reasons: Vec<VerificationReason>,
}

impl VerifyPaymentResponse {
    fn new(outcome: &VerificationOutcome, plan: Option<Plan>) -> Self {
        Self {
            verified: outcome.is_verified(),
            status: if outcome.is_verified() { "verified" } else { "rejected" },
            plan,
            reasons: outcome.failures().iter().map(VerificationReason::from).collect(),
        }
    }
}

pub async fn verify_mpesa_payment(
    State(state): State<AppState>,
    payload: Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> ApiResult<Json<VerifyPaymentResponse>> {
    let Json(req) = payload.map_err(|rejection| {
        let trace_id = Uuid::new_v4();
        warn!(%trace_id, status = %rejection.status(), "Rejected verification request body");
        ApiError::BadRequest {
            code: "invalid_request_body",
            trace_id: Some(trace_id),
            message: Some(rejection.body_text()),
        }
    })?;
    let plan = match req.plan_id {
        Some(id) => match state.plans.find(id) {
            Some(plan) => Some(plan.clone()),
            None => {
                let trace_id = Uuid::new_v4();
                warn!(plan_id = id, %trace_id, "Verification requested for unknown plan");
                return Err(ApiError::not_found("plan_not_found", Some(trace_id)));
            }
        },
        None => None,
    };

    let outcome = state
        .verifier
        .verify_message(&req.message, plan.as_ref().map(|p| p.price));
    let codes: Vec<&str> = outcome.failures().iter().map(VerificationFailure::code).collect();
    state.metrics.observe(req.message.len(), &codes);
    info!(
        plan_id = ?req.plan_id,
        verified = outcome.is_verified(),
        reasons = ?codes,
        "Processed M-Pesa verification request"
    );

    Ok(Json(VerifyPaymentResponse::new(&outcome, plan)))
}

pub async fn metrics_text(State(state): State<AppState>) -> ApiResult<String> {
    let mut families = state.metrics.registry.gather();
    families.extend(prometheus::gather());
    let mut buf = Vec::new();
    TextEncoder::new()
        .encode(&families, &mut buf)
        .map_err(|e| ApiError::internal(e, None))?;
    String::from_utf8(buf).map_err(|e| ApiError::internal(e, None))
}
