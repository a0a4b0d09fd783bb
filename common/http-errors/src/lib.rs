use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts};
use serde::Serialize;
use std::{collections::HashSet, future::Future, pin::Pin, sync::Mutex};
use uuid::Uuid;

pub const ERROR_CODE_HEADER: &str = "X-Error-Code";

/// Distinct error codes tracked as labels before further codes collapse into `OVERFLOW_CODE`.
pub const MAX_ERROR_CODES: usize = 40;
pub const OVERFLOW_CODE: &str = "_overflow";

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")] pub trace_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")] pub message: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    NotFound { code: &'static str, trace_id: Option<Uuid> },
    Internal { trace_id: Option<Uuid>, message: Option<String> },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E, trace_id: Option<Uuid>) -> Self { Self::Internal { trace_id, message: Some(e.to_string()) } }
    pub fn not_found(code: &'static str, trace_id: Option<Uuid>) -> Self { Self::NotFound { code, trace_id } }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest { code, trace_id, message } => (
                StatusCode::BAD_REQUEST,
                ErrorBody { code: code.into(), trace_id, message },
            ),
            ApiError::NotFound { code, trace_id } => (
                StatusCode::NOT_FOUND,
                ErrorBody { code: code.into(), trace_id, message: None },
            ),
            ApiError::Internal { trace_id, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody { code: "internal_error".into(), trace_id, message },
            ),
        };
        let header = HeaderValue::from_str(&body.code).ok();
        let mut resp = (status, Json(body)).into_response();
        if let Some(val) = header {
            resp.headers_mut().insert(ERROR_CODE_HEADER, val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

static HTTP_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("http_errors_total", "Count of HTTP error responses emitted (status >= 400)"),
        &["service", "code", "status"],
    ).unwrap();
    let _ = prometheus::register(Box::new(counter.clone()));
    counter
});

static HTTP_ERROR_CODES_DISTINCT: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new("http_error_codes_distinct", "Distinct error codes seen as metric labels").unwrap();
    let _ = prometheus::register(Box::new(gauge.clone()));
    gauge
});

static HTTP_ERROR_CODE_OVERFLOW_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "http_error_code_overflow_total",
        "Error responses whose code was folded into the overflow label",
    ).unwrap();
    let _ = prometheus::register(Box::new(counter.clone()));
    counter
});

static SEEN_CODES: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

// Returns the label to use for `code`, enforcing the cardinality guard.
fn guarded_code_label(code: &str) -> String {
    let mut seen = match SEEN_CODES.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if seen.contains(code) {
        return code.to_string();
    }
    if seen.len() >= MAX_ERROR_CODES {
        HTTP_ERROR_CODE_OVERFLOW_TOTAL.inc();
        return OVERFLOW_CODE.to_string();
    }
    seen.insert(code.to_string());
    HTTP_ERROR_CODES_DISTINCT.set(seen.len() as i64);
    code.to_string()
}

pub fn record_error_response(service: &str, resp: &Response) {
    let status = resp.status();
    if status.as_u16() < 400 {
        return;
    }
    let code = resp
        .headers()
        .get(ERROR_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    let label = guarded_code_label(code);
    HTTP_ERRORS_TOTAL
        .with_label_values(&[service, label.as_str(), status.as_str()])
        .inc();
}

type LayerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Middleware for `axum::middleware::from_fn` counting error responses per service and code.
pub fn http_error_metrics_layer(
    service: &'static str,
) -> impl Fn(Request, Next) -> LayerFuture + Clone + Send + Sync + 'static {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let resp = next.run(req).await;
            record_error_response(service, &resp);
            resp
        }) as LayerFuture
    }
}
