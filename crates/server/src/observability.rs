use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "commons_errors_total",
        "Failures normalized into an error envelope, by rule",
        &["kind"]
    )
    .expect("register errors_total")
});

pub fn encode_metrics() -> (StatusCode, String) {
    // touch lazies so the families show up before the first failure
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&service::remote::REMOTE_CALLS_TOTAL);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}"));
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}
