//! Typed clients for other services of the application, addressed by logical name.

pub mod discovery;
pub mod reservations;

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

use crate::errors::ServiceError;

pub use discovery::{ServiceResolver, StaticServiceResolver};
pub use reservations::{HttpReservationClient, ReservationClient};

pub static REMOTE_CALLS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "commons_remote_calls_total",
        "Outbound existence checks by service and outcome",
        &["service", "outcome"]
    )
    .expect("register remote_calls_total")
});

/// Classify a transport failure: no response at all is connectivity, anything else is a
/// generic remote failure carrying whatever status reqwest saw.
pub fn transport_error(service: &str, err: &reqwest::Error) -> ServiceError {
    if err.is_connect() || err.is_timeout() {
        return ServiceError::unavailable(service, err.to_string());
    }
    match err.status() {
        Some(status) => ServiceError::remote(service, Some(status.as_u16()), err.to_string()),
        None if err.is_request() => ServiceError::unavailable(service, err.to_string()),
        None => ServiceError::remote(service, None, err.to_string()),
    }
}
