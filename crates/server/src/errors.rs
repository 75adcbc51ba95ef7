//! Failure normalization for every HTTP endpoint.
//!
//! Handlers return `Result<_, ApiError>`; turning an `ApiError` into a response runs
//! the failure through a priority-ordered rule list and emits exactly one
//! `{code, response}` envelope. Panics inside handlers are routed through the same
//! catch-all by [`panic_response`].

use std::any::Any;
use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorEnvelope;
use service::validation::FieldErrors;
use service::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

use crate::observability::ERRORS_TOTAL;

pub const MSG_CONSTRAINT_PREFIX: &str = "Violación de restricción: ";
pub const MSG_VALIDATION_FALLBACK: &str = "Error de validación en los datos enviados";
pub const MSG_NOT_FOUND: &str = "No se encontró información asociada con el identificador ingresado";
pub const MSG_REMOTE_UNAVAILABLE: &str =
    "El servicio remoto no está disponible o no responde en este momento.";
pub const MSG_INTERNAL_PREFIX: &str = "Error interno del servidor: ";

/// Which rule produced an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConstraintViolation,
    BodyValidation,
    NotFound,
    Conflict,
    RemoteUnavailable,
    RemoteStatus,
    Unclassified,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::ConstraintViolation => "constraint_violation",
            ErrorKind::BodyValidation => "body_validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::RemoteUnavailable => "remote_unavailable",
            ErrorKind::RemoteStatus => "remote_status",
            ErrorKind::Unclassified => "unclassified",
        }
    }

    /// Caller mistakes log at `warn`; remote and internal failures at `error`.
    pub fn client_caused(self) -> bool {
        matches!(
            self,
            ErrorKind::ConstraintViolation | ErrorKind::BodyValidation | ErrorKind::NotFound | ErrorKind::Conflict
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub kind: ErrorKind,
    pub status: StatusCode,
    pub envelope: ErrorEnvelope,
}

impl Normalized {
    fn new(kind: ErrorKind, status: StatusCode, message: impl Into<String>) -> Self {
        Self { kind, status, envelope: ErrorEnvelope::new(status.as_u16(), message) }
    }
}

type Rule = fn(&(dyn StdError + 'static)) -> Option<Normalized>;

/// Most specific first. A wrapped connectivity failure must hit `remote_unavailable`
/// before `remote_status` would claim it as a generic remote error.
const RULES: &[Rule] = &[
    constraint_violation,
    body_validation,
    not_found,
    conflict,
    remote_unavailable,
    remote_status,
];

fn as_service<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a ServiceError> {
    err.downcast_ref::<ServiceError>()
}

fn constraint_violation(err: &(dyn StdError + 'static)) -> Option<Normalized> {
    match as_service(err)? {
        ServiceError::ConstraintViolation(detail) => Some(Normalized::new(
            ErrorKind::ConstraintViolation,
            StatusCode::BAD_REQUEST,
            format!("{MSG_CONSTRAINT_PREFIX}{detail}"),
        )),
        _ => None,
    }
}

fn body_validation(err: &(dyn StdError + 'static)) -> Option<Normalized> {
    match as_service(err)? {
        ServiceError::Validation(errors) => Some(Normalized::new(
            ErrorKind::BodyValidation,
            StatusCode::BAD_REQUEST,
            first_field_message(errors),
        )),
        _ => None,
    }
}

fn first_field_message(errors: &FieldErrors) -> String {
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| MSG_VALIDATION_FALLBACK.to_string())
}

fn not_found(err: &(dyn StdError + 'static)) -> Option<Normalized> {
    match as_service(err)? {
        ServiceError::NotFound(_) => {
            Some(Normalized::new(ErrorKind::NotFound, StatusCode::NOT_FOUND, MSG_NOT_FOUND))
        }
        _ => None,
    }
}

fn conflict(err: &(dyn StdError + 'static)) -> Option<Normalized> {
    match as_service(err)? {
        ServiceError::Conflict(message) => {
            Some(Normalized::new(ErrorKind::Conflict, StatusCode::CONFLICT, message.clone()))
        }
        _ => None,
    }
}

fn remote_unavailable(err: &(dyn StdError + 'static)) -> Option<Normalized> {
    let hit = match as_service(err) {
        Some(ServiceError::RemoteUnavailable { .. }) => true,
        Some(_) => false,
        None => err
            .downcast_ref::<reqwest::Error>()
            .is_some_and(|e| e.is_connect() || e.is_timeout()),
    };
    hit.then(|| {
        Normalized::new(ErrorKind::RemoteUnavailable, StatusCode::SERVICE_UNAVAILABLE, MSG_REMOTE_UNAVAILABLE)
    })
}

fn remote_status(err: &(dyn StdError + 'static)) -> Option<Normalized> {
    let status = match as_service(err) {
        Some(ServiceError::Remote { status, .. }) => *status,
        Some(_) => return None,
        None => err.downcast_ref::<reqwest::Error>()?.status().map(|s| s.as_u16()),
    };
    let status = status
        .filter(|s| *s > 0)
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Some(Normalized::new(ErrorKind::RemoteStatus, status, remote_message(status)))
}

/// Canned caller-facing text per remote status.
pub fn remote_message(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Solicitud incorrecta al servicio remoto.",
        401 => "No autorizado para acceder al servicio remoto.",
        403 => "Acceso prohibido al servicio remoto.",
        404 => "Recurso no encontrado en el servicio remoto.",
        503 => "Servicio remoto no disponible.",
        _ => "Error al comunicarse con el servicio remoto.",
    }
}

fn unclassified(message: &str) -> Normalized {
    Normalized::new(
        ErrorKind::Unclassified,
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("{MSG_INTERNAL_PREFIX}{message}"),
    )
}

/// The error itself followed by everything it wraps; opaque `anyhow` payloads are unrolled.
fn causes<'a>(err: &'a ServiceError) -> Vec<&'a (dyn StdError + 'static)> {
    let mut out: Vec<&(dyn StdError + 'static)> = Vec::new();
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(next) = current {
        out.push(next);
        current = match next.downcast_ref::<ServiceError>() {
            // transparent: source() would skip the wrapped object itself
            Some(ServiceError::Other(inner)) => Some(&**inner),
            _ => next.source(),
        };
    }
    out
}

/// Classify a failure into its status and envelope. Pure: no logging, no metrics.
pub fn normalize(err: &ServiceError) -> Normalized {
    let chain = causes(err);
    RULES
        .iter()
        .find_map(|rule| chain.iter().find_map(|cause| rule(*cause)))
        .unwrap_or_else(|| unclassified(&err.to_string()))
}

fn record(n: &Normalized, detail: &dyn std::fmt::Display) {
    ERRORS_TOTAL.with_label_values(&[n.kind.label()]).inc();
    if n.kind.client_caused() {
        warn!(kind = n.kind.label(), status = n.status.as_u16(), error = %detail, "request rejected");
    } else {
        error!(kind = n.kind.label(), status = n.status.as_u16(), error = %detail, "request failed");
    }
}

/// Error type of every handler: anything a service can raise, rendered once at the boundary.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self { Self(e) }
}

impl From<FieldErrors> for ApiError {
    fn from(e: FieldErrors) -> Self { Self(ServiceError::Validation(e)) }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self { Self(ServiceError::Other(e)) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let n = normalize(&self.0);
        record(&n, &self.0);
        (n.status, Json(n.envelope)).into_response()
    }
}

/// Response for a panic caught by `CatchPanicLayer`: same catch-all as unclassified errors.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    };
    let n = unclassified(&message);
    record(&n, &message);
    (n.status, Json(n.envelope)).into_response()
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("service wiring failed: {0}")]
    Wiring(#[from] ServiceError),
}
