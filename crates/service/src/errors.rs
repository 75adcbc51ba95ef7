use thiserror::Error;

use crate::validation::FieldErrors;

/// Every failure that can leave a service or the request boundary.
///
/// The HTTP layer maps each variant to exactly one `{code, response}` envelope;
/// nothing in the service layer recovers from these locally.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A path or parameter constraint was not met (e.g. a non-positive id).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    /// The request body failed domain validation. An empty list means the body was unreadable.
    #[error("validation error: {0}")]
    Validation(FieldErrors),
    #[error("not found: {0}")]
    NotFound(String),
    /// The remote service answered with an error status, or with a body we could not use.
    #[error("remote call to {service} failed (status {status:?}): {message}")]
    Remote { service: String, status: Option<u16>, message: String },
    /// The remote service never produced a response.
    #[error("remote service {service} unavailable: {message}")]
    RemoteUnavailable { service: String, message: String },
    /// Deletion refused because other entities still reference the resource.
    #[error("{0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(entity: &str, id: i64) -> Self {
        Self::NotFound(format!("{entity} {id} not found"))
    }

    pub fn remote(service: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote { service: service.to_string(), status, message: message.into() }
    }

    pub fn unavailable(service: &str, message: impl Into<String>) -> Self {
        Self::RemoteUnavailable { service: service.to_string(), message: message.into() }
    }
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self { Self::Validation(errors) }
}
