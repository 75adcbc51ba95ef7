//! Boundary extractors: nothing reaches a service before these accept it.

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use service::validation::{FieldErrors, Validate};
use service::ServiceError;
use tracing::debug;

use crate::errors::ApiError;

pub const ID_CONSTRAINT: &str = "id: El Id debe ser un entero positivo";

/// `{id}` path segment, guaranteed to be a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveId(pub i64);

pub fn parse_positive_id(raw: &str) -> Result<i64, ServiceError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ServiceError::ConstraintViolation(ID_CONSTRAINT.to_string())),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PositiveId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state).await.map_err(|rejection| {
            debug!(detail = %rejection.body_text(), "unreadable id segment");
            ApiError(ServiceError::ConstraintViolation(ID_CONSTRAINT.to_string()))
        })?;
        Ok(Self(parse_positive_id(&raw)?))
    }
}

/// JSON body that deserialized and passed its domain [`Validate`] rules.
///
/// A body that is not valid JSON for `T` is a validation failure without field errors.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            debug!(detail = %rejection.body_text(), "unreadable request body");
            ApiError(ServiceError::Validation(FieldErrors::new()))
        })?;
        value.validate()?;
        Ok(Self(value))
    }
}
