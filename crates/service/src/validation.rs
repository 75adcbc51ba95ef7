use std::fmt;

use serde::Serialize;

/// A single rejected field of a request body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Field errors in the order the checks ran (declaration order of the request fields).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self { Self(Vec::new()) }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn first(&self) -> Option<&FieldError> { self.0.first() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> { self.0.iter() }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("malformed request body");
        }
        let joined = self.0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        f.write_str(&joined)
    }
}

/// Domain validation rules of a request payload, checked at the HTTP boundary
/// before the payload reaches a service.
pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

pub fn not_blank(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, "no debe estar vacío");
    }
}

pub fn max_len(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(field, format!("no debe superar los {max} caracteres"));
    }
}

pub fn positive_f64(errors: &mut FieldErrors, field: &str, value: f64) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(field, "debe ser un número positivo");
    }
}

pub fn range_u32(errors: &mut FieldErrors, field: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(field, format!("debe estar entre {min} y {max}"));
    }
}

pub fn email(errors: &mut FieldErrors, field: &str, value: &str) {
    let v = value.trim();
    let valid = match v.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        errors.push(field, "debe ser una dirección de correo válida");
    }
}

pub fn digits(errors: &mut FieldErrors, field: &str, value: &str, min: usize, max: usize) {
    let v = value.trim();
    let ok = v.chars().all(|c| c.is_ascii_digit()) && (min..=max).contains(&v.len());
    if !ok {
        errors.push(field, format!("debe contener entre {min} y {max} dígitos"));
    }
}
