//! Catalog error types.

use serde::Serialize;
use thiserror::Error;

/// A single field that failed its constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum OfferError {
    /// One or more fields violated their constraint. Nothing was changed.
    #[error("validation failed: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("offer not found")]
    NotFound,

    /// The caller does not own the offer.
    #[error("not the owner of this offer")]
    Forbidden,

    /// Storage or asset store failure. Never retried here.
    #[error("upstream failure: {0:#}")]
    Upstream(#[from] anyhow::Error),
}

impl From<Vec<FieldViolation>> for OfferError {
    fn from(violations: Vec<FieldViolation>) -> Self {
        OfferError::Validation(violations)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
