//! API endpoint handlers, one module per audience.

pub mod admin;
pub mod auth;
pub mod doctor;
pub mod health;
pub mod patient;

use uuid::Uuid;

use crate::api::error::ApiError;

/// Parse a path id, rejecting malformed ones as a bad request.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid ID format: {raw}")))
}
