use std::fmt;

use board_db::models::OwnedMutation;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Post,
    Comment,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Post => write!(f, "post"),
            Resource::Comment => write!(f, "comment"),
        }
    }
}

pub fn not_found(resource: Resource) -> ApiError {
    ApiError::NotFound(format!("{} not found", resource))
}

pub fn not_owner(resource: Resource) -> ApiError {
    ApiError::Forbidden(format!("only the author can modify this {}", resource))
}

/// Pre-check on the looked-up owner: missing row is 404, someone else's row
/// is 403. Runs before any content validation.
pub fn ensure_owner(owner: Option<i64>, caller: i64, resource: Resource) -> Result<(), ApiError> {
    match owner {
        None => Err(not_found(resource)),
        Some(owner) if owner != caller => Err(not_owner(resource)),
        Some(_) => Ok(()),
    }
}

/// Outcome of the owner-filtered write. Ownership can change between the
/// pre-check and the write; the filter is what actually enforces it.
pub fn ensure_applied(outcome: OwnedMutation, resource: Resource) -> Result<(), ApiError> {
    match outcome {
        OwnedMutation::Applied => Ok(()),
        OwnedMutation::Missing => Err(not_found(resource)),
        OwnedMutation::NotOwner => Err(not_owner(resource)),
    }
}
