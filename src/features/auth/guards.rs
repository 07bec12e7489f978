//! Role-based authorization guards for the desk.
//!
//! Role hierarchy (from highest to lowest):
//! - admin: everything
//! - agent: works tickets (update, delete, list all)
//! - customer: opens tickets, reads them and attaches files

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

fn authenticated_user(parts: &Parts) -> Result<&AuthenticatedUser, AppError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

/// Guard for agent level access.
///
/// Allows users with "admin" or "agent" roles.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAgent(user): RequireAgent) { ... }
/// ```
pub struct RequireAgent(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAgent
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated_user(parts)?;

        if !user.has_agent_access() {
            return Err(AppError::Forbidden("Agent access required".to_string()));
        }

        Ok(RequireAgent(user.clone()))
    }
}

/// Guard for any desk role.
///
/// Allows users with "admin", "agent" or "customer" roles.
pub struct RequireDeskUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireDeskUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated_user(parts)?;

        if !user.has_desk_access() {
            return Err(AppError::Forbidden("Desk access required".to_string()));
        }

        Ok(RequireDeskUser(user.clone()))
    }
}
