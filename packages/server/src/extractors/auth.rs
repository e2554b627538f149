use axum::{extract::FromRequestParts, http::request::Parts};
use common::Role;
use engine::Actor;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated participant extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. Capability
/// checks happen inside the engine against the token's permission list.
pub struct AuthUser {
    pub participant_id: i32,
    pub name: String,
    pub role: Role,
    pub permissions: Vec<String>,
}

impl AuthUser {
    /// Identity handed to engine operations.
    pub fn actor(&self) -> Actor {
        Actor::new(self.participant_id, self.role, self.permissions.clone())
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(&state.config.auth.jwt_secret, token)
            .map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            participant_id: claims.uid,
            name: claims.sub,
            role: claims.role,
            permissions: claims.permissions,
        })
    }
}
