use common::Role;

use crate::error::{ArenaError, Result};

/// Authenticated identity on whose behalf an operation runs.
///
/// Supplied by the authentication layer on every call. Capabilities are
/// the permission strings granted in the caller's identity token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub participant_id: i32,
    pub role: Role,
    pub permissions: Vec<String>,
}

impl Actor {
    pub fn new(participant_id: i32, role: Role, permissions: Vec<String>) -> Self {
        Self {
            participant_id,
            role,
            permissions,
        }
    }

    /// Actor holding the default grants of `role`.
    pub fn with_role(participant_id: i32, role: Role) -> Self {
        Self::new(participant_id, role, role.default_permissions())
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn require_permission(&self, permission: &str) -> Result<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ArenaError::Forbidden(permission.to_string()))
        }
    }
}
