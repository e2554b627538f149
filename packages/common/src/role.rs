#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Capability names carried in identity tokens.
pub mod permission {
    /// Create, edit, close, delete and list rounds.
    pub const ROUND_MANAGE: &str = "round:manage";
    /// Register and delete participants.
    pub const PARTICIPANT_MANAGE: &str = "participant:manage";
    /// Cast peer votes and submit work.
    pub const ROUND_PARTICIPATE: &str = "round:participate";
}

/// Default role-permission grants. The authentication layer copies the
/// grants of a role into the token it issues.
pub const DEFAULT_GRANTS: &[(Role, &str)] = &[
    (Role::Admin, permission::ROUND_MANAGE),
    (Role::Admin, permission::PARTICIPANT_MANAGE),
    (Role::Admin, permission::ROUND_PARTICIPATE),
    (Role::Participant, permission::ROUND_PARTICIPATE),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "admin"))]
    Admin,
    /// Competes in rounds; the only role scored at closure.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "participant"))]
    Participant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Participant => "participant",
        }
    }

    /// Permissions granted to this role by default.
    pub fn default_permissions(&self) -> Vec<String> {
        DEFAULT_GRANTS
            .iter()
            .filter(|(role, _)| role == self)
            .map(|(_, perm)| perm.to_string())
            .collect()
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Participant
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    invalid: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid role '{}'. Valid values: admin, participant",
            self.invalid
        )
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "participant" => Ok(Self::Participant),
            _ => Err(ParseRoleError {
                invalid: s.to_string(),
            }),
        }
    }
}
