use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{ROLE_ADMIN, ROLE_AGENT, ROLE_CUSTOMER};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub sub: String,
    /// Display name, when the token carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    /// Check if user can work tickets (admin or agent)
    pub fn has_agent_access(&self) -> bool {
        self.is_admin() || self.has_role(ROLE_AGENT)
    }

    /// Check if user can use the desk at all (admin, agent or customer)
    pub fn has_desk_access(&self) -> bool {
        self.has_agent_access() || self.has_role(ROLE_CUSTOMER)
    }
}
