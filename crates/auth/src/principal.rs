use innkeep_core::UserId;
use serde::{Deserialize, Serialize};

use crate::{Role, TokenClaims};

/// Verified identity attached to a forwarded request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(subject: UserId, role: Role) -> Self {
        Self { subject, role }
    }
}

impl From<&TokenClaims> for Principal {
    fn from(claims: &TokenClaims) -> Self {
        Self {
            subject: claims.sub,
            role: claims.role.clone(),
        }
    }
}
