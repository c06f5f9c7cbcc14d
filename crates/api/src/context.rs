use innkeep_auth::{Principal, Role};
use innkeep_core::UserId;

/// Authenticated identity for a request, inserted by the gateway.
///
/// Only the gateway creates this; nothing a client sends can produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    subject: UserId,
    role: Role,
}

impl PrincipalContext {
    pub fn new(subject: UserId, role: Role) -> Self {
        Self { subject, role }
    }

    pub fn subject(&self) -> UserId {
        self.subject
    }

    pub fn role(&self) -> &Role {
        &self.role
    }
}

impl From<Principal> for PrincipalContext {
    fn from(p: Principal) -> Self {
        Self::new(p.subject, p.role)
    }
}
