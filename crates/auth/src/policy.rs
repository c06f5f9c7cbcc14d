//! Central path-prefix access policy.
//!
//! Every role check in the service goes through [`AccessPolicy::evaluate`];
//! handlers do not compare role strings themselves.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AuthError, Principal, Role, TokenClaims};

/// What a matching rule demands of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "require", rename_all = "snake_case")]
pub enum Requirement {
    /// Any verified token.
    Authenticated,
    /// A verified token whose role equals `role` exactly.
    Role { role: Role },
}

/// One protected-resource rule: `{ "prefix": "/api/admin", "require": "role", "role": "admin" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    pub prefix: String,
    #[serde(flatten)]
    pub requirement: Requirement,
}

impl AccessRule {
    pub fn authenticated(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            requirement: Requirement::Authenticated,
        }
    }

    pub fn role(prefix: impl Into<String>, role: Role) -> Self {
        Self {
            prefix: prefix.into(),
            requirement: Requirement::Role { role },
        }
    }

    /// Prefix match on path-segment boundaries.
    pub fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("rule prefix '{0}' must start with '/'")]
    InvalidPrefix(String),

    #[error("duplicate rule prefix '{0}'")]
    DuplicatePrefix(String),
}

/// Successful policy outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allowed {
    /// Identity to propagate downstream, if the caller presented a valid token.
    pub principal: Option<Principal>,
}

/// Static rule table; immutable once built.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    // longest prefix first
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>) -> Result<Self, PolicyError> {
        let mut normalized: Vec<AccessRule> = Vec::with_capacity(rules.len());

        for mut rule in rules {
            if !rule.prefix.starts_with('/') {
                return Err(PolicyError::InvalidPrefix(rule.prefix));
            }
            let trimmed = rule.prefix.trim_end_matches('/');
            rule.prefix = if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() };

            if normalized.iter().any(|r| r.prefix == rule.prefix) {
                return Err(PolicyError::DuplicatePrefix(rule.prefix));
            }
            normalized.push(rule);
        }

        normalized.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Ok(Self { rules: normalized })
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// The most specific rule covering `path`, if any.
    pub fn rule_for(&self, path: &str) -> Option<&AccessRule> {
        self.rules.iter().find(|r| r.matches(path))
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.rule_for(path).is_some()
    }

    /// Decide whether a request for `path` may proceed.
    ///
    /// `claims` must already be verified; pass `None` when no token was
    /// presented (or it failed verification on an unprotected path).
    pub fn evaluate(&self, path: &str, claims: Option<&TokenClaims>) -> Result<Allowed, AuthError> {
        let principal = claims.map(Principal::from);

        let Some(rule) = self.rule_for(path) else {
            return Ok(Allowed { principal });
        };

        let Some(principal) = principal else {
            return Err(AuthError::Unauthenticated);
        };

        match &rule.requirement {
            Requirement::Authenticated => {}
            Requirement::Role { role } => {
                if principal.role != *role {
                    return Err(AuthError::Forbidden(role.clone()));
                }
            }
        }

        Ok(Allowed {
            principal: Some(principal),
        })
    }
}
