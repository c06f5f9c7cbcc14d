//! Credential records and the login flow that turns them into tokens.

use chrono::{DateTime, Utc};

use innkeep_core::{DomainError, DomainResult, UserId};

use crate::{AuthError, IssuedToken, Role, TokenIssuer};

/// Shortest secret accepted at provisioning or password change.
pub const MIN_SECRET_LEN: usize = 8;

/// Canonical form of a login identifier (email or username).
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Check a login identifier before it is stored.
pub fn validate_identifier(identifier: &str) -> DomainResult<()> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(DomainError::validation("identifier must not be empty"));
    }
    if identifier.len() > 254 {
        return Err(DomainError::validation("identifier is too long"));
    }
    if identifier.chars().any(char::is_whitespace) {
        return Err(DomainError::validation("identifier must not contain whitespace"));
    }
    Ok(())
}

/// Check a plaintext secret before it is hashed.
pub fn validate_secret(secret: &str) -> DomainResult<()> {
    if secret.chars().count() < MIN_SECRET_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_SECRET_LEN} characters"
        )));
    }
    // bcrypt only looks at the first 72 bytes
    if secret.len() > 72 {
        return Err(DomainError::validation("password must be at most 72 bytes"));
    }
    Ok(())
}

/// One-way bcrypt hash of a secret. The plaintext is never kept.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn hash(secret: &str, cost: u32) -> Result<Self, AuthError> {
        bcrypt::hash(secret, cost)
            .map(Self)
            .map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))
    }

    /// Wrap an already-encoded bcrypt hash (e.g. loaded from storage).
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn verify(&self, secret: &str) -> bool {
        bcrypt::verify(secret, &self.0).unwrap_or(false)
    }
}

impl core::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Stored login identity.
#[derive(Debug, Clone)]
pub struct Credential {
    pub subject: UserId,
    /// Normalized identifier; see [`normalize_identifier`].
    pub identifier: String,
    pub display_name: String,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(
        subject: UserId,
        identifier: &str,
        display_name: impl Into<String>,
        password_hash: PasswordHash,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject,
            identifier: normalize_identifier(identifier),
            display_name: display_name.into(),
            password_hash,
            role,
            created_at,
        }
    }
}

/// Storage seam for credentials.
///
/// Identifiers passed in are already normalized.
pub trait CredentialStore: Send + Sync {
    fn find_by_identifier(&self, identifier: &str) -> Option<Credential>;
    fn get(&self, subject: &UserId) -> Option<Credential>;
    /// Fails with `Conflict` if the identifier is taken.
    fn insert(&self, credential: Credential) -> DomainResult<()>;
    fn update_password(&self, subject: &UserId, password_hash: PasswordHash) -> DomainResult<()>;
    fn remove(&self, subject: &UserId) -> DomainResult<Credential>;
    fn list(&self) -> Vec<Credential>;
}

impl<S> CredentialStore for std::sync::Arc<S>
where
    S: CredentialStore + ?Sized,
{
    fn find_by_identifier(&self, identifier: &str) -> Option<Credential> {
        (**self).find_by_identifier(identifier)
    }

    fn get(&self, subject: &UserId) -> Option<Credential> {
        (**self).get(subject)
    }

    fn insert(&self, credential: Credential) -> DomainResult<()> {
        (**self).insert(credential)
    }

    fn update_password(&self, subject: &UserId, password_hash: PasswordHash) -> DomainResult<()> {
        (**self).update_password(subject, password_hash)
    }

    fn remove(&self, subject: &UserId) -> DomainResult<Credential> {
        (**self).remove(subject)
    }

    fn list(&self) -> Vec<Credential> {
        (**self).list()
    }
}

/// Token issuer front door: checks credentials, then mints a token.
pub struct Authenticator<S> {
    store: S,
    issuer: TokenIssuer,
    // Verified against when the identifier is unknown so both failure paths
    // cost one bcrypt comparison.
    decoy: PasswordHash,
}

impl<S> Authenticator<S>
where
    S: CredentialStore,
{
    pub fn new(store: S, issuer: TokenIssuer, bcrypt_cost: u32) -> Result<Self, AuthError> {
        let decoy = PasswordHash::hash("innkeep-decoy-secret", bcrypt_cost)?;
        Ok(Self { store, issuer, decoy })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Verify `identifier`/`secret` and issue a token for the stored role.
    pub fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let identifier = normalize_identifier(identifier);

        let Some(credential) = self.store.find_by_identifier(&identifier) else {
            let _ = self.decoy.verify(secret);
            tracing::debug!("login rejected: unknown identifier");
            return Err(AuthError::InvalidCredentials);
        };

        if !credential.password_hash.verify(secret) {
            tracing::debug!(subject = %credential.subject, "login rejected: secret mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.issuer.issue(credential.subject, credential.role, now)?;
        tracing::info!(subject = %issued.claims.sub, role = %issued.claims.role, "token issued");
        Ok(issued)
    }
}
