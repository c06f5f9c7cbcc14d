//! HS256 token minting and verification.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};

use innkeep_core::UserId;

use crate::{AuthError, Role, TokenClaims, validate_claims};

/// Process-wide symmetric signing key.
///
/// Loaded once at startup and only ever read afterwards.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn issuer(&self, ttl: Duration) -> TokenIssuer {
        TokenIssuer::new(&self.0, ttl)
    }

    pub fn validator(&self) -> Hs256JwtValidator {
        Hs256JwtValidator::new(&self.0)
    }
}

impl core::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SigningSecret(<{} bytes redacted>)", self.0.len())
    }
}

/// A freshly minted token together with the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// Mints signed, time-bound tokens.
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `subject` valid from `now` until `now + ttl`.
    ///
    /// Timestamps are truncated to whole seconds (the wire precision), so the
    /// returned claims are exactly what a verifier will decode.
    pub fn issue(&self, subject: UserId, role: Role, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Internal("token expiry overflows the calendar".into()))?;
        let claims = TokenClaims {
            sub: subject,
            role,
            issued_at,
            expires_at,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))?;

        Ok(IssuedToken { token, claims })
    }
}

/// Token verification seam used by the HTTP gateway.
pub trait JwtValidator: Send + Sync {
    /// Verify integrity and expiry of `token` as of `now`.
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError>;
}

/// HS256 verifier backed by `jsonwebtoken`.
///
/// Expiry is checked against the caller-supplied clock, not the system clock,
/// so verification is a pure function of (token, key, now).
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::TokenInvalidSignature,
                _ => AuthError::TokenMalformed,
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
