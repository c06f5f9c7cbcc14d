use thiserror::Error;

use crate::Role;

/// Every way an authentication or authorization step can fail.
///
/// All variants are terminal for the request that produced them; nothing in
/// this crate retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown identifier or wrong secret (indistinguishable to the caller).
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token is malformed")]
    TokenMalformed,

    #[error("token signature is invalid")]
    TokenInvalidSignature,

    #[error("token has expired")]
    TokenExpired,

    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: role '{0}' required")]
    Forbidden(Role),

    /// Hashing or signing failed; not caused by the caller.
    #[error("internal auth failure: {0}")]
    Internal(String),
}

impl AuthError {
    /// True for failures raised while verifying a presented token.
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            AuthError::TokenMalformed | AuthError::TokenInvalidSignature | AuthError::TokenExpired
        )
    }

    /// Stable snake_case name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::TokenMalformed => "token_malformed",
            AuthError::TokenInvalidSignature => "token_invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Forbidden(_) => "forbidden",
            AuthError::Internal(_) => "internal",
        }
    }
}
