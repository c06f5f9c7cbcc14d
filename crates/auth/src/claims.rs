use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use innkeep_core::UserId;

use crate::{AuthError, Role};

/// Claims embedded in an Innkeep bearer token.
///
/// Serialized with the registered JWT names (`sub`, `iat`, `exp`); timestamps
/// are whole Unix seconds on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Account the token was issued to.
    pub sub: UserId,

    /// Role fixed at issuance; never re-derived per request.
    pub role: Role,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

/// Validate the time window of already-decoded claims.
///
/// Signature checks happen in [`crate::token`]; this only looks at the
/// timestamps so it can be driven with an explicit clock.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), AuthError> {
    if claims.expires_at <= claims.issued_at {
        return Err(AuthError::TokenMalformed);
    }
    if now >= claims.expires_at {
        return Err(AuthError::TokenExpired);
    }
    Ok(())
}
