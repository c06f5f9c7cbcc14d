//! Request/response DTOs and JSON mapping helpers.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use innkeep_auth::{Credential, IssuedToken};
use innkeep_core::{DomainError, UserId};

use crate::app::services::ServiceError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub identifier: String,
    pub password: String,
    #[serde(default)]
    pub display_name: String,
    pub role: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub subject_id: UserId,
    pub role: String,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            token_type: "Bearer",
            expires_at: issued.claims.expires_at,
            subject_id: issued.claims.sub,
            role: issued.claims.role.to_string(),
        }
    }
}

/// Account view without the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub identifier: String,
    pub display_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<Credential> for UserResponse {
    fn from(c: Credential) -> Self {
        Self {
            id: c.subject,
            identifier: c.identifier,
            display_name: c.display_name,
            role: c.role.to_string(),
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

/// Parse a path identifier (`HotelId`, `BookingId`, `UserId`).
pub fn parse_id<T>(raw: &str) -> Result<T, ServiceError>
where
    T: FromStr<Err = DomainError>,
{
    Ok(raw.parse::<T>()?)
}
