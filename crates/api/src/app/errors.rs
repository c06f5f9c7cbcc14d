//! Consistent JSON error responses: `{"error": <message>}`.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use innkeep_auth::AuthError;
use innkeep_core::DomainError;

use crate::app::services::ServiceError;

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "error": message.into() }))).into_response()
}

/// Map an auth failure to its HTTP form.
///
/// A malformed token and a forged one look the same to the caller, and
/// login never says which half was wrong.
pub fn auth_error_to_response(err: &AuthError) -> Response {
    let (status, message) = match err {
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid credentials"),
        AuthError::TokenMalformed | AuthError::TokenInvalidSignature => {
            (StatusCode::UNAUTHORIZED, "invalid token")
        }
        AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "token expired"),
        AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "authentication required"),
        AuthError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        AuthError::Internal(detail) => {
            tracing::error!(%detail, "auth internal failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    };

    let mut response = json_error(status, message);
    if status == StatusCode::UNAUTHORIZED {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    response
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, msg),
        DomainError::InvariantViolation(msg) => json_error(StatusCode::UNPROCESSABLE_ENTITY, msg),
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::Domain(e) => domain_error_to_response(e),
            ServiceError::Auth(e) => auth_error_to_response(&e),
            ServiceError::Internal(detail) => {
                tracing::error!(%detail, "request failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}
