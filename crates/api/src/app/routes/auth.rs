//! Login, sign-up and password change.
//!
//! Hashing work runs on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::app::dto::{ChangePasswordRequest, LoginRequest, RegisterRequest, TokenResponse, UserResponse};
use crate::app::routes::blocking;
use crate::app::services::{AppServices, ServiceError};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}

/// POST /api/auth/login - exchange credentials for a bearer token
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ServiceError> {
    let issued = blocking(services, move |s| s.login(&body.identifier, &body.password)).await?;
    Ok(Json(issued.into()))
}

/// POST /api/auth/register - create an ordinary guest account
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let account = blocking(services, move |s| {
        s.register(&body.email, &body.password, &body.display_name)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(account))))
}

/// POST /api/me/password - change the caller's password
pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ServiceError> {
    let subject = principal.subject();
    blocking(services, move |s| {
        s.change_password(&subject, &body.current_password, &body.new_password)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
