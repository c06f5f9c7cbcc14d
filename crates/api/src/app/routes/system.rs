use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, Json};

use crate::app::dto::UserResponse;
use crate::app::services::{AppServices, ServiceError};
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /api/me - the caller's account
pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Json<UserResponse>, ServiceError> {
    let account = services.account(&principal.subject())?;
    Ok(Json(account.into()))
}
