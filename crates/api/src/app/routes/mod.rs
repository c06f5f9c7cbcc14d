use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::app::services::{AppServices, ServiceError, ServiceResult};

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod hotels;
pub mod system;

/// Router for everything under `/api`. Access rules are enforced by the
/// gateway in front of it, not here.
pub fn router() -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/hotels", hotels::router())
        .nest("/bookings", bookings::router())
        .route("/me", get(system::whoami))
        .route("/me/password", post(auth::change_password))
        .nest("/admin", admin::router())
}

/// Run CPU-heavy service work (bcrypt) on the blocking pool.
pub(crate) async fn blocking<T, F>(services: Arc<AppServices>, f: F) -> ServiceResult<T>
where
    T: Send + 'static,
    F: FnOnce(&AppServices) -> ServiceResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&services))
        .await
        .map_err(|e| ServiceError::Internal(format!("blocking task failed: {e}")))?
}
