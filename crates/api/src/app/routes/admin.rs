//! Back-office CRUD for hotels, bookings and users.
//!
//! The whole `/api/admin` prefix is gated on the `admin` role by the access
//! policy; handlers here do no role checks of their own.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};

use innkeep_auth::Role;
use innkeep_booking::{Booking, Hotel, HotelDraft, HotelPatch, HotelQuery};
use innkeep_core::{DomainError, UserId};

use crate::app::dto::{self, CreateUserRequest, ListResponse, UserResponse};
use crate::app::routes::blocking;
use crate::app::services::{AppServices, ServiceError};
use crate::context::PrincipalContext;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/hotels", get(list_hotels).post(create_hotel))
        .route("/hotels/:id", put(update_hotel).delete(delete_hotel))
        .route("/bookings", get(list_bookings))
        .route("/bookings/:id/cancel", post(cancel_booking))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", delete(delete_user))
}

// ─────────────────────────────────────────────────────────────────────────────
// Hotels
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/admin/hotels
pub async fn list_hotels(Extension(services): Extension<Arc<AppServices>>) -> Json<ListResponse<Hotel>> {
    Json(services.hotels_search(&HotelQuery::default()).into())
}

/// POST /api/admin/hotels
pub async fn create_hotel(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<HotelDraft>,
) -> Result<impl IntoResponse, ServiceError> {
    let hotel = services.hotel_create(body)?;
    Ok((StatusCode::CREATED, Json(hotel)))
}

/// PUT /api/admin/hotels/:id - partial update
pub async fn update_hotel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<HotelPatch>,
) -> Result<Json<Hotel>, ServiceError> {
    let id = dto::parse_id(&id)?;
    Ok(Json(services.hotel_update(&id, body)?))
}

/// DELETE /api/admin/hotels/:id
pub async fn delete_hotel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    let id = dto::parse_id(&id)?;
    services.hotel_delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Bookings
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/admin/bookings
pub async fn list_bookings(Extension(services): Extension<Arc<AppServices>>) -> Json<ListResponse<Booking>> {
    Json(services.bookings_all().into())
}

/// POST /api/admin/bookings/:id/cancel - cancel any guest's booking
pub async fn cancel_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ServiceError> {
    let id = dto::parse_id(&id)?;
    Ok(Json(services.cancel_booking(&id, None)?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/admin/users
pub async fn list_users(Extension(services): Extension<Arc<AppServices>>) -> Json<ListResponse<UserResponse>> {
    let users: Vec<UserResponse> = services.users().into_iter().map(UserResponse::from).collect();
    Json(users.into())
}

/// POST /api/admin/users - provision an account with any role
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let account = blocking(services, move |s| {
        s.provision_account(&body.identifier, &body.password, &body.display_name, Role::new(body.role))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(account))))
}

/// DELETE /api/admin/users/:id
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    let id: UserId = dto::parse_id(&id)?;
    if id == principal.subject() {
        return Err(DomainError::conflict("administrators cannot delete their own account").into());
    }
    services.delete_user(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
