//! Guest bookings. Every route here sits behind an "authenticated" rule.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use innkeep_booking::{Booking, BookingRequest};

use crate::app::dto::{self, ListResponse};
use crate::app::services::{AppServices, ServiceError};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_booking).get(list_my_bookings))
        .route("/:id/cancel", post(cancel_my_booking))
}

/// POST /api/bookings
pub async fn create_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<BookingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let booking = services.reserve(principal.subject(), &body)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/bookings - the caller's bookings
pub async fn list_my_bookings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Json<ListResponse<Booking>> {
    Json(services.bookings_for(&principal.subject()).into())
}

/// POST /api/bookings/:id/cancel
pub async fn cancel_my_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ServiceError> {
    let id = dto::parse_id(&id)?;
    Ok(Json(services.cancel_booking(&id, Some(&principal.subject()))?))
}
