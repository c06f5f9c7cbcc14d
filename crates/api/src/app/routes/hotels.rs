//! Public catalogue.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    routing::get,
    Json, Router,
};

use innkeep_booking::{Hotel, HotelQuery};

use crate::app::dto::{self, ListResponse};
use crate::app::services::{AppServices, ServiceError};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_hotels))
        .route("/:id", get(get_hotel))
}

/// GET /api/hotels?city=&q=&max_rate=
pub async fn list_hotels(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<HotelQuery>,
) -> Json<ListResponse<Hotel>> {
    Json(services.hotels_search(&query).into())
}

/// GET /api/hotels/:id
pub async fn get_hotel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Hotel>, ServiceError> {
    let id = dto::parse_id(&id)?;
    Ok(Json(services.hotel(&id)?))
}
