//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: owned stores and the authenticator
//! - `routes/`: HTTP handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use innkeep_auth::AccessPolicy;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
///
/// The gateway wraps every route; which ones need a token is decided by the
/// access policy built from `config.access_rules`.
pub fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let policy = Arc::new(AccessPolicy::new(config.access_rules.clone())?);
    let gateway = middleware::GatewayState {
        jwt: Arc::new(config.jwt_secret.validator()),
        policy,
    };

    let services = Arc::new(services::AppServices::new(config)?);

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(gateway, middleware::gateway))
                .layer(Extension(services)),
        ))
}
