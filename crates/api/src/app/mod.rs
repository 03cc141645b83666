//! HTTP API application wiring (axum router + service wiring).
//!
//! - `services.rs`: coordinator, change bus and the SSE bridge
//! - `routes/`: HTTP handlers, one file per resource
//! - `dto.rs`: camelCase request/response bodies
//! - `errors.rs`: status mapping and the `{success, data, error}` shape

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::jwt::Hs256JwtValidator;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(config.jwt_secret.clone().into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::build_services(config));

    // Protected routes: everything but /health needs a valid bearer token.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
