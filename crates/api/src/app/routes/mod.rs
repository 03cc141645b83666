use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::Response,
    routing::get,
};

use crate::app::errors;

pub mod aid_requests;
pub mod distributions;
pub mod inventory;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stream", get(system::stream))
        .nest("/aid-requests", aid_requests::router())
        .nest("/distributions", distributions::router())
        .nest("/inventory", inventory::router())
}

/// Unwrap a JSON body, answering malformed input in the standard error shape.
pub(crate) fn body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    body.map(|Json(b)| b)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "ValidationError", e.body_text()))
}
