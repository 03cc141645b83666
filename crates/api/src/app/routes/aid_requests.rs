use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::{get, patch},
};

use aidflow_core::RequestId;

use crate::app::routes::body;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_requests).post(create_request))
        .route("/:id", get(get_request))
        .route("/:id/status", patch(set_status))
}

pub async fn create_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<dto::CreateAidRequestBody>, JsonRejection>,
) -> Response {
    let payload = match body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };
    let new = payload.into_new_request(principal.user_id());

    let result = services
        .coordinator
        .create_request(principal.principal(), new)
        .map(|r| dto::AidRequestView::from(&r));
    errors::respond(StatusCode::CREATED, result)
}

pub async fn list_requests(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    let result = services
        .coordinator
        .list_requests(principal.principal())
        .map(|all| all.iter().map(dto::AidRequestView::from).collect::<Vec<_>>());
    errors::respond(StatusCode::OK, result)
}

pub async fn get_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let request_id: RequestId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let result = services
        .coordinator
        .get_request(principal.principal(), request_id)
        .map(|r| dto::AidRequestView::from(&r));
    errors::respond(StatusCode::OK, result)
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<dto::RequestStatusBody>, JsonRejection>,
) -> Response {
    let request_id: RequestId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let payload = match body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };

    let result = services
        .coordinator
        .set_request_status(principal.principal(), request_id, payload.status)
        .map(|r| dto::AidRequestView::from(&r));
    errors::respond(StatusCode::OK, result)
}
