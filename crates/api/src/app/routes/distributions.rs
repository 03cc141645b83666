use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::get,
};

use aidflow_core::DistributionId;
use aidflow_infra::WorkflowResult;
use aidflow_distributions::Distribution;

use crate::app::routes::body;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_distributions).post(create_distribution))
        .route("/:id", get(get_distribution).patch(patch_distribution))
}

fn view(result: WorkflowResult<Distribution>) -> WorkflowResult<dto::DistributionView> {
    result.map(|d| dto::DistributionView::from(&d))
}

pub async fn create_distribution(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<dto::CreateDistributionBody>, JsonRejection>,
) -> Response {
    let payload = match body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };

    let result = services
        .coordinator
        .create_distribution(principal.principal(), payload.into());
    errors::respond(StatusCode::CREATED, view(result))
}

pub async fn list_distributions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    let result = services
        .coordinator
        .list_distributions(principal.principal())
        .map(|all| all.iter().map(dto::DistributionView::from).collect::<Vec<_>>());
    errors::respond(StatusCode::OK, result)
}

pub async fn get_distribution(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let distribution_id: DistributionId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let result = services
        .coordinator
        .get_distribution(principal.principal(), distribution_id);
    errors::respond(StatusCode::OK, view(result))
}

/// `{status}` advances (or cancels), `{assigneeId}` reassigns. Both may be sent; assignment goes first.
pub async fn patch_distribution(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<dto::PatchDistributionBody>, JsonRejection>,
) -> Response {
    let distribution_id: DistributionId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let payload = match body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };

    let coordinator = &services.coordinator;
    let principal = principal.principal();

    let mut result = None;
    if let Some(assignee_id) = payload.assignee_id {
        let assigned = coordinator.assign(principal, distribution_id, assignee_id);
        if assigned.is_err() {
            return errors::respond(StatusCode::OK, view(assigned));
        }
        result = Some(assigned);
    }
    if let Some(status) = payload.status {
        result = Some(coordinator.advance_status(principal, distribution_id, status));
    }

    match result {
        Some(result) => errors::respond(StatusCode::OK, view(result)),
        None => errors::json_error(
            StatusCode::BAD_REQUEST,
            "ValidationError",
            "expected 'status' or 'assigneeId'",
        ),
    }
}
