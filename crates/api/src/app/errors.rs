use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use aidflow_core::DomainError;
use aidflow_infra::{OperationResult, StoreError, WorkflowError, WorkflowResult};

pub fn status_for(err: &WorkflowError) -> StatusCode {
    match err {
        WorkflowError::Domain(e) => match e {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::IllegalTransition { .. } => StatusCode::CONFLICT,
            DomainError::InsufficientInventory(_) => StatusCode::CONFLICT,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Permission(_) => StatusCode::FORBIDDEN,
            DomainError::ConcurrencyConflict(_) => StatusCode::CONFLICT,
        },
        WorkflowError::Store(StoreError::Concurrency(_)) => StatusCode::CONFLICT,
        WorkflowError::Store(StoreError::Unavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn workflow_error_to_response(err: WorkflowError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    (status, Json(OperationResult::<()>::failed(&err))).into_response()
}

/// Render a workflow outcome as `{success, data}` with `success_status`, or as the mapped error.
pub fn respond<T: Serialize>(success_status: StatusCode, result: WorkflowResult<T>) -> Response {
    match result {
        Ok(data) => (success_status, Json(OperationResult::ok(data))).into_response(),
        Err(err) => workflow_error_to_response(err),
    }
}

/// Error body for failures caught before the workflow core (bad ids, bad bodies).
pub fn json_error(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": { "kind": kind, "message": message.into() },
        })),
    )
        .into_response()
}

/// Parse a path id, answering `400 ValidationError` on garbage.
pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.parse::<T>()
        .map_err(|e| workflow_error_to_response(WorkflowError::Domain(e)))
}

#[cfg(test)]
mod tests {
    use aidflow_core::{ItemId, Shortage};

    use super::*;

    #[test]
    fn transitions_and_shortages_conflict_validation_is_bad_request() {
        let transition = WorkflowError::from(DomainError::illegal_transition("pending", "delivered"));
        let shortage = WorkflowError::from(DomainError::InsufficientInventory(vec![Shortage {
            item_id: ItemId::new(),
            requested: 3,
            available: 1,
        }]));

        assert_eq!(status_for(&transition), StatusCode::CONFLICT);
        assert_eq!(status_for(&shortage), StatusCode::CONFLICT);
        assert_eq!(status_for(&DomainError::validation("x").into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&DomainError::not_found("item").into()), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&DomainError::permission("no").into()), StatusCode::FORBIDDEN);
    }

    #[test]
    fn store_failures_split_into_conflict_and_server_error() {
        assert_eq!(status_for(&StoreError::Concurrency("v1".into()).into()), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&StoreError::Unavailable("disk".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_ids_are_rejected_as_validation() {
        let res = parse_id::<ItemId>("nope").unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
