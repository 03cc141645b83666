use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, sse::Event as SseEvent},
};

use aidflow_auth::allowed_operations;

use crate::app::services::{self, AppServices};
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    let operations: serde_json::Map<String, serde_json::Value> = allowed_operations(principal.role())
        .into_iter()
        .map(|(op, grant)| (op.as_str().to_string(), serde_json::json!(grant)))
        .collect();

    Json(serde_json::json!({
        "userId": principal.user_id().to_string(),
        "role": principal.role().as_str(),
        "allowedOperations": operations,
    }))
}

pub async fn stream(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Sse<impl tokio_stream::Stream<Item = Result<SseEvent, std::convert::Infallible>>> {
    services::sse_stream(services)
}
