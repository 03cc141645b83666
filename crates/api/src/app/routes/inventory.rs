use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::{get, post},
};

use aidflow_core::ItemId;
use aidflow_infra::WorkflowResult;
use aidflow_inventory::{InventoryItem, ItemDraft, ItemPatch};

use crate::app::routes::body;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/low-stock", get(low_stock))
        .route("/:id", get(get_item).patch(update_item).delete(delete_item))
        .route("/:id/adjust", post(adjust_stock))
}

fn view(result: WorkflowResult<InventoryItem>) -> WorkflowResult<dto::InventoryItemView> {
    result.map(|i| dto::InventoryItemView::from(&i))
}

fn views(result: WorkflowResult<Vec<InventoryItem>>) -> WorkflowResult<Vec<dto::InventoryItemView>> {
    result.map(|all| all.iter().map(dto::InventoryItemView::from).collect())
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    errors::respond(StatusCode::OK, views(services.coordinator.list_items(principal.principal())))
}

pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    errors::respond(
        StatusCode::OK,
        views(services.coordinator.low_stock_items(principal.principal())),
    )
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let item_id: ItemId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    errors::respond(
        StatusCode::OK,
        view(services.coordinator.get_item(principal.principal(), item_id)),
    )
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<ItemDraft>, JsonRejection>,
) -> Response {
    let draft = match body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };
    errors::respond(
        StatusCode::CREATED,
        view(services.coordinator.create_item(principal.principal(), draft)),
    )
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<ItemPatch>, JsonRejection>,
) -> Response {
    let item_id: ItemId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let patch = match body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };
    errors::respond(
        StatusCode::OK,
        view(services.coordinator.update_item(principal.principal(), item_id, &patch)),
    )
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let item_id: ItemId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    errors::respond(
        StatusCode::OK,
        view(services.coordinator.delete_item(principal.principal(), item_id)),
    )
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<dto::AdjustStockBody>, JsonRejection>,
) -> Response {
    let item_id: ItemId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let adjust = match body(payload) {
        Ok(b) => b,
        Err(res) => return res,
    };
    errors::respond(
        StatusCode::OK,
        view(
            services
                .coordinator
                .adjust_item(principal.principal(), item_id, adjust.delta, &adjust.reason),
        ),
    )
}
