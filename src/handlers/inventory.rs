use super::common::{success_response, ValidatedJson};
use crate::{
    dto::{HistoryAudit, InventoryView, UpdateInventoryRequest},
    errors::ServiceError,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory))
        .route("/low-stock", get(list_low_stock))
        .route("/:id", get(get_inventory).put(update_inventory))
        .route("/:id/audit", get(audit_inventory))
        .route(
            "/product/:product_id",
            get(get_product_inventory).put(update_product_inventory),
        )
}

#[utoipa::path(
    get,
    path = "/api/inventory",
    responses(
        (status = 200, description = "All inventory rows", body = Vec<InventoryView>),
        (status = 500, description = "Store failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn list_inventory(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.ledger.get_all().await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/low-stock",
    responses(
        (status = 200, description = "Rows at or below their threshold", body = Vec<InventoryView>)
    ),
    tag = "Inventory"
)]
pub async fn list_low_stock(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.ledger.list_low_stock().await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/{id}",
    params(("id" = i32, Path, description = "Inventory ID")),
    responses(
        (status = 200, description = "Inventory row with history", body = InventoryView),
        (status = 404, description = "Inventory not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.ledger.get_by_id(id).await?))
}

#[utoipa::path(
    put,
    path = "/api/inventory/{id}",
    params(("id" = i32, Path, description = "Inventory ID")),
    request_body = UpdateInventoryRequest,
    responses(
        (status = 200, description = "Quantity set", body = InventoryView),
        (status = 400, description = "Negative quantity or invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Inventory not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn update_inventory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateInventoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.ledger.update(id, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/product/{product_id}",
    params(("product_id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Inventory row with history", body = InventoryView),
        (status = 404, description = "No inventory for product", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn get_product_inventory(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.ledger.get_by_product(product_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/inventory/product/{product_id}",
    params(("product_id" = i32, Path, description = "Product ID")),
    request_body = UpdateInventoryRequest,
    responses(
        (status = 200, description = "Quantity set", body = InventoryView),
        (status = 400, description = "Negative quantity or invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "No inventory for product", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn update_product_inventory(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateInventoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(
        state.ledger.update_by_product(product_id, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/inventory/{id}/audit",
    params(("id" = i32, Path, description = "Inventory ID")),
    responses(
        (status = 200, description = "History replay result", body = HistoryAudit),
        (status = 404, description = "Inventory not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn audit_inventory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.ledger.audit(id).await?))
}
