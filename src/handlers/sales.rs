use super::common::{created_response, success_response, ValidatedJson};
use crate::{
    dto::{CreateSaleRequest, SaleView, SalesStatistics},
    errors::ServiceError,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

pub fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/statistics", get(sales_statistics))
        .route("/product/:product_id", get(list_product_sales))
}

#[utoipa::path(
    get,
    path = "/api/sales",
    responses(
        (status = 200, description = "All sales, most recent first", body = Vec<SaleView>)
    ),
    tag = "Sales"
)]
pub async fn list_sales(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.sales.list_all().await?))
}

#[utoipa::path(
    post,
    path = "/api/sales",
    request_body = CreateSaleRequest,
    responses(
        (status = 201, description = "Sale recorded and stock decremented", body = SaleView),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "No inventory for product", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "Sales"
)]
pub async fn create_sale(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateSaleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sale = state.sales.create_sale(payload).await?;
    Ok(created_response(sale))
}

#[utoipa::path(
    get,
    path = "/api/sales/statistics",
    responses(
        (status = 200, description = "Revenue and units, overall and per platform", body = SalesStatistics)
    ),
    tag = "Sales"
)]
pub async fn sales_statistics(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.sales.statistics().await?))
}

#[utoipa::path(
    get,
    path = "/api/sales/product/{product_id}",
    params(("product_id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Sales of one product", body = Vec<SaleView>)
    ),
    tag = "Sales"
)]
pub async fn list_product_sales(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.sales.list_by_product(product_id).await?))
}
