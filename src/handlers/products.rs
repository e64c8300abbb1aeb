use super::common::{created_response, no_content_response, success_response, ValidatedJson};
use crate::{
    dto::{CreateProductRequest, ProductView, UpdateProductRequest},
    errors::ServiceError,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "All products with category and stock", body = Vec<ProductView>),
        (status = 500, description = "Store failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let products = state.catalog.list_products().await?;
    Ok(success_response(products))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product retrieved", body = ProductView),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.catalog.get_product(id).await?;
    Ok(success_response(product))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductView),
        (status = 400, description = "Invalid payload or unknown category", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.catalog.create_product(payload).await?;
    Ok(created_response(product))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductView),
        (status = 400, description = "Invalid payload or unknown category", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.catalog.update_product(id, payload).await?;
    Ok(success_response(product))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product still has stock or sales", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.catalog.delete_product(id).await?;
    Ok(no_content_response())
}
