use super::common::success_response;
use crate::{entities::category, errors::ServiceError, AppState};
use axum::{extract::State, response::IntoResponse, routing::get, Router};

pub fn categories_routes() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories", body = Vec<category::Model>),
        (status = 500, description = "Store failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.catalog.list_categories().await?;
    Ok(success_response(categories))
}
