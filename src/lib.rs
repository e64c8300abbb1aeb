//! E-commerce admin backend.
//!
//! A catalog of products and categories, an inventory ledger that records
//! every stock change, a sales recorder that decrements stock atomically, and
//! reporting over both, exposed as a JSON API.

pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod queries;
pub mod services;
pub mod tracing;

use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use crate::{
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    services::{CatalogService, InventoryLedger, SalesRecorder},
};

/// Shared handles given to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub catalog: Arc<CatalogService>,
    pub ledger: Arc<InventoryLedger>,
    pub sales: Arc<SalesRecorder>,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(db.clone(), event_sender.clone())),
            ledger: Arc::new(InventoryLedger::new(db.clone(), event_sender.clone())),
            sales: Arc::new(SalesRecorder::new(db.clone(), event_sender)),
            db,
        }
    }
}

/// Routes mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", handlers::products::products_routes())
        .nest("/categories", handlers::categories::categories_routes())
        .nest("/inventory", handlers::inventory::inventory_routes())
        .nest("/sales", handlers::sales::sales_routes())
}

/// The full application: welcome and health routes, the API, Swagger UI,
/// request ids and HTTP tracing. CORS is left to the binary.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::welcome))
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api_routes())
        .merge(openapi::swagger_ui())
        .fallback(route_not_found)
        .layer(crate::tracing::configure_http_tracing())
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

async fn route_not_found() -> ServiceError {
    ServiceError::NotFound("No route matches this path".to_string())
}
