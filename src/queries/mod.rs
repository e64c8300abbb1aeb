//! Read-only reporting queries.

pub mod inventory_queries;
pub mod sales_queries;

use crate::errors::ServiceError;
use async_trait::async_trait;
use sea_orm::DatabaseConnection;

#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}

pub use inventory_queries::{InventoryHistoryQuery, LowStockQuery};
pub use sales_queries::{SalesByProductQuery, SalesStatisticsQuery};
