use crate::{
    entities::{inventory, inventory_history},
    errors::ServiceError,
};
use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use super::Query;

/// Inventory rows whose quantity is at or below their own threshold
#[derive(Debug, Default)]
pub struct LowStockQuery;

#[async_trait]
impl Query for LowStockQuery {
    type Result = Vec<inventory::Model>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        inventory::Entity::find()
            .filter(
                Expr::col((inventory::Entity, inventory::Column::Quantity)).lte(Expr::col((
                    inventory::Entity,
                    inventory::Column::LowStockThreshold,
                ))),
            )
            .order_by_asc(inventory::Column::Quantity)
            .order_by_asc(inventory::Column::Id)
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}

/// History of one inventory row in chronological order
#[derive(Debug)]
pub struct InventoryHistoryQuery {
    pub inventory_id: i32,
}

#[async_trait]
impl Query for InventoryHistoryQuery {
    type Result = Vec<inventory_history::Model>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        inventory_history::Entity::find()
            .filter(inventory_history::Column::InventoryId.eq(self.inventory_id))
            .order_by_asc(inventory_history::Column::Timestamp)
            .order_by_asc(inventory_history::Column::Id)
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}
