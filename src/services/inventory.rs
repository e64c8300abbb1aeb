//! Inventory Ledger.
//!
//! Owns the current stock level of every product and its append-only history.
//! Each quantity change is written together with exactly one history record
//! inside a single transaction.

use crate::{
    db::{transaction_scope, DbPool},
    dto::{HistoryAudit, InventoryView, UpdateInventoryRequest},
    entities::{inventory, inventory_history},
    errors::ServiceError,
    events::{Event, EventSender},
    queries::{InventoryHistoryQuery, LowStockQuery, Query},
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::catalog::product_views_by_id;

pub struct InventoryLedger {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl InventoryLedger {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// All inventory rows with their product and category
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<InventoryView>, ServiceError> {
        let db = self.db_pool.as_ref();
        let rows = inventory::Entity::find()
            .order_by_asc(inventory::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        inventory_views(db, rows).await
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, inventory_id: i32) -> Result<InventoryView, ServiceError> {
        let db = self.db_pool.as_ref();
        let row = inventory::Entity::find_by_id(inventory_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| inventory_not_found(inventory_id))?;

        self.with_history(row).await
    }

    /// The inventory row of a product, including its history
    #[instrument(skip(self))]
    pub async fn get_by_product(&self, product_id: i32) -> Result<InventoryView, ServiceError> {
        let row = find_by_product(self.db_pool.as_ref(), product_id).await?;
        self.with_history(row).await
    }

    #[instrument(skip(self))]
    pub async fn history(
        &self,
        inventory_id: i32,
    ) -> Result<Vec<inventory_history::Model>, ServiceError> {
        InventoryHistoryQuery { inventory_id }
            .execute(self.db_pool.as_ref())
            .await
    }

    /// Sets the absolute quantity of an inventory row.
    ///
    /// Negative targets are rejected with `ValidationError`.
    pub async fn set_quantity(
        &self,
        inventory_id: i32,
        new_quantity: i32,
    ) -> Result<InventoryView, ServiceError> {
        self.update(
            inventory_id,
            UpdateInventoryRequest {
                quantity: new_quantity,
                low_stock_threshold: None,
            },
        )
        .await
    }

    /// Applies a quantity change, and optionally a new threshold, to one row.
    ///
    /// The transaction opens with a write to the row, so concurrent sales and
    /// adjustments queue behind each other instead of failing. The history
    /// record is written before the quantity itself, both in the same
    /// transaction.
    #[instrument(skip(self, input), fields(quantity = input.quantity))]
    pub async fn update(
        &self,
        inventory_id: i32,
        input: UpdateInventoryRequest,
    ) -> Result<InventoryView, ServiceError> {
        if input.quantity < 0 {
            warn!(inventory_id, quantity = input.quantity, "Rejected negative stock level");
            return Err(ServiceError::ValidationError(format!(
                "Quantity must not be negative, got {}",
                input.quantity
            )));
        }
        input.validate()?;

        let db = self.db_pool.as_ref();
        let (before, after) = transaction_scope(db, move |txn| {
            Box::pin(async move {
                // Write first: takes the row lock on Postgres and the writer
                // lock on SQLite before anything is read
                let claimed = inventory::Entity::update_many()
                    .col_expr(inventory::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(inventory::Column::Id.eq(inventory_id))
                    .exec(txn)
                    .await?;
                if claimed.rows_affected == 0 {
                    return Err(inventory_not_found(inventory_id));
                }
                let now = Utc::now();

                let current = inventory::Entity::find_by_id(inventory_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| inventory_not_found(inventory_id))?;

                inventory_history::ActiveModel {
                    inventory_id: Set(current.id),
                    previous_quantity: Set(current.quantity),
                    new_quantity: Set(input.quantity),
                    timestamp: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                let mut active: inventory::ActiveModel = current.clone().into();
                active.quantity = Set(input.quantity);
                if let Some(threshold) = input.low_stock_threshold {
                    active.low_stock_threshold = Set(threshold);
                }
                active.updated_at = Set(now);
                let updated = active.update(txn).await?;

                Ok::<_, ServiceError>((current, updated))
            })
        })
        .await?;

        counter!("ecommerce_admin.inventory.adjusted", 1, "source" => "manual");
        info!(
            inventory_id,
            product_id = after.product_id,
            previous_quantity = before.quantity,
            new_quantity = after.quantity,
            "Inventory quantity set"
        );
        self.publish_adjustment(&before, &after).await;

        self.with_history(after).await
    }

    /// Same as [`InventoryLedger::update`], addressing the row by product
    pub async fn update_by_product(
        &self,
        product_id: i32,
        input: UpdateInventoryRequest,
    ) -> Result<InventoryView, ServiceError> {
        let row = find_by_product(self.db_pool.as_ref(), product_id).await?;
        self.update(row.id, input).await
    }

    /// Inventory rows at or below their low-stock threshold
    #[instrument(skip(self))]
    pub async fn list_low_stock(&self) -> Result<Vec<InventoryView>, ServiceError> {
        let db = self.db_pool.as_ref();
        let rows = LowStockQuery.execute(db).await?;
        inventory_views(db, rows).await
    }

    /// Replays the history of a row from zero and compares it with the
    /// stored quantity
    #[instrument(skip(self))]
    pub async fn audit(&self, inventory_id: i32) -> Result<HistoryAudit, ServiceError> {
        let db = self.db_pool.as_ref();
        let row = inventory::Entity::find_by_id(inventory_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| inventory_not_found(inventory_id))?;
        let history = InventoryHistoryQuery { inventory_id }.execute(db).await?;

        let audit = HistoryAudit::replay(&row, &history);
        if !audit.consistent {
            warn!(
                inventory_id,
                current_quantity = audit.current_quantity,
                replayed_quantity = audit.replayed_quantity,
                breaks = audit.breaks.len(),
                "Inventory history does not reconstruct the current quantity"
            );
        }
        Ok(audit)
    }

    async fn with_history(&self, row: inventory::Model) -> Result<InventoryView, ServiceError> {
        let db = self.db_pool.as_ref();
        let history = InventoryHistoryQuery {
            inventory_id: row.id,
        }
        .execute(db)
        .await?;

        let mut view = inventory_views(db, vec![row])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::InternalError("Inventory view missing".to_string()))?;
        view.history = Some(history);
        Ok(view)
    }

    async fn publish_adjustment(&self, before: &inventory::Model, after: &inventory::Model) {
        self.event_sender
            .send_or_log(Event::InventoryAdjusted {
                inventory_id: after.id,
                product_id: after.product_id,
                previous_quantity: before.quantity,
                new_quantity: after.quantity,
            })
            .await;

        if crossed_into_low_stock(before, after) {
            self.event_sender
                .send_or_log(Event::LowStockDetected {
                    inventory_id: after.id,
                    product_id: after.product_id,
                    quantity: after.quantity,
                    low_stock_threshold: after.low_stock_threshold,
                })
                .await;
        }
    }
}

/// True when `after` is low on stock and `before` was not
pub(crate) fn crossed_into_low_stock(before: &inventory::Model, after: &inventory::Model) -> bool {
    after.is_low_stock() && !before.is_low_stock()
}

pub(crate) fn inventory_not_found(inventory_id: i32) -> ServiceError {
    ServiceError::NotFound(format!("Inventory {} not found", inventory_id))
}

async fn find_by_product<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
) -> Result<inventory::Model, ServiceError> {
    inventory::Entity::find()
        .filter(inventory::Column::ProductId.eq(product_id))
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Inventory for product {} not found", product_id))
        })
}

/// Joins inventory rows with their product and category
async fn inventory_views<C: ConnectionTrait>(
    db: &C,
    rows: Vec<inventory::Model>,
) -> Result<Vec<InventoryView>, ServiceError> {
    let mut products = product_views_by_id(db, rows.iter().map(|r| r.product_id)).await?;

    Ok(rows
        .into_iter()
        .map(|row| InventoryView {
            product: products.remove(&row.product_id),
            inventory: row,
            history: None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(quantity: i32, threshold: i32) -> inventory::Model {
        inventory::Model {
            id: 1,
            product_id: 1,
            quantity,
            low_stock_threshold: threshold,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_includes_the_threshold_itself() {
        assert!(stock(5, 5).is_low_stock());
        assert!(stock(0, 0).is_low_stock());
        assert!(!stock(6, 5).is_low_stock());
    }

    #[test]
    fn crossing_is_reported_once() {
        assert!(crossed_into_low_stock(&stock(10, 5), &stock(5, 5)));
        assert!(!crossed_into_low_stock(&stock(4, 5), &stock(3, 5)));
        assert!(!crossed_into_low_stock(&stock(10, 5), &stock(8, 5)));
    }
}
