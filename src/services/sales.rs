//! Sales Recorder.
//!
//! Recording a sale decrements the product's stock and appends a history
//! record in the same transaction. The decrement is a single guarded
//! `UPDATE ... WHERE quantity >= requested`, issued before anything else in
//! the transaction, so the row lock is held from the first statement and two
//! concurrent sales can never both take the last unit.

use crate::{
    db::{transaction_scope, DbPool},
    dto::{CreateSaleRequest, SaleView, SalesStatistics},
    entities::{inventory, inventory_history, sale},
    errors::ServiceError,
    events::{Event, EventSender},
    queries::{Query, SalesByProductQuery, SalesStatisticsQuery},
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
use super::inventory::crossed_into_low_stock;

pub struct SalesRecorder {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

/// Everything a committed sale changed
struct RecordedSale {
    sale: sale::Model,
    before: inventory::Model,
    after: inventory::Model,
}

impl SalesRecorder {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records a sale and takes its quantity out of stock.
    ///
    /// Fails with `NotFound` when the product has no inventory row and with
    /// `InsufficientStock` when fewer units are available than requested.
    /// A failed sale leaves no sale row and no history row behind.
    #[instrument(
        skip(self, input),
        fields(product_id = input.product_id, quantity = input.quantity, platform = %input.platform)
    )]
    pub async fn create_sale(&self, input: CreateSaleRequest) -> Result<SaleView, ServiceError> {
        if let Err(e) = input.validate() {
            counter!("ecommerce_admin.sales.rejected", 1, "reason" => "validation");
            return Err(e.into());
        }

        let db = self.db_pool.as_ref();
        let product_id = input.product_id;
        let quantity = input.quantity;
        let platform = input.platform.trim().to_string();
        let sale_date = input.sale_date;
        let total_price = input.total_price;

        let result = transaction_scope(db, move |txn| {
            Box::pin(async move {
                let decremented = inventory::Entity::update_many()
                    .col_expr(
                        inventory::Column::Quantity,
                        Expr::col(inventory::Column::Quantity).sub(quantity),
                    )
                    .col_expr(inventory::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(inventory::Column::ProductId.eq(product_id))
                    .filter(inventory::Column::Quantity.gte(quantity))
                    .exec(txn)
                    .await?;
                // Taken while the row lock is held, so history order follows lock order
                let recorded_at = Utc::now();

                let after = inventory::Entity::find()
                    .filter(inventory::Column::ProductId.eq(product_id))
                    .one(txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Inventory for product {} not found",
                            product_id
                        ))
                    })?;

                if decremented.rows_affected == 0 {
                    return Err(ServiceError::InsufficientStock(format!(
                        "product {} has {} units, {} requested",
                        product_id, after.quantity, quantity
                    )));
                }

                let before = inventory::Model {
                    quantity: after.quantity + quantity,
                    ..after.clone()
                };

                let sale = sale::ActiveModel {
                    product_id: Set(product_id),
                    quantity: Set(quantity),
                    total_price: Set(total_price),
                    platform: Set(platform),
                    sale_date: Set(sale_date.unwrap_or(recorded_at)),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                inventory_history::ActiveModel {
                    inventory_id: Set(after.id),
                    previous_quantity: Set(before.quantity),
                    new_quantity: Set(after.quantity),
                    timestamp: Set(recorded_at),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                Ok::<_, ServiceError>(RecordedSale {
                    sale,
                    before,
                    after,
                })
            })
        })
        .await;

        let recorded = match result {
            Ok(recorded) => recorded,
            Err(e) => {
                match &e {
                    ServiceError::InsufficientStock(_) => {
                        counter!("ecommerce_admin.sales.rejected", 1, "reason" => "insufficient_stock");
                        warn!(error = %e, "Sale rejected");
                    }
                    ServiceError::NotFound(_) => {
                        counter!("ecommerce_admin.sales.rejected", 1, "reason" => "not_found");
                        warn!(error = %e, "Sale rejected");
                    }
                    _ => {}
                }
                return Err(e);
            }
        };

        counter!("ecommerce_admin.sales.recorded", 1, "platform" => recorded.sale.platform.clone());
        counter!("ecommerce_admin.inventory.adjusted", 1, "source" => "sale");
        info!(
            sale_id = recorded.sale.id,
            previous_quantity = recorded.before.quantity,
            new_quantity = recorded.after.quantity,
            "Sale recorded"
        );

        self.publish(&recorded).await;

        let mut views = sale_views(db, vec![recorded.sale]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::InternalError("Sale view missing".to_string()))
    }

    /// Every sale, most recent first
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<SaleView>, ServiceError> {
        let db = self.db_pool.as_ref();
        let sales = sale::Entity::find()
            .order_by_desc(sale::Column::SaleDate)
            .order_by_desc(sale::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        sale_views(db, sales).await
    }

    #[instrument(skip(self))]
    pub async fn list_by_product(&self, product_id: i32) -> Result<Vec<SaleView>, ServiceError> {
        let db = self.db_pool.as_ref();
        let sales = SalesByProductQuery { product_id }.execute(db).await?;
        sale_views(db, sales).await
    }

    #[instrument(skip(self))]
    pub async fn statistics(&self) -> Result<SalesStatistics, ServiceError> {
        SalesStatisticsQuery.execute(self.db_pool.as_ref()).await
    }

    async fn publish(&self, recorded: &RecordedSale) {
        let sale = &recorded.sale;
        self.event_sender
            .send_or_log(Event::SaleRecorded {
                sale_id: sale.id,
                product_id: sale.product_id,
                quantity: sale.quantity,
                total_price: sale.total_price,
                platform: sale.platform.clone(),
                sale_date: sale.sale_date,
            })
            .await;

        self.event_sender
            .send_or_log(Event::InventoryAdjusted {
                inventory_id: recorded.after.id,
                product_id: recorded.after.product_id,
                previous_quantity: recorded.before.quantity,
                new_quantity: recorded.after.quantity,
            })
            .await;

        if crossed_into_low_stock(&recorded.before, &recorded.after) {
            self.event_sender
                .send_or_log(Event::LowStockDetected {
                    inventory_id: recorded.after.id,
                    product_id: recorded.after.product_id,
                    quantity: recorded.after.quantity,
                    low_stock_threshold: recorded.after.low_stock_threshold,
                })
                .await;
        }
    }
}

async fn sale_views<C: ConnectionTrait>(
    db: &C,
    sales: Vec<sale::Model>,
) -> Result<Vec<SaleView>, ServiceError> {
    let products = product_views_by_id(db, sales.iter().map(|s| s.product_id)).await?;

    Ok(sales
        .into_iter()
        .map(|sale| SaleView {
            product: products.get(&sale.product_id).cloned(),
            sale,
        })
        .collect())
}
