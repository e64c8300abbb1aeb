use crate::{
    db::{transaction_scope, DbPool},
    dto::{normalize_optional, CreateProductRequest, ProductView, UpdateProductRequest},
    entities::{category, inventory, inventory_history, product, sale},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Categories and products
pub struct CatalogService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Creates a category. A name already in use is a conflict.
    #[instrument(skip(self, description))]
    pub async fn create_category(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<category::Model, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name must not be blank".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();
        let existing = category::Entity::find()
            .filter(category::Column::Name.eq(name))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }

        let created = category::ActiveModel {
            name: Set(name.to_string()),
            description: Set(normalize_optional(description)),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;

        info!(category_id = created.id, "Category created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductView>, ServiceError> {
        let db = self.db_pool.as_ref();
        let products = product::Entity::find()
            .order_by_asc(product::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        product_views(db, products, true).await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i32) -> Result<ProductView, ServiceError> {
        let db = self.db_pool.as_ref();
        let product = find_product(db, id).await?;

        into_single(product_views(db, vec![product], true).await?, id)
    }

    /// Creates a product, and its inventory row when opening stock is given.
    ///
    /// Opening stock is recorded as a `0 -> quantity` history entry so the
    /// history of every inventory row starts from zero.
    #[instrument(skip(self, input), fields(name = %input.name, category_id = input.category_id))]
    pub async fn create_product(
        &self,
        input: CreateProductRequest,
    ) -> Result<ProductView, ServiceError> {
        input.validate()?;

        let db = self.db_pool.as_ref();
        ensure_category_exists(db, input.category_id).await?;

        let now = Utc::now();
        let created = transaction_scope(db, move |txn| {
            Box::pin(async move {
                let created = product::ActiveModel {
                    name: Set(input.name.trim().to_string()),
                    description: Set(normalize_optional(input.description)),
                    price: Set(input.price),
                    category_id: Set(input.category_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                if let Some(stock) = input.initial_stock {
                    let stock_row = inventory::ActiveModel {
                        product_id: Set(created.id),
                        quantity: Set(stock.quantity),
                        low_stock_threshold: Set(stock.low_stock_threshold),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    inventory_history::ActiveModel {
                        inventory_id: Set(stock_row.id),
                        previous_quantity: Set(0),
                        new_quantity: Set(stock.quantity),
                        timestamp: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                }

                Ok::<_, ServiceError>(created)
            })
        })
        .await?;

        info!(product_id = created.id, "Product created");
        self.event_sender
            .send_or_log(Event::ProductCreated {
                product_id: created.id,
                category_id: created.category_id,
            })
            .await;

        into_single(product_views(db, vec![created.clone()], true).await?, created.id)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: i32,
        input: UpdateProductRequest,
    ) -> Result<ProductView, ServiceError> {
        input.validate()?;

        let db = self.db_pool.as_ref();
        let existing = find_product(db, id).await?;

        if input.is_empty() {
            return into_single(product_views(db, vec![existing], true).await?, id);
        }

        if let Some(category_id) = input.category_id {
            ensure_category_exists(db, category_id).await?;
        }

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if input.description.is_some() {
            active.description = Set(normalize_optional(input.description));
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(product_id = id, "Product updated");
        self.event_sender
            .send_or_log(Event::ProductUpdated { product_id: id })
            .await;

        into_single(product_views(db, vec![updated], true).await?, id)
    }

    /// Deletes a product that has no stock record and no sales.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> Result<(), ServiceError> {
        transaction_scope(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                // Claim the row before the reference checks
                product::Entity::update_many()
                    .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(product::Column::Id.eq(id))
                    .exec(txn)
                    .await?;
                let product = find_product(txn, id).await?;

                let stock = product.find_related(inventory::Entity).one(txn).await?;
                if stock.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "Product {} still has an inventory record",
                        id
                    )));
                }

                let sales = product.find_related(sale::Entity).count(txn).await?;
                if sales > 0 {
                    return Err(ServiceError::Conflict(format!(
                        "Product {} has {} recorded sales",
                        id, sales
                    )));
                }

                product.delete(txn).await?;
                Ok(())
            })
        })
        .await
        .map_err(|e| {
            if matches!(e, ServiceError::Conflict(_)) {
                warn!(product_id = id, error = %e, "Product deletion refused");
            }
            e
        })?;

        info!(product_id = id, "Product deleted");
        self.event_sender
            .send_or_log(Event::ProductDeleted { product_id: id })
            .await;

        Ok(())
    }
}

async fn find_product<C: ConnectionTrait>(db: &C, id: i32) -> Result<product::Model, ServiceError> {
    product::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
}

async fn ensure_category_exists<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), ServiceError> {
    let found = category::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?;

    match found {
        Some(_) => Ok(()),
        None => Err(ServiceError::ValidationError(format!(
            "Category {} does not exist",
            id
        ))),
    }
}

fn into_single(views: Vec<ProductView>, id: i32) -> Result<ProductView, ServiceError> {
    views
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
}

/// Joins products with their categories, and optionally their inventory rows,
/// preserving the input order.
pub(crate) async fn product_views<C: ConnectionTrait>(
    db: &C,
    products: Vec<product::Model>,
    with_inventory: bool,
) -> Result<Vec<ProductView>, ServiceError> {
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let mut category_ids: Vec<i32> = products.iter().map(|p| p.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();

    let categories: HashMap<i32, category::Model> = category::Entity::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(db)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut stock: HashMap<i32, inventory::Model> = if with_inventory {
        inventory::Entity::find()
            .filter(inventory::Column::ProductId.is_in(products.iter().map(|p| p.id)))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|i| (i.product_id, i))
            .collect()
    } else {
        HashMap::new()
    };

    Ok(products
        .into_iter()
        .map(|product| ProductView {
            category: categories.get(&product.category_id).cloned(),
            inventory: stock.remove(&product.id),
            product,
        })
        .collect())
}

/// Looks up product views keyed by product id
pub(crate) async fn product_views_by_id<C: ConnectionTrait>(
    db: &C,
    product_ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, ProductView>, ServiceError> {
    let mut ids: Vec<i32> = product_ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let products = product::Entity::find()
        .filter(product::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(ServiceError::db_error)?;

    Ok(product_views(db, products, false)
        .await?
        .into_iter()
        .map(|view| (view.product.id, view))
        .collect())
}
