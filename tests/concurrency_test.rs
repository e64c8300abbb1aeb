mod common;

use common::{file_pool, TestApp};
use ecommerce_admin_api::{dto::CreateSaleRequest, entities::sale, errors::ServiceError};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use std::sync::Arc;
use tempfile::TempDir;

const POOL_SIZE: u32 = 8;

fn one_unit(product_id: i32) -> CreateSaleRequest {
    CreateSaleRequest {
        product_id,
        quantity: 1,
        total_price: dec!(499),
        platform: "Amazon".to_string(),
        sale_date: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_never_oversell() {
    const STOCK: i32 = 10;
    const ATTEMPTS: usize = 25;

    let dir = TempDir::new().unwrap();
    let app = TestApp::with_pool(file_pool(&dir, POOL_SIZE).await);
    let category = app.seed_category("Electronics").await;
    let product = app.seed_product(category.id, "Console", Some((STOCK, 2))).await;
    let product_id = product.product.id;

    let mut tasks = Vec::with_capacity(ATTEMPTS);
    for _ in 0..ATTEMPTS {
        let sales = Arc::clone(&app.state.sales);
        tasks.push(tokio::spawn(async move {
            sales.create_sale(one_unit(product_id)).await
        }));
    }

    let mut successes = 0;
    let mut insufficient = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(ServiceError::InsufficientStock(_)) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, STOCK as usize);
    assert_eq!(insufficient, ATTEMPTS - STOCK as usize);

    let stock = app.state.ledger.get_by_product(product_id).await.unwrap();
    assert_eq!(stock.inventory.quantity, 0);

    let audit = app.state.ledger.audit(stock.inventory.id).await.unwrap();
    assert!(audit.consistent, "history does not replay: {audit:?}");
    assert_eq!(audit.records, STOCK as usize + 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn adjustments_and_sales_on_one_row_all_complete() {
    const ROUNDS: usize = 10;
    const START: i32 = 20;
    const RESTOCK: i32 = 50;

    let dir = TempDir::new().unwrap();
    let app = TestApp::with_pool(file_pool(&dir, POOL_SIZE).await);
    let category = app.seed_category("Electronics").await;
    let product = app.seed_product(category.id, "Headset", Some((START, 5))).await;
    let product_id = product.product.id;
    let inventory_id = product.inventory.as_ref().unwrap().id;

    let mut sales = Vec::with_capacity(ROUNDS);
    let mut adjustments = Vec::with_capacity(ROUNDS);
    for _ in 0..ROUNDS {
        let recorder = Arc::clone(&app.state.sales);
        sales.push(tokio::spawn(async move {
            recorder.create_sale(one_unit(product_id)).await
        }));

        let ledger = Arc::clone(&app.state.ledger);
        adjustments.push(tokio::spawn(async move {
            ledger.set_quantity(inventory_id, RESTOCK).await
        }));
    }

    let mut errors = Vec::new();
    for task in sales {
        if let Err(e) = task.await.unwrap() {
            errors.push(e.to_string());
        }
    }
    for task in adjustments {
        if let Err(e) = task.await.unwrap() {
            errors.push(e.to_string());
        }
    }
    assert!(errors.is_empty(), "operations failed: {errors:?}");

    let recorded = sale::Entity::find()
        .count(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(recorded, ROUNDS as u64);

    let stock = app.state.ledger.get_by_id(inventory_id).await.unwrap();
    assert!(
        (RESTOCK - ROUNDS as i32..=RESTOCK).contains(&stock.inventory.quantity),
        "unexpected final quantity {}",
        stock.inventory.quantity
    );

    let audit = app.state.ledger.audit(inventory_id).await.unwrap();
    assert!(audit.consistent, "history does not replay: {audit:?}");
    assert_eq!(audit.records, 1 + 2 * ROUNDS);
}
