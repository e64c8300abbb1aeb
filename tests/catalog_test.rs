mod common;

use assert_matches::assert_matches;
use common::{product_request, TestApp};
use ecommerce_admin_api::{
    dto::{CreateSaleRequest, UpdateProductRequest},
    entities::{inventory, inventory_history, product},
    errors::ServiceError,
};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};

#[tokio::test]
async fn categories_are_listed_by_name_and_unique() {
    let app = TestApp::new().await;
    app.seed_category("Home & Kitchen").await;
    app.seed_category("Clothing").await;
    app.seed_category("Electronics").await;

    let names: Vec<String> = app
        .state
        .catalog
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Clothing", "Electronics", "Home & Kitchen"]);

    assert_matches!(
        app.state.catalog.create_category("Clothing", None).await,
        Err(ServiceError::Conflict(_))
    );
    assert_matches!(
        app.state.catalog.create_category("  ", None).await,
        Err(ServiceError::ValidationError(_))
    );
}

#[tokio::test]
async fn create_without_stock_has_no_inventory() {
    let app = TestApp::new().await;
    let category = app.seed_category("Electronics").await;

    let created = app.seed_product(category.id, "Laptop", None).await;

    assert_eq!(created.product.name, "Laptop");
    assert_eq!(created.product.category_id, category.id);
    assert_eq!(created.category.as_ref().map(|c| c.id), Some(category.id));
    assert!(created.inventory.is_none());

    let fetched = app.state.catalog.get_product(created.product.id).await.unwrap();
    assert_eq!(fetched.product.id, created.product.id);
    assert_eq!(fetched.product.price.round_dp(2), dec!(10.00));
}

#[tokio::test]
async fn opening_stock_is_recorded_as_history() {
    let app = TestApp::new().await;
    let category = app.seed_category("Electronics").await;

    let created = app.seed_product(category.id, "Tablet", Some((25, 7))).await;

    let stock = created.inventory.expect("inventory row");
    assert_eq!(stock.quantity, 25);
    assert_eq!(stock.low_stock_threshold, 7);

    let history = app.state.ledger.history(stock.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!((history[0].previous_quantity, history[0].new_quantity), (0, 25));
}

#[tokio::test]
async fn unknown_category_is_a_validation_error() {
    let app = TestApp::new().await;

    let result = app
        .state
        .catalog
        .create_product(product_request(77, "Orphan", Some((5, 1))))
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError(msg)) if msg.contains("77"));
    let db = app.state.db.as_ref();
    assert_eq!(product::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(inventory::Entity::find().count(db).await.unwrap(), 0);
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let app = TestApp::new().await;
    let electronics = app.seed_category("Electronics").await;
    let gadgets = app.seed_category("Gadgets").await;
    let created = app.seed_product(electronics.id, "Watch", Some((3, 1))).await;

    let updated = app
        .state
        .catalog
        .update_product(
            created.product.id,
            UpdateProductRequest {
                price: Some(dec!(199.50)),
                category_id: Some(gadgets.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.product.name, "Watch");
    assert_eq!(updated.product.price.round_dp(2), dec!(199.50));
    assert_eq!(updated.category.unwrap().name, "Gadgets");
    assert_eq!(updated.inventory.map(|i| i.quantity), Some(3));
    assert!(updated.product.updated_at >= created.product.updated_at);

    assert_matches!(
        app.state
            .catalog
            .update_product(
                created.product.id,
                UpdateProductRequest {
                    category_id: Some(555),
                    ..Default::default()
                },
            )
            .await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        app.state
            .catalog
            .update_product(404, UpdateProductRequest::default())
            .await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn delete_removes_unreferenced_product() {
    let app = TestApp::new().await;
    let category = app.seed_category("Electronics").await;
    let created = app.seed_product(category.id, "Mouse", None).await;

    app.state.catalog.delete_product(created.product.id).await.unwrap();

    assert_matches!(
        app.state.catalog.get_product(created.product.id).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        app.state.catalog.delete_product(created.product.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn delete_refuses_products_with_stock_or_sales() {
    let app = TestApp::new().await;
    let category = app.seed_category("Electronics").await;
    let stocked = app.seed_product(category.id, "Keyboard", Some((5, 1))).await;

    app.state
        .sales
        .create_sale(CreateSaleRequest {
            product_id: stocked.product.id,
            quantity: 1,
            total_price: dec!(10),
            platform: "Amazon".to_string(),
            sale_date: None,
        })
        .await
        .unwrap();

    assert_matches!(
        app.state.catalog.delete_product(stocked.product.id).await,
        Err(ServiceError::Conflict(_))
    );

    let db = app.state.db.as_ref();
    assert_eq!(product::Entity::find().count(db).await.unwrap(), 1);
    assert_eq!(inventory_history::Entity::find().count(db).await.unwrap(), 2);
}

#[tokio::test]
async fn list_includes_inventory_where_present() {
    let app = TestApp::new().await;
    let category = app.seed_category("Electronics").await;
    app.seed_product(category.id, "First", Some((4, 2))).await;
    app.seed_product(category.id, "Second", None).await;

    let listed = app.state.catalog.list_products().await.unwrap();

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].product.name, "First");
    assert_eq!(listed[0].inventory.as_ref().map(|i| i.quantity), Some(4));
    assert!(listed[1].inventory.is_none());
    assert!(listed.iter().all(|p| p.category.is_some()));
}
