mod common;

use axum::http::{Method, StatusCode};
use common::{money, TestApp};
use ecommerce_admin_api::middleware_helpers::request_id::REQUEST_ID_HEADER;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn create_stocked_product(app: &TestApp, quantity: i32, threshold: i32) -> Value {
    let category = app.seed_category("Electronics").await;
    let (status, body) = app
        .post(
            "/api/products",
            json!({
                "name": "Smartphone X",
                "description": "Latest smartphone",
                "price": "799.99",
                "categoryId": category.id,
                "initialStock": { "quantity": quantity, "lowStockThreshold": threshold }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn welcome_and_health() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to E-commerce Admin API");

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy", "database": "connected" }));
}

#[tokio::test]
async fn product_crud_round_trip() {
    let app = TestApp::new().await;
    let created = create_stocked_product(&app, 10, 5).await;
    let id = created["id"].as_i64().unwrap();

    assert_eq!(created["name"], "Smartphone X");
    assert_eq!(created["category"]["name"], "Electronics");
    assert_eq!(created["inventory"]["quantity"], 10);
    assert_eq!(money(&created["price"]).round_dp(2), dec!(799.99));

    let (status, list) = app.get("/api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, updated) = app
        .put(&format!("/api/products/{id}"), json!({ "name": "Smartphone X2" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Smartphone X2");

    // Still referenced by its inventory row
    let (status, body) = app.delete(&format!("/api/products/{id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let category_id = created["categoryId"].as_i64().unwrap();
    let (_, bare) = app
        .post(
            "/api/products",
            json!({ "name": "Case", "price": 5, "categoryId": category_id }),
        )
        .await;
    let bare_id = bare["id"].as_i64().unwrap();
    assert!(bare.get("inventory").is_none());

    let (status, body) = app.delete(&format!("/api/products/{bare_id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app.get(&format!("/api/products/{bare_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_resources_use_the_error_envelope() {
    let app = TestApp::new().await;

    let (status, headers, body) = app
        .send(Method::GET, "/api/products/12345", None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
    assert_eq!(body["error"], "Not Found");
    assert!(body["timestamp"].is_string());
    let header_id = headers.get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
    assert_eq!(body["requestId"], header_id);

    let (status, body) = app.get("/api/inventory/product/12345").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, body) = app.get("/api/nothing-here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn sale_flow_and_error_codes() {
    let app = TestApp::new().await;
    let created = create_stocked_product(&app, 10, 5).await;
    let product_id = created["id"].as_i64().unwrap();

    let (status, sale) = app
        .post(
            "/api/sales",
            json!({ "productId": product_id, "quantity": 3, "totalPrice": 2399.97, "platform": "Amazon" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{sale}");
    assert_eq!(sale["quantity"], 3);
    assert_eq!(sale["product"]["category"]["name"], "Electronics");

    let (status, body) = app
        .post(
            "/api/sales",
            json!({ "productId": product_id, "quantity": 15, "totalPrice": 100, "platform": "Amazon" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "insufficient_stock");

    let (status, body) = app
        .post(
            "/api/sales",
            json!({ "productId": 9999, "quantity": 1, "totalPrice": 1, "platform": "OLX" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, body) = app
        .post(
            "/api/sales",
            json!({ "productId": product_id, "quantity": 0, "totalPrice": 1, "platform": "OLX" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (status, stock) = app.get(&format!("/api/inventory/product/{product_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stock["quantity"], 7);
    assert_eq!(stock["history"].as_array().unwrap().len(), 2);

    let (status, sales) = app.get(&format!("/api/sales/product/{product_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sales.as_array().unwrap().len(), 1);

    let (status, stats) = app.get("/api/sales/statistics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalUnits"], 3);
    assert_eq!(money(&stats["totalRevenue"]), dec!(2399.97));
    assert_eq!(stats["byPlatform"][0]["platform"], "Amazon");
}

#[tokio::test]
async fn statistics_without_sales() {
    let app = TestApp::new().await;

    let (status, stats) = app.get("/api/sales/statistics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(stats["totalRevenue"].is_number());
    assert_eq!(money(&stats["totalRevenue"]), dec!(0));
    assert_eq!(stats["totalUnits"], 0);
    assert_eq!(stats["byPlatform"], json!([]));
}

#[tokio::test]
async fn inventory_updates_and_low_stock() {
    let app = TestApp::new().await;
    let created = create_stocked_product(&app, 10, 5).await;
    let inventory_id = created["inventory"]["id"].as_i64().unwrap();

    let (status, body) = app
        .put(&format!("/api/inventory/{inventory_id}"), json!({ "quantity": -4 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (_, low) = app.get("/api/inventory/low-stock").await;
    assert_eq!(low, json!([]));

    let (status, body) = app
        .put(&format!("/api/inventory/{inventory_id}"), json!({ "quantity": 5 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 5);
    assert_eq!(body["product"]["name"], "Smartphone X");

    let (_, low) = app.get("/api/inventory/low-stock").await;
    assert_eq!(low.as_array().unwrap().len(), 1);
    assert_eq!(low[0]["id"].as_i64(), Some(inventory_id));

    let product_id = created["id"].as_i64().unwrap();
    let (status, body) = app
        .put(
            &format!("/api/inventory/product/{product_id}"),
            json!({ "quantity": 30, "lowStockThreshold": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lowStockThreshold"], 3);

    let (status, audit) = app.get(&format!("/api/inventory/{inventory_id}/audit")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audit["consistent"], true);
    assert_eq!(audit["records"], 3);

    let (status, all) = app.get("/api/inventory").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, _) = app.put("/api/inventory/999", json!({ "quantity": 1 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post("/api/sales", json!({ "productId": "seven" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (status, body) = app
        .post("/api/products", json!({ "name": "", "price": 1, "categoryId": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn categories_endpoint_lists_seeded_categories() {
    let app = TestApp::new().await;
    app.seed_category("Clothing").await;

    let (status, body) = app.get("/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Clothing");
    assert_eq!(body[0]["description"], Value::Null);
}
