#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use ecommerce_admin_api::{
    db::{self, DbConfig},
    dto::{CreateProductRequest, InitialStock, ProductView},
    entities::category,
    events::{self, Event, EventSender},
    AppState,
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Opens a fresh in-memory SQLite database with the schema applied.
///
/// The pool is limited to one connection: every connection to
/// `sqlite::memory:` would otherwise see its own empty database.
pub async fn memory_pool() -> Arc<db::DbPool> {
    let pool = db::establish_connection_with_config(&DbConfig {
        url: "sqlite::memory:".into(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    })
    .await
    .expect("failed to create test database");

    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations in tests");

    Arc::new(pool)
}

/// Opens a SQLite database file inside `dir` behind a pool of `connections`
/// connections, so that concurrent tasks hold separate transactions at the
/// same time.
pub async fn file_pool(dir: &TempDir, connections: u32) -> Arc<db::DbPool> {
    let path = dir.path().join("ecommerce_admin.db");
    let pool = db::establish_connection_with_config(&DbConfig {
        url: format!("sqlite://{}?mode=rwc", path.display()),
        max_connections: connections,
        min_connections: 1,
        ..Default::default()
    })
    .await
    .expect("failed to open file-backed test database");

    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations in tests");

    Arc::new(pool)
}

/// Helper harness for an application backed by a SQLite database, in memory
/// unless built with [`TestApp::with_pool`].
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_pool(memory_pool().await)
    }

    pub fn with_pool(pool: Arc<db::DbPool>) -> Self {
        let (sender, rx) = EventSender::channel(256);
        let event_task = tokio::spawn(events::process_events(rx));

        let state = AppState::new(pool, Arc::new(sender));
        let router = ecommerce_admin_api::app_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Sends a request through the full router and returns status, headers
    /// and the decoded JSON body (`Value::Null` for empty bodies)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, axum::http::HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, headers, value)
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, _, value) = self.send(method, uri, body).await;
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    pub async fn seed_category(&self, name: &str) -> category::Model {
        self.state
            .catalog
            .create_category(name, None)
            .await
            .expect("seed category")
    }

    /// Creates a product priced at 10.00, with stock when `stock` is
    /// `Some((quantity, low_stock_threshold))`
    pub async fn seed_product(
        &self,
        category_id: i32,
        name: &str,
        stock: Option<(i32, i32)>,
    ) -> ProductView {
        self.state
            .catalog
            .create_product(product_request(category_id, name, stock))
            .await
            .expect("seed product")
    }
}

pub fn product_request(category_id: i32, name: &str, stock: Option<(i32, i32)>) -> CreateProductRequest {
    CreateProductRequest {
        name: name.to_string(),
        description: None,
        price: Decimal::new(1000, 2),
        category_id,
        initial_stock: stock.map(|(quantity, low_stock_threshold)| InitialStock {
            quantity,
            low_stock_threshold,
        }),
    }
}

/// A bare event channel for tests that inspect what a service publishes
pub fn event_channel() -> (Arc<EventSender>, mpsc::Receiver<Event>) {
    let (sender, rx) = EventSender::channel(64);
    (Arc::new(sender), rx)
}

/// Drains every event currently buffered in `rx`
pub fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

/// Reads a money field that may be encoded as a JSON string or number
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a money value: {other}"),
    }
}
