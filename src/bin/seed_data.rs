//! Seed data script - populates the database with a year of demo data
//!
//! Run with: cargo run --bin seed-data -- --days 365 --seed 42
//!
//! This creates:
//! - 3 categories
//! - 15 products, each with random opening stock
//! - Random daily sales over the requested period
//!
//! Sales go through the same recorder as the API, so a sale that would
//! oversell a product is skipped instead of driving stock negative.

use chrono::{Duration, TimeZone, Utc};
use clap::Parser;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use std::sync::Arc;
use tracing::{info, warn};

use ecommerce_admin_api::{
    config, db,
    dto::{CreateProductRequest, CreateSaleRequest, InitialStock, ProductView},
    entities::category,
    errors::ServiceError,
    events::{process_events, EventSender},
    services::{CatalogService, SalesRecorder},
};

const CATEGORIES: &[(&str, &str)] = &[
    ("Electronics", "Electronic devices and accessories"),
    ("Clothing", "Apparel and fashion items"),
    ("Home & Kitchen", "Items for home and kitchen use"),
];

/// (name, description, price, category)
const PRODUCTS: &[(&str, &str, Decimal, &str)] = &[
    ("Smartphone X", "Latest smartphone with advanced features", dec!(799.99), "Electronics"),
    ("Laptop Pro", "High-performance laptop for professionals", dec!(1299.99), "Electronics"),
    ("Wireless Earbuds", "Noise-cancelling wireless earbuds", dec!(129.99), "Electronics"),
    ("Smart Watch", "Fitness and health tracking smartwatch", dec!(249.99), "Electronics"),
    ("Bluetooth Speaker", "Portable Bluetooth speaker with deep bass", dec!(89.99), "Electronics"),
    ("Men's T-Shirt", "Comfortable cotton t-shirt", dec!(19.99), "Clothing"),
    ("Women's Jeans", "Stylish and durable jeans", dec!(49.99), "Clothing"),
    ("Running Shoes", "Lightweight shoes for running and athletics", dec!(79.99), "Clothing"),
    ("Winter Jacket", "Warm jacket for cold weather", dec!(129.99), "Clothing"),
    ("Summer Dress", "Flowy dress for summer days", dec!(39.99), "Clothing"),
    ("Coffee Maker", "Programmable coffee maker", dec!(69.99), "Home & Kitchen"),
    ("Blender", "High-speed blender for smoothies", dec!(59.99), "Home & Kitchen"),
    ("Toaster", "2-slice toaster with multiple settings", dec!(29.99), "Home & Kitchen"),
    ("Bedding Set", "Soft cotton bedding set", dec!(79.99), "Home & Kitchen"),
    ("Cutting Board", "Durable bamboo cutting board", dec!(24.99), "Home & Kitchen"),
];

const PLATFORMS: &[&str] = &["Amazon", "Daraz", "Direct Website", "OLX"];

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Populate the database with demo catalog, stock and sales")]
struct Args {
    /// Database URL; defaults to the configured one
    #[arg(long)]
    database_url: Option<String>,

    /// Number of days of sales history to generate, ending today
    #[arg(long, default_value_t = 365)]
    days: i64,

    /// RNG seed for reproducible data
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    config::init_tracing("info", false);

    info!("=== E-commerce Admin API Seed Data ===");

    let database_url = match args.database_url {
        Some(url) => url,
        None => config::load_config()?.database_url,
    };

    info!("Connecting to database: {}", database_url);
    let pool = db::establish_connection(&database_url).await?;
    db::run_migrations(&pool).await?;

    let existing = category::Entity::find().count(&pool).await?;
    if existing > 0 {
        info!("Database already contains data. Skipping seeding.");
        db::close_pool(pool).await?;
        return Ok(());
    }

    let db_arc = Arc::new(pool);
    let (sender, rx) = EventSender::channel(1024);
    let events = tokio::spawn(process_events(rx));
    let sender = Arc::new(sender);

    let catalog = CatalogService::new(db_arc.clone(), sender.clone());
    let recorder = SalesRecorder::new(db_arc.clone(), sender);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!("Creating categories...");
    let mut categories = Vec::with_capacity(CATEGORIES.len());
    for (name, description) in CATEGORIES {
        categories.push(
            catalog
                .create_category(name, Some(description.to_string()))
                .await?,
        );
    }

    info!("Creating products with opening stock...");
    let mut products = Vec::with_capacity(PRODUCTS.len());
    for (name, description, price, category_name) in PRODUCTS {
        let category_id = categories
            .iter()
            .find(|c| c.name == *category_name)
            .map(|c| c.id)
            .ok_or_else(|| anyhow::anyhow!("category '{}' was not created", category_name))?;

        let product = catalog
            .create_product(CreateProductRequest {
                name: name.to_string(),
                description: Some(description.to_string()),
                price: *price,
                category_id,
                initial_stock: Some(InitialStock {
                    quantity: rng.gen_range(5..=100),
                    low_stock_threshold: rng.gen_range(5..=20),
                }),
            })
            .await?;
        products.push(product);
    }
    info!("  Created {} products", products.len());

    info!("Recording {} days of sales...", args.days);
    let (recorded, skipped) = seed_sales(&recorder, &products, args.days, &mut rng).await?;
    info!("  Recorded {} sales, skipped {} for lack of stock", recorded, skipped);

    drop(catalog);
    drop(recorder);
    if let Err(e) = events.await {
        warn!(error = %e, "Event worker ended abnormally");
    }

    match Arc::try_unwrap(db_arc) {
        Ok(pool) => db::close_pool(pool).await?,
        Err(_) => warn!("Database pool still shared; leaving it to drop"),
    }

    info!("=== Seed Data Complete ===");
    info!("Try: curl http://localhost:3000/api/sales/statistics");
    Ok(())
}

async fn seed_sales(
    recorder: &SalesRecorder,
    products: &[ProductView],
    days: i64,
    rng: &mut StdRng,
) -> anyhow::Result<(usize, usize)> {
    let now = Utc::now();
    let start = (now - Duration::days(days)).date_naive();
    let mut recorded = 0;
    let mut skipped = 0;

    for offset in 0..=days {
        let day = start + Duration::days(offset);

        for _ in 0..rng.gen_range(0..=15) {
            let Some(product) = products.choose(rng) else {
                return Ok((recorded, skipped));
            };
            let quantity: i32 = rng.gen_range(1..=5);
            let platform = PLATFORMS.choose(rng).copied().unwrap_or("Direct Website");

            // Up to 20% off, in basis points
            let discount = Decimal::new(rng.gen_range(0..2_000), 4);
            let total_price = (product.product.price * (Decimal::ONE - discount)
                * Decimal::from(quantity))
            .round_dp(2);

            let sale_date = day
                .and_hms_opt(rng.gen_range(0..24), rng.gen_range(0..60), rng.gen_range(0..60))
                .map(|naive| Utc.from_utc_datetime(&naive))
                .unwrap_or(now)
                .min(now);

            let result = recorder
                .create_sale(CreateSaleRequest {
                    product_id: product.product.id,
                    quantity,
                    total_price,
                    platform: platform.to_string(),
                    sale_date: Some(sale_date),
                })
                .await;

            match result {
                Ok(_) => recorded += 1,
                Err(ServiceError::InsufficientStock(_)) => skipped += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok((recorded, skipped))
}
