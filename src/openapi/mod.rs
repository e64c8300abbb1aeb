use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "E-commerce Admin API",
        version = "1.0.0",
        description = r#"
# E-commerce Admin API

Back-office API for a small online shop.

- **Catalog**: products and their categories
- **Inventory**: current stock per product, an append-only history of every
  quantity change, and a low-stock listing
- **Sales**: recording a sale takes its units out of stock atomically; a sale
  that would drive stock below zero is rejected with `insufficient_stock`
- **Reporting**: revenue and units sold, overall and per platform

## Errors

Every failure uses the same envelope:

```json
{
  "error": "Unprocessable Entity",
  "code": "insufficient_stock",
  "message": "Insufficient stock: product 7 has 2 units, 5 requested",
  "requestId": "5f0c6f0e-1b7e-4a53-9d2b-2d1f3f0c9a11",
  "timestamp": "2024-12-09T10:30:00.000Z"
}
```
"#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development")
    ),
    tags(
        (name = "Catalog", description = "Products and categories"),
        (name = "Inventory", description = "Stock levels and their history"),
        (name = "Sales", description = "Sale recording and statistics"),
        (name = "Health", description = "Liveness and database connectivity")
    ),
    paths(
        crate::handlers::health::welcome,
        crate::handlers::health::health_check,

        // Catalog
        crate::handlers::categories::list_categories,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        // Inventory
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::list_low_stock,
        crate::handlers::inventory::get_inventory,
        crate::handlers::inventory::update_inventory,
        crate::handlers::inventory::get_product_inventory,
        crate::handlers::inventory::update_product_inventory,
        crate::handlers::inventory::audit_inventory,

        // Sales
        crate::handlers::sales::list_sales,
        crate::handlers::sales::create_sale,
        crate::handlers::sales::sales_statistics,
        crate::handlers::sales::list_product_sales,
    ),
    components(
        schemas(
            crate::entities::category::Model,
            crate::entities::product::Model,
            crate::entities::inventory::Model,
            crate::entities::inventory_history::Model,
            crate::entities::sale::Model,

            crate::dto::ProductView,
            crate::dto::InitialStock,
            crate::dto::CreateProductRequest,
            crate::dto::UpdateProductRequest,
            crate::dto::InventoryView,
            crate::dto::UpdateInventoryRequest,
            crate::dto::HistoryAudit,
            crate::dto::SaleView,
            crate::dto::CreateSaleRequest,
            crate::dto::SalesStatistics,
            crate::dto::PlatformSales,

            crate::handlers::health::HealthResponse,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
