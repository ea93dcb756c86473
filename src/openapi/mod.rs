use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "POS API",
        version = "0.1.0",
        description = r#"
# Retail Point-of-Sale API

Backend for a small-store point-of-sale: product catalog, inventory control,
cash/e-wallet checkout, transaction history, and sales analytics.

## Authentication

All endpoints outside `/auth` require a JWT bearer token:

```
Authorization: Bearer <your-jwt-token>
```

## Error Handling

Errors use a consistent response shape with appropriate HTTP status codes:

```json
{
  "error": "Not Found",
  "message": "Product 550e8400-e29b-41d4-a716-446655440000 not found",
  "timestamp": "2025-11-03T10:30:00.000Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "products", description = "Product catalog endpoints"),
        (name = "inventory", description = "Inventory management endpoints"),
        (name = "checkout", description = "POS checkout endpoint"),
        (name = "transactions", description = "Transaction history endpoints"),
        (name = "analytics", description = "Sales analytics endpoints")
    ),
    paths(
        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        // Inventory
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::inventory_summary,
        crate::handlers::inventory::low_stock,
        crate::handlers::inventory::adjust_stock,

        // Checkout
        crate::handlers::checkout::complete_checkout,

        // Transactions
        crate::handlers::transactions::list_transactions,
        crate::handlers::transactions::get_transaction,
        crate::handlers::transactions::delete_transaction,
        crate::handlers::transactions::export_transactions,

        // Analytics
        crate::handlers::analytics::metrics,
        crate::handlers::analytics::revenue,
        crate::handlers::analytics::top_products,
        crate::handlers::analytics::slow_movers,

        // Auth, profile, and category endpoints intentionally omitted for now
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::errors::ErrorResponse,

            // Catalog types
            crate::services::catalog::CatalogProduct,
            crate::handlers::products::CreateProductRequest,
            crate::handlers::products::UpdateProductRequest,

            // Inventory types
            crate::services::inventory::StockStatus,
            crate::services::inventory::InventoryItem,
            crate::services::inventory::InventorySummary,
            crate::services::inventory::AdjustStockInput,

            // Checkout types
            crate::services::checkout::CartLine,
            crate::services::checkout::CheckoutRequest,
            crate::services::checkout::CheckoutOutcome,
            crate::entities::sales_transaction::PaymentMethod,
            crate::entities::sales_transaction::TransactionStatus,

            // Transaction types
            crate::handlers::transactions::TransactionDetailResponse,

            // Analytics types
            crate::services::analytics::AnalyticsMetrics,
            crate::services::analytics::PeriodMetrics,
            crate::services::analytics::RevenuePoint,
            crate::services::analytics::TopProduct,
            crate::services::analytics::SlowMovingItem
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("POS API"));
        assert!(json.contains("/api/v1/checkout"));
        assert!(json.contains("/api/v1/inventory"));
    }
}
