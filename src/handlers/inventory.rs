use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{map_service_error, success_response},
    services::inventory::{AdjustStockInput, InventoryItem, InventorySummary, StockStatus},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory))
        .route("/summary", get(inventory_summary))
        .route("/low-stock", get(low_stock))
        .route("/:id/adjust", post(adjust_stock))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct InventoryQuery {
    /// Restrict to one stock tier
    pub status: Option<StockStatus>,
    /// Substring match over product name or SKU
    pub search: Option<String>,
}

/// Inventory table: active products with stock levels and tiers
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(InventoryQuery),
    responses(
        (status = 200, description = "Products with stock information", body = [InventoryItem]),
        (status = 401, description = "Not authenticated")
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<InventoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .inventory
        .list(user.user_id, query.status, query.search)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

/// Counts per stock tier for the inventory header cards
#[utoipa::path(
    get,
    path = "/api/v1/inventory/summary",
    responses((status = 200, description = "Counts per stock tier", body = InventorySummary)),
    tag = "inventory"
)]
pub async fn inventory_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .services
        .inventory
        .summary(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}

/// Products at or below their reorder threshold
#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    responses((status = 200, description = "Products needing a reorder")),
    tag = "inventory"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .inventory
        .low_stock(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

/// Manual stock correction (absolute or relative), floored at zero
#[utoipa::path(
    post,
    path = "/api/v1/inventory/{id}/adjust",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = AdjustStockInput,
    responses(
        (status = 200, description = "Stock adjusted"),
        (status = 400, description = "Invalid adjustment"),
        (status = 404, description = "Unknown product")
    ),
    tag = "inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStockInput>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .inventory
        .adjust_stock(user.user_id, id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}
