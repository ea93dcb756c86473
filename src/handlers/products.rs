use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{created_response, map_service_error, no_content_response, success_response, validate_input},
    services::catalog::{CatalogProduct, CreateProductInput, UpdateProductInput},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub sku: String,
    pub icon: Option<String>,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub reorder_level: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub icon: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub stock_quantity: Option<i32>,
    pub reorder_level: Option<i32>,
}

/// List the operator's active products with category names and stock tiers
#[utoipa::path(
    get,
    path = "/api/v1/products",
    responses(
        (status = 200, description = "Active products", body = [CatalogProduct]),
        (status = 401, description = "Not authenticated")
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .catalog
        .list_products(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

/// Fetch a single product
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = CatalogProduct),
        (status = 404, description = "Unknown product")
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .catalog
        .get_product(user.user_id, id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

/// Add a product to the catalog
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid product data")
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product = state
        .services
        .catalog
        .create_product(
            user.user_id,
            CreateProductInput {
                name: payload.name,
                sku: payload.sku,
                icon: payload.icon,
                price: payload.price,
                category_id: payload.category_id,
                stock_quantity: payload.stock_quantity,
                reorder_level: payload.reorder_level,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(created_response(product))
}

/// Update product details, price, thresholds, or stock
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated"),
        (status = 404, description = "Unknown product")
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .catalog
        .update_product(
            user.user_id,
            id,
            UpdateProductInput {
                name: payload.name,
                sku: payload.sku,
                icon: payload.icon,
                price: payload.price,
                category_id: payload.category_id,
                stock_quantity: payload.stock_quantity,
                reorder_level: payload.reorder_level,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

/// Soft-delete a product (clears the active flag)
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deactivated"),
        (status = 404, description = "Unknown product")
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .catalog
        .deactivate_product(user.user_id, id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
