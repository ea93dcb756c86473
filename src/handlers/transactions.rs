use crate::{
    auth::AuthUser,
    entities::{sales_transaction, transaction_item},
    errors::ApiError,
    handlers::common::{map_service_error, no_content_response, success_response},
    services::transactions::TransactionFilter,
    AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions))
        .route("/export", get(export_transactions))
        .route("/:id", get(get_transaction).delete(delete_transaction))
}

/// Transaction with its line items, as shown in the details modal
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionDetailResponse {
    #[serde(flatten)]
    pub transaction: sales_transaction::Model,
    pub items: Vec<transaction_item::Model>,
}

/// Transaction history, newest first
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    params(TransactionFilter),
    responses((status = 200, description = "Paginated transaction history")),
    tag = "transactions"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<TransactionFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let page = filter.page.max(1);
    let limit = filter.per_page.clamp(1, 100);

    let (transactions, total) = state
        .services
        .transactions
        .list(user.user_id, filter)
        .await
        .map_err(map_service_error)?;

    let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
    Ok(success_response(PaginatedResponse {
        items: transactions,
        total,
        page,
        limit,
        total_pages,
    }))
}

/// One transaction with line items
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction detail", body = TransactionDetailResponse),
        (status = 404, description = "Unknown transaction")
    ),
    tag = "transactions"
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (transaction, items) = state
        .services
        .transactions
        .get_with_items(user.user_id, id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(TransactionDetailResponse {
        transaction,
        items,
    }))
}

/// Administrative deletion of a transaction and its line items
#[utoipa::path(
    delete,
    path = "/api/v1/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 204, description = "Transaction deleted"),
        (status = 404, description = "Unknown transaction")
    ),
    tag = "transactions"
)]
pub async fn delete_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .transactions
        .delete(user.user_id, id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Download the filtered history as CSV
#[utoipa::path(
    get,
    path = "/api/v1/transactions/export",
    params(TransactionFilter),
    responses((status = 200, description = "CSV export", body = String, content_type = "text/csv")),
    tag = "transactions"
)]
pub async fn export_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<TransactionFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let csv = state
        .services
        .transactions
        .export_csv(user.user_id, filter)
        .await
        .map_err(map_service_error)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        csv,
    ))
}
