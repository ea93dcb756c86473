use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{map_service_error, success_response},
    services::analytics::{AnalyticsMetrics, Period},
    AppState,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/revenue", get(revenue))
        .route("/top-products", get(top_products))
        .route("/slow-movers", get(slow_movers))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PeriodQuery {
    /// Reporting window; defaults to today
    #[serde(default = "default_period")]
    pub period: Period,
}

fn default_period() -> Period {
    Period::Today
}

/// Revenue, transaction count, and average sale vs. the previous period
#[utoipa::path(
    get,
    path = "/api/v1/analytics/metrics",
    params(PeriodQuery),
    responses((status = 200, description = "Current and previous period metrics", body = AnalyticsMetrics)),
    tag = "analytics"
)]
pub async fn metrics(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let metrics = state
        .services
        .analytics
        .metrics(user.user_id, query.period)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(metrics))
}

/// Bucketed revenue series for the dashboard chart
#[utoipa::path(
    get,
    path = "/api/v1/analytics/revenue",
    params(PeriodQuery),
    responses((status = 200, description = "Revenue per bucket")),
    tag = "analytics"
)]
pub async fn revenue(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let series = state
        .services
        .analytics
        .revenue_series(user.user_id, query.period)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(series))
}

/// Top five products by quantity sold in the period
#[utoipa::path(
    get,
    path = "/api/v1/analytics/top-products",
    params(PeriodQuery),
    responses((status = 200, description = "Best sellers")),
    tag = "analytics"
)]
pub async fn top_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .services
        .analytics
        .top_products(user.user_id, query.period)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(products))
}

/// Active products with no sales in the last thirty days
#[utoipa::path(
    get,
    path = "/api/v1/analytics/slow-movers",
    responses((status = 200, description = "Stale inventory")),
    tag = "analytics"
)]
pub async fn slow_movers(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .analytics
        .slow_movers(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(items))
}
