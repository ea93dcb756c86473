use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{created_response, map_service_error},
    services::checkout::{CheckoutOutcome, CheckoutRequest},
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(complete_checkout))
}

/// Convert the client-held cart into a completed transaction.
///
/// Validation failures (empty cart, short cash) come back as 400 with the
/// cart untouched on the client; write failures after validation come back
/// as 422 once compensation has removed every partial row.
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Sale completed", body = CheckoutOutcome),
        (status = 400, description = "Invalid cart or payment"),
        (status = 422, description = "Write failure, rolled back")
    ),
    tag = "checkout"
)]
pub async fn complete_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .services
        .checkout
        .checkout(user.user_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(outcome))
}
