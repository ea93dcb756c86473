use crate::{
    auth::{SignupInput, TokenResponse},
    errors::ApiError,
    handlers::common::validate_input,
    AppState,
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub full_name: String,
    pub store_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Registers a new store operator, seeds the default categories, and logs
/// them straight in.
async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let user = state
        .auth
        .register(SignupInput {
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name.clone(),
            store_name: payload.store_name,
        })
        .await?;

    state
        .services
        .catalog
        .create_default_categories(user.id)
        .await;

    let token = state
        .auth
        .issue_token(user.id, Some(payload.full_name), Some(user.email.clone()))?;

    info!("Operator signed up: {}", user.email);
    Ok((StatusCode::CREATED, axum::Json(token)))
}

/// Verifies credentials and returns a bearer token
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<axum::Json<TokenResponse>, ApiError> {
    validate_input(&payload)?;

    let token = state.auth.login(&payload.email, &payload.password).await?;
    Ok(axum::Json(token))
}
