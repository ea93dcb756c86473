use crate::{
    auth::AuthUser,
    entities::{profile, Profile},
    errors::{ApiError, ServiceError},
    events::Event,
    handlers::common::{map_service_error, success_response},
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Deserialize;
use utoipa::ToSchema;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub store_name: Option<String>,
    pub phone: Option<String>,
}

/// Settings page: current operator profile
async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile = Profile::find_by_id(user.user_id)
        .one(&*state.db)
        .await
        .map_err(|e| map_service_error(e.into()))?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(success_response(profile))
}

/// Settings page: update display name, store name, or phone
async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = Profile::find_by_id(user.user_id)
        .one(&*state.db)
        .await
        .map_err(|e| map_service_error(e.into()))?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let mut active: profile::ActiveModel = profile.into();
    if let Some(full_name) = payload.full_name {
        if full_name.trim().is_empty() {
            return Err(ApiError::ServiceError(ServiceError::ValidationError(
                "Full name must not be empty".to_string(),
            )));
        }
        active.full_name = Set(full_name);
    }
    if let Some(store_name) = payload.store_name {
        active.store_name = Set(Some(store_name));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    active.updated_at = Set(Utc::now());

    let updated = active
        .update(&*state.db)
        .await
        .map_err(|e| map_service_error(e.into()))?;

    state
        .event_sender
        .send_or_log(Event::ProfileUpdated(user.user_id))
        .await;

    Ok(success_response(updated))
}
