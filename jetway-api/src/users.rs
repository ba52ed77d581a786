use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use jetway_core::user::normalize_email;
use jetway_core::{is_blank, Requester, Role, StoreError, User};

use crate::error::AppError;
use crate::state::AppState;

/// Self-service profile routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/me", get(get_profile).patch(update_profile))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone_number: Option<String>,
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.users.list_users().await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let Json(req) = payload?;

    if is_blank(req.name.as_deref()) || is_blank(req.email.as_deref()) {
        return Err(AppError::ValidationError("Name and email are required".to_string()));
    }

    let role = match req.role.as_deref().map(str::trim) {
        None | Some("") => Role::Traveler,
        Some(raw) => raw.parse::<Role>().map_err(AppError::ValidationError)?,
    };

    let user = User {
        id: Uuid::new_v4(),
        name: req.name.unwrap_or_default().trim().to_string(),
        email: normalize_email(&req.email.unwrap_or_default()),
        phone_number: req
            .phone_number
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
        role,
        created_at: Utc::now(),
    };

    state.users.insert_user(&user).await.map_err(|e| match e {
        StoreError::Duplicate(_) => AppError::ConflictError("User with this email already exists".to_string()),
        other => other.into(),
    })?;

    tracing::info!("Created {} user {}", user.role, user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
) -> Result<Json<User>, AppError> {
    state
        .users
        .get_user(requester.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Json(req) = payload?;

    let name = req.name.as_deref().map(str::trim);
    if name == Some("") {
        return Err(AppError::ValidationError("Name cannot be empty".to_string()));
    }
    let phone_number = req.phone_number.as_deref().map(str::trim);

    state
        .users
        .update_profile(requester.user_id, name, phone_number)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))
}
