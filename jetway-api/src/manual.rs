use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use jetway_core::manual::Manual;
use jetway_core::Requester;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/manual", get(get_manual))
}

#[derive(Debug, Deserialize)]
pub struct UpdateManualRequest {
    pub content: Option<String>,
}

pub async fn get_manual(State(state): State<AppState>) -> Result<Json<Manual>, AppError> {
    Ok(Json(state.manual.get_manual().await?.unwrap_or_default()))
}

pub async fn update_manual(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    payload: Result<Json<UpdateManualRequest>, JsonRejection>,
) -> Result<Json<Manual>, AppError> {
    let Json(req) = payload?;
    let content = req
        .content
        .ok_or_else(|| AppError::ValidationError("Content is required".to_string()))?;

    let manual = Manual {
        content,
        last_updated: Some(Utc::now()),
        updated_by: Some(requester.user_id),
    };
    state.manual.save_manual(&manual).await?;

    tracing::info!("Manual updated by {}", requester.user_id);
    Ok(Json(manual))
}
