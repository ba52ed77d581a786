use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use jetway_catalog::{FlightUpdate, NewFlight, SyncReport};
use jetway_core::{BookingDetails, Flight, Requester};

use crate::error::AppError;
use crate::state::AppState;
use crate::{manual, users};

/// Everything under `/v1/admin`. The caller layers auth and the admin check.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/flights", post(create_flight))
        .route("/v1/admin/flights/seed", post(seed_flights))
        .route("/v1/admin/flights/sync-all-seats", post(sync_all_seats))
        .route("/v1/admin/flights/{id}", put(update_flight).delete(delete_flight))
        .route("/v1/admin/flights/{id}/sync-seats", post(sync_flight_seats))
        .route("/v1/admin/bookings", get(list_all_bookings))
        .route("/v1/admin/users", get(users::list_users).post(users::create_user))
        .route("/v1/admin/manual", put(manual::update_manual))
}

pub async fn create_flight(
    State(state): State<AppState>,
    payload: Result<Json<NewFlight>, JsonRejection>,
) -> Result<(StatusCode, Json<Flight>), AppError> {
    let Json(req) = payload?;
    let flight = state.catalog.create_flight(req).await?;
    Ok((StatusCode::CREATED, Json(flight)))
}

pub async fn seed_flights(State(state): State<AppState>) -> Result<(StatusCode, Json<Value>), AppError> {
    let seeded = state.catalog.seed_flights().await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Seeded {} flights", seeded.len()),
            "flights": seeded,
        })),
    ))
}

pub async fn update_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
    payload: Result<Json<FlightUpdate>, JsonRejection>,
) -> Result<Json<Flight>, AppError> {
    let Json(req) = payload?;
    Ok(Json(state.catalog.update_flight(flight_id, req).await?))
}

pub async fn delete_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.catalog.delete_flight(flight_id).await?;
    Ok(Json(json!({ "message": "Flight deleted" })))
}

pub async fn sync_flight_seats(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let result = state.reconciler.sync_flight(flight_id).await?;
    let flight = state.catalog.get_flight(flight_id).await?;

    Ok(Json(json!({
        "message": "Seats synchronized",
        "before": result.before,
        "after": result.after,
        "flight": flight,
    })))
}

pub async fn sync_all_seats(State(state): State<AppState>) -> Result<Json<SyncReport>, AppError> {
    Ok(Json(state.reconciler.recalculate_all().await?))
}

pub async fn list_all_bookings(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
) -> Result<Json<Vec<BookingDetails>>, AppError> {
    Ok(Json(state.bookings.list_all_bookings(&requester).await?))
}
