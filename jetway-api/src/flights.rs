use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use jetway_catalog::SeatAvailability;
use jetway_core::Flight;

use crate::error::AppError;
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/v1/flights", get(list_flights))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/flights/{id}/seats", get(get_seat_map))
}

pub async fn list_flights(State(state): State<AppState>) -> Result<Json<Vec<Flight>>, AppError> {
    Ok(Json(state.catalog.list_flights().await?))
}

pub async fn get_seat_map(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<SeatAvailability>, AppError> {
    Ok(Json(state.catalog.seat_availability(flight_id).await?))
}
