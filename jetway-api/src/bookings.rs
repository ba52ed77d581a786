use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use jetway_booking::CreateBookingRequest;
use jetway_core::{BookingDetails, Requester};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_my_bookings).post(create_booking))
        .route("/v1/bookings/{id}", get(get_booking).delete(cancel_booking))
}

pub async fn create_booking(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingDetails>), AppError> {
    let Json(req) = payload?;
    let details = state.bookings.create_booking(&requester, req).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

pub async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
) -> Result<Json<Vec<BookingDetails>>, AppError> {
    Ok(Json(state.bookings.list_my_bookings(&requester).await?))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingDetails>, AppError> {
    Ok(Json(state.bookings.get_booking(&requester, booking_id).await?))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingDetails>, AppError> {
    Ok(Json(state.bookings.cancel_booking(&requester, booking_id).await?))
}
