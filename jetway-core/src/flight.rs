use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

pub const DEFAULT_AIRCRAFT: &str = "A320";
pub const DEFAULT_GATE: &str = "TBD";

/// Cabin class of a single seat
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatClass {
    Economy,
    Business,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Seat {
    pub code: String,
    pub class: SeatClass,
}

impl Seat {
    pub fn new(code: impl Into<String>, class: SeatClass) -> Self {
        Self { code: code.into(), class }
    }
}

/// A scheduled flight with a fixed seat inventory.
///
/// `available_seats` is a denormalized counter. The booking ledger is the
/// source of truth and the reconciler converges the counter to
/// `total_seats - Σ seats of CONFIRMED bookings`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price: f64,
    pub aircraft: String,
    pub gate: String,
    pub total_seats: i32,
    pub available_seats: i32,
    pub seat_map: Vec<Seat>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flight {
    pub fn has_seat(&self, code: &str) -> bool {
        self.seat_map.iter().any(|seat| seat.code == code)
    }
}
