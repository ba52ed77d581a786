use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use jetway_core::flight::{DEFAULT_AIRCRAFT, DEFAULT_GATE};
use jetway_core::repository::{BookingRepository, FlightRepository};
use jetway_core::{is_blank, BookingFilter, CoreError, CoreResult, Flight, Seat};

use crate::coerce;
use crate::locks::FlightLocks;
use crate::reconcile::SeatReconciler;
use crate::seatmap::{generate_seat_map, validate_seat_map, DEFAULT_TOTAL_SEATS};

/// Admin payload for creating a flight. Required fields are optional here so
/// a missing one surfaces as a validation error naming it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFlight {
    pub flight_number: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_datetime")]
    pub departure_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "coerce::opt_datetime")]
    pub arrival_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "coerce::opt_f64")]
    pub price: Option<f64>,
    pub aircraft: Option<String>,
    pub gate: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_i32")]
    pub total_seats: Option<i32>,
    #[serde(default, deserialize_with = "coerce::opt_i32")]
    pub available_seats: Option<i32>,
    pub seat_map: Option<Vec<Seat>>,
}

/// Partial admin update. `available_seats` is not accepted; the counter is
/// re-derived after every update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightUpdate {
    pub flight_number: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_datetime")]
    pub departure_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "coerce::opt_datetime")]
    pub arrival_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "coerce::opt_f64")]
    pub price: Option<f64>,
    pub aircraft: Option<String>,
    pub gate: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_i32")]
    pub total_seats: Option<i32>,
    pub seat_map: Option<Vec<Seat>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatAvailability {
    pub flight_id: Uuid,
    pub flight_number: String,
    pub seat_map: Vec<Seat>,
    pub reserved_seats: Vec<String>,
    pub available_seats: i32,
    pub total_seats: i32,
}

/// Flight administration and the public seat query surface.
pub struct FlightCatalog {
    flights: Arc<dyn FlightRepository>,
    bookings: Arc<dyn BookingRepository>,
    reconciler: Arc<SeatReconciler>,
    locks: Arc<FlightLocks>,
}

impl FlightCatalog {
    pub fn new(
        flights: Arc<dyn FlightRepository>,
        bookings: Arc<dyn BookingRepository>,
        reconciler: Arc<SeatReconciler>,
        locks: Arc<FlightLocks>,
    ) -> Self {
        Self {
            flights,
            bookings,
            reconciler,
            locks,
        }
    }

    pub async fn list_flights(&self) -> CoreResult<Vec<Flight>> {
        Ok(self.flights.list_flights().await?)
    }

    pub async fn get_flight(&self, id: Uuid) -> CoreResult<Flight> {
        self.flights
            .get_flight(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create_flight(&self, req: NewFlight) -> CoreResult<Flight> {
        let mut missing = Vec::new();
        if is_blank(req.flight_number.as_deref()) {
            missing.push("flight_number");
        }
        if is_blank(req.origin.as_deref()) {
            missing.push("origin");
        }
        if is_blank(req.destination.as_deref()) {
            missing.push("destination");
        }
        if req.departure_time.is_none() {
            missing.push("departure_time");
        }
        if req.arrival_time.is_none() {
            missing.push("arrival_time");
        }
        if req.price.is_none() {
            missing.push("price");
        }
        if !missing.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let flight_number = trimmed(req.flight_number);
        let departure_time = req.departure_time.unwrap_or_default();
        let arrival_time = req.arrival_time.unwrap_or_default();
        let price = req.price.unwrap_or_default();
        let total_seats = req.total_seats.unwrap_or(DEFAULT_TOTAL_SEATS);

        check_schedule(departure_time, arrival_time)?;
        check_price(price)?;
        check_total_seats(total_seats)?;

        let available_seats = req.available_seats.unwrap_or(total_seats);
        if available_seats < 0 || available_seats > total_seats {
            return Err(CoreError::ValidationError(format!(
                "available_seats must be between 0 and {}",
                total_seats
            )));
        }

        let seat_map = match req.seat_map {
            Some(seat_map) if !seat_map.is_empty() => {
                validate_seat_map(&seat_map, total_seats).map_err(CoreError::ValidationError)?;
                seat_map
            }
            _ => generate_seat_map(total_seats),
        };

        if self.flights.find_by_number(&flight_number).await?.is_some() {
            return Err(duplicate_number(&flight_number));
        }

        let now = Utc::now();
        let flight = Flight {
            id: Uuid::new_v4(),
            flight_number,
            origin: trimmed(req.origin),
            destination: trimmed(req.destination),
            departure_time,
            arrival_time,
            price,
            aircraft: non_blank_or(req.aircraft, DEFAULT_AIRCRAFT),
            gate: non_blank_or(req.gate, DEFAULT_GATE),
            total_seats,
            available_seats,
            seat_map,
            created_at: now,
            updated_at: now,
        };

        self.flights.insert_flight(&flight).await.map_err(|e| match e {
            jetway_core::StoreError::Duplicate(_) => duplicate_number(&flight.flight_number),
            other => other.into(),
        })?;

        info!("Created flight {} ({})", flight.flight_number, flight.id);
        Ok(flight)
    }

    /// Apply a partial update, then re-derive the seat counter. Changing
    /// `total_seats` without a map regenerates the default layout; a layout
    /// that would drop a seat held by a CONFIRMED booking is rejected.
    pub async fn update_flight(&self, id: Uuid, req: FlightUpdate) -> CoreResult<Flight> {
        // Held for the seat check, the write and the reconcile so no booking
        // lands in between.
        let guard = self.locks.acquire(id).await;
        let mut flight = self.get_flight(id).await?;

        if let Some(number) = req.flight_number {
            let number = required_text("flight_number", number)?;
            if number != flight.flight_number {
                if let Some(other) = self.flights.find_by_number(&number).await? {
                    if other.id != flight.id {
                        return Err(duplicate_number(&number));
                    }
                }
            }
            flight.flight_number = number;
        }
        if let Some(origin) = req.origin {
            flight.origin = required_text("origin", origin)?;
        }
        if let Some(destination) = req.destination {
            flight.destination = required_text("destination", destination)?;
        }
        if let Some(departure_time) = req.departure_time {
            flight.departure_time = departure_time;
        }
        if let Some(arrival_time) = req.arrival_time {
            flight.arrival_time = arrival_time;
        }
        if let Some(price) = req.price {
            check_price(price)?;
            flight.price = price;
        }
        if let Some(aircraft) = req.aircraft {
            flight.aircraft = non_blank_or(Some(aircraft), DEFAULT_AIRCRAFT);
        }
        if let Some(gate) = req.gate {
            flight.gate = non_blank_or(Some(gate), DEFAULT_GATE);
        }
        check_schedule(flight.departure_time, flight.arrival_time)?;

        let previous_total = flight.total_seats;
        if let Some(total_seats) = req.total_seats {
            check_total_seats(total_seats)?;
            flight.total_seats = total_seats;
        }

        let new_map = match req.seat_map {
            Some(seat_map) if !seat_map.is_empty() => {
                validate_seat_map(&seat_map, flight.total_seats)
                    .map_err(CoreError::ValidationError)?;
                Some(seat_map)
            }
            _ if flight.total_seats != previous_total => Some(generate_seat_map(flight.total_seats)),
            _ => None,
        };

        if let Some(seat_map) = new_map {
            let codes: HashSet<&str> = seat_map.iter().map(|s| s.code.as_str()).collect();
            for held in self.reserved_seats(flight.id).await? {
                if !codes.contains(held.as_str()) {
                    return Err(CoreError::ValidationError(format!(
                        "Seat {} is held by a confirmed booking and cannot be removed",
                        held
                    )));
                }
            }
            flight.seat_map = seat_map;
        }

        flight.updated_at = Utc::now();
        let updated = self.flights.update_flight(&flight).await.map_err(|e| match e {
            jetway_core::StoreError::Duplicate(_) => duplicate_number(&flight.flight_number),
            other => other.into(),
        })?;
        if !updated {
            return Err(not_found(id));
        }

        self.reconciler.recalculate(id).await?;
        drop(guard);
        info!("Updated flight {} ({})", flight.flight_number, flight.id);

        self.get_flight(id).await
    }

    /// Hard delete. Bookings referencing the flight are left in place.
    pub async fn delete_flight(&self, id: Uuid) -> CoreResult<()> {
        let _guard = self.locks.acquire(id).await;
        if !self.flights.delete_flight(id).await? {
            return Err(not_found(id));
        }
        info!("Deleted flight {}", id);
        Ok(())
    }

    /// Seat codes held by CONFIRMED bookings on the flight.
    pub async fn reserved_seats(&self, flight_id: Uuid) -> CoreResult<Vec<String>> {
        let confirmed = self
            .bookings
            .find_bookings(&BookingFilter::confirmed_on(flight_id))
            .await?;

        Ok(confirmed
            .into_iter()
            .flat_map(|b| b.seat_numbers)
            .collect())
    }

    /// Seat layout plus occupancy. Reconciles first so the returned counter
    /// reflects the ledger.
    pub async fn seat_availability(&self, flight_id: Uuid) -> CoreResult<SeatAvailability> {
        if self.reconciler.recalculate(flight_id).await?.is_none() {
            return Err(not_found(flight_id));
        }

        let flight = self.get_flight(flight_id).await?;
        let reserved_seats = self.reserved_seats(flight_id).await?;

        Ok(SeatAvailability {
            flight_id: flight.id,
            flight_number: flight.flight_number,
            seat_map: flight.seat_map,
            reserved_seats,
            available_seats: flight.available_seats,
            total_seats: flight.total_seats,
        })
    }

    /// Insert the sample schedule, skipping flight numbers that already
    /// exist, then reconcile what was inserted.
    pub async fn seed_flights(&self) -> CoreResult<Vec<Flight>> {
        let mut seeded = Vec::new();

        for sample in sample_flights(Utc::now()) {
            let number = sample.flight_number.clone().unwrap_or_default();
            if self.flights.find_by_number(&number).await?.is_some() {
                info!("Seed flight {} already exists, skipping", number);
                continue;
            }

            let flight = self.create_flight(sample).await?;
            self.reconciler.recalculate(flight.id).await?;
            seeded.push(self.get_flight(flight.id).await?);
        }

        info!("Seeded {} flights", seeded.len());
        Ok(seeded)
    }
}

fn sample_flights(now: DateTime<Utc>) -> Vec<NewFlight> {
    let sample = |number: &str,
                  origin: &str,
                  destination: &str,
                  depart_in: i64,
                  duration: i64,
                  price: f64,
                  aircraft: &str,
                  gate: &str,
                  seats: i32| {
        let departure = now + Duration::hours(depart_in);
        NewFlight {
            flight_number: Some(number.to_string()),
            origin: Some(origin.to_string()),
            destination: Some(destination.to_string()),
            departure_time: Some(departure),
            arrival_time: Some(departure + Duration::hours(duration)),
            price: Some(price),
            aircraft: Some(aircraft.to_string()),
            gate: Some(gate.to_string()),
            total_seats: Some(seats),
            available_seats: None,
            seat_map: None,
        }
    };

    vec![
        sample("AI101", "JFK", "LAX", 24, 3, 420.0, "Boeing 777", "A3", 60),
        sample("AI205", "ORD", "MIA", 48, 4, 320.0, "Airbus A320", "B12", 48),
        sample("AI509", "SFO", "SEA", 12, 2, 180.0, "Embraer 175", "C4", 30),
    ]
}

fn not_found(id: Uuid) -> CoreError {
    CoreError::NotFound(format!("Flight {} not found", id))
}

fn duplicate_number(number: &str) -> CoreError {
    CoreError::Conflict(format!("Flight number {} already exists", number))
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn non_blank_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

fn required_text(field: &str, value: String) -> CoreResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::ValidationError(format!("{} cannot be empty", field)));
    }
    Ok(value.to_string())
}

fn check_schedule(departure: DateTime<Utc>, arrival: DateTime<Utc>) -> CoreResult<()> {
    if arrival < departure {
        return Err(CoreError::ValidationError(
            "arrival_time must not be before departure_time".to_string(),
        ));
    }
    Ok(())
}

fn check_price(price: f64) -> CoreResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(CoreError::ValidationError("price must be a non-negative number".to_string()));
    }
    Ok(())
}

fn check_total_seats(total_seats: i32) -> CoreResult<()> {
    if total_seats <= 0 {
        return Err(CoreError::ValidationError("total_seats must be positive".to_string()));
    }
    Ok(())
}
