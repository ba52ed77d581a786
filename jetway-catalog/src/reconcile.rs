use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use jetway_core::repository::{BookingRepository, FlightRepository};
use jetway_core::{BookingFilter, CoreError, CoreResult, Flight};

/// Counter a flight should carry given the seats held by CONFIRMED bookings.
/// Floored at zero so an oversold ledger cannot drive it negative.
pub fn available_target(total_seats: i32, booked_seats: i64) -> i32 {
    let target = (i64::from(total_seats) - booked_seats).max(0);
    i32::try_from(target).unwrap_or(i32::MAX)
}

/// Before/after of one flight whose counter was corrected
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeatSyncResult {
    pub flight_id: Uuid,
    pub flight_number: String,
    pub before: i32,
    pub after: i32,
}

impl SeatSyncResult {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// Outcome of a full synchronization pass
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub synchronized: usize,
    pub updated: usize,
    pub results: Vec<SeatSyncResult>,
}

/// Derives a flight's available-seat counter from the booking ledger and
/// repairs it when it has drifted. The only writer of `available_seats`
/// besides the booking workflow's increment/decrement.
pub struct SeatReconciler {
    flights: Arc<dyn FlightRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl SeatReconciler {
    pub fn new(flights: Arc<dyn FlightRepository>, bookings: Arc<dyn BookingRepository>) -> Self {
        Self { flights, bookings }
    }

    /// Σ seats over CONFIRMED bookings on the flight
    pub async fn booked_seats(&self, flight_id: Uuid) -> CoreResult<i64> {
        let confirmed = self
            .bookings
            .find_bookings(&BookingFilter::confirmed_on(flight_id))
            .await?;

        Ok(confirmed.iter().map(|b| i64::from(b.seats)).sum())
    }

    /// Recompute and persist the counter. `None` when the flight does not
    /// exist. Writes only when the stored value differs, so repeated calls
    /// without a ledger change are free.
    pub async fn recalculate(&self, flight_id: Uuid) -> CoreResult<Option<i32>> {
        let Some(flight) = self.flights.get_flight(flight_id).await? else {
            return Ok(None);
        };

        let target = self.reconcile(&flight).await?;
        Ok(Some(target))
    }

    /// Reconcile one flight and report before/after. NotFound when absent.
    pub async fn sync_flight(&self, flight_id: Uuid) -> CoreResult<SeatSyncResult> {
        let flight = self
            .flights
            .get_flight(flight_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Flight {} not found", flight_id)))?;

        let after = self.reconcile(&flight).await?;

        Ok(SeatSyncResult {
            flight_id: flight.id,
            flight_number: flight.flight_number,
            before: flight.available_seats,
            after,
        })
    }

    /// Reconcile every flight; the report lists only flights that changed.
    pub async fn recalculate_all(&self) -> CoreResult<SyncReport> {
        let flights = self.flights.list_flights().await?;
        let mut results = Vec::new();

        for flight in &flights {
            let after = self.reconcile(flight).await?;
            if after != flight.available_seats {
                results.push(SeatSyncResult {
                    flight_id: flight.id,
                    flight_number: flight.flight_number.clone(),
                    before: flight.available_seats,
                    after,
                });
            }
        }

        info!("Synchronized {} flights, {} corrected", flights.len(), results.len());

        Ok(SyncReport {
            synchronized: flights.len(),
            updated: results.len(),
            results,
        })
    }

    async fn reconcile(&self, flight: &Flight) -> CoreResult<i32> {
        let booked = self.booked_seats(flight.id).await?;
        let target = available_target(flight.total_seats, booked);

        if booked > i64::from(flight.total_seats) {
            warn!(
                "Flight {} is oversold: {} seats booked of {}",
                flight.flight_number, booked, flight.total_seats
            );
        }

        if target != flight.available_seats {
            self.flights.set_available_seats(flight.id, target).await?;
            info!(
                "Corrected available seats for flight {}: {} -> {}",
                flight.flight_number, flight.available_seats, target
            );
        }

        Ok(target)
    }
}
