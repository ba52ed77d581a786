use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use jetway_core::repository::BookingRepository;
use jetway_core::{Booking, BookingFilter, BookingStatus, CoreResult, PaymentStatus};

/// Thin query layer over the booking repository. Holds no business rules.
#[derive(Clone)]
pub struct BookingLedger {
    repo: Arc<dyn BookingRepository>,
}

impl BookingLedger {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, booking: &Booking) -> CoreResult<()> {
        Ok(self.repo.insert_booking(booking).await?)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.repo.get_booking(id).await?)
    }

    pub async fn confirmed_for_flight(&self, flight_id: Uuid) -> CoreResult<Vec<Booking>> {
        Ok(self.repo.find_bookings(&BookingFilter::confirmed_on(flight_id)).await?)
    }

    /// Union of seat codes held by CONFIRMED bookings on the flight
    pub async fn reserved_seat_codes(&self, flight_id: Uuid) -> CoreResult<HashSet<String>> {
        Ok(self
            .confirmed_for_flight(flight_id)
            .await?
            .into_iter()
            .flat_map(|b| b.seat_numbers)
            .collect())
    }

    /// Newest first
    pub async fn for_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        Ok(self.repo.find_bookings(&BookingFilter::for_user(user_id)).await?)
    }

    /// Newest first
    pub async fn all(&self) -> CoreResult<Vec<Booking>> {
        Ok(self.repo.find_bookings(&BookingFilter::all()).await?)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        payment_status: PaymentStatus,
    ) -> CoreResult<Option<Booking>> {
        Ok(self.repo.update_status(id, status, payment_status).await?)
    }
}
