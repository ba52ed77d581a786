use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use jetway_core::manual::Manual;
use jetway_core::repository::{BookingRepository, FlightRepository, ManualRepository, UserRepository};
use jetway_core::user::normalize_email;
use jetway_core::{Booking, BookingFilter, BookingStatus, Flight, PaymentStatus, StoreError, StoreResult, User};

/// Process-local implementation of every repository trait. Backs the
/// `memory` storage backend and the test suites. Enforces the same unique
/// keys as the Postgres schema.
#[derive(Default)]
pub struct InMemoryStore {
    flights: RwLock<Vec<Flight>>,
    bookings: RwLock<Vec<Booking>>,
    users: RwLock<Vec<User>>,
    manual: RwLock<Option<Manual>>,
    counter_writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes to any flight's `available_seats` so far.
    pub fn seat_counter_writes(&self) -> usize {
        self.counter_writes.load(Ordering::SeqCst)
    }

    fn record_counter_write(&self) {
        self.counter_writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl FlightRepository for InMemoryStore {
    async fn insert_flight(&self, flight: &Flight) -> StoreResult<()> {
        let mut flights = self.flights.write().await;
        if flights.iter().any(|f| f.flight_number == flight.flight_number) {
            return Err(StoreError::Duplicate(flight.flight_number.clone()));
        }
        flights.push(flight.clone());
        Ok(())
    }

    async fn get_flight(&self, id: Uuid) -> StoreResult<Option<Flight>> {
        Ok(self.flights.read().await.iter().find(|f| f.id == id).cloned())
    }

    async fn find_by_number(&self, flight_number: &str) -> StoreResult<Option<Flight>> {
        Ok(self
            .flights
            .read()
            .await
            .iter()
            .find(|f| f.flight_number == flight_number)
            .cloned())
    }

    async fn list_flights(&self) -> StoreResult<Vec<Flight>> {
        let mut flights = self.flights.read().await.clone();
        flights.sort_by_key(|f| f.departure_time);
        Ok(flights)
    }

    async fn update_flight(&self, flight: &Flight) -> StoreResult<bool> {
        let mut flights = self.flights.write().await;
        if flights
            .iter()
            .any(|f| f.id != flight.id && f.flight_number == flight.flight_number)
        {
            return Err(StoreError::Duplicate(flight.flight_number.clone()));
        }

        match flights.iter_mut().find(|f| f.id == flight.id) {
            Some(existing) => {
                let available_seats = existing.available_seats;
                *existing = Flight {
                    available_seats,
                    ..flight.clone()
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_flight(&self, id: Uuid) -> StoreResult<bool> {
        let mut flights = self.flights.write().await;
        let before = flights.len();
        flights.retain(|f| f.id != id);
        Ok(flights.len() < before)
    }

    async fn take_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<i32>> {
        let mut flights = self.flights.write().await;
        match flights.iter_mut().find(|f| f.id == id) {
            Some(flight) if flight.available_seats >= seats => {
                flight.available_seats -= seats;
                flight.updated_at = Utc::now();
                self.record_counter_write();
                Ok(Some(flight.available_seats))
            }
            _ => Ok(None),
        }
    }

    async fn return_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<i32>> {
        let mut flights = self.flights.write().await;
        match flights.iter_mut().find(|f| f.id == id) {
            Some(flight) => {
                flight.available_seats = flight.available_seats.saturating_add(seats);
                flight.updated_at = Utc::now();
                self.record_counter_write();
                Ok(Some(flight.available_seats))
            }
            None => Ok(None),
        }
    }

    async fn set_available_seats(&self, id: Uuid, available: i32) -> StoreResult<()> {
        let mut flights = self.flights.write().await;
        if let Some(flight) = flights.iter_mut().find(|f| f.id == id) {
            flight.available_seats = available;
            flight.updated_at = Utc::now();
            self.record_counter_write();
        }
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        let mut bookings = self.bookings.write().await;

        if booking.is_confirmed() {
            let held = bookings
                .iter()
                .filter(|b| b.flight_id == booking.flight_id && b.is_confirmed())
                .flat_map(|b| b.seat_numbers.iter());
            for code in held {
                if booking.seat_numbers.contains(code) {
                    return Err(StoreError::Duplicate(code.clone()));
                }
            }
        }

        bookings.push(booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.read().await.iter().find(|b| b.id == id).cloned())
    }

    async fn find_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        // Newest insertion first so equal timestamps still come out newest-first.
        let mut matched: Vec<Booking> = bookings
            .iter()
            .rev()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        payment_status: PaymentStatus,
    ) -> StoreResult<Option<Booking>> {
        let mut bookings = self.bookings.write().await;
        Ok(bookings.iter_mut().find(|b| b.id == id).map(|booking| {
            booking.status = status;
            booking.payment_status = payment_status;
            booking.updated_at = Utc::now();
            booking.clone()
        }))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let email = normalize_email(&user.email);
        if users.iter().any(|u| normalize_email(&u.email) == email) {
            return Err(StoreError::Duplicate(email));
        }
        users.push(User {
            email,
            ..user.clone()
        });
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.iter().rev().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        phone_number: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            if let Some(name) = name {
                user.name = name.to_string();
            }
            if let Some(phone) = phone_number {
                user.phone_number = Some(phone.to_string());
            }
            user.clone()
        }))
    }
}

#[async_trait]
impl ManualRepository for InMemoryStore {
    async fn get_manual(&self) -> StoreResult<Option<Manual>> {
        Ok(self.manual.read().await.clone())
    }

    async fn save_manual(&self, manual: &Manual) -> StoreResult<()> {
        *self.manual.write().await = Some(manual.clone());
        Ok(())
    }
}
