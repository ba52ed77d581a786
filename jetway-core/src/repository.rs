use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{Booking, BookingFilter, BookingStatus};
use crate::flight::Flight;
use crate::manual::Manual;
use crate::payment::PaymentStatus;
use crate::user::User;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique key was violated; the payload names the key.
    #[error("Duplicate key: {0}")]
    Duplicate(String),
    #[error("Storage backend failure: {0}")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository trait for flight data access
#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// Fails with `Duplicate` when the flight number is taken.
    async fn insert_flight(&self, flight: &Flight) -> StoreResult<()>;

    async fn get_flight(&self, id: Uuid) -> StoreResult<Option<Flight>>;

    async fn find_by_number(&self, flight_number: &str) -> StoreResult<Option<Flight>>;

    /// All flights ordered by departure time ascending.
    async fn list_flights(&self) -> StoreResult<Vec<Flight>>;

    /// Persists every field except `available_seats`. Returns false when absent.
    async fn update_flight(&self, flight: &Flight) -> StoreResult<bool>;

    /// Hard delete. Returns false when absent.
    async fn delete_flight(&self, id: Uuid) -> StoreResult<bool>;

    /// Conditional decrement: only applies while `available_seats >= seats`.
    /// Returns the new counter, or `None` if the flight is absent or short.
    async fn take_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<i32>>;

    /// Increment. Returns the new counter, or `None` if the flight is absent.
    async fn return_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<i32>>;

    /// Overwrite the counter. Only the reconciler calls this.
    async fn set_available_seats(&self, id: Uuid, available: i32) -> StoreResult<()>;
}

/// Repository trait for the booking ledger
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Fails with `Duplicate` when a seat code is already held by a CONFIRMED
    /// booking on the same flight; the key is the seat code.
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()>;

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// Matching bookings, newest `created_at` first.
    async fn find_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>>;

    /// Moves a booking to `status`/`payment_status`; a CANCELLED booking
    /// releases its seat codes. Returns the updated booking, `None` when absent.
    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        payment_status: PaymentStatus,
    ) -> StoreResult<Option<Booking>>;
}

/// Repository trait for the user directory
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Duplicate` when the (normalized) email is taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        phone_number: Option<&str>,
    ) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait ManualRepository: Send + Sync {
    async fn get_manual(&self) -> StoreResult<Option<Manual>>;

    async fn save_manual(&self, manual: &Manual) -> StoreResult<()>;
}
