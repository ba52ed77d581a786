pub mod flight;
pub mod booking;
pub mod user;
pub mod manual;
pub mod repository;
pub mod identity;
pub mod payment;
pub mod notifier;

pub use booking::{Booking, BookingDetails, BookingFilter, BookingStatus};
pub use flight::{Flight, Seat, SeatClass};
pub use identity::{Requester, Role};
pub use payment::PaymentStatus;
pub use repository::{StoreError, StoreResult};
pub use user::{User, UserSummary};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(key) => CoreError::Conflict(key),
            StoreError::Backend(e) => CoreError::InternalError(e.to_string()),
        }
    }
}

/// True for `None`, empty and whitespace-only strings.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
