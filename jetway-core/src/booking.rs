use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::flight::Flight;
use crate::payment::PaymentStatus;
use crate::user::UserSummary;

/// Booking lifecycle. CONFIRMED → CANCELLED happens at most once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// A traveler's claim on `seats` seats of one flight. Never physically deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub user_id: Uuid,
    pub passenger_name: String,
    pub passenger_email: String,
    pub seats: i32,
    pub seat_numbers: Vec<String>,
    pub contact_number: Option<String>,
    pub payment_reference: String,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Query filter over the ledger. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub flight_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn confirmed_on(flight_id: Uuid) -> Self {
        Self {
            flight_id: Some(flight_id),
            status: Some(BookingStatus::Confirmed),
            ..Self::default()
        }
    }

    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        self.flight_id.map_or(true, |id| booking.flight_id == id)
            && self.user_id.map_or(true, |id| booking.user_id == id)
            && self.status.map_or(true, |s| booking.status == s)
    }
}

/// Booking joined with its flight (and owner, for admin views).
/// `flight` is `None` once the flight has been deleted.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub flight: Option<Flight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(flight_id: Uuid, user_id: Uuid, status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            flight_id,
            user_id,
            passenger_name: "Grace".to_string(),
            passenger_email: "grace@example.com".to_string(),
            seats: 1,
            seat_numbers: vec!["3A".to_string()],
            contact_number: None,
            payment_reference: "PAY-X-1".to_string(),
            payment_status: PaymentStatus::Pending,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_filter_matching() {
        let flight = Uuid::new_v4();
        let user = Uuid::new_v4();
        let confirmed = booking(flight, user, BookingStatus::Confirmed);
        let cancelled = booking(flight, user, BookingStatus::Cancelled);
        let elsewhere = booking(Uuid::new_v4(), user, BookingStatus::Confirmed);

        let filter = BookingFilter::confirmed_on(flight);
        assert!(filter.matches(&confirmed));
        assert!(!filter.matches(&cancelled));
        assert!(!filter.matches(&elsewhere));

        assert!(BookingFilter::for_user(user).matches(&cancelled));
        assert!(!BookingFilter::for_user(Uuid::new_v4()).matches(&cancelled));
        assert!(BookingFilter::all().matches(&elsewhere));
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&BookingStatus::Cancelled).unwrap(), "\"CANCELLED\"");
        assert_eq!("CONFIRMED".parse::<BookingStatus>().unwrap(), BookingStatus::Confirmed);
        assert!("PENDING".parse::<BookingStatus>().is_err());
    }
}
