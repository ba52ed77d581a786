use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::pii::Masked;

/// Topic the receipt notifier publishes to.
pub const BOOKING_RECEIPT_TOPIC: &str = "booking.receipt";

/// Payload handed to the mailer behind the bus. Everything a receipt needs is
/// inlined so the consumer never has to read the data store.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingReceiptEvent {
    pub booking_id: Uuid,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub passenger_name: String,
    pub passenger_email: Masked<String>,
    pub seat_numbers: Vec<String>,
    pub payment_reference: String,
    pub status: String,
    pub timestamp: i64,
}

impl BookingReceiptEvent {
    /// Seat list as it appears on the receipt.
    pub fn seat_list(&self) -> String {
        if self.seat_numbers.is_empty() {
            "Auto-assigned".to_string()
        } else {
            self.seat_numbers.join(", ")
        }
    }

    pub fn subject(&self) -> String {
        format!("Booking Confirmation - {}", self.flight_number)
    }
}
