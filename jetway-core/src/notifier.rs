use async_trait::async_trait;

use crate::booking::BookingDetails;

/// Outbound receipt delivery. Called fire-and-forget after a booking is
/// confirmed; a failure never affects the booking.
#[async_trait]
pub trait ReceiptNotifier: Send + Sync {
    async fn send_booking_receipt(
        &self,
        booking: &BookingDetails,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Notifier used when no message bus is configured.
pub struct LogNotifier;

#[async_trait]
impl ReceiptNotifier for LogNotifier {
    async fn send_booking_receipt(
        &self,
        booking: &BookingDetails,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let flight_number = booking
            .flight
            .as_ref()
            .map(|f| f.flight_number.as_str())
            .unwrap_or("unknown");

        tracing::info!(
            booking_id = %booking.booking.id,
            flight = flight_number,
            seats = ?booking.booking.seat_numbers,
            "Receipt delivery skipped (no transport configured)"
        );
        Ok(())
    }
}
