use async_trait::async_trait;
use chrono::Utc;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info};

use jetway_core::notifier::ReceiptNotifier;
use jetway_core::BookingDetails;
use jetway_shared::models::events::{BookingReceiptEvent, BOOKING_RECEIPT_TOPIC};

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic)
            .key(key)
            .payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!("Sent message to {}/{}: partition {} offset {}", topic, key, delivery.partition, delivery.offset);
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }
}

/// Build the receipt payload. Fails when the booking's flight is gone.
pub fn receipt_event(details: &BookingDetails) -> Result<BookingReceiptEvent, String> {
    let booking = &details.booking;
    let flight = details
        .flight
        .as_ref()
        .ok_or_else(|| format!("booking {} has no flight to put on a receipt", booking.id))?;

    Ok(BookingReceiptEvent {
        booking_id: booking.id,
        flight_number: flight.flight_number.clone(),
        origin: flight.origin.clone(),
        destination: flight.destination.clone(),
        departure_time: flight.departure_time,
        passenger_name: booking.passenger_name.clone(),
        passenger_email: booking.passenger_email.clone().into(),
        seat_numbers: booking.seat_numbers.clone(),
        payment_reference: booking.payment_reference.clone(),
        status: booking.status.to_string(),
        timestamp: Utc::now().timestamp(),
    })
}

/// Publishes booking receipts to the bus for the mailer to pick up.
pub struct KafkaReceiptNotifier {
    producer: EventProducer,
}

impl KafkaReceiptNotifier {
    pub fn new(producer: EventProducer) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl ReceiptNotifier for KafkaReceiptNotifier {
    async fn send_booking_receipt(
        &self,
        details: &BookingDetails,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let event = receipt_event(details)?;
        let payload = serde_json::to_string(&event)?;

        self.producer
            .publish(BOOKING_RECEIPT_TOPIC, &event.booking_id.to_string(), &payload)
            .await?;

        info!("Receipt queued for booking {} ({})", event.booking_id, event.subject());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jetway_core::{Booking, BookingStatus, Flight, PaymentStatus};
    use uuid::Uuid;

    fn details(with_flight: bool) -> BookingDetails {
        let now = Utc::now();
        let flight = Flight {
            id: Uuid::new_v4(),
            flight_number: "AI509".to_string(),
            origin: "SFO".to_string(),
            destination: "SEA".to_string(),
            departure_time: now,
            arrival_time: now,
            price: 180.0,
            aircraft: "Embraer 175".to_string(),
            gate: "C4".to_string(),
            total_seats: 30,
            available_seats: 29,
            seat_map: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        BookingDetails {
            booking: Booking {
                id: Uuid::new_v4(),
                flight_id: flight.id,
                user_id: Uuid::new_v4(),
                passenger_name: "Ada".to_string(),
                passenger_email: "ada@example.com".to_string(),
                seats: 1,
                seat_numbers: Vec::new(),
                contact_number: Some("+15550100".to_string()),
                payment_reference: "PAY-ABC-7".to_string(),
                payment_status: PaymentStatus::Paid,
                status: BookingStatus::Confirmed,
                created_at: now,
                updated_at: now,
            },
            flight: with_flight.then_some(flight),
            user: None,
        }
    }

    #[test]
    fn test_receipt_event_from_booking() {
        let event = receipt_event(&details(true)).unwrap();
        assert_eq!(event.subject(), "Booking Confirmation - AI509");
        assert_eq!(event.seat_list(), "Auto-assigned");
        assert_eq!(event.status, "CONFIRMED");
        assert_eq!(event.passenger_email.expose(), "ada@example.com");
    }

    #[test]
    fn test_receipt_requires_flight() {
        assert!(receipt_event(&details(false)).is_err());
    }
}
