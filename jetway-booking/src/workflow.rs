use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use jetway_catalog::{FlightLocks, SeatReconciler};
use jetway_core::notifier::ReceiptNotifier;
use jetway_core::payment::generate_payment_reference;
use jetway_core::repository::{FlightRepository, UserRepository};
use jetway_core::{
    is_blank, Booking, BookingDetails, BookingStatus, CoreError, CoreResult, Flight, PaymentStatus,
    Requester,
};

use crate::ledger::BookingLedger;

/// Traveler's booking request as it arrives from the HTTP layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBookingRequest {
    pub flight_id: Option<Uuid>,
    pub passenger_name: Option<String>,
    pub passenger_email: Option<String>,
    pub seats: Option<i32>,
    #[serde(default)]
    pub seat_numbers: Option<Vec<String>>,
    pub contact_number: Option<String>,
    pub payment_method: Option<String>,
}

/// Orchestrates booking creation and cancellation against the flight
/// counter, the ledger and the reconciler.
pub struct BookingWorkflow {
    flights: Arc<dyn FlightRepository>,
    ledger: BookingLedger,
    users: Arc<dyn UserRepository>,
    reconciler: Arc<SeatReconciler>,
    notifier: Arc<dyn ReceiptNotifier>,
    locks: Arc<FlightLocks>,
}

impl BookingWorkflow {
    pub fn new(
        flights: Arc<dyn FlightRepository>,
        ledger: BookingLedger,
        users: Arc<dyn UserRepository>,
        reconciler: Arc<SeatReconciler>,
        notifier: Arc<dyn ReceiptNotifier>,
        locks: Arc<FlightLocks>,
    ) -> Self {
        Self {
            flights,
            ledger,
            users,
            reconciler,
            notifier,
            locks,
        }
    }

    pub async fn create_booking(
        &self,
        requester: &Requester,
        req: CreateBookingRequest,
    ) -> CoreResult<BookingDetails> {
        let mut missing = Vec::new();
        if req.flight_id.is_none() {
            missing.push("flight_id");
        }
        if is_blank(req.passenger_name.as_deref()) {
            missing.push("passenger_name");
        }
        if is_blank(req.passenger_email.as_deref()) {
            missing.push("passenger_email");
        }
        if req.seats.is_none() {
            missing.push("seats");
        }
        let (Some(flight_id), Some(seats), true) = (req.flight_id, req.seats, missing.is_empty()) else {
            return Err(CoreError::ValidationError(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };
        if seats < 1 {
            return Err(CoreError::ValidationError("seats must be at least 1".to_string()));
        }

        let user = self
            .users
            .get_user(requester.user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("User {} not found", requester.user_id)))?;
        if !user.has_phone_number() {
            return Err(CoreError::ValidationError(
                "Phone number required before booking. Please update your profile.".to_string(),
            ));
        }

        let _guard = self.locks.acquire(flight_id).await;

        let flight = self
            .flights
            .get_flight(flight_id)
            .await?
            .ok_or_else(|| flight_not_found(flight_id))?;

        if flight.available_seats < seats {
            return Err(not_enough_seats(flight.available_seats));
        }

        let reserved = self.ledger.reserved_seat_codes(flight_id).await?;
        let explicit: Vec<String> = req
            .seat_numbers
            .unwrap_or_default()
            .into_iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();

        let seat_numbers = if explicit.is_empty() {
            auto_assign(&flight, &reserved, seats)?
        } else {
            check_explicit_seats(&flight, &reserved, &explicit, seats)?;
            explicit
        };

        if self.flights.take_seats(flight_id, seats).await?.is_none() {
            // Counter moved underneath us (another process); report what is left.
            let left = self.reconciler.recalculate(flight_id).await?.unwrap_or(0);
            return Err(not_enough_seats(left));
        }

        let now = Utc::now();
        let contact_number = if is_blank(req.contact_number.as_deref()) {
            user.phone_number.clone()
        } else {
            req.contact_number.map(|c| c.trim().to_string())
        };
        let booking = Booking {
            id: Uuid::new_v4(),
            flight_id,
            user_id: user.id,
            passenger_name: req.passenger_name.unwrap_or_default().trim().to_string(),
            passenger_email: req.passenger_email.unwrap_or_default().trim().to_string(),
            seats,
            seat_numbers,
            contact_number,
            payment_reference: generate_payment_reference(),
            payment_status: PaymentStatus::at_checkout(req.payment_method.as_deref()),
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.ledger.create(&booking).await {
            // The counter was already decremented; converge it before failing.
            if let Err(reconcile_err) = self.reconciler.recalculate(flight_id).await {
                error!("Reconciliation after failed booking insert on {} failed: {}", flight_id, reconcile_err);
            }
            return Err(match err {
                CoreError::Conflict(code) => CoreError::ValidationError(format!("Seat {} is already reserved", code)),
                other => other,
            });
        }

        self.reconciler.recalculate(flight_id).await?;
        let flight = self.flights.get_flight(flight_id).await?;

        info!(
            "Booking {} confirmed on flight {}: {} seat(s) {:?}",
            booking.id, flight_id, booking.seats, booking.seat_numbers
        );

        let details = BookingDetails {
            booking,
            flight,
            user: None,
        };
        self.dispatch_receipt(details.clone());

        Ok(details)
    }

    pub async fn cancel_booking(&self, requester: &Requester, booking_id: Uuid) -> CoreResult<BookingDetails> {
        let booking = self
            .ledger
            .get(booking_id)
            .await?
            .ok_or_else(|| booking_not_found(booking_id))?;

        if !requester.can_access(booking.user_id) {
            return Err(CoreError::Forbidden("Not authorized to cancel this booking".to_string()));
        }

        let _guard = self.locks.acquire(booking.flight_id).await;

        // Re-read under the lock so two cancels cannot both pass the check.
        let booking = self
            .ledger
            .get(booking_id)
            .await?
            .ok_or_else(|| booking_not_found(booking_id))?;
        if !booking.is_confirmed() {
            return Err(CoreError::ValidationError("Booking is already cancelled".to_string()));
        }

        let cancelled = self
            .ledger
            .update_status(
                booking_id,
                BookingStatus::Cancelled,
                booking.payment_status.after_cancellation(),
            )
            .await?
            .ok_or_else(|| booking_not_found(booking_id))?;

        if self.flights.return_seats(cancelled.flight_id, cancelled.seats).await?.is_none() {
            warn!("Cancelled booking {} references missing flight {}", cancelled.id, cancelled.flight_id);
        }
        self.reconciler.recalculate(cancelled.flight_id).await?;

        info!("Booking {} cancelled, {} seat(s) released", cancelled.id, cancelled.seats);

        let flight = self.flights.get_flight(cancelled.flight_id).await?;
        Ok(BookingDetails {
            booking: cancelled,
            flight,
            user: None,
        })
    }

    pub async fn get_booking(&self, requester: &Requester, booking_id: Uuid) -> CoreResult<BookingDetails> {
        let booking = self
            .ledger
            .get(booking_id)
            .await?
            .ok_or_else(|| booking_not_found(booking_id))?;

        if !requester.can_access(booking.user_id) {
            return Err(CoreError::Forbidden("Not authorized to view this booking".to_string()));
        }

        let flight = self.flights.get_flight(booking.flight_id).await?;
        Ok(BookingDetails {
            booking,
            flight,
            user: None,
        })
    }

    /// Requester's own bookings, newest first.
    pub async fn list_my_bookings(&self, requester: &Requester) -> CoreResult<Vec<BookingDetails>> {
        let bookings = self.ledger.for_user(requester.user_id).await?;
        self.with_flights(bookings, false).await
    }

    /// Every booking with flight and owner attached. Admin only.
    pub async fn list_all_bookings(&self, requester: &Requester) -> CoreResult<Vec<BookingDetails>> {
        if !requester.is_admin() {
            return Err(CoreError::Forbidden("Admin access required".to_string()));
        }
        let bookings = self.ledger.all().await?;
        self.with_flights(bookings, true).await
    }

    async fn with_flights(&self, bookings: Vec<Booking>, with_users: bool) -> CoreResult<Vec<BookingDetails>> {
        let mut flights: HashMap<Uuid, Option<Flight>> = HashMap::new();
        let mut users = HashMap::new();
        let mut out = Vec::with_capacity(bookings.len());

        for booking in bookings {
            if !flights.contains_key(&booking.flight_id) {
                let flight = self.flights.get_flight(booking.flight_id).await?;
                flights.insert(booking.flight_id, flight);
            }
            let flight = flights.get(&booking.flight_id).cloned().flatten();

            let user = if with_users {
                if !users.contains_key(&booking.user_id) {
                    let user = self.users.get_user(booking.user_id).await?;
                    users.insert(booking.user_id, user.map(|u| u.summary()));
                }
                users.get(&booking.user_id).cloned().flatten()
            } else {
                None
            };

            out.push(BookingDetails { booking, flight, user });
        }

        Ok(out)
    }

    fn dispatch_receipt(&self, details: BookingDetails) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_booking_receipt(&details).await {
                warn!("Failed to send receipt for booking {}: {}", details.booking.id, e);
            }
        });
    }
}

/// First `seats` unreserved codes in seat-map order. A flight without a seat
/// map gets no assignment.
fn auto_assign(flight: &Flight, reserved: &HashSet<String>, seats: i32) -> CoreResult<Vec<String>> {
    if flight.seat_map.is_empty() {
        return Ok(Vec::new());
    }

    let wanted = usize::try_from(seats).unwrap_or(0);
    let picked: Vec<String> = flight
        .seat_map
        .iter()
        .filter(|seat| !reserved.contains(&seat.code))
        .take(wanted)
        .map(|seat| seat.code.clone())
        .collect();

    if picked.len() < wanted {
        return Err(CoreError::ValidationError(format!(
            "Only {} unassigned seats left on the seat map",
            picked.len()
        )));
    }
    Ok(picked)
}

fn check_explicit_seats(
    flight: &Flight,
    reserved: &HashSet<String>,
    explicit: &[String],
    seats: i32,
) -> CoreResult<()> {
    if usize::try_from(seats).ok() != Some(explicit.len()) {
        return Err(CoreError::ValidationError(
            "Number of seat numbers must match seats requested".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(explicit.len());
    for code in explicit {
        if !seen.insert(code.as_str()) {
            return Err(CoreError::ValidationError(format!("Seat {} requested more than once", code)));
        }
        if !flight.has_seat(code) {
            return Err(CoreError::ValidationError(format!("Seat {} does not exist on this flight", code)));
        }
        if reserved.contains(code) {
            return Err(CoreError::ValidationError(format!("Seat {} is already reserved", code)));
        }
    }
    Ok(())
}

fn not_enough_seats(available: i32) -> CoreError {
    CoreError::ValidationError(format!("Only {} seats available", available))
}

fn flight_not_found(id: Uuid) -> CoreError {
    CoreError::NotFound(format!("Flight {} not found", id))
}

fn booking_not_found(id: Uuid) -> CoreError {
    CoreError::NotFound(format!("Booking {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jetway_catalog::{generate_seat_map, FlightCatalog, FlightUpdate};
    use jetway_core::repository::BookingRepository;
    use jetway_core::{Role, User};
    use jetway_store::InMemoryStore;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct RecordingNotifier(mpsc::UnboundedSender<Uuid>);

    #[async_trait]
    impl ReceiptNotifier for RecordingNotifier {
        async fn send_booking_receipt(
            &self,
            booking: &BookingDetails,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.0.send(booking.booking.id)?;
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl ReceiptNotifier for FailingNotifier {
        async fn send_booking_receipt(
            &self,
            _booking: &BookingDetails,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Err("smtp relay unreachable".into())
        }
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        workflow: Arc<BookingWorkflow>,
        traveler: Requester,
        flight: Flight,
    }

    async fn fixture_with(total_seats: i32, notifier: Arc<dyn ReceiptNotifier>) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let reconciler = Arc::new(SeatReconciler::new(store.clone(), store.clone()));
        let workflow = Arc::new(BookingWorkflow::new(
            store.clone(),
            BookingLedger::new(store.clone()),
            store.clone(),
            reconciler,
            notifier,
            Arc::new(FlightLocks::new()),
        ));

        let traveler = add_user(&store, "ada@example.com", Some("+15550100"), Role::Traveler).await;

        let now = Utc::now();
        let flight = Flight {
            id: Uuid::new_v4(),
            flight_number: "AI101".to_string(),
            origin: "JFK".to_string(),
            destination: "LAX".to_string(),
            departure_time: now,
            arrival_time: now,
            price: 420.0,
            aircraft: "Boeing 777".to_string(),
            gate: "A3".to_string(),
            total_seats,
            available_seats: total_seats,
            seat_map: generate_seat_map(total_seats),
            created_at: now,
            updated_at: now,
        };
        store.insert_flight(&flight).await.unwrap();

        Fixture {
            store,
            workflow,
            traveler,
            flight,
        }
    }

    /// Flight store whose writes stall, widening the window between a
    /// flight update's seat check and its write.
    struct SlowFlightWrites(Arc<InMemoryStore>);

    #[async_trait]
    impl FlightRepository for SlowFlightWrites {
        async fn insert_flight(&self, flight: &Flight) -> jetway_core::StoreResult<()> {
            self.0.insert_flight(flight).await
        }

        async fn get_flight(&self, id: Uuid) -> jetway_core::StoreResult<Option<Flight>> {
            self.0.get_flight(id).await
        }

        async fn find_by_number(&self, flight_number: &str) -> jetway_core::StoreResult<Option<Flight>> {
            self.0.find_by_number(flight_number).await
        }

        async fn list_flights(&self) -> jetway_core::StoreResult<Vec<Flight>> {
            self.0.list_flights().await
        }

        async fn update_flight(&self, flight: &Flight) -> jetway_core::StoreResult<bool> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.0.update_flight(flight).await
        }

        async fn delete_flight(&self, id: Uuid) -> jetway_core::StoreResult<bool> {
            self.0.delete_flight(id).await
        }

        async fn take_seats(&self, id: Uuid, seats: i32) -> jetway_core::StoreResult<Option<i32>> {
            self.0.take_seats(id, seats).await
        }

        async fn return_seats(&self, id: Uuid, seats: i32) -> jetway_core::StoreResult<Option<i32>> {
            self.0.return_seats(id, seats).await
        }

        async fn set_available_seats(&self, id: Uuid, available: i32) -> jetway_core::StoreResult<()> {
            self.0.set_available_seats(id, available).await
        }
    }

    async fn fixture(total_seats: i32) -> Fixture {
        fixture_with(total_seats, Arc::new(FailingNotifier)).await
    }

    async fn add_user(store: &InMemoryStore, email: &str, phone: Option<&str>, role: Role) -> Requester {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            phone_number: phone.map(str::to_string),
            role,
            created_at: Utc::now(),
        };
        store.insert_user(&user).await.unwrap();
        Requester::new(user.id, role)
    }

    fn request(flight_id: Uuid, seats: i32, seat_numbers: &[&str]) -> CreateBookingRequest {
        CreateBookingRequest {
            flight_id: Some(flight_id),
            passenger_name: Some("Ada Lovelace".to_string()),
            passenger_email: Some("ada@example.com".to_string()),
            seats: Some(seats),
            seat_numbers: Some(seat_numbers.iter().map(|s| s.to_string()).collect()),
            contact_number: None,
            payment_method: None,
        }
    }

    async fn available(f: &Fixture) -> i32 {
        f.store.get_flight(f.flight.id).await.unwrap().unwrap().available_seats
    }

    #[tokio::test]
    async fn test_booking_decrements_counter() {
        let f = fixture(10).await;
        let details = f
            .workflow
            .create_booking(&f.traveler, request(f.flight.id, 3, &[]))
            .await
            .unwrap();

        assert_eq!(details.booking.status, BookingStatus::Confirmed);
        assert_eq!(details.booking.seat_numbers, vec!["1A", "1B", "1C"]);
        assert_eq!(details.booking.payment_status, PaymentStatus::Pending);
        assert_eq!(details.booking.contact_number.as_deref(), Some("+15550100"));
        assert!(details.booking.payment_reference.starts_with("PAY-"));
        assert_eq!(details.flight.as_ref().map(|fl| fl.available_seats), Some(7));
        assert_eq!(available(&f).await, 7);

        let ledger = f.workflow.list_my_bookings(&f.traveler).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].booking.seats, 3);
    }

    #[tokio::test]
    async fn test_cancel_after_two_bookings() {
        let f = fixture(10).await;
        let first = f
            .workflow
            .create_booking(&f.traveler, request(f.flight.id, 3, &[]))
            .await
            .unwrap();
        let second = f
            .workflow
            .create_booking(&f.traveler, request(f.flight.id, 4, &[]))
            .await
            .unwrap();
        assert_eq!(second.booking.seat_numbers, vec!["1D", "1E", "1F", "2A"]);

        let cancelled = f.workflow.cancel_booking(&f.traveler, first.booking.id).await.unwrap();
        assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
        assert_eq!(available(&f).await, 6);

        // Released seats are handed out again in map order.
        let third = f
            .workflow
            .create_booking(&f.traveler, request(f.flight.id, 2, &[]))
            .await
            .unwrap();
        assert_eq!(third.booking.seat_numbers, vec!["1A", "1B"]);
    }

    #[tokio::test]
    async fn test_reserved_explicit_seat_rejected() {
        let f = fixture(10).await;
        f.workflow
            .create_booking(&f.traveler, request(f.flight.id, 1, &["1A"]))
            .await
            .unwrap();

        let result = f
            .workflow
            .create_booking(&f.traveler, request(f.flight.id, 2, &["1A", "1B"]))
            .await;
        match result {
            Err(CoreError::ValidationError(msg)) => assert!(msg.contains("1A")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(available(&f).await, 9);
    }

    #[tokio::test]
    async fn test_over_capacity_fails_before_any_write() {
        let f = fixture(3).await;
        let result = f
            .workflow
            .create_booking(&f.traveler, request(f.flight.id, 5, &[]))
            .await;

        assert!(matches!(result, Err(CoreError::ValidationError(_))));
        assert_eq!(f.store.seat_counter_writes(), 0);
        assert!(f.workflow.list_my_bookings(&f.traveler).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_phone_number_required() {
        let f = fixture(10).await;
        let no_phone = add_user(&f.store, "grace@example.com", None, Role::Traveler).await;

        let result = f
            .workflow
            .create_booking(&no_phone, request(f.flight.id, 1, &[]))
            .await;
        match result {
            Err(CoreError::ValidationError(msg)) => assert!(msg.contains("Phone number required")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_fields_and_unknown_flight() {
        let f = fixture(10).await;
        let result = f
            .workflow
            .create_booking(&f.traveler, CreateBookingRequest::default())
            .await;
        match result {
            Err(CoreError::ValidationError(msg)) => {
                assert!(msg.contains("flight_id"));
                assert!(msg.contains("seats"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let result = f
            .workflow
            .create_booking(&f.traveler, request(Uuid::new_v4(), 1, &[]))
            .await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_explicit_seat_rules() {
        let f = fixture(10).await;
        let cases: [(i32, &[&str]); 3] = [(2, &["1A"]), (2, &["1A", "1A"]), (1, &["9Z"])];

        for (seats, codes) in cases {
            let result = f
                .workflow
                .create_booking(&f.traveler, request(f.flight.id, seats, codes))
                .await;
            assert!(matches!(result, Err(CoreError::ValidationError(_))), "{:?}", codes);
        }
        assert_eq!(available(&f).await, 10);
    }

    #[tokio::test]
    async fn test_paid_booking_refunded_on_cancel() {
        let f = fixture(10).await;
        let mut req = request(f.flight.id, 1, &[]);
        req.payment_method = Some("card".to_string());
        req.contact_number = Some(" +442071838750 ".to_string());

        let created = f.workflow.create_booking(&f.traveler, req).await.unwrap();
        assert_eq!(created.booking.payment_status, PaymentStatus::Paid);
        assert_eq!(created.booking.contact_number.as_deref(), Some("+442071838750"));

        let cancelled = f.workflow.cancel_booking(&f.traveler, created.booking.id).await.unwrap();
        assert_eq!(cancelled.booking.payment_status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn test_double_cancel_leaves_counter_alone() {
        let f = fixture(10).await;
        let created = f
            .workflow
            .create_booking(&f.traveler, request(f.flight.id, 2, &[]))
            .await
            .unwrap();
        f.workflow.cancel_booking(&f.traveler, created.booking.id).await.unwrap();

        let writes = f.store.seat_counter_writes();
        let again = f.workflow.cancel_booking(&f.traveler, created.booking.id).await;
        assert!(matches!(again, Err(CoreError::ValidationError(_))));
        assert_eq!(f.store.seat_counter_writes(), writes);
        assert_eq!(available(&f).await, 10);
    }

    #[tokio::test]
    async fn test_owner_or_admin_only() {
        let f = fixture(10).await;
        let created = f
            .workflow
            .create_booking(&f.traveler, request(f.flight.id, 1, &[]))
            .await
            .unwrap();
        let stranger = add_user(&f.store, "eve@example.com", Some("+15550199"), Role::Traveler).await;
        let admin = add_user(&f.store, "ops@example.com", None, Role::Admin).await;

        let id = created.booking.id;
        assert!(matches!(f.workflow.get_booking(&stranger, id).await, Err(CoreError::Forbidden(_))));
        assert!(matches!(f.workflow.cancel_booking(&stranger, id).await, Err(CoreError::Forbidden(_))));
        assert!(matches!(f.workflow.list_all_bookings(&stranger).await, Err(CoreError::Forbidden(_))));
        assert!(f.workflow.get_booking(&f.traveler, id).await.is_ok());

        let all = f.workflow.list_all_bookings(&admin).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user.as_ref().map(|u| u.email.as_str()), Some("ada@example.com"));

        f.workflow.cancel_booking(&admin, id).await.unwrap();
        assert!(matches!(
            f.workflow.get_booking(&f.traveler, Uuid::new_v4()).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_receipt_dispatched_after_booking() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let f = fixture_with(10, Arc::new(RecordingNotifier(tx))).await;

        let created = f
            .workflow
            .create_booking(&f.traveler, request(f.flight.id, 1, &[]))
            .await
            .unwrap();

        let sent = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert_eq!(sent, Some(created.booking.id));
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_booking() {
        let f = fixture(10).await;
        let created = f
            .workflow
            .create_booking(&f.traveler, request(f.flight.id, 1, &[]))
            .await;
        assert!(created.is_ok());
        tokio::task::yield_now().await;
        assert_eq!(available(&f).await, 9);
    }

    #[tokio::test]
    async fn test_deleted_flight_projects_as_none() {
        let f = fixture(10).await;
        let created = f
            .workflow
            .create_booking(&f.traveler, request(f.flight.id, 1, &[]))
            .await
            .unwrap();
        f.store.delete_flight(f.flight.id).await.unwrap();

        let details = f.workflow.get_booking(&f.traveler, created.booking.id).await.unwrap();
        assert!(details.flight.is_none());

        let cancelled = f.workflow.cancel_booking(&f.traveler, created.booking.id).await.unwrap();
        assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_concurrent_bookings_never_oversell() {
        let f = fixture(5).await;
        let mut handles = Vec::new();
        for _ in 0..12 {
            let workflow = f.workflow.clone();
            let traveler = f.traveler;
            let req = request(f.flight.id, 1, &[]);
            handles.push(tokio::spawn(async move { workflow.create_booking(&traveler, req).await }));
        }

        let mut seats = HashSet::new();
        let mut confirmed = 0;
        for handle in handles {
            if let Ok(details) = handle.await.unwrap() {
                confirmed += 1;
                seats.extend(details.booking.seat_numbers);
            }
        }

        assert_eq!(confirmed, 5);
        assert_eq!(seats.len(), 5);
        assert_eq!(available(&f).await, 0);
    }

    #[tokio::test]
    async fn test_flight_shrink_and_booking_do_not_interleave() {
        let f = fixture(12).await;
        let slow: Arc<dyn FlightRepository> = Arc::new(SlowFlightWrites(f.store.clone()));
        let locks = Arc::new(FlightLocks::new());
        let reconciler = Arc::new(SeatReconciler::new(slow.clone(), f.store.clone()));
        let catalog = Arc::new(FlightCatalog::new(
            slow.clone(),
            f.store.clone(),
            reconciler.clone(),
            locks.clone(),
        ));
        let workflow = Arc::new(BookingWorkflow::new(
            slow,
            BookingLedger::new(f.store.clone()),
            f.store.clone(),
            reconciler,
            Arc::new(FailingNotifier),
            locks,
        ));

        workflow
            .create_booking(&f.traveler, request(f.flight.id, 6, &["1A", "1B", "1C", "1D", "1E", "1F"]))
            .await
            .unwrap();

        let update = {
            let catalog = catalog.clone();
            let id = f.flight.id;
            tokio::spawn(async move {
                catalog
                    .update_flight(
                        id,
                        FlightUpdate {
                            total_seats: Some(6),
                            ..Default::default()
                        },
                    )
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let booking = workflow.create_booking(&f.traveler, request(f.flight.id, 1, &[])).await;

        let updated = update.await.unwrap().unwrap();
        assert_eq!(updated.total_seats, 6);
        assert_eq!(updated.available_seats, 0);
        assert!(matches!(booking, Err(CoreError::ValidationError(_))));

        let confirmed: i32 = f
            .store
            .find_bookings(&jetway_core::BookingFilter::confirmed_on(f.flight.id))
            .await
            .unwrap()
            .iter()
            .map(|b| b.seats)
            .sum();
        assert_eq!(confirmed, 6);
    }
}
