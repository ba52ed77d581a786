use std::sync::Arc;

use jetway_booking::{BookingLedger, BookingWorkflow};
use jetway_catalog::{FlightCatalog, FlightLocks, SeatReconciler};
use jetway_core::notifier::ReceiptNotifier;
use jetway_core::repository::{BookingRepository, FlightRepository, ManualRepository, UserRepository};
use jetway_store::database::DbClient;
use jetway_store::{
    InMemoryStore, PostgresBookingRepository, PostgresFlightRepository, PostgresManualRepository,
    PostgresUserRepository, RedisClient,
};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct RateLimit {
    pub requests: i64,
    pub window_seconds: i64,
}

/// The storage collaborators, one handle per repository trait.
#[derive(Clone)]
pub struct Repositories {
    pub flights: Arc<dyn FlightRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub users: Arc<dyn UserRepository>,
    pub manual: Arc<dyn ManualRepository>,
}

impl Repositories {
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            flights: store.clone(),
            bookings: store.clone(),
            users: store.clone(),
            manual: store,
        }
    }

    pub fn postgres(db: &DbClient) -> Self {
        let pool = db.pool.clone();
        Self {
            flights: Arc::new(PostgresFlightRepository::new(pool.clone())),
            bookings: Arc::new(PostgresBookingRepository::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            manual: Arc::new(PostgresManualRepository::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<FlightCatalog>,
    pub reconciler: Arc<SeatReconciler>,
    pub bookings: Arc<BookingWorkflow>,
    pub users: Arc<dyn UserRepository>,
    pub manual: Arc<dyn ManualRepository>,
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub rate_limit: RateLimit,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        notifier: Arc<dyn ReceiptNotifier>,
        auth: AuthConfig,
        redis: Option<Arc<RedisClient>>,
        rate_limit: RateLimit,
    ) -> Self {
        let reconciler = Arc::new(SeatReconciler::new(repos.flights.clone(), repos.bookings.clone()));
        let locks = Arc::new(FlightLocks::new());
        let catalog = Arc::new(FlightCatalog::new(
            repos.flights.clone(),
            repos.bookings.clone(),
            reconciler.clone(),
            locks.clone(),
        ));
        let bookings = Arc::new(BookingWorkflow::new(
            repos.flights.clone(),
            BookingLedger::new(repos.bookings.clone()),
            repos.users.clone(),
            reconciler.clone(),
            notifier,
            locks,
        ));

        Self {
            catalog,
            reconciler,
            bookings,
            users: repos.users,
            manual: repos.manual,
            redis,
            auth,
            rate_limit,
        }
    }
}
