pub mod seatmap;
pub mod locks;
pub mod reconcile;
pub mod flights;
pub mod coerce;

pub use locks::{FlightGuard, FlightLocks};
pub use flights::{FlightCatalog, FlightUpdate, NewFlight, SeatAvailability};
pub use reconcile::{SeatReconciler, SeatSyncResult, SyncReport};
pub use seatmap::{generate_seat_map, DEFAULT_TOTAL_SEATS};
