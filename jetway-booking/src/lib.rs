pub mod ledger;
pub mod workflow;

pub use ledger::BookingLedger;
pub use workflow::{BookingWorkflow, CreateBookingRequest};
