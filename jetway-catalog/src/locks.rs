use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

type LockMap = HashMap<Uuid, Arc<AsyncMutex<()>>>;

/// One async mutex per flight, shared by every service that touches the
/// flight's seats. Booking, cancellation and flight updates on the same
/// flight run one at a time within this process.
#[derive(Default)]
pub struct FlightLocks {
    locks: Mutex<LockMap>,
}

impl FlightLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, flight_id: Uuid) -> FlightGuard<'_> {
        let lock = self.map().entry(flight_id).or_default().clone();
        let guard = lock.lock_owned().await;
        FlightGuard {
            locks: self,
            flight_id,
            guard: Some(guard),
        }
    }

    /// Number of flights with a live lock entry.
    pub fn tracked(&self) -> usize {
        self.map().len()
    }

    fn map(&self) -> MutexGuard<'_, LockMap> {
        // The map holds no invariant a panicking holder could break.
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Held for the duration of a per-flight critical section. The flight's
/// entry is dropped from the map once nobody holds or waits on it.
pub struct FlightGuard<'a> {
    locks: &'a FlightLocks,
    flight_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();

        let mut map = self.locks.map();
        let idle = map
            .get(&self.flight_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            map.remove(&self.flight_id);
        }
    }
}
