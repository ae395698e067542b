//! Single-flight admission gate.
//!
//! The gate bounds how many jobs run at once (one, by default). A job
//! must hold a permit for its entire lifetime; dropping the permit on
//! any exit path reopens the slot. Acquisition never waits: a full
//! gate is an immediate busy answer, not a queue.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::debug;

/// Bounded job admission. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Held for the lifetime of an admitted job. The slot is returned when
/// this is dropped.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Try to admit a job. `None` means every slot is taken.
    pub fn try_acquire(&self) -> Option<AdmissionPermit> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => Some(AdmissionPermit { _permit: permit }),
            Err(TryAcquireError::NoPermits) => {
                debug!("admission gate full");
                None
            }
            Err(TryAcquireError::Closed) => None,
        }
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected_while_permit_held() {
        let gate = AdmissionGate::new(1);

        let permit = gate.try_acquire();
        assert!(permit.is_some());
        assert!(gate.try_acquire().is_none());

        drop(permit);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn test_capacity_bounds_concurrent_admissions() {
        let gate = AdmissionGate::new(3);

        let held: Vec<_> = (0..3).map(|_| gate.try_acquire().unwrap()).collect();
        assert!(gate.try_acquire().is_none());
        assert_eq!(gate.available(), 0);

        drop(held);
        assert_eq!(gate.available(), 3);
    }

    #[test]
    fn test_zero_capacity_is_clamped_to_one() {
        let gate = AdmissionGate::new(0);
        assert_eq!(gate.capacity(), 1);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn test_gate_clones_share_the_same_slots() {
        let gate = AdmissionGate::new(1);
        let other = gate.clone();

        let _permit = gate.try_acquire().unwrap();
        assert!(other.try_acquire().is_none());
    }
}
