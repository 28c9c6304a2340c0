//! Per-program mutual exclusion for membership actions.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};

/// Tracks programs with an accept or decline in flight.
///
/// A second action for the same program fails fast with
/// [`ClientError::Busy`] instead of queueing behind the first.
#[derive(Debug, Clone, Default)]
pub struct ActionGate {
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl ActionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the program until the returned permit is dropped.
    pub fn try_acquire(&self, program_id: Uuid) -> ClientResult<ActionPermit> {
        if !self.lock().insert(program_id) {
            return Err(ClientError::Busy(program_id));
        }
        Ok(ActionPermit {
            in_flight: Arc::clone(&self.in_flight),
            program_id,
        })
    }

    pub fn is_busy(&self, program_id: Uuid) -> bool {
        self.lock().contains(&program_id)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<Uuid>> {
        // The set stays consistent even if a holder panicked.
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Releases its program on drop.
#[derive(Debug)]
pub struct ActionPermit {
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
    program_id: Uuid,
}

impl ActionPermit {
    pub fn program_id(&self) -> Uuid {
        self.program_id
    }
}

impl Drop for ActionPermit {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.program_id);
    }
}
