//! State store — the authoritative last-known [`ThermState`].
//!
//! Any number of readers; writers are the reconciliation paths (interrupt,
//! poll, post-actuation).  Translation happens before the write lock is
//! taken, so a writer holds the lock only for a single copy and a reader
//! always sees a snapshot produced by exactly one `reconcile` call.

use std::sync::{PoisonError, RwLock};

use super::state::{RawPins, ThermState};

pub struct StateStore {
    state: RwLock<ThermState>,
}

impl StateStore {
    pub(crate) fn new(initial: RawPins) -> Self {
        Self {
            state: RwLock::new(initial.to_state()),
        }
    }

    /// Current snapshot.
    pub fn get(&self) -> ThermState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the state derived from `raw`.  Returns the snapshot it replaced.
    pub(crate) fn reconcile(&self, raw: RawPins) -> ThermState {
        let next = raw.to_state();
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        core::mem::replace(&mut *guard, next)
    }
}
