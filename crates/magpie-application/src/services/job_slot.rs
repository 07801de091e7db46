//! Single-occupancy slot for a recurring scheduled job
//!
//! Handlers keep one daily job alive at a time. When configuration changes
//! the cron spec, the old job must be stopped before the replacement is
//! installed; [`JobSlot`] serializes that hand-over so two jobs for the same
//! purpose can never tick concurrently.

use magpie_ports::JobHandle;
use tokio::sync::Mutex;
use tracing::debug;

/// Holds at most one scheduled job, replacing stop-then-install
#[derive(Default)]
pub struct JobSlot {
    current: Mutex<Option<Box<dyn JobHandle>>>,
}

impl JobSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handle`, stopping any previously installed job first.
    ///
    /// The slot lock is held across the stop and the install, so concurrent
    /// replacements cannot leave two live jobs behind.
    pub async fn replace(&self, handle: Box<dyn JobHandle>) {
        let mut slot = self.current.lock().await;
        if let Some(old) = slot.take() {
            debug!("Stopping previous scheduled job before replacement");
            old.stop().await;
        }
        *slot = Some(handle);
    }

    /// Stop and discard the installed job, if any.
    pub async fn clear(&self) {
        let mut slot = self.current.lock().await;
        if let Some(old) = slot.take() {
            old.stop().await;
        }
    }

    /// Returns true while a job is installed
    pub async fn is_occupied(&self) -> bool {
        self.current.lock().await.is_some()
    }
}
