use blockcensus_common::ScannerId;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::ScanError;

/// The set of identifiers currently running a bulk scan.
///
/// Cloning shares the same set. Membership is held by a [`ScannerGuard`], so
/// an entry disappears whenever its scan ends, however it ends.
#[derive(Debug, Clone, Default)]
pub struct ScannerRegistry {
    active: Arc<Mutex<HashSet<ScannerId>>>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`, or fail with [`ScanError::AlreadyScanning`] if it is taken.
    pub fn try_acquire(&self, id: ScannerId) -> Result<ScannerGuard, ScanError> {
        if !self.active.lock().insert(id) {
            return Err(ScanError::AlreadyScanning(id));
        }
        Ok(ScannerGuard {
            id,
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self, id: ScannerId) -> bool {
        self.active.lock().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.active.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases its identifier from the registry on drop.
#[derive(Debug)]
pub struct ScannerGuard {
    id: ScannerId,
    active: Arc<Mutex<HashSet<ScannerId>>>,
}

impl ScannerGuard {
    pub fn id(&self) -> ScannerId {
        self.id
    }
}

impl Drop for ScannerGuard {
    fn drop(&mut self) {
        self.active.lock().remove(&self.id);
    }
}
