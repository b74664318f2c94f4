use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{SizeEntry, SizeStore, StoreError};

/// Process-local store, for tests and runs that should not touch disk.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<SizeEntry>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<SizeEntry>) -> Self {
        MemoryStore {
            entries: Mutex::new(entries),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of completed `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SizeStore for MemoryStore {
    fn load(&self) -> Result<Vec<SizeEntry>, StoreError> {
        let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    fn save(&self, entries: &[SizeEntry]) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        *guard = entries.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
