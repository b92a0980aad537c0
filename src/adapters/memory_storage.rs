//! In-memory storage, for tests and throwaway sessions.

use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::error::KumoError;
use crate::ports::storage_port::StoragePort;

/// Clones share the same blob, so a test can keep a handle to the storage it
/// hands to a store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blob: Rc<RefCell<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: &str) -> Self {
        Self {
            blob: Rc::new(RefCell::new(Some(blob.to_string()))),
        }
    }
}

impl StoragePort for MemoryStorage {
    fn read_all(&self) -> Result<Option<String>, KumoError> {
        Ok(self.blob.borrow().clone())
    }

    fn write_all(&self, blob: &str) -> Result<(), KumoError> {
        *self.blob.borrow_mut() = Some(blob.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), KumoError> {
        self.blob.borrow_mut().take();
        Ok(())
    }
}
