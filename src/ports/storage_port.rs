//! Persistence port for the strategy collection.
//!
//! The whole collection lives in one serialized blob under
//! [`STORAGE_KEY`]. Implementations only move that blob; parsing and
//! consistency are the store's job.

use crate::domain::error::KumoError;

/// Fixed identifier the strategy collection is stored under.
pub const STORAGE_KEY: &str = "kumo_strategies";

pub trait StoragePort {
    /// Current blob, or `None` when nothing has been written yet.
    fn read_all(&self) -> Result<Option<String>, KumoError>;

    /// Replace the blob. Readers see either the old or the new blob, never a mix.
    fn write_all(&self, blob: &str) -> Result<(), KumoError>;

    /// Remove the blob entirely.
    fn clear(&self) -> Result<(), KumoError>;
}

impl<T: StoragePort + ?Sized> StoragePort for Box<T> {
    fn read_all(&self) -> Result<Option<String>, KumoError> {
        (**self).read_all()
    }

    fn write_all(&self, blob: &str) -> Result<(), KumoError> {
        (**self).write_all(blob)
    }

    fn clear(&self) -> Result<(), KumoError> {
        (**self).clear()
    }
}
