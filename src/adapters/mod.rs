//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod file_storage;
pub mod memory_storage;
#[cfg(feature = "sqlite")]
pub mod sqlite_storage;
