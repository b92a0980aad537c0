//! Store configuration, read and validated from a [`ConfigPort`].

use std::path::PathBuf;

use crate::domain::error::KumoError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_FILE_PATH: &str = "kumo_strategies.json";
pub const DEFAULT_POOL_SIZE: u32 = 4;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    File,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
    pub pool_size: u32,
    pub log_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: PathBuf::from(DEFAULT_FILE_PATH),
            pool_size: DEFAULT_POOL_SIZE,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, KumoError> {
        let backend = parse_backend(config)?;
        let path = parse_path(config, backend)?;
        let pool_size = parse_pool_size(config)?;
        let log_level = parse_log_level(config)?;
        Ok(Self {
            backend,
            path,
            pool_size,
            log_level,
        })
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> KumoError {
    KumoError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_backend(config: &dyn ConfigPort) -> Result<StorageBackend, KumoError> {
    let raw = config
        .get_string("storage", "backend")
        .unwrap_or_else(|| "file".to_string());
    match raw.trim().to_lowercase().as_str() {
        "file" => Ok(StorageBackend::File),
        "sqlite" if cfg!(feature = "sqlite") => Ok(StorageBackend::Sqlite),
        "sqlite" => Err(invalid(
            "storage",
            "backend",
            "sqlite backend requires the 'sqlite' feature",
        )),
        "memory" => Ok(StorageBackend::Memory),
        other => Err(invalid(
            "storage",
            "backend",
            format!("unknown backend '{other}', expected file, sqlite or memory"),
        )),
    }
}

fn parse_path(config: &dyn ConfigPort, backend: StorageBackend) -> Result<PathBuf, KumoError> {
    match config.get_string("storage", "path") {
        Some(p) if p.trim().is_empty() => Err(invalid("storage", "path", "path must not be empty")),
        Some(p) => Ok(PathBuf::from(p.trim())),
        None if backend == StorageBackend::Sqlite => Err(KumoError::ConfigMissing {
            section: "storage".to_string(),
            key: "path".to_string(),
        }),
        None => Ok(PathBuf::from(DEFAULT_FILE_PATH)),
    }
}

fn parse_pool_size(config: &dyn ConfigPort) -> Result<u32, KumoError> {
    let value = config
        .get_int("storage", "pool_size")?
        .unwrap_or(DEFAULT_POOL_SIZE as i64);
    if !(1..=32).contains(&value) {
        return Err(invalid("storage", "pool_size", "pool_size must be between 1 and 32"));
    }
    Ok(value as u32)
}

fn parse_log_level(config: &dyn ConfigPort) -> Result<String, KumoError> {
    let level = config
        .get_string("logging", "level")
        .map(|l| l.trim().to_lowercase())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(invalid(
            "logging",
            "level",
            format!("unknown level '{level}', expected one of {}", LOG_LEVELS.join(", ")),
        ));
    }
    Ok(level)
}
