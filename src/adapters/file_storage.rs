//! JSON file storage. The file holds the serialized collection and nothing else.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::error::KumoError;
use crate::ports::storage_port::StoragePort;

pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StoragePort for FileStorage {
    fn read_all(&self) -> Result<Option<String>, KumoError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(KumoError::StorageRead {
                reason: format!("{}: {e}", self.path.display()),
            }),
        }
    }

    // Written to a sibling file first, then renamed over the target.
    fn write_all(&self, blob: &str) -> Result<(), KumoError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let staging = self.staging_path();
        fs::write(&staging, blob).map_err(|e| KumoError::StorageWrite {
            reason: format!("{}: {e}", staging.display()),
        })?;
        fs::rename(&staging, &self.path).map_err(|e| KumoError::StorageWrite {
            reason: format!("{}: {e}", self.path.display()),
        })?;
        debug!(path = %self.path.display(), bytes = blob.len(), "wrote strategy file");
        Ok(())
    }

    fn clear(&self) -> Result<(), KumoError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
