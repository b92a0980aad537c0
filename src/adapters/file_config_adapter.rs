//! INI file configuration adapter.

use crate::domain::error::KumoError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, KumoError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| KumoError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, KumoError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| KumoError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, KumoError> {
        self.config
            .getint(section, key)
            .map_err(|reason| KumoError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[storage]
backend = sqlite
path = /var/lib/kumo/strategies.db
pool_size = 2

[logging]
level = debug
"#;

    #[test]
    fn reads_storage_and_logging_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("storage", "backend").as_deref(), Some("sqlite"));
        assert_eq!(
            adapter.get_string("storage", "path").as_deref(),
            Some("/var/lib/kumo/strategies.db")
        );
        assert_eq!(adapter.get_int("storage", "pool_size").unwrap(), Some(2));
        assert_eq!(adapter.get_string("logging", "level").as_deref(), Some("debug"));
    }

    #[test]
    fn missing_keys_fall_back() {
        let adapter = FileConfigAdapter::from_string("[storage]\n").unwrap();
        assert_eq!(adapter.get_string("storage", "path"), None);
        assert_eq!(adapter.get_string("nope", "path"), None);
        assert_eq!(adapter.get_int("storage", "pool_size").unwrap(), None);
    }

    #[test]
    fn non_numeric_int_is_invalid() {
        let adapter = FileConfigAdapter::from_string("[storage]\npool_size = many\n").unwrap();
        match adapter.get_int("storage", "pool_size") {
            Err(KumoError::ConfigInvalid { section, key, .. }) => {
                assert_eq!(section, "storage");
                assert_eq!(key, "pool_size");
            }
            other => panic!("expected ConfigInvalid, got: {other:?}"),
        }
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[storage]\nbackend = memory\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("storage", "backend").as_deref(), Some("memory"));
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        match FileConfigAdapter::from_file("/nonexistent/kumo.ini") {
            Err(KumoError::ConfigParse { file, .. }) => assert_eq!(file, "/nonexistent/kumo.ini"),
            Err(other) => panic!("expected ConfigParse, got: {other}"),
            Ok(_) => panic!("expected error"),
        }
    }
}
