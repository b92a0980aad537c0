//! Configuration access port trait.

use crate::domain::error::KumoError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `Ok(None)` when the key is absent; `ConfigInvalid` when it is present
    /// but not an integer.
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, KumoError>;
}
