//! Configuration access port trait.

use crate::domain::error::WealthlogError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Trimmed value, with blank treated as unset.
    fn get_trimmed(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Integer value, or `default` when unset. A value that is present but
    /// not an integer is `ConfigInvalid`.
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, WealthlogError> {
        match self.get_trimmed(section, key) {
            Some(value) => value.parse().map_err(|_| WealthlogError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("expected an integer, got {value:?}"),
            }),
            None => Ok(default),
        }
    }
}
