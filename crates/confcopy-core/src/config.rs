//! Workspace configuration
//!
//! Loaded from TOML; every field has a default, so an empty file is valid.
//!
//! ```toml
//! storage_root = "/var/lib/confcopy"
//! reject_occupied_locations = true
//! log_delegate_timing = false
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Workspace configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory relative locations are resolved against by file storage
    pub storage_root: PathBuf,
    /// Refuse an unforced save of a new configuration onto an occupied location
    pub reject_occupied_locations: bool,
    /// Log how long delegate creation took
    pub log_delegate_timing: bool,
}

impl WorkspaceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With storage root
    #[inline]
    #[must_use]
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    /// With occupied-location policy
    #[inline]
    #[must_use]
    pub fn with_reject_occupied_locations(mut self, reject: bool) -> Self {
        self.reject_occupied_locations = reject;
        self
    }

    /// With delegate timing logs
    #[inline]
    #[must_use]
    pub fn with_delegate_timing(mut self, enabled: bool) -> Self {
        self.log_delegate_timing = enabled;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML for this structure
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("."),
            reject_occupied_locations: true,
            log_delegate_timing: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_is_default() {
        let config = WorkspaceConfig::from_toml_str("").unwrap();
        assert_eq!(config, WorkspaceConfig::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let config = WorkspaceConfig::from_toml_str(
            "storage_root = \"/srv/conf\"\nreject_occupied_locations = false\n",
        )
        .unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/srv/conf"));
        assert!(!config.reject_occupied_locations);
        assert!(config.log_delegate_timing);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let result = WorkspaceConfig::from_toml_str("storage_root = 3");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_delegate_timing = false").unwrap();
        let config = WorkspaceConfig::load(file.path()).unwrap();
        assert!(!config.log_delegate_timing);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = WorkspaceConfig::load("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn builder() {
        let config = WorkspaceConfig::new()
            .with_storage_root("/tmp/x")
            .with_reject_occupied_locations(false)
            .with_delegate_timing(false);
        assert_eq!(config.storage_root, PathBuf::from("/tmp/x"));
        assert!(!config.reject_occupied_locations);
        assert!(!config.log_delegate_timing);
    }
}
