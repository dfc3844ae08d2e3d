//! Built-in flat key/value configuration type

use super::{ConfigurationDelegate, RuntimeDescriptor};
use crate::error::DelegateError;
use crate::progress::{ensure_not_cancelled, ProgressMonitor};
use crate::view::ConfigurationView;
use crate::working_copy::WorkingCopy;
use confcopy_model::{keys, Attributes};
use std::path::Path;

/// Type id of [`PropertiesDelegate`]
pub const PROPERTIES_TYPE_ID: &str = "properties";

/// Delegate for plain property sets
///
/// Defaults the reserved flags, imports JSON object files and runtime
/// settings. Everything it manages lives in the attribute map, so load and
/// save have nothing extra to do.
#[derive(Debug, Default)]
pub struct PropertiesDelegate;

impl PropertiesDelegate {
    /// Create delegate
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Copy imported settings, leaving the owner's id and type untouched
    fn apply(owner: &WorkingCopy, attributes: Attributes) {
        for (key, value) in attributes {
            if keys::is_identity(&key) {
                tracing::debug!("Skipping imported identity key {} for {}", key, owner.id());
                continue;
            }
            owner.set_attribute(&key, value);
        }
    }
}

impl ConfigurationDelegate for PropertiesDelegate {
    fn set_defaults(&self, owner: &WorkingCopy) -> Result<(), DelegateError> {
        if !owner.has_attribute(keys::NAME) {
            owner.set_name(owner.id());
        }
        if !owner.has_attribute(keys::LOCKED) {
            owner.set_locked(false);
        }
        if !owner.has_attribute(keys::PRIVATE) {
            owner.set_private(false);
        }
        Ok(())
    }

    fn import_from_path(
        &self,
        owner: &WorkingCopy,
        path: &Path,
        progress: &dyn ProgressMonitor,
    ) -> Result<(), DelegateError> {
        progress.begin_subtask(&format!("Importing {}", path.display()));
        let text = std::fs::read_to_string(path).map_err(|e| {
            DelegateError::failed(format!("cannot read {}: {}", path.display(), e))
        })?;
        let attributes: Attributes = serde_json::from_str(&text).map_err(|e| {
            DelegateError::failed(format!("{} is not a property file: {}", path.display(), e))
        })?;
        ensure_not_cancelled(progress)?;

        tracing::debug!("Importing {} properties into {}", attributes.len(), owner.id());
        Self::apply(owner, attributes);
        Ok(())
    }

    fn import_from_runtime(
        &self,
        owner: &WorkingCopy,
        runtime: &RuntimeDescriptor,
        progress: &dyn ProgressMonitor,
    ) -> Result<(), DelegateError> {
        progress.begin_subtask(&format!("Importing from runtime {}", runtime.name));
        ensure_not_cancelled(progress)?;

        Self::apply(owner, runtime.attributes.clone());
        owner.set_attribute(keys::RUNTIME_ID, runtime.id.as_str());
        Ok(())
    }

    fn load(&self, _owner: &WorkingCopy, progress: &dyn ProgressMonitor) -> Result<(), DelegateError> {
        ensure_not_cancelled(progress)
    }

    fn save(&self, _owner: &WorkingCopy, progress: &dyn ProgressMonitor) -> Result<(), DelegateError> {
        ensure_not_cancelled(progress)
    }
}
