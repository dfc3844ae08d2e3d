//! Type-specific delegates
//!
//! A [`ConfigurationDelegate`] carries the behaviour of one configuration
//! type: defaulting, import, load and save of auxiliary data. Delegates are
//! resolved through the [`DelegateRegistry`] and created lazily, at most
//! once per working copy.
//!
//! The owning [`WorkingCopy`] is passed to every hook. Delegates read and
//! write attributes through it, so changes go through the same dirty
//! tracking and notification as any other edit.

use crate::error::DelegateError;
use crate::progress::ProgressMonitor;
use crate::view::ConfigurationView;
use crate::working_copy::WorkingCopy;
use confcopy_model::{AttributeValue, Attributes};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod properties;
mod registry;

pub use properties::{PropertiesDelegate, PROPERTIES_TYPE_ID};
pub use registry::{ConfigurationType, DelegateFactory, DelegateRegistry};

/// Behaviour bound to a configuration type
///
/// Every hook has a default so implementations override only what their
/// type supports. Import hooks default to a structured "unsupported"
/// failure; the rest default to doing nothing.
///
/// # Cancellation
/// Long-running hooks should poll the progress monitor and return
/// [`DelegateError::Cancelled`] rather than finish silently.
pub trait ConfigurationDelegate: Send + Sync {
    /// Bind to the owning working copy; called once, right after construction
    ///
    /// # Errors
    /// A failure discards the delegate
    fn initialize(&self, _owner: &WorkingCopy) -> Result<(), DelegateError> {
        Ok(())
    }

    /// Populate type-specific default attributes
    ///
    /// # Errors
    /// Structured errors reach the caller; unexpected ones are logged
    fn set_defaults(&self, _owner: &WorkingCopy) -> Result<(), DelegateError> {
        Ok(())
    }

    /// Import configuration data from a filesystem path
    ///
    /// # Errors
    /// Structured errors reach the caller; unexpected ones are logged
    fn import_from_path(
        &self,
        owner: &WorkingCopy,
        _path: &Path,
        _progress: &dyn ProgressMonitor,
    ) -> Result<(), DelegateError> {
        Err(DelegateError::failed(format!(
            "type {} does not support import from a path",
            owner.config_type().id()
        )))
    }

    /// Import configuration data from an existing runtime installation
    ///
    /// # Errors
    /// Structured errors reach the caller; unexpected ones are logged
    fn import_from_runtime(
        &self,
        owner: &WorkingCopy,
        _runtime: &RuntimeDescriptor,
        _progress: &dyn ProgressMonitor,
    ) -> Result<(), DelegateError> {
        Err(DelegateError::failed(format!(
            "type {} does not support import from a runtime",
            owner.config_type().id()
        )))
    }

    /// Load persisted data into the owner
    ///
    /// Use [`WorkingCopy::load_attribute`] so loading does not dirty the
    /// working copy.
    ///
    /// # Errors
    /// Any failure discards the delegate
    fn load(&self, _owner: &WorkingCopy, _progress: &dyn ProgressMonitor) -> Result<(), DelegateError> {
        Ok(())
    }

    /// Persist delegate-managed auxiliary data during save
    ///
    /// # Errors
    /// Any failure aborts the save
    fn save(&self, _owner: &WorkingCopy, _progress: &dyn ProgressMonitor) -> Result<(), DelegateError> {
        Ok(())
    }

    /// Release resources; called once when the owner is disposed
    fn dispose(&self) {}
}

/// An installed runtime a configuration can be imported from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeDescriptor {
    /// Runtime identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Installation directory
    pub location: PathBuf,
    /// Settings the runtime exposes
    pub attributes: Attributes,
}

impl RuntimeDescriptor {
    /// Create a runtime descriptor without attributes
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: location.into(),
            attributes: Attributes::new(),
        }
    }

    /// With one attribute
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
