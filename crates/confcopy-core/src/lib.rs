//! confcopy core - editable configuration resources
//!
//! Implements the working-copy protocol:
//! - Derive an isolated, editable [`WorkingCopy`] from a persisted
//!   [`ConfigurationResource`], or create one fresh
//! - Track dirtiness and notify listeners of real changes only
//! - Lazily create one type-specific [`ConfigurationDelegate`] per copy
//! - Save with optimistic-concurrency validation against the original's
//!   persisted timestamp
//!
//! # Example
//!
//! ```rust
//! use confcopy_core::prelude::*;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), WorkingCopyError> {
//! let storage = Arc::new(MemoryStorage::new());
//! let workspace = Workspace::new(
//!     WorkspaceConfig::default(),
//!     storage.clone(),
//!     DelegateRegistry::with_defaults(),
//! );
//!
//! let location = Location::from("web.json");
//! let fresh = workspace.create_working_copy(
//!     "web",
//!     location.clone(),
//!     workspace.configuration_type(PROPERTIES_TYPE_ID),
//! );
//! fresh.set_defaults(&NullProgress)?;
//! fresh.save(false, &NullProgress)?;
//!
//! // Someone else edits the same configuration
//! let original = workspace.open(&location)?;
//! let editor = original.create_working_copy();
//! editor.set_attribute("port", 8080);
//! storage.touch(&location);
//!
//! let err = editor.save(false, &NullProgress).unwrap_err();
//! assert!(err.is_stale());
//! editor.save(true, &NullProgress)?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod delegate;
pub mod error;
pub mod progress;
pub mod resource;
pub mod state;
pub mod storage;
pub mod validator;
pub mod view;
pub mod working_copy;
pub mod workspace;

pub use config::WorkspaceConfig;
pub use delegate::{
    ConfigurationDelegate, ConfigurationType, DelegateFactory, DelegateRegistry,
    PropertiesDelegate, RuntimeDescriptor, PROPERTIES_TYPE_ID,
};
pub use error::{ConfigError, DelegateError, RegistryError, StorageError, WorkingCopyError};
pub use progress::{ensure_not_cancelled, NullProgress, ProgressMonitor, ProgressTracker};
pub use resource::ConfigurationResource;
pub use state::SaveState;
pub use storage::{ConfigurationStorage, FileStorage, MemoryStorage, Snapshot};
pub use validator::TimestampValidator;
pub use view::ConfigurationView;
pub use working_copy::WorkingCopy;
pub use workspace::Workspace;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with confcopy
    pub use crate::{
        ConfigurationDelegate, ConfigurationResource, ConfigurationStorage, ConfigurationType,
        ConfigurationView, DelegateError, DelegateRegistry, FileStorage, MemoryStorage,
        NullProgress, ProgressMonitor, SaveState, WorkingCopy, WorkingCopyError, Workspace,
        WorkspaceConfig, PROPERTIES_TYPE_ID,
    };
    pub use confcopy_model::{keys, AttributeValue, Location, PropertyChangeEvent, Timestamp};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
