//! Persisted configuration resources
//!
//! A [`ConfigurationResource`] is the shared, read-oriented original. It is
//! only ever mutated by a working copy's save, which replaces its
//! attributes and persists them in one step.

use crate::config::WorkspaceConfig;
use crate::delegate::{ConfigurationType, DelegateRegistry};
use crate::error::{StorageError, WorkingCopyError};
use crate::storage::{ConfigurationStorage, Snapshot};
use crate::view::ConfigurationView;
use crate::working_copy::WorkingCopy;
use confcopy_model::{AttributeStore, Attributes, Location, Timestamp};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Collaborators shared by every resource of a workspace
#[derive(Clone)]
pub(crate) struct ResourceContext {
    pub(crate) storage: Arc<dyn ConfigurationStorage>,
    pub(crate) registry: Arc<DelegateRegistry>,
    pub(crate) config: Arc<WorkspaceConfig>,
}

impl fmt::Debug for ResourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceContext")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Attributes and the timestamp they were persisted at
#[derive(Debug, Clone, Default)]
struct PersistedState {
    attributes: AttributeStore,
    timestamp: Option<Timestamp>,
}

/// The durable original of a configuration
///
/// # Invariants
/// - once persisted, `attributes` are exactly what storage holds at
///   `timestamp`
/// - only [`WorkingCopy::save`] replaces the attributes
pub struct ConfigurationResource {
    id: String,
    config_type: ConfigurationType,
    location: Location,
    state: RwLock<PersistedState>,
    context: ResourceContext,
}

impl ConfigurationResource {
    pub(crate) fn from_snapshot(
        id: String,
        config_type: ConfigurationType,
        location: Location,
        snapshot: Snapshot,
        context: ResourceContext,
    ) -> Self {
        Self {
            id,
            config_type,
            location,
            state: RwLock::new(PersistedState {
                attributes: AttributeStore::from_map(snapshot.attributes),
                timestamp: Some(snapshot.timestamp),
            }),
            context,
        }
    }

    pub(crate) fn unpersisted(
        id: String,
        config_type: ConfigurationType,
        location: Location,
        context: ResourceContext,
    ) -> Self {
        Self {
            id,
            config_type,
            location,
            state: RwLock::new(PersistedState::default()),
            context,
        }
    }

    /// Timestamp of the last persisted state, `None` if never persisted
    #[must_use]
    pub fn timestamp(&self) -> Option<Timestamp> {
        self.state.read().timestamp
    }

    /// Derive an editable working copy
    ///
    /// The copy starts clean with a private copy of the current attributes
    /// and this resource's timestamp as its validation base.
    #[must_use]
    pub fn create_working_copy(self: &Arc<Self>) -> WorkingCopy {
        WorkingCopy::derive(self)
    }

    /// Re-read attributes and timestamp from storage
    ///
    /// # Errors
    /// Returns storage errors, including `NotFound` if nothing is persisted
    pub fn reload(&self) -> Result<(), WorkingCopyError> {
        let snapshot = self.context.storage.load(&self.location)?;
        *self.state.write() = PersistedState {
            attributes: AttributeStore::from_map(snapshot.attributes),
            timestamp: Some(snapshot.timestamp),
        };
        tracing::debug!("Reloaded {} at {}", self.id, snapshot.timestamp);
        Ok(())
    }

    /// Replace the attributes with `attributes` and persist them
    ///
    /// On failure the previous attributes and timestamp are restored, so a
    /// failed commit leaves nothing behind.
    pub(crate) fn commit(&self, attributes: Attributes) -> Result<Timestamp, StorageError> {
        let mut state = self.state.write();
        let previous = std::mem::take(&mut *state);
        state.attributes = AttributeStore::from_map(attributes);

        match self.context.storage.persist(&self.location, state.attributes.as_map()) {
            Ok(timestamp) => {
                state.timestamp = Some(timestamp);
                Ok(timestamp)
            }
            Err(e) => {
                *state = previous;
                Err(e)
            }
        }
    }

    /// Attributes and timestamp, read together
    pub(crate) fn read_state(&self) -> (AttributeStore, Option<Timestamp>) {
        let state = self.state.read();
        (state.attributes.clone(), state.timestamp)
    }

    pub(crate) fn context(&self) -> &ResourceContext {
        &self.context
    }
}

impl ConfigurationView for ConfigurationResource {
    fn id(&self) -> &str {
        &self.id
    }

    fn config_type(&self) -> &ConfigurationType {
        &self.config_type
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn is_working_copy(&self) -> bool {
        false
    }

    fn read_attributes<R>(&self, f: impl FnOnce(&AttributeStore) -> R) -> R {
        f(&self.state.read().attributes)
    }
}

impl fmt::Display for ConfigurationResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigurationResource {}", self.id)
    }
}

impl fmt::Debug for ConfigurationResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationResource")
            .field("id", &self.id)
            .field("type", &self.config_type.id())
            .field("location", &self.location)
            .field("timestamp", &self.timestamp())
            .finish()
    }
}
