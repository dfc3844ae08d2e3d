//! Workspace façade
//!
//! Bundles the collaborators (storage, type registry, configuration) and
//! hands out originals and fresh working copies bound to them.

use crate::config::WorkspaceConfig;
use crate::delegate::{ConfigurationType, DelegateRegistry};
use crate::error::WorkingCopyError;
use crate::resource::{ConfigurationResource, ResourceContext};
use crate::storage::ConfigurationStorage;
use crate::working_copy::WorkingCopy;
use confcopy_model::{keys, AttributeValue, Location};
use std::sync::Arc;

/// Entry point for opening and creating configurations
#[derive(Debug, Clone)]
pub struct Workspace {
    context: ResourceContext,
}

impl Workspace {
    /// Create a workspace over `storage`
    #[must_use]
    pub fn new(
        config: WorkspaceConfig,
        storage: Arc<dyn ConfigurationStorage>,
        registry: DelegateRegistry,
    ) -> Self {
        tracing::debug!("Workspace with {} configuration types", registry.len());
        Self {
            context: ResourceContext {
                storage,
                registry: Arc::new(registry),
                config: Arc::new(config),
            },
        }
    }

    /// Workspace configuration
    #[must_use]
    pub fn config(&self) -> &WorkspaceConfig {
        &self.context.config
    }

    /// Storage collaborator
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn ConfigurationStorage> {
        &self.context.storage
    }

    /// Type registry
    #[must_use]
    pub fn registry(&self) -> &DelegateRegistry {
        &self.context.registry
    }

    /// Descriptor for `type_id`; a placeholder if it is not registered
    #[must_use]
    pub fn configuration_type(&self, type_id: &str) -> ConfigurationType {
        self.context
            .registry
            .get_type(type_id)
            .cloned()
            .unwrap_or_else(|| ConfigurationType::unregistered(type_id))
    }

    /// Whether anything is persisted at `location`
    ///
    /// # Errors
    /// Returns storage errors
    pub fn exists(&self, location: &Location) -> Result<bool, WorkingCopyError> {
        Ok(self.context.storage.current_timestamp(location)?.is_some())
    }

    /// Load the original persisted at `location`
    ///
    /// The type comes from the `configuration-type-id` attribute; the id
    /// from `id`, falling back to the file stem of the location.
    ///
    /// # Errors
    /// - `Storage` if nothing can be loaded
    /// - `InvalidResource` if the type attribute is missing or not a string
    pub fn open(&self, location: &Location) -> Result<Arc<ConfigurationResource>, WorkingCopyError> {
        let snapshot = self.context.storage.load(location)?;

        let type_id = match snapshot.attributes.get(keys::CONFIGURATION_TYPE_ID) {
            Some(AttributeValue::String(type_id)) => type_id.clone(),
            _ => {
                return Err(WorkingCopyError::InvalidResource {
                    location: location.clone(),
                    reason: format!("missing string attribute {}", keys::CONFIGURATION_TYPE_ID),
                })
            }
        };
        let id = snapshot
            .attributes
            .get(keys::ID)
            .and_then(AttributeValue::as_str)
            .map(str::to_string)
            .or_else(|| location.file_stem())
            .ok_or_else(|| WorkingCopyError::InvalidResource {
                location: location.clone(),
                reason: "no id".to_string(),
            })?;

        tracing::debug!("Opened {} ({}) at {}", id, type_id, snapshot.timestamp);
        Ok(Arc::new(ConfigurationResource::from_snapshot(
            id,
            self.configuration_type(&type_id),
            location.clone(),
            snapshot,
            self.context.clone(),
        )))
    }

    /// Create a fresh, dirty working copy with no original
    #[must_use]
    pub fn create_working_copy(
        &self,
        id: impl Into<String>,
        location: Location,
        config_type: ConfigurationType,
    ) -> WorkingCopy {
        WorkingCopy::fresh(id.into(), config_type, location, self.context.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::PROPERTIES_TYPE_ID;
    use crate::error::StorageError;
    use crate::storage::MemoryStorage;
    use crate::view::ConfigurationView;
    use confcopy_model::Attributes;

    fn workspace(storage: Arc<MemoryStorage>) -> Workspace {
        Workspace::new(WorkspaceConfig::default(), storage, DelegateRegistry::with_defaults())
    }

    #[test]
    fn open_reads_type_and_id() {
        let storage = Arc::new(MemoryStorage::new());
        let location = Location::from("servers/web.json");
        let mut attributes = Attributes::new();
        attributes.insert(keys::ID.to_string(), "web".into());
        attributes.insert(keys::CONFIGURATION_TYPE_ID.to_string(), PROPERTIES_TYPE_ID.into());
        storage.persist(&location, &attributes).unwrap();

        let original = workspace(Arc::clone(&storage)).open(&location).unwrap();
        assert_eq!(original.id(), "web");
        assert_eq!(original.config_type().name(), "Properties");
        assert!(original.timestamp().is_some());
    }

    #[test]
    fn open_falls_back_to_file_stem() {
        let storage = Arc::new(MemoryStorage::new());
        let location = Location::from("servers/tomcat.json");
        let mut attributes = Attributes::new();
        attributes.insert(keys::CONFIGURATION_TYPE_ID.to_string(), "jetty".into());
        storage.persist(&location, &attributes).unwrap();

        let original = workspace(storage).open(&location).unwrap();
        assert_eq!(original.id(), "tomcat");
        assert_eq!(original.config_type(), &ConfigurationType::unregistered("jetty"));
    }

    #[test]
    fn open_without_type_is_invalid() {
        let storage = Arc::new(MemoryStorage::new());
        let location = Location::from("x.json");
        storage.persist(&location, &Attributes::new()).unwrap();

        assert!(matches!(
            workspace(storage).open(&location),
            Err(WorkingCopyError::InvalidResource { .. })
        ));
    }

    #[test]
    fn open_missing() {
        let ws = workspace(Arc::new(MemoryStorage::new()));
        assert!(matches!(
            ws.open(&Location::from("none.json")),
            Err(WorkingCopyError::Storage(StorageError::NotFound(_)))
        ));
        assert!(!ws.exists(&Location::from("none.json")).unwrap());
    }
}
