//! Type-resolution registry
//!
//! Maps configuration type ids to delegate factories. Built once, then
//! shared read-only behind an `Arc`.

use super::properties::{PropertiesDelegate, PROPERTIES_TYPE_ID};
use super::ConfigurationDelegate;
use crate::error::{DelegateError, RegistryError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Constructs a fresh delegate per call
pub type DelegateFactory =
    Arc<dyn Fn() -> Result<Arc<dyn ConfigurationDelegate>, DelegateError> + Send + Sync>;

/// Descriptor of a configuration kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigurationType {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

impl ConfigurationType {
    /// Create a descriptor
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
        }
    }

    /// Placeholder for a type id no registry knows about
    #[must_use]
    pub fn unregistered(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id)
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Type id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

struct RegisteredType {
    config_type: ConfigurationType,
    factory: DelegateFactory,
}

/// Registry of configuration types and their delegate factories
#[derive(Default)]
pub struct DelegateRegistry {
    types: HashMap<String, RegisteredType>,
}

impl DelegateRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Create registry with built-in types
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            ConfigurationType::new(PROPERTIES_TYPE_ID, "Properties")
                .with_description("Flat key/value configuration"),
            || Ok(Arc::new(PropertiesDelegate::new()) as Arc<dyn ConfigurationDelegate>),
        );
        registry
    }

    /// Register a type; replaces any previous registration of the same id
    pub fn register<F>(&mut self, config_type: ConfigurationType, factory: F)
    where
        F: Fn() -> Result<Arc<dyn ConfigurationDelegate>, DelegateError> + Send + Sync + 'static,
    {
        self.types.insert(
            config_type.id().to_string(),
            RegisteredType {
                config_type,
                factory: Arc::new(factory),
            },
        );
    }

    /// Check if type is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, type_id: &str) -> bool {
        self.types.contains_key(type_id)
    }

    /// Remove type
    #[inline]
    pub fn remove(&mut self, type_id: &str) -> bool {
        self.types.remove(type_id).is_some()
    }

    /// Descriptor for a registered type
    #[must_use]
    pub fn get_type(&self, type_id: &str) -> Option<&ConfigurationType> {
        self.types.get(type_id).map(|t| &t.config_type)
    }

    /// All registered descriptors, ordered by id
    #[must_use]
    pub fn types(&self) -> Vec<&ConfigurationType> {
        let mut types: Vec<_> = self.types.values().map(|t| &t.config_type).collect();
        types.sort_by(|a, b| a.id().cmp(b.id()));
        types
    }

    /// Get number of registered types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Construct a fresh delegate for `type_id`
    ///
    /// # Errors
    /// - `RegistryError::UnknownType` if nothing is registered
    /// - `RegistryError::Construction` if the factory fails
    pub fn create(&self, type_id: &str) -> Result<Arc<dyn ConfigurationDelegate>, RegistryError> {
        let registered = self
            .types
            .get(type_id)
            .ok_or_else(|| RegistryError::UnknownType(type_id.to_string()))?;
        (registered.factory)().map_err(|source| RegistryError::Construction {
            type_id: type_id.to_string(),
            source,
        })
    }
}

impl fmt::Debug for DelegateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateRegistry")
            .field("types", &self.types().iter().map(|t| t.id()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;
    impl ConfigurationDelegate for Nop {}

    #[test]
    fn registry_new_empty() {
        let registry = DelegateRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn registry_with_defaults() {
        let registry = DelegateRegistry::with_defaults();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(PROPERTIES_TYPE_ID));
        assert_eq!(registry.get_type(PROPERTIES_TYPE_ID).unwrap().name(), "Properties");
    }

    #[test]
    fn registry_register_and_remove() {
        let mut registry = DelegateRegistry::new();
        registry.register(ConfigurationType::new("jetty", "Jetty"), || {
            Ok(Arc::new(Nop) as Arc<dyn ConfigurationDelegate>)
        });
        assert!(registry.contains("jetty"));
        assert!(registry.create("jetty").is_ok());
        assert!(registry.remove("jetty"));
        assert!(!registry.remove("jetty"));
    }

    #[test]
    fn registry_types_sorted() {
        let mut registry = DelegateRegistry::with_defaults();
        registry.register(ConfigurationType::new("apache", "Apache"), || {
            Ok(Arc::new(Nop) as Arc<dyn ConfigurationDelegate>)
        });
        let ids: Vec<_> = registry.types().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["apache", PROPERTIES_TYPE_ID]);
    }

    #[test]
    fn create_unknown_type() {
        let registry = DelegateRegistry::new();
        assert!(matches!(
            registry.create("nope"),
            Err(RegistryError::UnknownType(id)) if id == "nope"
        ));
    }

    #[test]
    fn create_reports_factory_failure() {
        let mut registry = DelegateRegistry::new();
        registry.register(ConfigurationType::new("broken", "Broken"), || {
            Err(DelegateError::failed("missing installation"))
        });
        let err = registry.create("broken").err().unwrap();
        assert_eq!(
            err.to_string(),
            "could not construct delegate for type broken: missing installation"
        );
    }

    #[test]
    fn factory_builds_fresh_instances() {
        let registry = DelegateRegistry::with_defaults();
        let a = registry.create(PROPERTIES_TYPE_ID).unwrap();
        let b = registry.create(PROPERTIES_TYPE_ID).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unregistered_descriptor() {
        let t = ConfigurationType::unregistered("custom");
        assert_eq!(t.id(), "custom");
        assert_eq!(t.name(), "custom");
        assert_eq!(t.description(), "");
    }
}
