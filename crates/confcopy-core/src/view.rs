//! Read access shared by originals and working copies

use crate::delegate::ConfigurationType;
use confcopy_model::{keys, AttributeStore, AttributeValue, Attributes, Location};
use std::collections::BTreeMap;

/// Read-only view of a configuration
///
/// Implementors provide identity and scoped access to their attribute
/// store; the typed getters come for free.
pub trait ConfigurationView {
    /// Stable identifier
    fn id(&self) -> &str;

    /// Configuration kind
    fn config_type(&self) -> &ConfigurationType;

    /// Where the configuration is (or will be) persisted
    fn location(&self) -> &Location;

    /// Whether this is an editable working copy
    fn is_working_copy(&self) -> bool;

    /// Run `f` against the current attributes
    ///
    /// `f` must not call back into the view.
    fn read_attributes<R>(&self, f: impl FnOnce(&AttributeStore) -> R) -> R;

    /// Raw attribute value
    fn get_attribute(&self, key: &str) -> Option<AttributeValue> {
        self.read_attributes(|store| store.get(key).cloned())
    }

    /// Check if attribute is present
    fn has_attribute(&self, key: &str) -> bool {
        self.read_attributes(|store| store.contains_key(key))
    }

    /// Integer attribute or `default`
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.read_attributes(|store| store.get_int(key, default))
    }

    /// Boolean attribute or `default`
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.read_attributes(|store| store.get_bool(key, default))
    }

    /// String attribute or `default`
    fn get_string(&self, key: &str, default: &str) -> String {
        self.read_attributes(|store| store.get_string(key, default))
    }

    /// List attribute or `default`
    fn get_list(&self, key: &str, default: Vec<String>) -> Vec<String> {
        self.read_attributes(|store| store.get_list(key, default))
    }

    /// Map attribute or `default`
    fn get_map(&self, key: &str, default: BTreeMap<String, String>) -> BTreeMap<String, String> {
        self.read_attributes(|store| store.get_map(key, default))
    }

    /// Display name; empty if unset
    fn name(&self) -> String {
        self.get_string(keys::NAME, "")
    }

    /// Locked flag
    fn is_locked(&self) -> bool {
        self.get_bool(keys::LOCKED, false)
    }

    /// Private flag
    fn is_private(&self) -> bool {
        self.get_bool(keys::PRIVATE, false)
    }

    /// Copy of the full attribute mapping
    fn attributes(&self) -> Attributes {
        self.read_attributes(|store| store.as_map().clone())
    }
}
