//! Attribute store
//!
//! A typed key/value map whose setters report whether anything changed.
//! The owner decides what a change means (dirty flag, notification).

use crate::event::PropertyChangeEvent;
use crate::value::AttributeValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw attribute mapping, ordered by key
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Reserved attribute keys
pub mod keys {
    /// Stable resource identifier
    pub const ID: &str = "id";
    /// Display name
    pub const NAME: &str = "name";
    /// Locked flag
    pub const LOCKED: &str = "locked";
    /// Private flag
    pub const PRIVATE: &str = "private";
    /// Configuration type identifier
    pub const CONFIGURATION_TYPE_ID: &str = "configuration-type-id";
    /// Runtime a configuration was imported from
    pub const RUNTIME_ID: &str = "runtime-id";

    /// Check if `key` names the resource's identity (id or type)
    ///
    /// Identity is fixed when the resource is created; imports and edits
    /// must leave these keys alone.
    #[inline]
    #[must_use]
    pub fn is_identity(key: &str) -> bool {
        key == ID || key == CONFIGURATION_TYPE_ID
    }
}

/// Typed key/value map with change-aware setters
///
/// # Invariants
/// - `set` with a value equal to the current one changes nothing and
///   returns `None`
/// - every call returning `Some` changed exactly one entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeStore {
    entries: Attributes,
}

impl AttributeStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store owning the given mapping
    #[inline]
    #[must_use]
    pub fn from_map(entries: Attributes) -> Self {
        Self { entries }
    }

    /// Raw value lookup
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries.get(key)
    }

    /// Integer attribute, or `default` if missing or of another kind
    #[must_use]
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(AttributeValue::as_int).unwrap_or(default)
    }

    /// Boolean attribute, or `default` if missing or of another kind
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(AttributeValue::as_bool).unwrap_or(default)
    }

    /// String attribute, or `default` if missing or of another kind
    #[must_use]
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get(key)
            .and_then(AttributeValue::as_str)
            .unwrap_or(default)
            .to_string()
    }

    /// List attribute, or `default` if missing or of another kind
    #[must_use]
    pub fn get_list(&self, key: &str, default: Vec<String>) -> Vec<String> {
        self.get(key)
            .and_then(AttributeValue::as_list)
            .map_or(default, <[String]>::to_vec)
    }

    /// Map attribute, or `default` if missing or of another kind
    #[must_use]
    pub fn get_map(
        &self,
        key: &str,
        default: BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        self.get(key)
            .and_then(AttributeValue::as_map)
            .map_or(default, Clone::clone)
    }

    /// Set an attribute
    ///
    /// Returns the change, or `None` if the stored value already equals
    /// `value`.
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Option<PropertyChangeEvent> {
        let value = value.into();
        if self.entries.get(key) == Some(&value) {
            return None;
        }
        let old = self.entries.insert(key.to_string(), value.clone());
        Some(PropertyChangeEvent::new(key, old, Some(value)))
    }

    /// Remove an attribute
    ///
    /// Returns the change, or `None` if the key was absent.
    pub fn remove(&mut self, key: &str) -> Option<PropertyChangeEvent> {
        let old = self.entries.remove(key)?;
        Some(PropertyChangeEvent::new(key, Some(old), None))
    }

    /// Replace the whole mapping
    pub fn replace_all(&mut self, entries: Attributes) {
        self.entries = entries;
    }

    /// Check if key is present
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of attributes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.entries.iter()
    }

    /// Borrow the raw mapping
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Attributes {
        &self.entries
    }

    /// Take the raw mapping
    #[inline]
    #[must_use]
    pub fn into_map(self) -> Attributes {
        self.entries
    }
}

impl From<Attributes> for AttributeStore {
    fn from(entries: Attributes) -> Self {
        Self::from_map(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn identity_keys() {
        assert!(keys::is_identity(keys::ID));
        assert!(keys::is_identity(keys::CONFIGURATION_TYPE_ID));
        assert!(!keys::is_identity(keys::NAME));
        assert!(!keys::is_identity(keys::RUNTIME_ID));
    }

    #[test]
    fn set_reports_old_and_new() {
        let mut store = AttributeStore::new();
        let first = store.set("port", 8080).unwrap();
        assert_eq!(first.old_value, None);
        assert_eq!(first.new_value, Some(AttributeValue::Int(8080)));

        let second = store.set("port", 9090).unwrap();
        assert_eq!(second.property, "port");
        assert_eq!(second.old_value, Some(AttributeValue::Int(8080)));
        assert_eq!(second.new_value, Some(AttributeValue::Int(9090)));
    }

    #[test]
    fn set_equal_value_is_silent() {
        let mut store = AttributeStore::new();
        store.set("hosts", vec!["a", "b"]);
        assert!(store.set("hosts", vec!["a", "b"]).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn set_same_content_other_kind_is_a_change() {
        let mut store = AttributeStore::new();
        store.set("flag", "true");
        assert!(store.set("flag", true).is_some());
    }

    #[test]
    fn typed_getters_fall_back_on_kind_mismatch() {
        let mut store = AttributeStore::new();
        store.set("port", "not a number");
        assert_eq!(store.get_int("port", 80), 80);
        assert_eq!(store.get_string("port", ""), "not a number");
        assert!(store.get_bool("missing", true));
        assert_eq!(store.get_list("port", vec!["d".to_string()]), vec!["d"]);
        assert!(store.get_map("port", BTreeMap::new()).is_empty());
    }

    #[test]
    fn remove_missing_is_silent() {
        let mut store = AttributeStore::new();
        assert!(store.remove("nothing").is_none());
        store.set("k", 1);
        let change = store.remove("k").unwrap();
        assert_eq!(change.old_value, Some(AttributeValue::Int(1)));
        assert_eq!(change.new_value, None);
    }

    #[test]
    fn serde_is_transparent() {
        let mut store = AttributeStore::new();
        store.set("b", true);
        store.set("a", 1);
        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"{"a":1,"b":true}"#);
    }

    fn value_strategy() -> impl Strategy<Value = AttributeValue> {
        prop_oneof![
            any::<bool>().prop_map(AttributeValue::Bool),
            any::<i64>().prop_map(AttributeValue::Int),
            "[a-z]{0,8}".prop_map(AttributeValue::String),
            prop::collection::vec("[a-z]{0,4}", 0..4).prop_map(AttributeValue::List),
        ]
    }

    proptest! {
        #[test]
        fn prop_repeated_set_is_silent(key in "[a-z]{1,6}", value in value_strategy()) {
            let mut store = AttributeStore::new();
            store.set(&key, value.clone());
            prop_assert!(store.set(&key, value).is_none());
        }

        #[test]
        fn prop_differing_set_reports_exact_change(
            key in "[a-z]{1,6}",
            a in value_strategy(),
            b in value_strategy(),
        ) {
            prop_assume!(a != b);
            let mut store = AttributeStore::new();
            store.set(&key, a.clone());
            let change = store.set(&key, b.clone()).unwrap();
            prop_assert_eq!(change.old_value, Some(a));
            prop_assert_eq!(change.new_value, Some(b.clone()));
            prop_assert_eq!(store.get(&key), Some(&b));
        }
    }
}
