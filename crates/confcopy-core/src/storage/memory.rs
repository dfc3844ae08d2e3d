//! In-memory storage

use super::{ConfigurationStorage, Snapshot};
use crate::error::StorageError;
use confcopy_model::{Attributes, Location, Timestamp};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Concurrent in-memory storage
///
/// Timestamps start at [`Timestamp::INITIAL`] per location and grow by one
/// per write. Removing a location keeps its last timestamp, and a later
/// persist continues from there.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<Location, Snapshot>,
    removed: DashMap<Location, Timestamp>,
}

impl MemoryStorage {
    /// Create empty storage
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the timestamp at `location` without changing its attributes
    ///
    /// Stands in for an edit made by another process. Returns the new
    /// timestamp, or `None` if nothing is persisted there.
    pub fn touch(&self, location: &Location) -> Option<Timestamp> {
        self.entries.get_mut(location).map(|mut snapshot| {
            snapshot.timestamp = snapshot.timestamp.next();
            snapshot.timestamp
        })
    }

    /// Drop whatever is persisted at `location`
    pub fn remove(&self, location: &Location) -> Option<Snapshot> {
        match self.entries.entry(location.clone()) {
            Entry::Occupied(entry) => {
                self.removed.insert(location.clone(), entry.get().timestamp);
                Some(entry.remove())
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Number of persisted locations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is persisted
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigurationStorage for MemoryStorage {
    fn persist(
        &self,
        location: &Location,
        attributes: &Attributes,
    ) -> Result<Timestamp, StorageError> {
        let timestamp = match self.entries.entry(location.clone()) {
            Entry::Occupied(mut entry) => {
                let timestamp = entry.get().timestamp.next();
                entry.insert(Snapshot {
                    attributes: attributes.clone(),
                    timestamp,
                });
                timestamp
            }
            Entry::Vacant(entry) => {
                let previous = self.removed.get(location).map(|t| *t);
                let timestamp = Timestamp::after(previous);
                entry.insert(Snapshot {
                    attributes: attributes.clone(),
                    timestamp,
                });
                timestamp
            }
        };
        Ok(timestamp)
    }

    fn current_timestamp(&self, location: &Location) -> Result<Option<Timestamp>, StorageError> {
        Ok(self.entries.get(location).map(|s| s.timestamp))
    }

    fn load(&self, location: &Location) -> Result<Snapshot, StorageError> {
        self.entries
            .get(location)
            .map(|s| s.value().clone())
            .ok_or_else(|| StorageError::NotFound(location.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confcopy_model::AttributeValue;

    fn attrs(port: i64) -> Attributes {
        let mut a = Attributes::new();
        a.insert("port".to_string(), AttributeValue::Int(port));
        a
    }

    #[test]
    fn persist_assigns_increasing_timestamps() {
        let storage = MemoryStorage::new();
        let loc = Location::from("a");
        let t1 = storage.persist(&loc, &attrs(1)).unwrap();
        let t2 = storage.persist(&loc, &attrs(2)).unwrap();
        assert_eq!(t1, Timestamp::INITIAL);
        assert!(t2 > t1);
        assert_eq!(storage.current_timestamp(&loc).unwrap(), Some(t2));
    }

    #[test]
    fn load_returns_matching_snapshot() {
        let storage = MemoryStorage::new();
        let loc = Location::from("a");
        let ts = storage.persist(&loc, &attrs(7)).unwrap();
        let snapshot = storage.load(&loc).unwrap();
        assert_eq!(snapshot.timestamp, ts);
        assert_eq!(snapshot.attributes, attrs(7));
    }

    #[test]
    fn missing_location() {
        let storage = MemoryStorage::new();
        let loc = Location::from("nowhere");
        assert_eq!(storage.current_timestamp(&loc).unwrap(), None);
        assert!(matches!(storage.load(&loc), Err(StorageError::NotFound(_))));
        assert_eq!(storage.touch(&loc), None);
    }

    #[test]
    fn touch_bumps_timestamp_only() {
        let storage = MemoryStorage::new();
        let loc = Location::from("a");
        let ts = storage.persist(&loc, &attrs(1)).unwrap();
        let touched = storage.touch(&loc).unwrap();
        assert!(touched > ts);
        assert_eq!(storage.load(&loc).unwrap().attributes, attrs(1));
    }

    #[test]
    fn remove_forgets_location() {
        let storage = MemoryStorage::new();
        let loc = Location::from("a");
        storage.persist(&loc, &attrs(1)).unwrap();
        assert_eq!(storage.len(), 1);
        assert!(storage.remove(&loc).is_some());
        assert!(storage.is_empty());
        assert_eq!(storage.remove(&loc), None);
    }

    #[test]
    fn recreate_after_remove_continues_timestamps() {
        let storage = MemoryStorage::new();
        let loc = Location::from("a");
        storage.persist(&loc, &attrs(1)).unwrap();
        let last = storage.persist(&loc, &attrs(2)).unwrap();
        storage.remove(&loc);

        let recreated = storage.persist(&loc, &attrs(3)).unwrap();
        assert!(recreated > last);
        assert_eq!(storage.current_timestamp(&loc).unwrap(), Some(recreated));
    }
}
