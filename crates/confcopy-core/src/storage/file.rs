//! JSON file storage

use super::{ConfigurationStorage, Snapshot};
use crate::error::StorageError;
use chrono::{DateTime, Utc};
use confcopy_model::{Attributes, ContentDigest, Location, Timestamp};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// On-disk document
#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    revision: Timestamp,
    modified: DateTime<Utc>,
    checksum: ContentDigest,
    attributes: Attributes,
}

/// One JSON document per location
///
/// Relative locations resolve under `root`. The revision stored in the
/// document is the resource timestamp; a Blake3 checksum of the attributes
/// is verified on load. Writes go to a sibling `.tmp` file and are renamed
/// into place.
///
/// Revisions never go below the wall clock in nanoseconds, so a file that
/// is deleted and recreated, possibly by another process, does not repeat
/// a revision an editor may still hold.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
    /// Highest revision written per file; also serializes writes
    issued: Mutex<HashMap<PathBuf, Timestamp>>,
}

impl FileStorage {
    /// Create storage rooted at `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path backing `location`
    #[must_use]
    pub fn resolve(&self, location: &Location) -> PathBuf {
        let path = location.as_path();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn read_document(&self, location: &Location) -> Result<Option<StoredDocument>, StorageError> {
        let path = self.resolve(location);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io_error(path, e)),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| StorageError::Malformed {
                location: location.clone(),
                message: e.to_string(),
            })
    }

    fn write_document(&self, path: &Path, document: &StoredDocument) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io_error(parent, e))?;
        }
        let json = serde_json::to_string_pretty(document)?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).map_err(|e| StorageError::io_error(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| StorageError::io_error(path, e))
    }
}

impl ConfigurationStorage for FileStorage {
    fn persist(
        &self,
        location: &Location,
        attributes: &Attributes,
    ) -> Result<Timestamp, StorageError> {
        let path = self.resolve(location);
        let mut issued = self.issued.lock();
        let on_disk = match self.read_document(location) {
            Ok(doc) => doc.map(|d| d.revision),
            Err(StorageError::Malformed { .. }) => None,
            Err(e) => return Err(e),
        };
        let previous = on_disk.max(issued.get(&path).copied());
        let modified = Utc::now();
        let document = StoredDocument {
            revision: next_revision(previous, modified),
            modified,
            checksum: ContentDigest::of_attributes(attributes)?,
            attributes: attributes.clone(),
        };
        self.write_document(&path, &document)?;
        issued.insert(path, document.revision);
        tracing::debug!("Persisted {} at {}", location, document.revision);
        Ok(document.revision)
    }

    fn current_timestamp(&self, location: &Location) -> Result<Option<Timestamp>, StorageError> {
        Ok(self.read_document(location)?.map(|d| d.revision))
    }

    fn load(&self, location: &Location) -> Result<Snapshot, StorageError> {
        let document = self
            .read_document(location)?
            .ok_or_else(|| StorageError::NotFound(location.clone()))?;
        let actual = ContentDigest::of_attributes(&document.attributes)?;
        if actual != document.checksum {
            return Err(StorageError::IntegrityMismatch {
                location: location.clone(),
                expected: document.checksum,
                actual,
            });
        }
        Ok(Snapshot {
            attributes: document.attributes,
            timestamp: document.revision,
        })
    }
}

/// Revision after `previous`, but no lower than `now` in nanoseconds
fn next_revision(previous: Option<Timestamp>, now: DateTime<Utc>) -> Timestamp {
    let clock = now
        .timestamp_nanos_opt()
        .and_then(|nanos| u64::try_from(nanos).ok())
        .unwrap_or(0);
    Timestamp::after(previous).max(Timestamp::new(clock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use confcopy_model::AttributeValue;
    use pretty_assertions::assert_eq;

    fn attrs() -> Attributes {
        let mut a = Attributes::new();
        a.insert("host".to_string(), AttributeValue::from("localhost"));
        a.insert("port".to_string(), AttributeValue::Int(8080));
        a
    }

    #[test]
    fn persist_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let loc = Location::from("servers/tomcat.json");

        let ts = storage.persist(&loc, &attrs()).unwrap();
        assert!(ts > Timestamp::INITIAL);
        assert!(dir.path().join("servers/tomcat.json").exists());

        let snapshot = storage.load(&loc).unwrap();
        assert_eq!(snapshot.attributes, attrs());
        assert_eq!(snapshot.timestamp, ts);
    }

    #[test]
    fn revisions_increase() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let loc = Location::from("a.json");
        let t1 = storage.persist(&loc, &attrs()).unwrap();
        let t2 = storage.persist(&loc, &attrs()).unwrap();
        assert!(t2 > t1);
        assert_eq!(storage.current_timestamp(&loc).unwrap(), Some(t2));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let loc = Location::from("none.json");
        assert_eq!(storage.current_timestamp(&loc).unwrap(), None);
        assert!(matches!(storage.load(&loc), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn hand_edited_attributes_fail_integrity() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let loc = Location::from("a.json");
        storage.persist(&loc, &attrs()).unwrap();

        let path = storage.resolve(&loc);
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.replace("8080", "9090")).unwrap();

        assert!(matches!(
            storage.load(&loc),
            Err(StorageError::IntegrityMismatch { .. })
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let loc = Location::from("bad.json");
        std::fs::write(storage.resolve(&loc), "not json").unwrap();
        assert!(matches!(
            storage.current_timestamp(&loc),
            Err(StorageError::Malformed { .. })
        ));
        // Overwriting a malformed document is allowed
        let ts = storage.persist(&loc, &attrs()).unwrap();
        assert_eq!(storage.current_timestamp(&loc).unwrap(), Some(ts));
    }

    #[test]
    fn recreate_after_delete_gets_new_revision() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let loc = Location::from("a.json");
        let first = storage.persist(&loc, &attrs()).unwrap();
        std::fs::remove_file(storage.resolve(&loc)).unwrap();

        let second = storage.persist(&loc, &attrs()).unwrap();
        assert!(second > first);

        // A separate instance has no memory of `second`; the clock still moves it on
        std::fs::remove_file(storage.resolve(&loc)).unwrap();
        let other = FileStorage::new(dir.path());
        let third = other.persist(&loc, &attrs()).unwrap();
        assert!(third > second);
    }

    #[test]
    fn next_revision_follows_previous_when_clock_lags() {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        assert_eq!(next_revision(None, epoch), Timestamp::INITIAL);
        assert_eq!(
            next_revision(Some(Timestamp::new(41)), epoch),
            Timestamp::new(42)
        );

        let now = Utc::now();
        let clock = u64::try_from(now.timestamp_nanos_opt().unwrap()).unwrap();
        assert_eq!(
            next_revision(Some(Timestamp::new(3)), now),
            Timestamp::new(clock)
        );
    }

    #[test]
    fn absolute_locations_ignore_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new("/unused/root");
        let absolute = dir.path().join("abs.json");
        let loc = Location::new(&absolute);
        assert_eq!(storage.resolve(&loc), absolute);
        storage.persist(&loc, &attrs()).unwrap();
        assert!(absolute.exists());
    }
}
