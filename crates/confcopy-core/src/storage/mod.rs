//! Storage collaborator
//!
//! The working-copy layer depends only on the three primitives of
//! [`ConfigurationStorage`] plus location identity. Two implementations
//! ship with the crate:
//! - [`MemoryStorage`]: concurrent in-memory map, handy for tests and
//!   embedding
//! - [`FileStorage`]: one JSON document per location with a checksum

use crate::error::StorageError;
use confcopy_model::{Attributes, Location, Timestamp};

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Persisted attribute mapping and the timestamp it was written at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Persisted attributes
    pub attributes: Attributes,
    /// Timestamp assigned by the write that produced them
    pub timestamp: Timestamp,
}

/// Durable storage for configuration resources
///
/// # Contract
/// - `persist` assigns a timestamp strictly greater than any previously
///   assigned to the same location
/// - `current_timestamp` reflects the latest persisted write, including
///   writes made outside this process
/// - `load` returns attributes and timestamp that belong together
pub trait ConfigurationStorage: Send + Sync {
    /// Durably write `attributes` at `location`
    ///
    /// # Errors
    /// Returns error if the write fails; nothing is considered persisted then
    fn persist(&self, location: &Location, attributes: &Attributes)
        -> Result<Timestamp, StorageError>;

    /// Latest persisted timestamp, `None` if nothing is persisted
    ///
    /// # Errors
    /// Returns error if the location cannot be inspected
    fn current_timestamp(&self, location: &Location) -> Result<Option<Timestamp>, StorageError>;

    /// Read the persisted snapshot
    ///
    /// # Errors
    /// Returns `NotFound` if nothing is persisted at `location`
    fn load(&self, location: &Location) -> Result<Snapshot, StorageError>;
}
