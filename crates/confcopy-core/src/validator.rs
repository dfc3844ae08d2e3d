//! Optimistic concurrency check run before an unforced save

use crate::error::WorkingCopyError;
use crate::storage::ConfigurationStorage;
use confcopy_model::{Location, Timestamp};

/// Compares what storage holds now with what a working copy was based on
///
/// Validation never writes; a failure means nothing was persisted.
#[derive(Clone, Copy)]
pub struct TimestampValidator<'a> {
    storage: &'a dyn ConfigurationStorage,
    reject_occupied: bool,
}

impl<'a> TimestampValidator<'a> {
    /// Create a validator over `storage`
    #[must_use]
    pub fn new(storage: &'a dyn ConfigurationStorage) -> Self {
        Self {
            storage,
            reject_occupied: true,
        }
    }

    /// Whether a fresh working copy may not claim an occupied location
    #[must_use]
    pub fn with_reject_occupied(mut self, reject: bool) -> Self {
        self.reject_occupied = reject;
        self
    }

    /// Check that the original at `location` is still at `expected`
    ///
    /// # Errors
    /// - `StaleConcurrentModification` if the persisted timestamp moved
    /// - `Storage` if the timestamp cannot be read
    pub fn validate_unchanged(
        &self,
        id: &str,
        location: &Location,
        expected: Option<Timestamp>,
    ) -> Result<(), WorkingCopyError> {
        let actual = self.storage.current_timestamp(location)?;
        if actual == expected {
            return Ok(());
        }
        tracing::warn!(
            "Stale save of {} at {}: base {:?}, now {:?}",
            id,
            location,
            expected,
            actual
        );
        Err(WorkingCopyError::StaleConcurrentModification {
            id: id.to_string(),
            location: location.clone(),
            expected,
            actual,
        })
    }

    /// Check that nothing is persisted at `location` yet
    ///
    /// # Errors
    /// - `LocationOccupied` if something is, and occupied locations are
    ///   rejected
    /// - `Storage` if the timestamp cannot be read
    pub fn validate_vacant(&self, location: &Location) -> Result<(), WorkingCopyError> {
        if !self.reject_occupied {
            return Ok(());
        }
        match self.storage.current_timestamp(location)? {
            Some(_) => Err(WorkingCopyError::LocationOccupied(location.clone())),
            None => Ok(()),
        }
    }
}
