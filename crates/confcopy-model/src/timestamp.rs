//! Persisted revision timestamps

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Persisted revision of a configuration resource
///
/// Storage assigns a strictly greater value on every persist of the same
/// location, so equality is the only test needed to detect a concurrent
/// write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// First revision handed out for a location
    pub const INITIAL: Self = Self(1);

    /// Wrap a raw revision
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw revision
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Revision following this one
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Revision following `previous`, or [`Timestamp::INITIAL`]
    #[inline]
    #[must_use]
    pub fn after(previous: Option<Self>) -> Self {
        previous.map_or(Self::INITIAL, Self::next)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}
