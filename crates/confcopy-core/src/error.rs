//! Error types for confcopy core
//!
//! Errors are split by the layer that raises them:
//! - [`StorageError`]: persistence collaborator failures
//! - [`DelegateError`]: type-specific behaviour failures
//! - [`RegistryError`]: type resolution failures
//! - [`ConfigError`]: workspace configuration loading
//! - [`WorkingCopyError`]: everything a working-copy operation can surface
//!
//! [`DelegateError::is_structured`] carries the propagation policy:
//! structured failures cross the working-copy boundary, unexpected ones are
//! logged and absorbed during defaulting and import.

use crate::state::SaveState;
use confcopy_model::{ContentDigest, DigestError, Location, Timestamp};
use std::path::PathBuf;

/// Errors raised by a storage implementation
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Nothing persisted at location
    #[error("no configuration persisted at {0}")]
    NotFound(Location),

    /// IO error
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be decoded
    #[error("malformed document at {location}: {message}")]
    Malformed { location: Location, message: String },

    /// Stored checksum does not match the stored attributes
    #[error("integrity check failed at {location}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        location: Location,
        expected: ContentDigest,
        actual: ContentDigest,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Digest computation error
    #[error("digest error: {0}")]
    Digest(#[from] DigestError),
}

impl StorageError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by delegate code
#[derive(Debug, thiserror::Error)]
pub enum DelegateError {
    /// Actionable failure reported by the delegate
    #[error("{0}")]
    Failed(String),

    /// Progress channel signalled cancellation
    #[error("operation cancelled")]
    Cancelled,

    /// Storage failure inside the delegate
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Anything else; logged and absorbed where policy allows
    #[error("unexpected delegate failure: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl DelegateError {
    /// Create a structured failure
    #[inline]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Wrap an arbitrary error as unexpected
    #[inline]
    pub fn unexpected(error: impl Into<anyhow::Error>) -> Self {
        Self::Unexpected(error.into())
    }

    /// Whether the failure carries actionable information for the caller
    #[inline]
    #[must_use]
    pub fn is_structured(&self) -> bool {
        !matches!(self, Self::Unexpected(_))
    }
}

/// Type resolution errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No factory registered for type
    #[error("unknown configuration type: {0}")]
    UnknownType(String),

    /// Factory failed to construct a delegate
    #[error("could not construct delegate for type {type_id}: {source}")]
    Construction {
        type_id: String,
        #[source]
        source: DelegateError,
    },
}

/// Errors during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main working-copy error type
#[derive(Debug, thiserror::Error)]
pub enum WorkingCopyError {
    /// The original changed in storage since the working copy was derived
    #[error(
        "configuration {id} at {location} was modified externally (base {}, now {})",
        describe(.expected),
        describe(.actual)
    )]
    StaleConcurrentModification {
        id: String,
        location: Location,
        expected: Option<Timestamp>,
        actual: Option<Timestamp>,
    },

    /// A fresh working copy targets a location that is already persisted
    #[error("a configuration is already persisted at {0}")]
    LocationOccupied(Location),

    /// Persisted document is not a configuration resource
    #[error("invalid configuration at {location}: {reason}")]
    InvalidResource { location: Location, reason: String },

    /// Working copy was disposed
    #[error("working copy {0} has been disposed")]
    Disposed(String),

    /// Progress channel signalled cancellation
    #[error("operation cancelled")]
    Cancelled,

    /// Save state machine refused a transition
    #[error("illegal save state transition: {from:?} -> {to:?}")]
    IllegalTransition { from: SaveState, to: SaveState },

    /// Delegate failure
    #[error("delegate error: {0}")]
    Delegate(#[from] DelegateError),

    /// Storage failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Type resolution failure
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl WorkingCopyError {
    /// Check if the caller can act on the error (reload, retry, force)
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::StaleConcurrentModification { .. }
            | Self::LocationOccupied(_)
            | Self::Cancelled
            | Self::Storage(_) => true,
            Self::Delegate(e) => e.is_structured(),
            Self::InvalidResource { .. }
            | Self::Disposed(_)
            | Self::IllegalTransition { .. }
            | Self::Registry(_) => false,
        }
    }

    /// Check if this is a concurrent-modification conflict
    #[inline]
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleConcurrentModification { .. })
    }
}

fn describe(timestamp: &Option<Timestamp>) -> String {
    timestamp.map_or_else(|| "none".to_string(), |t| t.to_string())
}
