//! confcopy model
//!
//! Value types shared by every layer of the working-copy protocol.
//!
//! # Core Concepts
//!
//! - [`AttributeValue`]: the closed set of attribute kinds
//! - [`AttributeStore`]: key/value map whose setters report real changes
//! - [`ChangeNotifier`]: ordered listener set with snapshot firing
//! - [`Timestamp`]: persisted revision used for conflict detection
//! - [`Location`]: where a resource is persisted
//! - [`ContentDigest`]: Blake3 digest of an attribute mapping
//!
//! # Example
//!
//! ```rust
//! use confcopy_model::{AttributeStore, AttributeValue};
//!
//! let mut store = AttributeStore::new();
//! let change = store.set("port", 8080).unwrap();
//! assert_eq!(change.new_value, Some(AttributeValue::Int(8080)));
//!
//! // Same value again: nothing to report
//! assert!(store.set("port", 8080).is_none());
//! ```

#![warn(unreachable_pub)]

mod digest;
mod event;
mod location;
mod store;
mod timestamp;
mod value;

pub use digest::{ContentDigest, DigestError};
pub use event::{ChangeNotifier, ListenerHandle, PropertyChangeEvent, PropertyChangeListener};
pub use location::Location;
pub use store::{keys, AttributeStore, Attributes};
pub use timestamp::Timestamp;
pub use value::{AttributeKind, AttributeValue};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
