//! Editable working copies
//!
//! A [`WorkingCopy`] owns a private copy of a configuration's attributes.
//! Edits never reach the original until [`WorkingCopy::save`] commits them,
//! after checking that nobody else persisted the original in the meantime.
//!
//! # Delegate resolution
//!
//! The type-specific [`ConfigurationDelegate`] is created on first demand
//! and then cached. Creation is guarded by a per-copy lock with a
//! double-checked fast path, so concurrent callers construct at most one
//! delegate. Failures are logged and reported as "no delegate"; a later
//! call may retry.
//!
//! # Example
//!
//! ```rust
//! use confcopy_core::prelude::*;
//! use std::sync::Arc;
//!
//! let workspace = Workspace::new(
//!     WorkspaceConfig::default(),
//!     Arc::new(MemoryStorage::new()),
//!     DelegateRegistry::with_defaults(),
//! );
//! let wc = workspace.create_working_copy(
//!     "web",
//!     Location::from("web.json"),
//!     workspace.configuration_type(PROPERTIES_TYPE_ID),
//! );
//! wc.set_attribute("port", 8080);
//! let original = wc.save(false, &NullProgress).unwrap();
//!
//! assert!(!wc.is_dirty());
//! assert_eq!(original.get_int("port", 0), 8080);
//! ```

use crate::delegate::{ConfigurationDelegate, ConfigurationType, RuntimeDescriptor};
use crate::error::{DelegateError, WorkingCopyError};
use crate::progress::ProgressMonitor;
use crate::resource::{ConfigurationResource, ResourceContext};
use crate::state::{validate_transition, SaveState};
use crate::validator::TimestampValidator;
use crate::view::ConfigurationView;
use confcopy_model::{
    keys, AttributeStore, AttributeValue, ChangeNotifier, ListenerHandle, Location,
    PropertyChangeEvent, Timestamp,
};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::cell::Cell;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Private editing state
#[derive(Debug)]
struct EditState {
    attributes: AttributeStore,
    state: SaveState,
    /// Bumped by every mutation; tells a finishing save whether it
    /// committed the latest edits
    revision: u64,
    original: Option<Arc<ConfigurationResource>>,
    base_timestamp: Option<Timestamp>,
}

impl EditState {
    fn record_change(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        if self.state == SaveState::Clean {
            self.state = SaveState::Dirty;
        }
    }
}

/// Editable front of a configuration
///
/// # Invariants
/// - `is_dirty()` is false exactly when nothing was mutated since
///   derivation or the last successful save
/// - at most one delegate is constructed per working copy
/// - listeners run with no internal lock held
pub struct WorkingCopy {
    id: String,
    config_type: ConfigurationType,
    location: Location,
    context: ResourceContext,

    edit: RwLock<EditState>,
    notifier: ChangeNotifier,

    delegate: OnceLock<Arc<dyn ConfigurationDelegate>>,
    /// Serializes delegate construction; the flag marks a construction in
    /// progress on the holding thread
    delegate_lock: ReentrantMutex<Cell<bool>>,
    delegate_init_time: Mutex<Option<Duration>>,

    data_loaded: AtomicBool,
    disposed: AtomicBool,
}

impl WorkingCopy {
    pub(crate) fn derive(original: &Arc<ConfigurationResource>) -> Self {
        let (attributes, base_timestamp) = original.read_state();
        Self::build(
            original.id().to_string(),
            original.config_type().clone(),
            original.location().clone(),
            original.context().clone(),
            EditState {
                attributes,
                state: SaveState::Clean,
                revision: 0,
                original: Some(Arc::clone(original)),
                base_timestamp,
            },
        )
    }

    pub(crate) fn fresh(
        id: String,
        config_type: ConfigurationType,
        location: Location,
        context: ResourceContext,
    ) -> Self {
        let mut attributes = AttributeStore::new();
        attributes.set(keys::ID, id.as_str());
        attributes.set(keys::CONFIGURATION_TYPE_ID, config_type.id());
        Self::build(
            id,
            config_type,
            location,
            context,
            EditState {
                attributes,
                state: SaveState::Dirty,
                revision: 0,
                original: None,
                base_timestamp: None,
            },
        )
    }

    fn build(
        id: String,
        config_type: ConfigurationType,
        location: Location,
        context: ResourceContext,
        edit: EditState,
    ) -> Self {
        Self {
            id,
            config_type,
            location,
            context,
            edit: RwLock::new(edit),
            notifier: ChangeNotifier::new(),
            delegate: OnceLock::new(),
            delegate_lock: ReentrantMutex::new(Cell::new(false)),
            delegate_init_time: Mutex::new(None),
            data_loaded: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    /// A working copy is its own working copy
    #[inline]
    #[must_use]
    pub fn create_working_copy(&self) -> &Self {
        self
    }

    /// The resource this copy was derived from, or materialized by its
    /// first save
    #[must_use]
    pub fn original(&self) -> Option<Arc<ConfigurationResource>> {
        self.edit.read().original.clone()
    }

    /// Timestamp the next unforced save is validated against
    #[must_use]
    pub fn base_timestamp(&self) -> Option<Timestamp> {
        self.edit.read().base_timestamp
    }

    /// Whether there are unsaved mutations
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.edit.read().state.is_dirty()
    }

    /// Current save state
    #[must_use]
    pub fn save_state(&self) -> SaveState {
        self.edit.read().state
    }

    /// Whether delegate-driven data was loaded, defaulted or imported
    #[must_use]
    pub fn is_data_loaded(&self) -> bool {
        self.data_loaded.load(Ordering::Acquire)
    }

    /// Whether [`dispose`](Self::dispose) has run
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Set an attribute
    ///
    /// An equal value changes nothing. Otherwise the copy becomes dirty and
    /// one change event named `key` fires. Returns whether anything
    /// changed.
    pub fn set_attribute(&self, key: &str, value: impl Into<AttributeValue>) -> bool {
        let change = {
            let mut edit = self.edit.write();
            let change = edit.attributes.set(key, value);
            if change.is_some() {
                edit.record_change();
            }
            change
        };
        self.announce(change)
    }

    /// Remove an attribute; removing a missing key changes nothing
    pub fn remove_attribute(&self, key: &str) -> bool {
        let change = {
            let mut edit = self.edit.write();
            let change = edit.attributes.remove(key);
            if change.is_some() {
                edit.record_change();
            }
            change
        };
        self.announce(change)
    }

    /// Set the display name
    pub fn set_name(&self, name: &str) -> bool {
        self.set_attribute(keys::NAME, name)
    }

    /// Set the locked flag
    pub fn set_locked(&self, locked: bool) -> bool {
        self.set_attribute(keys::LOCKED, locked)
    }

    /// Set the private flag
    pub fn set_private(&self, private: bool) -> bool {
        self.set_attribute(keys::PRIVATE, private)
    }

    /// Store an attribute read from persisted delegate data
    ///
    /// Neither dirties the copy nor fires an event.
    pub fn load_attribute(&self, key: &str, value: impl Into<AttributeValue>) {
        self.edit.write().attributes.set(key, value);
    }

    fn announce(&self, change: Option<PropertyChangeEvent>) -> bool {
        match change {
            Some(event) => {
                self.notifier.fire(&event);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Register a listener; returns `false` if already registered
    pub fn add_property_change_listener(&self, listener: ListenerHandle) -> bool {
        self.notifier.add_listener(listener)
    }

    /// Unregister a listener; returns `false` if it was not registered
    pub fn remove_property_change_listener(&self, listener: &ListenerHandle) -> bool {
        self.notifier.remove_listener(listener)
    }

    /// Fire a change event without touching attributes
    pub fn fire_property_change(
        &self,
        property: &str,
        old_value: Option<AttributeValue>,
        new_value: Option<AttributeValue>,
    ) {
        self.notifier.fire_change(property, old_value, new_value);
    }

    // ------------------------------------------------------------------
    // Delegate
    // ------------------------------------------------------------------

    /// The delegate for this copy's type, created on first demand
    ///
    /// With `load`, a newly created delegate loads its persisted data
    /// before it is published. Returns `None` if no delegate could be
    /// created (the failure is logged), if called re-entrantly while this
    /// thread is constructing it, or after disposal.
    pub fn get_delegate(
        &self,
        load: bool,
        progress: &dyn ProgressMonitor,
    ) -> Option<Arc<dyn ConfigurationDelegate>> {
        if let Some(delegate) = self.delegate.get() {
            return (!self.is_disposed()).then(|| Arc::clone(delegate));
        }

        let constructing = self.delegate_lock.lock();
        if self.is_disposed() {
            return None;
        }
        if let Some(delegate) = self.delegate.get() {
            return Some(Arc::clone(delegate));
        }
        if constructing.get() {
            tracing::debug!("Delegate of {} requested during its construction", self.id);
            return None;
        }

        constructing.set(true);
        let result = self.create_delegate(load, progress);
        constructing.set(false);

        match result {
            Ok(delegate) => Some(Arc::clone(self.delegate.get_or_init(|| delegate))),
            Err(e) => {
                tracing::error!("Could not create delegate for {}: {}", self, e);
                None
            }
        }
    }

    fn create_delegate(
        &self,
        load: bool,
        progress: &dyn ProgressMonitor,
    ) -> Result<Arc<dyn ConfigurationDelegate>, WorkingCopyError> {
        let started = Instant::now();
        let delegate = self.context.registry.create(self.config_type.id())?;

        let bound = delegate.initialize(self).and_then(|()| {
            if load {
                delegate.load(self, progress)
            } else {
                Ok(())
            }
        });
        if let Err(e) = bound {
            delegate.dispose();
            return Err(e.into());
        }
        if load {
            self.data_loaded.store(true, Ordering::Release);
        }

        let elapsed = started.elapsed();
        *self.delegate_init_time.lock() = Some(elapsed);
        if self.context.config.log_delegate_timing {
            tracing::debug!(
                "Created delegate for {} <{}ms> {}",
                self.id,
                elapsed.as_millis(),
                self.config_type.id()
            );
        }
        Ok(delegate)
    }

    /// How long delegate creation (and load) took, once created
    #[must_use]
    pub fn delegate_init_time(&self) -> Option<Duration> {
        *self.delegate_init_time.lock()
    }

    /// Apply the type's default attributes
    ///
    /// # Errors
    /// Structured delegate failures. Unexpected ones are logged; a missing
    /// delegate makes this a no-op.
    pub fn set_defaults(&self, progress: &dyn ProgressMonitor) -> Result<(), WorkingCopyError> {
        self.run_hook("set_defaults", progress, |delegate| delegate.set_defaults(self))
    }

    /// Import configuration data from `path`
    ///
    /// # Errors
    /// Structured delegate failures, as for [`set_defaults`](Self::set_defaults)
    pub fn import_from_path(
        &self,
        path: impl AsRef<Path>,
        progress: &dyn ProgressMonitor,
    ) -> Result<(), WorkingCopyError> {
        let path = path.as_ref();
        self.run_hook("import_from_path", progress, |delegate| {
            delegate.import_from_path(self, path, progress)
        })
    }

    /// Import configuration data from an existing runtime
    ///
    /// # Errors
    /// Structured delegate failures, as for [`set_defaults`](Self::set_defaults)
    pub fn import_from_runtime(
        &self,
        runtime: &RuntimeDescriptor,
        progress: &dyn ProgressMonitor,
    ) -> Result<(), WorkingCopyError> {
        self.run_hook("import_from_runtime", progress, |delegate| {
            delegate.import_from_runtime(self, runtime, progress)
        })
    }

    fn run_hook<F>(
        &self,
        operation: &str,
        progress: &dyn ProgressMonitor,
        hook: F,
    ) -> Result<(), WorkingCopyError>
    where
        F: FnOnce(&dyn ConfigurationDelegate) -> Result<(), DelegateError>,
    {
        let Some(delegate) = self.get_delegate(false, progress) else {
            tracing::debug!("No delegate for {}, {} skipped", self.id, operation);
            return Ok(());
        };

        match hook(delegate.as_ref()) {
            Ok(()) => {
                self.data_loaded.store(true, Ordering::Release);
                Ok(())
            }
            Err(e) if e.is_structured() => Err(e.into()),
            Err(e) => {
                tracing::warn!("Error calling delegate {}() on {}: {}", operation, self, e);
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------

    /// Commit the edits to the original and persist it
    ///
    /// Unless `force`, the original must not have been persisted by anyone
    /// else since this copy was derived (or last saved). A fresh copy
    /// materializes its original on first save.
    ///
    /// # Errors
    /// - `Disposed` after [`dispose`](Self::dispose)
    /// - `StaleConcurrentModification` or `LocationOccupied` from validation
    /// - `Cancelled` if the monitor was cancelled before commit
    /// - `IllegalTransition` if a save is already running
    /// - delegate and storage failures
    ///
    /// On error nothing is committed to the original and the dirty state is
    /// unchanged.
    pub fn save(
        &self,
        force: bool,
        progress: &dyn ProgressMonitor,
    ) -> Result<Arc<ConfigurationResource>, WorkingCopyError> {
        if self.is_disposed() {
            return Err(WorkingCopyError::Disposed(self.id.clone()));
        }
        progress.begin_subtask(&format!("Saving {}", self.id));

        let (prior, started_at) = {
            let mut edit = self.edit.write();
            validate_transition(edit.state, SaveState::Saving)?;
            let prior = edit.state;
            edit.state = SaveState::Saving;
            (prior, edit.revision)
        };

        let result = self.commit(force, progress);

        let mut edit = self.edit.write();
        edit.state = match &result {
            Ok((_, committed)) if *committed == edit.revision => SaveState::Clean,
            Ok(_) => SaveState::Dirty,
            Err(_) if edit.revision == started_at => prior,
            Err(_) => SaveState::Dirty,
        };
        drop(edit);

        result.map(|(original, _)| original)
    }

    /// Validate, save delegate data, then push attributes to the original
    ///
    /// Returns the original and the edit revision that was committed.
    fn commit(
        &self,
        force: bool,
        progress: &dyn ProgressMonitor,
    ) -> Result<(Arc<ConfigurationResource>, u64), WorkingCopyError> {
        let (original, base_timestamp) = {
            let edit = self.edit.read();
            (edit.original.clone(), edit.base_timestamp)
        };

        if !force {
            let validator = TimestampValidator::new(self.context.storage.as_ref())
                .with_reject_occupied(self.context.config.reject_occupied_locations);
            match original {
                Some(_) => validator.validate_unchanged(&self.id, &self.location, base_timestamp)?,
                None => validator.validate_vacant(&self.location)?,
            }
        }

        if progress.is_cancelled() {
            return Err(WorkingCopyError::Cancelled);
        }

        // Delegate data goes first so a failing delegate leaves the
        // original untouched.
        if let Some(delegate) = self.delegate.get() {
            delegate.save(self, progress).map_err(|e| match e {
                DelegateError::Cancelled => WorkingCopyError::Cancelled,
                e => WorkingCopyError::Delegate(e),
            })?;
        }

        let original = original.unwrap_or_else(|| {
            Arc::new(ConfigurationResource::unpersisted(
                self.id.clone(),
                self.config_type.clone(),
                self.location.clone(),
                self.context.clone(),
            ))
        });

        let (attributes, revision) = {
            let edit = self.edit.read();
            (edit.attributes.as_map().clone(), edit.revision)
        };
        let timestamp = original.commit(attributes)?;

        {
            let mut edit = self.edit.write();
            edit.base_timestamp = Some(timestamp);
            edit.original = Some(Arc::clone(&original));
        }
        tracing::info!("Saved {} to {} at {}", self.id, self.location, timestamp);

        Ok((original, revision))
    }

    // ------------------------------------------------------------------
    // Disposal
    // ------------------------------------------------------------------

    /// Release the delegate and drop all listeners
    ///
    /// Idempotent; also runs on drop. The private attributes stay readable
    /// and writable, but the copy can no longer be saved.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        {
            let _guard = self.delegate_lock.lock();
            if let Some(delegate) = self.delegate.get() {
                delegate.dispose();
            }
        }
        self.notifier.clear();
        tracing::debug!("Disposed {}", self);
    }
}

impl ConfigurationView for WorkingCopy {
    fn id(&self) -> &str {
        &self.id
    }

    fn config_type(&self) -> &ConfigurationType {
        &self.config_type
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn is_working_copy(&self) -> bool {
        true
    }

    fn read_attributes<R>(&self, f: impl FnOnce(&AttributeStore) -> R) -> R {
        f(&self.edit.read().attributes)
    }
}

impl Drop for WorkingCopy {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Display for WorkingCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkingCopy {}", self.id)
    }
}

impl fmt::Debug for WorkingCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkingCopy")
            .field("id", &self.id)
            .field("type", &self.config_type.id())
            .field("location", &self.location)
            .field("state", &self.save_state())
            .field("has_delegate", &self.delegate.get().is_some())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
