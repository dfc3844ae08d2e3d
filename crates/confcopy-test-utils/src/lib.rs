//! Testing utilities for confcopy workspace
//!
//! Shared fixtures: instrumented delegates, recording listeners and
//! in-memory workspaces.

#![allow(missing_docs)]

use confcopy_core::{
    ConfigurationDelegate, ConfigurationResource, ConfigurationStorage, ConfigurationType,
    DelegateError, DelegateRegistry, MemoryStorage, ProgressMonitor, RuntimeDescriptor,
    WorkingCopy, Workspace, WorkspaceConfig,
};
use confcopy_model::{
    keys, AttributeValue, Attributes, Location, PropertyChangeEvent, PropertyChangeListener,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const COUNTING_TYPE_ID: &str = "counting";

/// How an instrumented hook ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Outcome {
    #[default]
    Succeed,
    /// Structured `DelegateError::Failed`
    Structured,
    /// `DelegateError::Unexpected`
    Unexpected,
}

impl Outcome {
    fn into_result(self, hook: &str) -> Result<(), DelegateError> {
        match self {
            Self::Succeed => Ok(()),
            Self::Structured => Err(DelegateError::failed(format!("{hook} rejected"))),
            Self::Unexpected => Err(DelegateError::unexpected(anyhow::anyhow!("{hook} blew up"))),
        }
    }
}

/// Per-hook outcomes of a [`CountingDelegate`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DelegateBehavior {
    pub initialize: Outcome,
    pub defaults: Outcome,
    pub import: Outcome,
    pub load: Outcome,
    pub save: Outcome,
    /// Sleep inside the factory, widening construction races
    pub construction_delay: Duration,
}

impl DelegateBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(mut self, outcome: Outcome) -> Self {
        self.defaults = outcome;
        self
    }

    pub fn with_import(mut self, outcome: Outcome) -> Self {
        self.import = outcome;
        self
    }

    pub fn with_initialize(mut self, outcome: Outcome) -> Self {
        self.initialize = outcome;
        self
    }

    pub fn with_load(mut self, outcome: Outcome) -> Self {
        self.load = outcome;
        self
    }

    pub fn with_save(mut self, outcome: Outcome) -> Self {
        self.save = outcome;
        self
    }

    pub fn with_construction_delay(mut self, delay: Duration) -> Self {
        self.construction_delay = delay;
        self
    }
}

/// Hook call counters shared by every delegate a factory builds
#[derive(Debug, Default)]
pub struct DelegateProbe {
    pub constructed: AtomicUsize,
    pub initialized: AtomicUsize,
    pub defaulted: AtomicUsize,
    pub imported: AtomicUsize,
    pub loaded: AtomicUsize,
    pub saved: AtomicUsize,
    pub disposed: AtomicUsize,
}

impl DelegateProbe {
    pub fn constructed(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }

    pub fn loaded(&self) -> usize {
        self.loaded.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> usize {
        self.saved.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }
}

/// Delegate that counts its hook calls and fails on request
///
/// Successful hooks leave a trace in the owner: `set_defaults` sets
/// `defaulted`, `load` loads `loaded`, imports set `imported-from`.
#[derive(Debug)]
pub struct CountingDelegate {
    probe: Arc<DelegateProbe>,
    behavior: DelegateBehavior,
}

impl ConfigurationDelegate for CountingDelegate {
    fn initialize(&self, _owner: &WorkingCopy) -> Result<(), DelegateError> {
        self.probe.initialized.fetch_add(1, Ordering::SeqCst);
        self.behavior.initialize.into_result("initialize")
    }

    fn set_defaults(&self, owner: &WorkingCopy) -> Result<(), DelegateError> {
        self.probe.defaulted.fetch_add(1, Ordering::SeqCst);
        self.behavior.defaults.into_result("set_defaults")?;
        owner.set_attribute("defaulted", true);
        Ok(())
    }

    fn import_from_path(
        &self,
        owner: &WorkingCopy,
        path: &Path,
        _progress: &dyn ProgressMonitor,
    ) -> Result<(), DelegateError> {
        self.probe.imported.fetch_add(1, Ordering::SeqCst);
        self.behavior.import.into_result("import_from_path")?;
        owner.set_attribute("imported-from", path.display().to_string());
        Ok(())
    }

    fn import_from_runtime(
        &self,
        owner: &WorkingCopy,
        runtime: &RuntimeDescriptor,
        _progress: &dyn ProgressMonitor,
    ) -> Result<(), DelegateError> {
        self.probe.imported.fetch_add(1, Ordering::SeqCst);
        self.behavior.import.into_result("import_from_runtime")?;
        owner.set_attribute("imported-from", runtime.id.as_str());
        Ok(())
    }

    fn load(&self, owner: &WorkingCopy, _progress: &dyn ProgressMonitor) -> Result<(), DelegateError> {
        self.probe.loaded.fetch_add(1, Ordering::SeqCst);
        self.behavior.load.into_result("load")?;
        owner.load_attribute("loaded", true);
        Ok(())
    }

    fn save(&self, _owner: &WorkingCopy, _progress: &dyn ProgressMonitor) -> Result<(), DelegateError> {
        self.probe.saved.fetch_add(1, Ordering::SeqCst);
        self.behavior.save.into_result("save")
    }

    fn dispose(&self) {
        self.probe.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Registry with one instrumented type, [`COUNTING_TYPE_ID`]
pub fn counting_registry(behavior: DelegateBehavior) -> (DelegateRegistry, Arc<DelegateProbe>) {
    let probe = Arc::new(DelegateProbe::default());
    let mut registry = DelegateRegistry::with_defaults();
    let shared = Arc::clone(&probe);
    registry.register(
        ConfigurationType::new(COUNTING_TYPE_ID, "Counting"),
        move || {
            shared.constructed.fetch_add(1, Ordering::SeqCst);
            if !behavior.construction_delay.is_zero() {
                std::thread::sleep(behavior.construction_delay);
            }
            Ok(Arc::new(CountingDelegate {
                probe: Arc::clone(&shared),
                behavior,
            }) as Arc<dyn ConfigurationDelegate>)
        },
    );
    (registry, probe)
}

/// Registry whose `type_id` factory always fails
pub fn failing_registry(type_id: &str) -> DelegateRegistry {
    let mut registry = DelegateRegistry::new();
    registry.register(ConfigurationType::new(type_id, "Broken"), || {
        Err(DelegateError::failed("factory unavailable"))
    });
    registry
}

/// Listener that records every event it sees
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<PropertyChangeEvent>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<PropertyChangeEvent> {
        self.events.lock().clone()
    }

    pub fn properties(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.property.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.events.lock().len()
    }
}

impl PropertyChangeListener for RecordingListener {
    fn property_changed(&self, event: &PropertyChangeEvent) {
        self.events.lock().push(event.clone());
    }
}

/// In-memory workspace and its storage
pub fn memory_workspace(registry: DelegateRegistry) -> (Workspace, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let workspace = Workspace::new(WorkspaceConfig::default(), storage.clone(), registry);
    (workspace, storage)
}

/// Persist a minimal configuration of `type_id` and open it
pub fn seed_original(
    workspace: &Workspace,
    id: &str,
    type_id: &str,
    extra: &[(&str, AttributeValue)],
) -> Arc<ConfigurationResource> {
    let location = Location::from(format!("{id}.json"));
    let mut attributes = Attributes::new();
    attributes.insert(keys::ID.to_string(), id.into());
    attributes.insert(keys::NAME.to_string(), id.into());
    attributes.insert(keys::CONFIGURATION_TYPE_ID.to_string(), type_id.into());
    for (key, value) in extra {
        attributes.insert((*key).to_string(), value.clone());
    }
    workspace.storage().persist(&location, &attributes).unwrap();
    workspace.open(&location).unwrap()
}
