//! Property change notification
//!
//! [`ChangeNotifier`] keeps an ordered set of [`PropertyChangeListener`]s and
//! fires [`PropertyChangeEvent`]s to a snapshot of them.

use crate::value::AttributeValue;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A named change with its old and new value
///
/// `None` on either side means the attribute was absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChangeEvent {
    /// Attribute (property) name
    pub property: String,
    /// Value before the change
    pub old_value: Option<AttributeValue>,
    /// Value after the change
    pub new_value: Option<AttributeValue>,
}

impl PropertyChangeEvent {
    /// Create a change event
    #[inline]
    #[must_use]
    pub fn new(
        property: impl Into<String>,
        old_value: Option<AttributeValue>,
        new_value: Option<AttributeValue>,
    ) -> Self {
        Self {
            property: property.into(),
            old_value,
            new_value,
        }
    }
}

/// Observer of property changes
///
/// Implemented for any `Fn(&PropertyChangeEvent) + Send + Sync`.
pub trait PropertyChangeListener: Send + Sync {
    /// Called synchronously for every fired change
    fn property_changed(&self, event: &PropertyChangeEvent);
}

impl<F> PropertyChangeListener for F
where
    F: Fn(&PropertyChangeEvent) + Send + Sync,
{
    fn property_changed(&self, event: &PropertyChangeEvent) {
        self(event);
    }
}

/// Shared listener handle; identity is the allocation
pub type ListenerHandle = Arc<dyn PropertyChangeListener>;

/// Ordered listener set with snapshot firing
///
/// # Semantics
/// - Adding a handle already present is a no-op
/// - Removing a handle not present is a no-op
/// - `fire` invokes listeners in registration order; listeners added or
///   removed during a firing do not change who is notified by that firing
/// - No lock is held while listeners run, so a listener may call back into
///   the notifier
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Mutex<Vec<ListenerHandle>>,
}

impl ChangeNotifier {
    /// Create an empty notifier
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    ///
    /// Returns `true` if the listener was not yet registered.
    pub fn add_listener(&self, listener: ListenerHandle) -> bool {
        let mut listeners = self.listeners.lock();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Unregister a listener
    ///
    /// Returns `true` if the listener was registered.
    pub fn remove_listener(&self, listener: &ListenerHandle) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    /// Fire an event to the current listeners
    pub fn fire(&self, event: &PropertyChangeEvent) {
        let snapshot: Vec<ListenerHandle> = self.listeners.lock().clone();
        for listener in &snapshot {
            listener.property_changed(event);
        }
    }

    /// Build and fire an event
    pub fn fire_change(
        &self,
        property: &str,
        old_value: Option<AttributeValue>,
        new_value: Option<AttributeValue>,
    ) {
        self.fire(&PropertyChangeEvent::new(property, old_value, new_value));
    }

    /// Number of registered listeners
    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Drop all listeners
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

fn same_listener(a: &ListenerHandle, b: &ListenerHandle) -> bool {
    // Compare data pointers only; vtable pointers are not unique.
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> ListenerHandle {
        let log = Arc::clone(log);
        Arc::new(move |e: &PropertyChangeEvent| {
            log.lock().push(format!("{tag}:{}", e.property));
        })
    }

    #[test]
    fn duplicate_add_is_noop() {
        let notifier = ChangeNotifier::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        let listener: ListenerHandle = Arc::new(move |_: &PropertyChangeEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(notifier.add_listener(Arc::clone(&listener)));
        assert!(!notifier.add_listener(Arc::clone(&listener)));
        notifier.fire_change("port", None, Some(AttributeValue::Int(1)));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.listener_count(), 1);
    }

    #[test]
    fn remove_non_member_is_noop() {
        let notifier = ChangeNotifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let registered = recorder(&log, "a");
        let stranger = recorder(&log, "b");

        notifier.add_listener(Arc::clone(&registered));
        assert!(!notifier.remove_listener(&stranger));
        assert!(notifier.remove_listener(&registered));
        assert!(!notifier.remove_listener(&registered));
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn fires_in_registration_order() {
        let notifier = ChangeNotifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        notifier.add_listener(recorder(&log, "first"));
        notifier.add_listener(recorder(&log, "second"));
        notifier.add_listener(recorder(&log, "third"));

        notifier.fire_change("name", None, None);

        assert_eq!(
            *log.lock(),
            vec!["first:name", "second:name", "third:name"]
        );
    }

    #[test]
    fn listener_added_during_firing_is_not_notified() {
        let notifier = Arc::new(ChangeNotifier::new());
        let late_calls = Arc::new(AtomicUsize::new(0));

        let n = Arc::clone(&notifier);
        let late = Arc::clone(&late_calls);
        notifier.add_listener(Arc::new(move |_: &PropertyChangeEvent| {
            let late = Arc::clone(&late);
            n.add_listener(Arc::new(move |_: &PropertyChangeEvent| {
                late.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        notifier.fire_change("x", None, None);
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.listener_count(), 2);
    }

    #[test]
    fn listener_removed_during_firing_still_notified() {
        let notifier = Arc::new(ChangeNotifier::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let second = recorder(&log, "second");

        let n = Arc::clone(&notifier);
        let victim = Arc::clone(&second);
        notifier.add_listener(Arc::new(move |_: &PropertyChangeEvent| {
            n.remove_listener(&victim);
        }));
        notifier.add_listener(second);

        notifier.fire_change("x", None, None);
        assert_eq!(*log.lock(), vec!["second:x"]);

        notifier.fire_change("y", None, None);
        assert_eq!(log.lock().len(), 1);
    }
}
