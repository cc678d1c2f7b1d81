#![forbid(unsafe_code)]

//! Back-button dispatch.
//!
//! A [`BackDispatcher`] is an ordered registry of entries that may handle a
//! back signal. Entries are either [`BackCallback`]s or nested child
//! dispatchers (one per child component). The host calls
//! [`BackDispatcher::back`] when the platform delivers a back press.
//!
//! # Selection rule
//!
//! Among the enabled entries, the one with the highest priority wins. Ties go
//! to the entry registered most recently, so a child registered after its
//! parent router's own callback is consulted first.
//!
//! A child dispatcher is enabled only while it is *active* (its component is
//! at least started) and at least one of its own entries is enabled.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// One back handler.
pub struct BackCallback {
    enabled: Cell<bool>,
    priority: i32,
    on_back: Box<dyn Fn()>,
}

impl BackCallback {
    /// Priority used by routers and most components.
    pub const PRIORITY_DEFAULT: i32 = 0;

    /// Create a callback with [`PRIORITY_DEFAULT`](Self::PRIORITY_DEFAULT).
    pub fn new(enabled: bool, on_back: impl Fn() + 'static) -> Self {
        Self::with_priority(enabled, Self::PRIORITY_DEFAULT, on_back)
    }

    pub fn with_priority(enabled: bool, priority: i32, on_back: impl Fn() + 'static) -> Self {
        Self {
            enabled: Cell::new(enabled),
            priority,
            on_back: Box::new(on_back),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }
}

impl fmt::Debug for BackCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackCallback")
            .field("enabled", &self.enabled.get())
            .field("priority", &self.priority)
            .finish()
    }
}

#[derive(Clone)]
enum Target {
    Callback(Rc<BackCallback>),
    Child(Rc<DispatcherInner>),
}

impl Target {
    fn is_enabled(&self) -> bool {
        match self {
            Self::Callback(callback) => callback.is_enabled(),
            Self::Child(child) => child.is_enabled(),
        }
    }
}

struct Entry {
    id: u64,
    priority: i32,
    target: Target,
}

struct DispatcherInner {
    entries: RefCell<Vec<Entry>>,
    next_id: Cell<u64>,
    active: Cell<bool>,
}

impl DispatcherInner {
    fn new(active: bool) -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            active: Cell::new(active),
        }
    }

    fn is_enabled(&self) -> bool {
        self.active.get() && self.entries.borrow().iter().any(|e| e.target.is_enabled())
    }

    fn insert(self: &Rc<Self>, priority: i32, target: Target) -> BackRegistration {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push(Entry {
            id,
            priority,
            target,
        });
        BackRegistration {
            dispatcher: Rc::downgrade(self),
            id,
            released: Cell::new(false),
        }
    }

    fn back(&self) -> bool {
        if !self.active.get() {
            return false;
        }
        let chosen = {
            let entries = self.entries.borrow();
            entries
                .iter()
                .filter(|e| e.target.is_enabled())
                .max_by_key(|e| (e.priority, e.id))
                .map(|e| e.target.clone())
        };
        match chosen {
            Some(Target::Callback(callback)) => {
                tracing::debug!(message = "back.dispatch", priority = callback.priority);
                (callback.on_back)();
                true
            }
            Some(Target::Child(child)) => child.back(),
            None => false,
        }
    }
}

/// Ordered registry of back handlers.
///
/// Cloning creates a new handle to the **same** registry.
#[derive(Clone)]
pub struct BackDispatcher {
    inner: Rc<DispatcherInner>,
}

impl Default for BackDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BackDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackDispatcher")
            .field("active", &self.inner.active.get())
            .field("entries", &self.inner.entries.borrow().len())
            .finish()
    }
}

impl BackDispatcher {
    /// A root dispatcher. Roots are always active.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DispatcherInner::new(true)),
        }
    }

    /// Register a callback. It stays registered until the returned
    /// registration is dropped or [`unregister`](BackRegistration::unregister)ed.
    pub fn register(&self, callback: &Rc<BackCallback>) -> BackRegistration {
        self.inner
            .insert(callback.priority, Target::Callback(Rc::clone(callback)))
    }

    /// Create a nested dispatcher attached to this one.
    ///
    /// The child starts inactive; see [`set_active`](Self::set_active).
    pub fn child(&self) -> (BackDispatcher, BackRegistration) {
        let child = Rc::new(DispatcherInner::new(false));
        let registration = self.inner.insert(
            BackCallback::PRIORITY_DEFAULT,
            Target::Child(Rc::clone(&child)),
        );
        (BackDispatcher { inner: child }, registration)
    }

    /// Toggle whether this dispatcher takes part in selection.
    pub fn set_active(&self, active: bool) {
        self.inner.active.set(active);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Whether a back press would be handled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    /// Deliver a back press. Returns `true` if some entry handled it.
    pub fn back(&self) -> bool {
        self.inner.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// RAII registration in a [`BackDispatcher`].
#[must_use = "dropping a BackRegistration immediately unregisters the entry"]
pub struct BackRegistration {
    dispatcher: Weak<DispatcherInner>,
    id: u64,
    released: Cell<bool>,
}

impl BackRegistration {
    /// Remove the entry. Idempotent.
    pub fn unregister(&self) {
        if self.released.replace(true) {
            return;
        }
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            let removed: Vec<Entry> = {
                let mut entries = dispatcher.entries.borrow_mut();
                let (gone, kept): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut *entries)
                    .into_iter()
                    .partition(|e| e.id == self.id);
                *entries = kept;
                gone
            };
            drop(removed);
        }
    }
}

impl Drop for BackRegistration {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl fmt::Debug for BackRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackRegistration")
            .field("id", &self.id)
            .field("released", &self.released.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(enabled: bool, priority: i32) -> (Rc<BackCallback>, Rc<Cell<u32>>) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let callback = Rc::new(BackCallback::with_priority(enabled, priority, move || {
            h.set(h.get() + 1)
        }));
        (callback, hits)
    }

    #[test]
    fn empty_dispatcher_does_not_handle() {
        let dispatcher = BackDispatcher::new();
        assert!(!dispatcher.is_enabled());
        assert!(!dispatcher.back());
    }

    #[test]
    fn latest_registration_wins_ties() {
        let dispatcher = BackDispatcher::new();
        let (first, first_hits) = counter(true, 0);
        let (second, second_hits) = counter(true, 0);
        let _r1 = dispatcher.register(&first);
        let _r2 = dispatcher.register(&second);

        assert!(dispatcher.back());
        assert_eq!(first_hits.get(), 0);
        assert_eq!(second_hits.get(), 1);
    }

    #[test]
    fn priority_beats_recency() {
        let dispatcher = BackDispatcher::new();
        let (high, high_hits) = counter(true, 10);
        let (low, low_hits) = counter(true, 0);
        let _r1 = dispatcher.register(&high);
        let _r2 = dispatcher.register(&low);

        dispatcher.back();
        assert_eq!(high_hits.get(), 1);
        assert_eq!(low_hits.get(), 0);
    }

    #[test]
    fn disabled_callbacks_are_skipped() {
        let dispatcher = BackDispatcher::new();
        let (a, a_hits) = counter(true, 0);
        let (b, b_hits) = counter(false, 0);
        let _r1 = dispatcher.register(&a);
        let _r2 = dispatcher.register(&b);

        dispatcher.back();
        assert_eq!(a_hits.get(), 1);
        assert_eq!(b_hits.get(), 0);

        b.set_enabled(true);
        dispatcher.back();
        assert_eq!(b_hits.get(), 1);
    }

    #[test]
    fn dropping_registration_unregisters() {
        let dispatcher = BackDispatcher::new();
        let (a, _) = counter(true, 0);
        let registration = dispatcher.register(&a);
        assert_eq!(dispatcher.len(), 1);
        drop(registration);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn child_requires_activation() {
        let parent = BackDispatcher::new();
        let (parent_cb, parent_hits) = counter(true, 0);
        let _r = parent.register(&parent_cb);

        let (child, _child_reg) = parent.child();
        let (child_cb, child_hits) = counter(true, 0);
        let _cr = child.register(&child_cb);

        parent.back();
        assert_eq!(parent_hits.get(), 1);
        assert_eq!(child_hits.get(), 0);

        child.set_active(true);
        parent.back();
        assert_eq!(child_hits.get(), 1);
        assert_eq!(parent_hits.get(), 1);
    }

    #[test]
    fn child_without_enabled_entries_falls_through() {
        let parent = BackDispatcher::new();
        let (parent_cb, parent_hits) = counter(true, 0);
        let _r = parent.register(&parent_cb);
        let (child, _child_reg) = parent.child();
        child.set_active(true);

        assert!(parent.back());
        assert_eq!(parent_hits.get(), 1);
    }
}
