#![forbid(unsafe_code)]

//! Retained, keyed instances scoped to one component.
//!
//! An [`InstanceKeeper`] lets a component park long-lived helpers (tickers,
//! caches, presenters) under a string key. Every retained [`Instance`]
//! receives exactly one [`Instance::on_destroy`] call when the owning
//! component is torn down.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Something that can be retained by an [`InstanceKeeper`].
pub trait Instance: 'static {
    /// Called once when the keeper is destroyed or the instance is removed.
    fn on_destroy(&self) {}
}

struct Slot {
    any: Rc<dyn Any>,
    instance: Rc<dyn Instance>,
}

#[derive(Default)]
struct KeeperInner {
    slots: RefCell<BTreeMap<String, Slot>>,
    destroyed: Cell<bool>,
}

/// Shared handle to a component's retained instances.
#[derive(Clone, Default)]
pub struct InstanceKeeper {
    inner: Rc<KeeperInner>,
}

impl fmt::Debug for InstanceKeeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceKeeper")
            .field("instances", &self.inner.slots.borrow().len())
            .field("destroyed", &self.inner.destroyed.get())
            .finish()
    }
}

impl InstanceKeeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an instance of type `I`.
    #[must_use]
    pub fn get<I: Instance>(&self, key: &str) -> Option<Rc<I>> {
        let any = self.inner.slots.borrow().get(key).map(|s| Rc::clone(&s.any))?;
        any.downcast::<I>().ok()
    }

    /// Return the instance under `key`, creating it with `create` if absent.
    ///
    /// An existing instance of a different type is destroyed and replaced.
    pub fn get_or_create<I: Instance>(&self, key: &str, create: impl FnOnce() -> I) -> Rc<I> {
        if let Some(existing) = self.get::<I>(key) {
            return existing;
        }
        if let Some(stale) = self.remove(key) {
            tracing::warn!(message = "instance_keeper.type_mismatch", key);
            stale.on_destroy();
        }
        let instance = Rc::new(create());
        if self.inner.destroyed.get() {
            // Keeper already torn down: hand the instance out but never retain it.
            instance.on_destroy();
            return instance;
        }
        self.inner.slots.borrow_mut().insert(
            key.to_owned(),
            Slot {
                any: Rc::clone(&instance) as Rc<dyn Any>,
                instance: Rc::clone(&instance) as Rc<dyn Instance>,
            },
        );
        instance
    }

    /// Remove an instance without destroying it.
    pub fn remove(&self, key: &str) -> Option<Rc<dyn Instance>> {
        let slot = self.inner.slots.borrow_mut().remove(key);
        slot.map(|s| s.instance)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.slots.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Destroy every retained instance. Idempotent.
    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        let slots = std::mem::take(&mut *self.inner.slots.borrow_mut());
        for (_, slot) in slots {
            slot.instance.on_destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ticker {
        destroyed: Rc<Cell<u32>>,
    }

    impl Instance for Ticker {
        fn on_destroy(&self) {
            self.destroyed.set(self.destroyed.get() + 1);
        }
    }

    struct Other;
    impl Instance for Other {}

    #[test]
    fn get_or_create_reuses_instance() {
        let keeper = InstanceKeeper::new();
        let destroyed = Rc::new(Cell::new(0));
        let d = Rc::clone(&destroyed);
        let a = keeper.get_or_create("ticker", || Ticker { destroyed: d });
        let b = keeper.get_or_create("ticker", || -> Ticker { unreachable!() });
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn destroy_notifies_once() {
        let keeper = InstanceKeeper::new();
        let destroyed = Rc::new(Cell::new(0));
        let d = Rc::clone(&destroyed);
        let _ = keeper.get_or_create("ticker", || Ticker { destroyed: d });
        keeper.destroy();
        keeper.destroy();
        assert_eq!(destroyed.get(), 1);
        assert!(keeper.is_empty());
    }

    #[test]
    fn type_mismatch_replaces_and_destroys() {
        let keeper = InstanceKeeper::new();
        let destroyed = Rc::new(Cell::new(0));
        let d = Rc::clone(&destroyed);
        let _ = keeper.get_or_create("slot", || Ticker { destroyed: d });
        let _ = keeper.get_or_create("slot", || Other);
        assert_eq!(destroyed.get(), 1);
        assert!(keeper.get::<Other>("slot").is_some());
        assert!(keeper.get::<Ticker>("slot").is_none());
    }

    #[test]
    fn create_after_destroy_is_not_retained() {
        let keeper = InstanceKeeper::new();
        keeper.destroy();
        let destroyed = Rc::new(Cell::new(0));
        let d = Rc::clone(&destroyed);
        let _ = keeper.get_or_create("late", || Ticker { destroyed: d });
        assert_eq!(destroyed.get(), 1);
        assert!(keeper.is_empty());
    }
}
