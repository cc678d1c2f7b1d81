#![forbid(unsafe_code)]

//! Live children owned by a router.
//!
//! Only [`CreatedChild`] leaves the router. [`LiveChild`] carries the
//! child's scoped collaborators (lifecycle, state keeper, instance keeper,
//! back dispatcher) and is destroyed together with them.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use waypoint_core::{
    BackRegistration, ComponentContext, InstanceKeeper, LifecycleRegistry, LifecycleState,
    SavedState, StateKeeper,
};

use crate::nav::Status;

/// A child as seen by consumers: its configuration and its instance.
///
/// Two children are equal when their configurations are equal and they share
/// the same instance allocation.
pub struct CreatedChild<C, T> {
    pub configuration: C,
    pub instance: Rc<T>,
}

impl<C, T> CreatedChild<C, T> {
    #[must_use]
    pub fn new(configuration: C, instance: Rc<T>) -> Self {
        Self {
            configuration,
            instance,
        }
    }
}

impl<C: Clone, T> Clone for CreatedChild<C, T> {
    fn clone(&self) -> Self {
        Self {
            configuration: self.configuration.clone(),
            instance: Rc::clone(&self.instance),
        }
    }
}

impl<C: PartialEq, T> PartialEq for CreatedChild<C, T> {
    fn eq(&self, other: &Self) -> bool {
        self.configuration == other.configuration && Rc::ptr_eq(&self.instance, &other.instance)
    }
}

impl<C: Eq, T> Eq for CreatedChild<C, T> {}

impl<C: fmt::Debug, T> fmt::Debug for CreatedChild<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatedChild")
            .field("configuration", &self.configuration)
            .field("instance", &Rc::as_ptr(&self.instance))
            .finish()
    }
}

/// One slot of a reconciliation plan.
pub(crate) enum Child<C, T> {
    /// Kept or newly created; part of the next snapshot.
    Created(Rc<LiveChild<C, T>>),
    /// Absent from the next state; torn down before the snapshot is emitted.
    Destroyed(Rc<LiveChild<C, T>>),
}

pub(crate) struct LiveChild<C, T> {
    configuration: C,
    instance: Rc<T>,
    /// The child's own collaborators, handed to the factory.
    context: ComponentContext,
    /// Attachment of the child's back dispatcher to the parent's.
    back_registration: BackRegistration,
    /// Desired tier from the last pass; the lifecycle is capped by the parent.
    status: Cell<Status>,
    destroyed: Cell<bool>,
}

impl<C: Clone, T> LiveChild<C, T> {
    pub(crate) fn configuration(&self) -> &C {
        &self.configuration
    }

    pub(crate) fn context(&self) -> &ComponentContext {
        &self.context
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> Status {
        self.status.get()
    }

    pub(crate) fn set_status(&self, status: Status) {
        self.status.set(status);
    }

    pub(crate) fn lifecycle_state(&self) -> LifecycleState {
        self.context.lifecycle().state()
    }

    /// Lifecycle the child should be in under a parent in `parent` state.
    pub(crate) fn target(&self, parent: LifecycleState) -> LifecycleState {
        self.status.get().lifecycle_state().min(parent)
    }

    /// Walk the lifecycle to [`target`](Self::target), one step at a time.
    pub(crate) fn drive(&self, parent: LifecycleState) {
        if self.destroyed.get() {
            return;
        }
        let lifecycle = self.context.lifecycle();
        lifecycle.move_to(self.target(parent));
        self.context
            .back_dispatcher()
            .set_active(lifecycle.state() >= LifecycleState::Started);
    }

    /// Tear the child down. Idempotent.
    pub(crate) fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.context.back_dispatcher().set_active(false);
        self.context.lifecycle().destroy();
        self.context.instance_keeper().destroy();
        self.back_registration.unregister();
    }

    #[cfg(test)]
    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub(crate) fn created(&self) -> CreatedChild<C, T> {
        CreatedChild::new(self.configuration.clone(), Rc::clone(&self.instance))
    }
}

pub(crate) type Factory<C, T> = Box<dyn Fn(&C, ComponentContext) -> T>;

/// Builds children under one parent context.
pub(crate) struct ChildSpawner<C, T> {
    parent: ComponentContext,
    factory: Factory<C, T>,
}

impl<C: Clone, T> ChildSpawner<C, T> {
    pub(crate) fn new(parent: ComponentContext, factory: Factory<C, T>) -> Self {
        Self { parent, factory }
    }

    /// Create a child in `Initialized` state with freshly scoped
    /// collaborators, seeded from `saved` if given.
    pub(crate) fn spawn(&self, configuration: &C, saved: Option<SavedState>) -> Rc<LiveChild<C, T>> {
        let (back_dispatcher, back_registration) = self.parent.back_dispatcher().child();
        let context = ComponentContext::new(
            LifecycleRegistry::new(),
            StateKeeper::restored(saved.unwrap_or_default()),
            InstanceKeeper::new(),
            back_dispatcher,
        );
        let instance = Rc::new((self.factory)(configuration, context.clone()));
        Rc::new(LiveChild {
            configuration: configuration.clone(),
            instance,
            context,
            back_registration,
            status: Cell::new(Status::Created),
            destroyed: Cell::new(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::{LifecycleCallbacks, LifecycleEvent};

    #[test]
    fn created_child_equality_is_config_plus_identity() {
        let a = CreatedChild::new('a', Rc::new(1));
        let same = a.clone();
        let other_instance = CreatedChild::new('a', Rc::new(1));
        assert_eq!(a, same);
        assert_ne!(a, other_instance);
    }

    #[test]
    fn drive_caps_at_parent_and_gates_back() {
        let parent = ComponentContext::root(LifecycleRegistry::new());
        let spawner: ChildSpawner<char, ()> = ChildSpawner::new(parent, Box::new(|_, _| ()));
        let child = spawner.spawn(&'a', None);
        child.set_status(Status::Resumed);

        child.drive(LifecycleState::Created);
        assert_eq!(child.lifecycle_state(), LifecycleState::Created);
        assert!(!child.context().back_dispatcher().is_active());

        child.drive(LifecycleState::Resumed);
        assert_eq!(child.lifecycle_state(), LifecycleState::Resumed);
        assert!(child.context().back_dispatcher().is_active());
    }

    #[test]
    fn destroy_is_idempotent_and_detaches_back() {
        let parent = ComponentContext::root(LifecycleRegistry::new());
        let parent_back = parent.back_dispatcher().clone();
        let events = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let spawner: ChildSpawner<char, waypoint_core::Subscription> = ChildSpawner::new(
            parent,
            Box::new(move |_, ctx| {
                let sink = Rc::clone(&sink);
                ctx.lifecycle()
                    .subscribe(LifecycleCallbacks::on_any(move |e| sink.borrow_mut().push(e)))
            }),
        );
        let child = spawner.spawn(&'a', None);
        assert_eq!(parent_back.len(), 1);
        child.drive(LifecycleState::Resumed);
        child.destroy();
        child.destroy();
        assert!(child.is_destroyed());
        assert_eq!(parent_back.len(), 0);
        let destroys = events
            .borrow()
            .iter()
            .filter(|e| **e == LifecycleEvent::Destroy)
            .count();
        assert_eq!(destroys, 1);
    }
}
