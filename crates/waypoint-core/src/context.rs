#![forbid(unsafe_code)]

//! Component context: the bundle of scoped collaborators every component
//! receives.
//!
//! A [`ComponentContext`] is cheaply cloneable (`Rc` inside each part) and
//! carries:
//!
//! - a [`LifecycleRegistry`] driven by whoever owns the component;
//! - a [`StateKeeper`] for state that must survive process recreation;
//! - an [`InstanceKeeper`] for retained helpers torn down with the component;
//! - a [`BackDispatcher`] where the component registers back handlers.
//!
//! The host builds the root with [`ComponentContext::root`] (first launch) or
//! [`ComponentContext::restored`] (after process death). Routers derive child
//! contexts for the components they create; a child's collaborators are
//! created together with the child and destroyed together with it.
//!
//! # Example
//!
//! ```
//! use waypoint_core::context::ComponentContext;
//! use waypoint_core::lifecycle::{LifecycleRegistry, LifecycleState};
//!
//! let lifecycle = LifecycleRegistry::new();
//! let root = ComponentContext::root(lifecycle.clone());
//! lifecycle.resume();
//! assert_eq!(root.lifecycle().state(), LifecycleState::Resumed);
//! ```

use crate::back::BackDispatcher;
use crate::instance_keeper::InstanceKeeper;
use crate::lifecycle::LifecycleRegistry;
use crate::state_keeper::{SavedState, StateKeeper};

#[derive(Clone, Debug)]
pub struct ComponentContext {
    lifecycle: LifecycleRegistry,
    state_keeper: StateKeeper,
    instance_keeper: InstanceKeeper,
    back_dispatcher: BackDispatcher,
}

impl ComponentContext {
    /// Assemble a context from explicit parts.
    #[must_use]
    pub fn new(
        lifecycle: LifecycleRegistry,
        state_keeper: StateKeeper,
        instance_keeper: InstanceKeeper,
        back_dispatcher: BackDispatcher,
    ) -> Self {
        Self {
            lifecycle,
            state_keeper,
            instance_keeper,
            back_dispatcher,
        }
    }

    /// Root context for a fresh launch.
    #[must_use]
    pub fn root(lifecycle: LifecycleRegistry) -> Self {
        Self::restored(lifecycle, SavedState::default())
    }

    /// Root context seeded with state saved by a previous process.
    #[must_use]
    pub fn restored(lifecycle: LifecycleRegistry, saved: SavedState) -> Self {
        let instance_keeper = InstanceKeeper::new();
        let keeper = instance_keeper.clone();
        lifecycle.do_on_destroy(move || keeper.destroy());
        Self::new(
            lifecycle,
            StateKeeper::restored(saved),
            instance_keeper,
            BackDispatcher::new(),
        )
    }

    #[must_use]
    pub fn lifecycle(&self) -> &LifecycleRegistry {
        &self.lifecycle
    }

    #[must_use]
    pub fn state_keeper(&self) -> &StateKeeper {
        &self.state_keeper
    }

    #[must_use]
    pub fn instance_keeper(&self) -> &InstanceKeeper {
        &self.instance_keeper
    }

    #[must_use]
    pub fn back_dispatcher(&self) -> &BackDispatcher {
        &self.back_dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance_keeper::Instance;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Probe(Rc<Cell<bool>>);

    impl Instance for Probe {
        fn on_destroy(&self) {
            self.0.set(true);
        }
    }

    #[test]
    fn root_instances_die_with_root_lifecycle() {
        let lifecycle = LifecycleRegistry::new();
        let root = ComponentContext::root(lifecycle.clone());
        lifecycle.resume();

        let destroyed = Rc::new(Cell::new(false));
        let d = Rc::clone(&destroyed);
        let _ = root.instance_keeper().get_or_create("probe", || Probe(d));

        lifecycle.destroy();
        assert!(destroyed.get());
    }

    #[test]
    fn restored_context_exposes_saved_state() {
        let keeper = StateKeeper::new();
        keeper.register_value("answer", || 42u8).unwrap();
        let saved = keeper.save();

        let root = ComponentContext::restored(LifecycleRegistry::new(), saved);
        let answer: Option<u8> = root.state_keeper().consume_as("answer").unwrap();
        assert_eq!(answer, Some(42));
    }

    #[test]
    fn clones_share_collaborators() {
        let root = ComponentContext::root(LifecycleRegistry::new());
        let copy = root.clone();
        assert!(root.lifecycle().ptr_eq(copy.lifecycle()));
    }
}
