#![forbid(unsafe_code)]

//! Waypoint public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. The
//! component building blocks live in `waypoint-core`; routers and the
//! reactive plumbing they emit through live in `waypoint-runtime` (enabled
//! by the default `runtime` feature).

pub mod prelude {
    pub use waypoint_core as core;
    #[cfg(feature = "runtime")]
    pub use waypoint_runtime as runtime;

    pub use waypoint_core::{
        BackCallback, BackDispatcher, BackRegistration, ComponentContext, Instance,
        InstanceKeeper, LifecycleCallbacks, LifecycleEvent, LifecycleRegistry, LifecycleState,
        SavedState, SerializableContainer, StateKeeper, Subscription,
    };

    #[cfg(feature = "runtime")]
    pub use waypoint_runtime::reactive::{Observable, Value};
    #[cfg(feature = "runtime")]
    pub use waypoint_runtime::router::{
        ChildSlot, ChildSlotValue, ChildStack, ChildStackValue, CreatedChild, SlotConfig,
        SlotNavigation, SlotNavigator, StackConfig, StackNavigation, StackNavigator, StateCodec,
        child_slot, child_stack,
    };
    #[cfg(feature = "runtime")]
    pub use waypoint_runtime::{NavResult, NavigationError};
}
