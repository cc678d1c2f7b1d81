#![forbid(unsafe_code)]

//! Core: component lifecycle, back dispatch, state and instance retention.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`) and synchronous. The
//! navigation engine in `waypoint-runtime` builds on these collaborators to
//! give every child component its own scoped context.

pub mod back;
pub mod context;
pub mod error;
pub mod instance_keeper;
pub mod lifecycle;
pub mod state_keeper;
pub mod subscription;

pub use back::{BackCallback, BackDispatcher, BackRegistration};
pub use context::ComponentContext;
pub use error::StateKeeperError;
pub use instance_keeper::{Instance, InstanceKeeper};
pub use lifecycle::{LifecycleCallbacks, LifecycleEvent, LifecycleRegistry, LifecycleState};
pub use state_keeper::{SavedState, SerializableContainer, StateKeeper};
pub use subscription::Subscription;
