#![forbid(unsafe_code)]

//! Navigation plumbing shared by every router kind.
//!
//! - [`source`]: the synchronous event bus routers subscribe to.
//! - [`status`]: desired lifecycle tiers and their derivation from a
//!   navigation state.

pub mod source;
pub mod status;

pub(crate) use source::Backlog;
pub use source::{DEFAULT_MAX_NAVIGATION_DEPTH, NavObserver, NavigationSource, SimpleNavigation};
pub use status::{ChildNavState, NavState, Status, derive_slot_statuses, derive_stack_statuses, ensure_unique};
