#![forbid(unsafe_code)]

//! Reactive values: the output channel of every router.
//!
//! - [`Observable`]: a shared, version-tracked value holder with change
//!   notification.
//! - [`Value`]: the read-only view routers hand out. Implemented by
//!   `Observable`, by [`MappedValue`] (a pure transform re-evaluated on every
//!   update) and by [`ConstValue`] (never changes).
//! - [`Subscription`]: RAII guard returned by every `subscribe`.
//!
//! # Invariants
//!
//! 1. `subscribe` delivers the current value synchronously before returning,
//!    then every later update.
//! 2. Subscribers are notified in registration order.
//! 3. `Observable::set` with a value equal to the current one is a no-op (no
//!    version bump, no notification).
//! 4. A value set from inside a notification is delivered after the current
//!    round finishes, so no subscriber ever sees an older value after a
//!    newer one.

pub mod observable;
pub mod operator;

pub use observable::Observable;
pub use operator::{ConstValue, MappedValue, Value};
pub use waypoint_core::Subscription;
