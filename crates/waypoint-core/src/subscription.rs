#![forbid(unsafe_code)]

//! Cancellation handle shared by every observable surface in waypoint.
//!
//! Registries (lifecycle, observable values, navigation sources) hold their
//! observers as `Weak` references. The strong reference lives inside a
//! [`Subscription`], so dropping or cancelling the subscription makes the
//! observer unreachable and the registry prunes it lazily on its next pass.
//!
//! # Invariants
//!
//! 1. [`Subscription::cancel`] is idempotent.
//! 2. Cancelling one subscription never affects other observers or the
//!    value held by the registry.
//! 3. An observer that is mid-call when cancelled finishes its current call;
//!    it is never invoked again afterwards.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// RAII guard keeping an observer registered.
///
/// Dropping the guard unsubscribes. [`cancel`](Self::cancel) does the same
/// without consuming the guard.
#[must_use = "dropping a Subscription immediately unsubscribes the observer"]
pub struct Subscription {
    guard: RefCell<Option<Rc<dyn Any>>>,
}

impl Subscription {
    /// Wrap the strong half of an observer.
    pub fn new(guard: Rc<dyn Any>) -> Self {
        Self {
            guard: RefCell::new(Some(guard)),
        }
    }

    /// A subscription that was never attached to anything.
    ///
    /// Used by values that never change and therefore never notify again.
    pub fn empty() -> Self {
        Self {
            guard: RefCell::new(None),
        }
    }

    /// Unregister the observer. Safe to call any number of times.
    pub fn cancel(&self) {
        // Take first, drop after the borrow ends: the guard may own closures
        // whose destructors touch this subscription.
        let guard = self.guard.borrow_mut().take();
        drop(guard);
    }

    /// Whether the observer is still registered through this handle.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.guard.borrow().is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
