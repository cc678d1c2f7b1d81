#![forbid(unsafe_code)]

//! Synchronous navigation event bus.
//!
//! [`SimpleNavigation`] delivers each published event to every registered
//! observer, in registration order, before [`navigate`](SimpleNavigation::navigate)
//! returns. Nothing is buffered: observers registered later never see earlier
//! events.
//!
//! Publishing from inside an observer is allowed. Each nested publish
//! increments a depth counter; a publish that would exceed the configured
//! maximum is rejected with [`NavigationError::ReentrancyLimit`] instead of
//! growing the call stack without bound.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::{NavResult, NavigationError};

/// Default cap on nested [`SimpleNavigation::navigate`] calls.
pub const DEFAULT_MAX_NAVIGATION_DEPTH: usize = 64;

/// Observer of navigation events. Identity is the `Rc` allocation.
pub type NavObserver<E> = Rc<dyn Fn(&E) -> NavResult>;

/// A source of navigation events that routers attach to.
pub trait NavigationSource<E> {
    /// Register `observer` for every subsequent event. Registering the same
    /// observer twice has no effect.
    fn subscribe(&self, observer: &NavObserver<E>);

    /// Remove `observer`. No-op if it is not registered.
    fn unsubscribe(&self, observer: &NavObserver<E>);
}

struct Bus<E> {
    observers: RefCell<Vec<NavObserver<E>>>,
    depth: Cell<usize>,
    max_depth: usize,
}

/// Cloneable handle to a synchronous event bus.
pub struct SimpleNavigation<E> {
    bus: Rc<Bus<E>>,
}

impl<E> Clone for SimpleNavigation<E> {
    fn clone(&self) -> Self {
        Self {
            bus: Rc::clone(&self.bus),
        }
    }
}

impl<E> fmt::Debug for SimpleNavigation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNavigation")
            .field("observers", &self.bus.observers.borrow().len())
            .field("depth", &self.bus.depth.get())
            .field("max_depth", &self.bus.max_depth)
            .finish()
    }
}

impl<E> Default for SimpleNavigation<E> {
    fn default() -> Self {
        Self::new()
    }
}

struct DepthGuard<'a>(&'a Cell<usize>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl<E> SimpleNavigation<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_NAVIGATION_DEPTH)
    }

    /// A bus rejecting publishes nested deeper than `max_depth`.
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            bus: Rc::new(Bus {
                observers: RefCell::new(Vec::new()),
                depth: Cell::new(0),
                max_depth: max_depth.max(1),
            }),
        }
    }

    /// Deliver `event` to every current observer.
    ///
    /// Every observer receives the event even if an earlier one fails; the
    /// first error is returned.
    ///
    /// # Errors
    ///
    /// [`NavigationError::ReentrancyLimit`] when nested too deeply, otherwise
    /// whatever the first failing observer returned.
    pub fn navigate(&self, event: E) -> NavResult {
        let depth = self.bus.depth.get();
        if depth >= self.bus.max_depth {
            tracing::warn!(
                message = "navigation.depth_exceeded",
                limit = self.bus.max_depth
            );
            return Err(NavigationError::ReentrancyLimit {
                limit: self.bus.max_depth,
            });
        }
        self.bus.depth.set(depth + 1);
        let _guard = DepthGuard(&self.bus.depth);

        let observers: Vec<NavObserver<E>> = self.bus.observers.borrow().clone();
        tracing::trace!(
            message = "navigation.publish",
            observers = observers.len(),
            depth = depth + 1
        );
        let mut first_error = None;
        for observer in observers {
            if let Err(err) = observer(&event) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.bus.observers.borrow().len()
    }
}

impl<E> NavigationSource<E> for SimpleNavigation<E> {
    fn subscribe(&self, observer: &NavObserver<E>) {
        let mut observers = self.bus.observers.borrow_mut();
        if !observers.iter().any(|o| Rc::ptr_eq(o, observer)) {
            observers.push(Rc::clone(observer));
        }
    }

    fn unsubscribe(&self, observer: &NavObserver<E>) {
        self.bus
            .observers
            .borrow_mut()
            .retain(|o| !Rc::ptr_eq(o, observer));
    }
}

/// Events published on a source while the router that will listen to it is
/// still being built (for example, a factory navigating during the initial
/// reconcile). Captured in order and handed back by [`release`](Self::release).
pub(crate) struct Backlog<E: Clone + 'static, S: NavigationSource<E>> {
    source: S,
    observer: NavObserver<E>,
    /// Shared with `observer`.
    events: Rc<RefCell<Vec<E>>>,
}

impl<E: Clone + 'static, S: NavigationSource<E> + Clone> Backlog<E, S> {
    /// Start buffering every event published on `source`.
    pub(crate) fn capture(source: &S) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let observer: NavObserver<E> = Rc::new(move |event: &E| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });
        source.subscribe(&observer);
        Self {
            source: source.clone(),
            observer,
            events,
        }
    }

    /// Stop buffering and return the captured events, oldest first.
    pub(crate) fn release(self) -> Vec<E> {
        self.source.unsubscribe(&self.observer);
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl<E: Clone + 'static, S: NavigationSource<E>> Drop for Backlog<E, S> {
    fn drop(&mut self) {
        self.source.unsubscribe(&self.observer);
    }
}
