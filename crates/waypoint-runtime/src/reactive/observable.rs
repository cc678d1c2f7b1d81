#![forbid(unsafe_code)]

//! Single-slot observable value.
//!
//! # Design
//!
//! [`Observable<T>`] keeps its value, version counter and subscriber list in
//! one `Rc`. Subscribers are stored as `Weak` references to boxed callbacks;
//! the strong side lives in the returned [`Subscription`], so dropping the
//! guard unsubscribes and dead entries are pruned lazily on the next
//! notification.
//!
//! Notification never holds a `RefCell` borrow while a callback runs.
//! Callbacks may read the observable, subscribe, unsubscribe, or set a new
//! value. A nested `set` updates the value immediately but its delivery is
//! deferred until the round in progress completes; the outer round then
//! starts over with the newest value.
//!
//! # Failure Modes
//!
//! - **Callback panics**: the value is already committed. The emitting flag
//!   is reset by a drop guard so the observable stays usable.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::operator::Value;
use waypoint_core::Subscription;

struct Observer<T>(Box<dyn Fn(&T)>);

struct ObservableInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    subscribers: RefCell<Vec<Weak<Observer<T>>>>,
    emitting: Cell<bool>,
    pending: Cell<bool>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** value.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

struct EmitGuard<'a>(&'a Cell<bool>);

impl Drop for EmitGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<T> Observable<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                subscribers: RefCell::new(Vec::new()),
                emitting: Cell::new(false),
                pending: Cell::new(false),
            }),
        }
    }

    /// Borrow the current value for the duration of `f`.
    ///
    /// `f` must not set the value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Number of committed mutations.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Live subscriber count. Dead entries are pruned first.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        subscribers.retain(|w| w.strong_count() > 0);
        subscribers.len()
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Store `value` and notify every subscriber, even if it is equal to the
    /// current value.
    pub fn replace(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.inner.version.set(self.inner.version.get() + 1);
        self.notify();
    }

    /// Register `observer`, delivering the current value immediately.
    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription {
        let observer = Rc::new(Observer(Box::new(observer)));
        self.inner
            .subscribers
            .borrow_mut()
            .push(Rc::downgrade(&observer));
        let current = self.get();
        (observer.0)(&current);
        Subscription::new(observer)
    }

    fn notify(&self) {
        if self.inner.emitting.get() {
            self.inner.pending.set(true);
            return;
        }
        self.inner.emitting.set(true);
        let _guard = EmitGuard(&self.inner.emitting);
        loop {
            self.inner.pending.set(false);
            let live: Vec<Rc<Observer<T>>> = {
                let mut subscribers = self.inner.subscribers.borrow_mut();
                subscribers.retain(|w| w.strong_count() > 0);
                subscribers.iter().filter_map(Weak::upgrade).collect()
            };
            let snapshot = self.get();
            for observer in live {
                if self.inner.pending.get() {
                    break;
                }
                (observer.0)(&snapshot);
            }
            if !self.inner.pending.get() {
                break;
            }
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Store `value` if it differs from the current one, then notify.
    pub fn set(&self, value: T) {
        if *self.inner.value.borrow() == value {
            return;
        }
        self.replace(value);
    }

    /// Derive the next value from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.with(f);
        self.set(next);
    }
}

impl<T: Clone + 'static> Value<T> for Observable<T> {
    fn value(&self) -> T {
        self.get()
    }

    fn subscribe_boxed(&self, observer: Box<dyn Fn(&T)>) -> Subscription {
        Observable::subscribe(self, observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, impl Fn(&T) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |v: &T| sink.borrow_mut().push(v.clone()))
    }

    #[test]
    fn subscribe_delivers_current_then_updates() {
        let obs = Observable::new(1);
        let (log, observer) = recorder();
        let _sub = obs.subscribe(observer);
        obs.set(2);
        obs.set(3);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn equal_set_is_noop() {
        let obs = Observable::new("a".to_string());
        let (log, observer) = recorder();
        let _sub = obs.subscribe(observer);
        obs.set("a".to_string());
        assert_eq!(obs.version(), 0);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn replace_always_notifies() {
        let obs = Observable::new(5);
        let (log, observer) = recorder();
        let _sub = obs.subscribe(observer);
        obs.replace(5);
        assert_eq!(obs.version(), 1);
        assert_eq!(*log.borrow(), vec![5, 5]);
    }

    #[test]
    fn update_derives_from_current() {
        let obs = Observable::new(10);
        obs.update(|v| v * 2);
        assert_eq!(obs.get(), 20);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let obs = Observable::new(0);
        let (log, observer) = recorder();
        let sub = obs.subscribe(observer);
        obs.set(1);
        drop(sub);
        obs.set(2);
        assert_eq!(*log.borrow(), vec![0, 1]);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn cancel_is_idempotent_and_isolated() {
        let obs = Observable::new(0);
        let (a_log, a) = recorder();
        let (b_log, b) = recorder();
        let sub_a = obs.subscribe(a);
        let _sub_b = obs.subscribe(b);
        sub_a.cancel();
        sub_a.cancel();
        obs.set(1);
        assert_eq!(*a_log.borrow(), vec![0]);
        assert_eq!(*b_log.borrow(), vec![0, 1]);
        assert_eq!(obs.get(), 1);
    }

    #[test]
    fn nested_set_never_delivers_stale_value() {
        let obs = Observable::new(0);
        let inner = obs.clone();
        let _bump = obs.subscribe(move |v| {
            if *v == 1 {
                inner.set(2);
            }
        });
        let (log, observer) = recorder();
        let _sub = obs.subscribe(observer);
        obs.set(1);
        assert_eq!(obs.get(), 2);
        let log = log.borrow();
        assert_eq!(log.last(), Some(&2));
        assert!(!log.contains(&1), "stale value delivered after newer one: {log:?}");
    }

    #[test]
    fn subscribers_notified_in_registration_order() {
        let obs = Observable::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));
        let subs: Vec<_> = (0..3)
            .map(|i| {
                let order = Rc::clone(&order);
                obs.subscribe(move |_| order.borrow_mut().push(i))
            })
            .collect();
        order.borrow_mut().clear();
        obs.set(1);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn debug_does_not_require_clone() {
        #[derive(Debug)]
        struct Token(u8);

        let obs = Observable::new(Token(3));
        assert_eq!(obs.version(), 0);
        assert_eq!(obs.with(|t| t.0), 3);
        let text = format!("{obs:?}");
        assert!(text.contains("Token(3)"), "{text}");
        assert!(text.contains("subscribers: 0"), "{text}");
    }
}
