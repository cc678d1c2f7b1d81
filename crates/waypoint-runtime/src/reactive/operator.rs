#![forbid(unsafe_code)]

//! Read-only value views and composable transforms over them.
//!
//! [`Value`] is what routers expose: a synchronous snapshot read plus a
//! subscription that fires immediately and on every later update.
//! [`Value::map`] builds a [`MappedValue`], a pure transform re-evaluated on
//! each update of its source; it keeps no subscriber list of its own.

use std::fmt;
use std::rc::Rc;

use waypoint_core::Subscription;

/// Read-only observable snapshot.
pub trait Value<T> {
    /// Current snapshot.
    fn value(&self) -> T;

    /// Register a boxed observer. It fires with the current value before this
    /// returns.
    fn subscribe_boxed(&self, observer: Box<dyn Fn(&T)>) -> Subscription;

    /// [`subscribe_boxed`](Self::subscribe_boxed) for unboxed closures.
    fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription
    where
        Self: Sized,
    {
        self.subscribe_boxed(Box::new(observer))
    }

    /// View this value through `f`.
    fn map<U>(self, f: impl Fn(&T) -> U + 'static) -> MappedValue<T, U>
    where
        Self: Sized + 'static,
        T: 'static,
    {
        MappedValue {
            source: Rc::new(self),
            mapper: Rc::new(f),
        }
    }
}

/// A [`Value`] derived from another by a pure function.
pub struct MappedValue<T, U> {
    source: Rc<dyn Value<T>>,
    mapper: Rc<dyn Fn(&T) -> U>,
}

impl<T, U> Clone for MappedValue<T, U> {
    fn clone(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
            mapper: Rc::clone(&self.mapper),
        }
    }
}

impl<T, U> fmt::Debug for MappedValue<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedValue").finish_non_exhaustive()
    }
}

impl<T: 'static, U: 'static> Value<U> for MappedValue<T, U> {
    fn value(&self) -> U {
        (self.mapper)(&self.source.value())
    }

    fn subscribe_boxed(&self, observer: Box<dyn Fn(&U)>) -> Subscription {
        let mapper = Rc::clone(&self.mapper);
        self.source
            .subscribe_boxed(Box::new(move |t| observer(&mapper(t))))
    }
}

/// A [`Value`] that never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstValue<T> {
    value: T,
}

impl<T> ConstValue<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Clone> Value<T> for ConstValue<T> {
    fn value(&self) -> T {
        self.value.clone()
    }

    fn subscribe_boxed(&self, observer: Box<dyn Fn(&T)>) -> Subscription {
        observer(&self.value);
        Subscription::empty()
    }
}
