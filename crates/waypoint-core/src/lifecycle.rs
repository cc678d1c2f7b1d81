#![forbid(unsafe_code)]

//! Component lifecycle registry.
//!
//! A [`LifecycleRegistry`] tracks one component's [`LifecycleState`] and
//! notifies subscribers as it moves between states. States are totally
//! ordered:
//!
//! ```text
//! Destroyed < Initialized < Created < Started < Resumed
//! ```
//!
//! # Invariants
//!
//! 1. Every transition moves exactly one step; [`LifecycleRegistry::move_to`]
//!    walks intermediate states so subscribers always see
//!    `create → start → resume` and `pause → stop → destroy` in order.
//! 2. `Destroyed` is terminal. Further transitions are ignored.
//! 3. Subscribing to a registry that has already advanced replays the
//!    callbacks from `on_create` up to the current state.
//! 4. Subscribers are notified in registration order.
//!
//! Callbacks must not drive the registry they are subscribed to.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::subscription::Subscription;

/// Lifecycle tier of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    /// Torn down; terminal.
    Destroyed,
    /// Constructed but not yet created.
    Initialized,
    /// Alive, not visible.
    Created,
    /// Visible, not interactive.
    Started,
    /// Visible and interactive.
    Resumed,
}

/// Single-step lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Create,
    Start,
    Resume,
    Pause,
    Stop,
    Destroy,
}

impl LifecycleState {
    /// Next state one step toward `target`, with the event fired on arrival.
    ///
    /// `Initialized → Destroyed` fires nothing since the component was never
    /// created. A target of `Initialized` is unreachable once created; the
    /// walk stops at `Created`.
    fn step_toward(self, target: Self) -> Option<(Self, Option<LifecycleEvent>)> {
        use LifecycleState::*;
        if self == target || self == Destroyed {
            return None;
        }
        if target > self {
            return match self {
                Initialized => Some((Created, Some(LifecycleEvent::Create))),
                Created => Some((Started, Some(LifecycleEvent::Start))),
                Started => Some((Resumed, Some(LifecycleEvent::Resume))),
                Destroyed | Resumed => None,
            };
        }
        match self {
            Resumed => Some((Started, Some(LifecycleEvent::Pause))),
            Started => Some((Created, Some(LifecycleEvent::Stop))),
            Created if target == Initialized => None,
            Created => Some((Destroyed, Some(LifecycleEvent::Destroy))),
            Initialized => Some((Destroyed, None)),
            Destroyed => None,
        }
    }
}

type Callback = Box<dyn Fn()>;

/// Set of optional per-event callbacks.
///
/// ```
/// use waypoint_core::lifecycle::{LifecycleCallbacks, LifecycleRegistry};
///
/// let lifecycle = LifecycleRegistry::new();
/// let _sub = lifecycle.subscribe(
///     LifecycleCallbacks::new().on_resume(|| println!("resumed")),
/// );
/// lifecycle.resume();
/// ```
#[derive(Default)]
pub struct LifecycleCallbacks {
    on_create: Option<Callback>,
    on_start: Option<Callback>,
    on_resume: Option<Callback>,
    on_pause: Option<Callback>,
    on_stop: Option<Callback>,
    on_destroy: Option<Callback>,
}

impl LifecycleCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_create(mut self, f: impl Fn() + 'static) -> Self {
        self.on_create = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_start(mut self, f: impl Fn() + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_resume(mut self, f: impl Fn() + 'static) -> Self {
        self.on_resume = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_pause(mut self, f: impl Fn() + 'static) -> Self {
        self.on_pause = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_stop(mut self, f: impl Fn() + 'static) -> Self {
        self.on_stop = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_destroy(mut self, f: impl Fn() + 'static) -> Self {
        self.on_destroy = Some(Box::new(f));
        self
    }

    /// Route every event to one closure.
    #[must_use]
    pub fn on_any(f: impl Fn(LifecycleEvent) + 'static) -> Self {
        let f = Rc::new(f);
        let hook = |event: LifecycleEvent| {
            let f = Rc::clone(&f);
            move || f(event)
        };
        Self::new()
            .on_create(hook(LifecycleEvent::Create))
            .on_start(hook(LifecycleEvent::Start))
            .on_resume(hook(LifecycleEvent::Resume))
            .on_pause(hook(LifecycleEvent::Pause))
            .on_stop(hook(LifecycleEvent::Stop))
            .on_destroy(hook(LifecycleEvent::Destroy))
    }

    fn fire(&self, event: LifecycleEvent) {
        let callback = match event {
            LifecycleEvent::Create => &self.on_create,
            LifecycleEvent::Start => &self.on_start,
            LifecycleEvent::Resume => &self.on_resume,
            LifecycleEvent::Pause => &self.on_pause,
            LifecycleEvent::Stop => &self.on_stop,
            LifecycleEvent::Destroy => &self.on_destroy,
        };
        if let Some(callback) = callback {
            callback();
        }
    }
}

struct RegistryInner {
    state: Cell<LifecycleState>,
    callbacks: RefCell<Vec<Weak<LifecycleCallbacks>>>,
    on_destroy: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Shared handle to one component's lifecycle.
///
/// Cloning a registry creates a new handle to the **same** lifecycle.
#[derive(Clone)]
pub struct LifecycleRegistry {
    inner: Rc<RegistryInner>,
}

impl Default for LifecycleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LifecycleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleRegistry")
            .field("state", &self.state())
            .field("subscribers", &self.inner.callbacks.borrow().len())
            .finish()
    }
}

impl LifecycleRegistry {
    /// A fresh lifecycle in the `Initialized` state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(LifecycleState::Initialized)
    }

    /// A lifecycle that starts in `state` without firing anything.
    #[must_use]
    pub fn with_state(state: LifecycleState) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                state: Cell::new(state),
                callbacks: RefCell::new(Vec::new()),
                on_destroy: RefCell::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.inner.state.get()
    }

    /// Whether both handles point at the same lifecycle.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register callbacks. Already-passed `create/start/resume` events are
    /// replayed immediately.
    pub fn subscribe(&self, callbacks: LifecycleCallbacks) -> Subscription {
        let callbacks = Rc::new(callbacks);
        let state = self.state();
        if state >= LifecycleState::Created {
            callbacks.fire(LifecycleEvent::Create);
        }
        if state >= LifecycleState::Started {
            callbacks.fire(LifecycleEvent::Start);
        }
        if state >= LifecycleState::Resumed {
            callbacks.fire(LifecycleEvent::Resume);
        }
        self.inner
            .callbacks
            .borrow_mut()
            .push(Rc::downgrade(&callbacks));
        Subscription::new(callbacks)
    }

    /// Run `f` once when the lifecycle is destroyed.
    ///
    /// The registry owns `f` until it fires. If the lifecycle is already
    /// destroyed, `f` runs immediately.
    pub fn do_on_destroy(&self, f: impl FnOnce() + 'static) {
        if self.state() == LifecycleState::Destroyed {
            f();
            return;
        }
        self.inner.on_destroy.borrow_mut().push(Box::new(f));
    }

    /// Walk one state at a time toward `target`.
    pub fn move_to(&self, target: LifecycleState) {
        while let Some((next, event)) = self.state().step_toward(target) {
            tracing::trace!(
                message = "lifecycle.transition",
                from = ?self.state(),
                to = ?next
            );
            self.inner.state.set(next);
            if let Some(event) = event {
                self.dispatch(event);
            }
            if next == LifecycleState::Destroyed {
                let once = std::mem::take(&mut *self.inner.on_destroy.borrow_mut());
                for f in once {
                    f();
                }
            }
        }
    }

    pub fn create(&self) {
        if self.state() == LifecycleState::Initialized {
            self.move_to(LifecycleState::Created);
        }
    }

    pub fn start(&self) {
        if self.state() < LifecycleState::Started {
            self.move_to(LifecycleState::Started);
        }
    }

    pub fn resume(&self) {
        self.move_to(LifecycleState::Resumed);
    }

    pub fn pause(&self) {
        if self.state() == LifecycleState::Resumed {
            self.move_to(LifecycleState::Started);
        }
    }

    pub fn stop(&self) {
        if self.state() > LifecycleState::Created {
            self.move_to(LifecycleState::Created);
        }
    }

    pub fn destroy(&self) {
        self.move_to(LifecycleState::Destroyed);
    }

    fn dispatch(&self, event: LifecycleEvent) {
        // Snapshot live observers so callbacks may (un)subscribe freely.
        let live: Vec<Rc<LifecycleCallbacks>> = {
            let mut callbacks = self.inner.callbacks.borrow_mut();
            callbacks.retain(|weak| weak.strong_count() > 0);
            callbacks.iter().filter_map(Weak::upgrade).collect()
        };
        for callbacks in live {
            callbacks.fire(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(lifecycle: &LifecycleRegistry) -> (Rc<RefCell<Vec<LifecycleEvent>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let sub = lifecycle.subscribe(LifecycleCallbacks::on_any(move |event| {
            sink.borrow_mut().push(event);
        }));
        (log, sub)
    }

    #[test]
    fn resume_walks_every_step() {
        let lifecycle = LifecycleRegistry::new();
        let (log, _sub) = recorder(&lifecycle);
        lifecycle.resume();
        assert_eq!(
            *log.borrow(),
            vec![
                LifecycleEvent::Create,
                LifecycleEvent::Start,
                LifecycleEvent::Resume
            ]
        );
        assert_eq!(lifecycle.state(), LifecycleState::Resumed);
    }

    #[test]
    fn destroy_from_resumed_walks_down() {
        let lifecycle = LifecycleRegistry::new();
        lifecycle.resume();
        let (log, _sub) = recorder(&lifecycle);
        log.borrow_mut().clear();

        lifecycle.destroy();
        assert_eq!(
            *log.borrow(),
            vec![
                LifecycleEvent::Pause,
                LifecycleEvent::Stop,
                LifecycleEvent::Destroy
            ]
        );
    }

    #[test]
    fn destroyed_is_terminal() {
        let lifecycle = LifecycleRegistry::new();
        lifecycle.create();
        lifecycle.destroy();
        lifecycle.resume();
        assert_eq!(lifecycle.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn destroy_uncreated_fires_nothing() {
        let lifecycle = LifecycleRegistry::new();
        let (log, _sub) = recorder(&lifecycle);
        lifecycle.destroy();
        assert!(log.borrow().is_empty());
        assert_eq!(lifecycle.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn late_subscriber_gets_replay() {
        let lifecycle = LifecycleRegistry::new();
        lifecycle.start();
        let (log, _sub) = recorder(&lifecycle);
        assert_eq!(
            *log.borrow(),
            vec![LifecycleEvent::Create, LifecycleEvent::Start]
        );
    }

    #[test]
    fn cancelled_subscriber_is_silent() {
        let lifecycle = LifecycleRegistry::new();
        let (log, sub) = recorder(&lifecycle);
        sub.cancel();
        lifecycle.resume();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn move_to_initialized_stops_at_created() {
        let lifecycle = LifecycleRegistry::new();
        lifecycle.resume();
        lifecycle.move_to(LifecycleState::Initialized);
        assert_eq!(lifecycle.state(), LifecycleState::Created);
    }

    #[test]
    fn do_on_destroy_runs_once() {
        let lifecycle = LifecycleRegistry::new();
        lifecycle.create();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        lifecycle.do_on_destroy(move || c.set(c.get() + 1));
        lifecycle.destroy();
        lifecycle.destroy();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn do_on_destroy_after_destroy_runs_immediately() {
        let lifecycle = LifecycleRegistry::new();
        lifecycle.destroy();
        let ran = Rc::new(Cell::new(false));
        let r = Rc::clone(&ran);
        lifecycle.do_on_destroy(move || r.set(true));
        assert!(ran.get());
    }

    #[test]
    fn pause_and_stop_are_guarded() {
        let lifecycle = LifecycleRegistry::new();
        lifecycle.create();
        lifecycle.pause();
        assert_eq!(lifecycle.state(), LifecycleState::Created);
        lifecycle.stop();
        assert_eq!(lifecycle.state(), LifecycleState::Created);
        lifecycle.resume();
        lifecycle.stop();
        assert_eq!(lifecycle.state(), LifecycleState::Created);
    }
}
