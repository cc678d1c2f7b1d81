#![forbid(unsafe_code)]

//! Generic children router.
//!
//! A [`Router`] owns a navigation state and the live children derived from
//! it. Every navigation job runs one pass:
//!
//! ```text
//! event ─► RouterPolicy::reduce ─► NavState::children ─► reconcile ─► Observable::set
//! ```
//!
//! # Re-entrancy
//!
//! Jobs posted while a pass is in flight (from a factory, a lifecycle
//! callback, an output subscriber, or a completion callback) are queued and
//! drained, in order, before the outermost call returns. One outermost call
//! drains at most [`RouterConfig::max_pending_events`] jobs; the rest are
//! dropped with [`NavigationError::ReentrancyLimit`]. Errors of queued jobs
//! surface from the outermost call.
//!
//! # Lifecycle
//!
//! Children never run ahead of the parent: a child's lifecycle is
//! `min(desired status, parent state)`. Parent transitions re-drive every
//! child, and destroying the parent destroys the router.
//!
//! # Ownership
//!
//! Every callback the router registers elsewhere (parent lifecycle, parent
//! back dispatcher, parent state keeper, navigation source) holds a `Weak`
//! reference. The [`Router`] handle owns the router; dropping the last
//! handle destroys it.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use tracing::field::Empty;
use waypoint_core::{
    BackCallback, BackRegistration, ComponentContext, LifecycleCallbacks, LifecycleEvent,
    LifecycleState, SavedState, SerializableContainer, StateKeeperError, Subscription,
};

use super::child::{ChildSpawner, CreatedChild, LiveChild};
use super::config::RouterConfig;
use super::persistence::SavedRouterState;
use super::reconcile::reconcile;
use crate::error::{NavResult, NavigationError};
use crate::nav::{Backlog, NavObserver, NavState, NavigationSource, ensure_unique};
use crate::reactive::{Observable, Value};

/// The navigation semantics a [`Router`] runs.
pub trait RouterPolicy: 'static {
    type Configuration: Clone + Eq + Hash + 'static;
    type Event: 'static;
    type State: NavState<Self::Configuration> + Clone + 'static;

    /// Persistable form of `state`, or `None` to skip persistence.
    fn save_state(&self, state: &Self::State) -> Option<SerializableContainer>;

    /// Inverse of [`save_state`](Self::save_state). `None` falls back to the
    /// initial state.
    fn restore_state(&self, container: &SerializableContainer) -> Option<Self::State>;

    /// Next state for `event`. An error leaves the router untouched.
    fn reduce(&self, state: &Self::State, event: &Self::Event) -> NavResult<Self::State>;

    /// Called after `new` is committed and emitted.
    fn on_event_complete(&self, _event: &Self::Event, _new: &Self::State, _old: &Self::State) {}

    /// State a back press should produce, or `None` if back is not handled.
    fn back_transform(&self, state: &Self::State) -> Option<Self::State>;
}

type Mapper<S, C, T, O> = Box<dyn Fn(&S, Vec<CreatedChild<C, T>>) -> O>;

enum Job<E> {
    Event(E),
    Back,
    Sync,
    Destroy,
}

struct Core<S, C, T> {
    /// Last committed navigation state.
    state: S,
    /// Live children, in the order `state.children()` lists them.
    children: Vec<Rc<LiveChild<C, T>>>,
}

struct Shared<P: RouterPolicy, T: 'static, O: 'static> {
    /// State keeper key, unique among the parent's routers.
    key: String,
    /// Jobs one outermost dispatch may drain.
    max_pending: usize,
    policy: P,
    parent: ComponentContext,
    spawner: ChildSpawner<P::Configuration, T>,
    /// Builds the emitted snapshot from the state and its live children.
    mapper: Mapper<P::State, P::Configuration, T, O>,
    /// Never borrowed across a factory, lifecycle or observer callback.
    core: RefCell<Core<P::State, P::Configuration, T>>,
    /// Jobs posted while a drain is running.
    jobs: RefCell<VecDeque<Job<P::Event>>>,
    /// Set while the outermost dispatch drains `jobs`.
    draining: Cell<bool>,
    destroyed: Cell<bool>,
    /// Whether `key` is still registered in the parent's state keeper.
    registered: Cell<bool>,
    output: Observable<O>,
    /// Enabled iff `policy.back_transform` would handle a press.
    back_callback: Rc<BackCallback>,
    back_registration: BackRegistration,
    /// Parent lifecycle observer; dropped on teardown.
    lifecycle_subscription: RefCell<Option<Subscription>>,
    /// Run once at teardown (source unsubscription).
    on_destroy: RefCell<Vec<Box<dyn FnOnce()>>>,
}

struct DrainGuard<'a>(&'a Cell<bool>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

fn created<C: Clone, T>(children: &[Rc<LiveChild<C, T>>]) -> Vec<CreatedChild<C, T>> {
    children.iter().map(|child| child.created()).collect()
}

/// A running router. Cloning creates a new handle to the **same** router.
pub struct Router<P: RouterPolicy, T: 'static, O: 'static> {
    shared: Rc<Shared<P, T, O>>,
}

impl<P: RouterPolicy, T: 'static, O: 'static> Clone for Router<P, T, O> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<P: RouterPolicy, T: 'static, O: 'static> fmt::Debug for Router<P, T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("key", &self.shared.key)
            .field("children", &self.shared.core.borrow().children.len())
            .field("destroyed", &self.shared.destroyed.get())
            .finish()
    }
}

impl<P, T, O> Router<P, T, O>
where
    P: RouterPolicy,
    T: 'static,
    O: Clone + PartialEq + 'static,
{
    /// Build a router under `parent`.
    ///
    /// The saved state under `config.key` is consumed if present and
    /// restorable; otherwise `initial_state` is used. Children are created
    /// and driven to `min(status, parent state)` before this returns.
    ///
    /// # Errors
    ///
    /// - [`NavigationError::State`] if `config.key` is already registered in
    ///   the parent's state keeper.
    /// - Whatever `initial_state` returns.
    /// - [`NavigationError::DuplicateConfiguration`] if the state repeats a
    ///   configuration.
    pub fn new(
        parent: &ComponentContext,
        config: &RouterConfig,
        policy: P,
        initial_state: impl FnOnce() -> NavResult<P::State>,
        factory: impl Fn(&P::Configuration, ComponentContext) -> T + 'static,
        mapper: impl Fn(&P::State, Vec<CreatedChild<P::Configuration, T>>) -> O + 'static,
    ) -> NavResult<Self> {
        let key = config.key.clone();
        if parent.state_keeper().is_registered(&key) {
            return Err(StateKeeperError::collision(key).into());
        }
        let (state, saved_children) = restore_or_init(&policy, parent, &key, initial_state)?;
        let targets = state.children();
        ensure_unique(&targets)?;

        let spawner = ChildSpawner::new(parent.clone(), Box::new(factory));
        let shared = Rc::new_cyclic(|weak: &Weak<Shared<P, T, O>>| {
            // Registered before any child so active children win ties.
            let back_callback = Rc::new(BackCallback::new(false, {
                let weak = weak.clone();
                move || {
                    if let Some(shared) = weak.upgrade() {
                        let _ = shared.dispatch(Job::Back);
                    }
                }
            }));
            let back_registration = parent.back_dispatcher().register(&back_callback);

            let mut saved_children = saved_children.into_iter();
            let reconciled = reconcile(&[], &targets, parent.lifecycle().state(), |_, c| {
                spawner.spawn(c, saved_children.next())
            });
            let output = Observable::new(mapper(&state, created(&reconciled.children)));
            tracing::debug!(
                message = "router.created",
                key = %key,
                children = reconciled.children.len()
            );

            Shared {
                key: key.clone(),
                max_pending: config.max_pending_events.max(1),
                policy,
                parent: parent.clone(),
                spawner,
                mapper: Box::new(mapper),
                core: RefCell::new(Core {
                    state,
                    children: reconciled.children,
                }),
                jobs: RefCell::new(VecDeque::new()),
                draining: Cell::new(false),
                destroyed: Cell::new(false),
                registered: Cell::new(false),
                output,
                back_callback,
                back_registration,
                lifecycle_subscription: RefCell::new(None),
                on_destroy: RefCell::new(Vec::new()),
            }
        });
        shared.refresh_back();

        let weak = Rc::downgrade(&shared);
        parent
            .state_keeper()
            .register(key, move || weak.upgrade().and_then(|shared| shared.save()))?;
        shared.registered.set(true);

        let weak = Rc::downgrade(&shared);
        let subscription = parent
            .lifecycle()
            .subscribe(LifecycleCallbacks::on_any(move |event| {
                if let Some(shared) = weak.upgrade() {
                    let job = match event {
                        LifecycleEvent::Destroy => Job::Destroy,
                        _ => Job::Sync,
                    };
                    let _ = shared.dispatch(job);
                }
            }));
        *shared.lifecycle_subscription.borrow_mut() = Some(subscription);
        if parent.lifecycle().state() == LifecycleState::Destroyed {
            shared.teardown();
        }

        Ok(Self { shared })
    }

    /// Forward every event of `source` to this router through `map`.
    ///
    /// The observer is removed when the router is destroyed.
    pub fn listen<E, S>(&self, source: &S, map: impl Fn(&E) -> P::Event + 'static)
    where
        E: 'static,
        S: NavigationSource<E> + Clone + 'static,
    {
        if self.shared.destroyed.get() {
            return;
        }
        let weak = Rc::downgrade(&self.shared);
        let observer: NavObserver<E> = Rc::new(move |event: &E| match weak.upgrade() {
            Some(shared) => shared.dispatch(Job::Event(map(event))),
            None => Ok(()),
        });
        source.subscribe(&observer);
        let source = source.clone();
        self.shared
            .on_destroy
            .borrow_mut()
            .push(Box::new(move || source.unsubscribe(&observer)));
    }

    /// [`listen`](Self::listen), then run whatever `backlog` captured while
    /// the router was being built, in publish order.
    ///
    /// Replayed events that fail are logged by the drain and dropped; their
    /// publisher already returned.
    pub(crate) fn listen_with_backlog<E, S>(
        &self,
        source: &S,
        backlog: Backlog<E, S>,
        map: impl Fn(&E) -> P::Event + 'static,
    ) where
        E: Clone + 'static,
        S: NavigationSource<E> + Clone + 'static,
    {
        let map = Rc::new(map);
        let forward = Rc::clone(&map);
        self.listen(source, move |event: &E| forward(event));
        for event in backlog.release() {
            let _ = self.shared.dispatch(Job::Event(map(&event)));
        }
    }

    /// Run one event through the router.
    ///
    /// # Errors
    ///
    /// [`NavigationError::RouterDestroyed`] after destruction, otherwise
    /// whatever the pass (or a pass queued during it) returned.
    pub fn dispatch(&self, event: P::Event) -> NavResult {
        self.shared.dispatch(Job::Event(event))
    }

    /// Current navigation state.
    #[must_use]
    pub fn state(&self) -> P::State {
        self.shared.core.borrow().state.clone()
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.shared.key
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.shared.destroyed.get()
    }

    /// Destroy every child and detach from the parent. Idempotent.
    pub fn destroy(&self) {
        let _ = self.shared.dispatch(Job::Destroy);
    }
}

impl<P, T, O> Value<O> for Router<P, T, O>
where
    P: RouterPolicy,
    T: 'static,
    O: Clone + PartialEq + 'static,
{
    fn value(&self) -> O {
        self.shared.output.get()
    }

    fn subscribe_boxed(&self, observer: Box<dyn Fn(&O)>) -> Subscription {
        self.shared.output.subscribe(observer)
    }
}

fn restore_or_init<P: RouterPolicy>(
    policy: &P,
    parent: &ComponentContext,
    key: &str,
    initial_state: impl FnOnce() -> NavResult<P::State>,
) -> NavResult<(P::State, Vec<SavedState>)> {
    let saved = parent
        .state_keeper()
        .consume(key)
        .and_then(|container| match container.decode::<SavedRouterState>() {
            Ok(saved) => Some(saved),
            Err(err) => {
                tracing::warn!(message = "router.restore_failed", key, error = %err);
                None
            }
        });
    if let Some(saved) = saved {
        if let Some(state) = policy.restore_state(&saved.nav) {
            let children = state.children();
            if children.len() == saved.children.len() && ensure_unique(&children).is_ok() {
                tracing::debug!(message = "router.restored", key, children = children.len());
                return Ok((state, saved.children));
            }
            tracing::warn!(
                message = "router.restore_mismatch",
                key,
                configurations = children.len(),
                saved_children = saved.children.len()
            );
        }
    }
    Ok((initial_state()?, Vec::new()))
}

impl<P, T, O> Shared<P, T, O>
where
    P: RouterPolicy,
    T: 'static,
    O: Clone + PartialEq + 'static,
{
    fn dispatch(&self, job: Job<P::Event>) -> NavResult {
        if self.destroyed.get() {
            return match job {
                Job::Event(_) => Err(NavigationError::RouterDestroyed),
                _ => Ok(()),
            };
        }
        self.jobs.borrow_mut().push_back(job);
        if self.draining.replace(true) {
            tracing::trace!(message = "router.queued", key = %self.key);
            return Ok(());
        }
        let _guard = DrainGuard(&self.draining);
        self.drain()
    }

    fn drain(&self) -> NavResult {
        let mut first_error = None;
        let mut processed = 0;
        loop {
            let job = self.jobs.borrow_mut().pop_front();
            let Some(job) = job else { break };
            if processed == self.max_pending {
                let mut dropped = std::mem::take(&mut *self.jobs.borrow_mut());
                dropped.push_front(job);
                tracing::warn!(
                    message = "router.reentrancy_limit",
                    key = %self.key,
                    limit = self.max_pending,
                    dropped = dropped.len()
                );
                let destroy = dropped.iter().any(|job| matches!(job, Job::Destroy));
                drop(dropped);
                if destroy {
                    self.teardown();
                }
                first_error.get_or_insert(NavigationError::ReentrancyLimit {
                    limit: self.max_pending,
                });
                break;
            }
            processed += 1;
            if let Err(err) = self.run(job) {
                tracing::warn!(message = "router.navigation_rejected", key = %self.key, error = %err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn run(&self, job: Job<P::Event>) -> NavResult {
        if self.destroyed.get() {
            return Ok(());
        }
        match job {
            Job::Event(event) => {
                let old = self.core.borrow().state.clone();
                let new = self.policy.reduce(&old, &event)?;
                self.commit(new.clone())?;
                self.policy.on_event_complete(&event, &new, &old);
                Ok(())
            }
            Job::Back => {
                let state = self.core.borrow().state.clone();
                match self.policy.back_transform(&state) {
                    Some(next) => self.commit(next),
                    None => Ok(()),
                }
            }
            Job::Sync => {
                self.sync();
                Ok(())
            }
            Job::Destroy => {
                self.teardown();
                Ok(())
            }
        }
    }

    fn commit(&self, state: P::State) -> NavResult {
        let targets = state.children();
        ensure_unique(&targets)?;

        let span = tracing::debug_span!(
            "router.pass",
            key = %self.key,
            created = Empty,
            retained = Empty,
            destroyed = Empty
        );
        let _enter = span.enter();

        let live = self.core.borrow().children.clone();
        let reconciled = reconcile(&live, &targets, self.parent.lifecycle().state(), |_, c| {
            self.spawner.spawn(c, None)
        });
        span.record("created", reconciled.created);
        span.record("retained", reconciled.retained);
        span.record("destroyed", reconciled.destroyed);
        tracing::debug!(
            message = "router.reconcile",
            created = reconciled.created,
            retained = reconciled.retained,
            destroyed = reconciled.destroyed
        );

        let snapshot = (self.mapper)(&state, created(&reconciled.children));
        {
            let mut core = self.core.borrow_mut();
            core.state = state;
            core.children = reconciled.children;
        }
        self.refresh_back();
        self.output.set(snapshot);
        Ok(())
    }

    fn sync(&self) {
        let parent = self.parent.lifecycle().state();
        if parent == LifecycleState::Destroyed {
            self.teardown();
            return;
        }
        let children = self.core.borrow().children.clone();
        for child in &children {
            child.drive(parent);
        }
    }

    fn refresh_back(&self) {
        let state = self.core.borrow().state.clone();
        let enabled = !self.destroyed.get() && self.policy.back_transform(&state).is_some();
        self.back_callback.set_enabled(enabled);
    }

    fn save(&self) -> Option<SerializableContainer> {
        if self.destroyed.get() {
            return None;
        }
        let (state, children) = {
            let core = self.core.borrow();
            (core.state.clone(), core.children.clone())
        };
        let nav = self.policy.save_state(&state)?;
        let children = children
            .iter()
            .map(|child| child.context().state_keeper().save())
            .collect();
        match SerializableContainer::encode(&SavedRouterState { nav, children }) {
            Ok(container) => Some(container),
            Err(err) => {
                tracing::warn!(message = "router.encode_failed", key = %self.key, error = %err);
                None
            }
        }
    }
}

impl<P: RouterPolicy, T: 'static, O: 'static> Shared<P, T, O> {
    fn teardown(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.back_callback.set_enabled(false);
        self.back_registration.unregister();
        if self.registered.replace(false) {
            self.parent.state_keeper().unregister(&self.key);
        }
        let subscription = self.lifecycle_subscription.borrow_mut().take();
        drop(subscription);

        let children = std::mem::take(&mut self.core.borrow_mut().children);
        for child in children.iter().rev() {
            child.destroy();
        }
        let hooks = std::mem::take(&mut *self.on_destroy.borrow_mut());
        for hook in hooks {
            hook();
        }
        tracing::debug!(message = "router.destroyed", key = %self.key, children = children.len());
    }
}

impl<P: RouterPolicy, T: 'static, O: 'static> Drop for Shared<P, T, O> {
    fn drop(&mut self) {
        self.teardown();
    }
}
