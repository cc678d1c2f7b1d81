#![forbid(unsafe_code)]

//! Stack router: an ordered, non-empty list of configurations where the last
//! one is active.
//!
//! ```text
//! index 0 (bottom) ... index n-1 (active, Resumed)
//! ```
//!
//! Callers navigate through a [`StackNavigation`] (or any
//! [`NavigationSource`] of [`StackEvent`]s). Each event carries a transform
//! over the configuration list plus an optional completion callback invoked
//! with `(new, old)` once the new list is committed and emitted.
//!
//! The [`StackNavigator`] helpers build the usual transforms. `pop` never
//! empties the stack; `pop_to` rejects an out-of-range index with
//! [`NavigationError::IndexOutOfBounds`] and leaves the stack unchanged.
//!
//! # Example
//!
//! ```
//! use waypoint_core::{ComponentContext, LifecycleRegistry};
//! use waypoint_runtime::reactive::Value;
//! use waypoint_runtime::router::{StackConfig, StackNavigation, StackNavigator, child_stack};
//!
//! let lifecycle = LifecycleRegistry::new();
//! let root = ComponentContext::root(lifecycle.clone());
//! lifecycle.resume();
//!
//! let navigation = StackNavigation::new();
//! let stack = child_stack(&root, &navigation, StackConfig::single("home"), |c, _| c.len())
//!     .unwrap();
//! navigation.push("details").unwrap();
//! assert_eq!(stack.value().active.configuration, "details");
//! assert_eq!(stack.value().back_stack.len(), 1);
//! ```

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use ahash::AHashSet;
use waypoint_core::{ComponentContext, SerializableContainer, Subscription};

use super::child::CreatedChild;
use super::config::StackConfig;
use super::engine::{Router, RouterPolicy};
use super::persistence::StateCodec;
use crate::error::{NavResult, NavigationError};
use crate::nav::{Backlog, ChildNavState, NavObserver, NavState, NavigationSource, SimpleNavigation, derive_stack_statuses};
use crate::reactive::Value;

type Transformer<C> = Rc<dyn Fn(&[C]) -> NavResult<Vec<C>>>;
type Completion<C> = Rc<dyn Fn(&[C], &[C])>;

/// A stack navigation command.
pub struct StackEvent<C> {
    transformer: Transformer<C>,
    on_complete: Option<Completion<C>>,
}

impl<C> Clone for StackEvent<C> {
    fn clone(&self) -> Self {
        Self {
            transformer: Rc::clone(&self.transformer),
            on_complete: self.on_complete.clone(),
        }
    }
}

impl<C> fmt::Debug for StackEvent<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackEvent")
            .field("has_on_complete", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

impl<C> StackEvent<C> {
    pub fn new(transformer: impl Fn(&[C]) -> NavResult<Vec<C>> + 'static) -> Self {
        Self {
            transformer: Rc::new(transformer),
            on_complete: None,
        }
    }

    #[must_use]
    pub fn with_on_complete(mut self, on_complete: impl Fn(&[C], &[C]) + 'static) -> Self {
        self.on_complete = Some(Rc::new(on_complete));
        self
    }

    /// Apply the transform to `configurations`.
    pub fn transform(&self, configurations: &[C]) -> NavResult<Vec<C>> {
        (self.transformer)(configurations)
    }

    /// Run the completion callback, if any.
    pub fn complete(&self, new: &[C], old: &[C]) {
        if let Some(on_complete) = &self.on_complete {
            on_complete(new, old);
        }
    }
}

/// Stack navigation commands, built on [`navigate_event`](Self::navigate_event).
pub trait StackNavigator<C: Clone + PartialEq + 'static> {
    /// Publish a raw event.
    fn navigate_event(&self, event: StackEvent<C>) -> NavResult;

    fn navigate(&self, transformer: impl Fn(&[C]) -> NavResult<Vec<C>> + 'static) -> NavResult
    where
        Self: Sized,
    {
        self.navigate_event(StackEvent::new(transformer))
    }

    fn navigate_with(
        &self,
        transformer: impl Fn(&[C]) -> NavResult<Vec<C>> + 'static,
        on_complete: impl Fn(&[C], &[C]) + 'static,
    ) -> NavResult
    where
        Self: Sized,
    {
        self.navigate_event(StackEvent::new(transformer).with_on_complete(on_complete))
    }

    /// Append `configuration`. It must not already be in the stack.
    fn push(&self, configuration: C) -> NavResult
    where
        Self: Sized,
    {
        self.navigate(move |stack| {
            let mut next = stack.to_vec();
            next.push(configuration.clone());
            Ok(next)
        })
    }

    /// Append `configuration` unless it is already active. `on_complete`
    /// receives whether anything was pushed.
    fn push_new_with(&self, configuration: C, on_complete: impl Fn(bool) + 'static) -> NavResult
    where
        Self: Sized,
    {
        self.navigate_with(
            move |stack| {
                let mut next = stack.to_vec();
                if next.last() != Some(&configuration) {
                    next.push(configuration.clone());
                }
                Ok(next)
            },
            move |new, old| on_complete(new.len() > old.len()),
        )
    }

    fn push_new(&self, configuration: C) -> NavResult
    where
        Self: Sized,
    {
        self.push_new_with(configuration, |_| {})
    }

    /// Move an equal configuration to the top, or push it if absent.
    fn push_to_front(&self, configuration: C) -> NavResult
    where
        Self: Sized,
    {
        self.navigate(move |stack| {
            let mut next: Vec<C> = stack.iter().filter(|c| **c != configuration).cloned().collect();
            next.push(configuration.clone());
            Ok(next)
        })
    }

    /// Remove every configuration matching `same_kind`, then push
    /// `configuration`.
    fn bring_to_front(&self, configuration: C, same_kind: impl Fn(&C) -> bool + 'static) -> NavResult
    where
        Self: Sized,
    {
        self.navigate(move |stack| {
            let mut next: Vec<C> = stack
                .iter()
                .filter(|c| !same_kind(c) && **c != configuration)
                .cloned()
                .collect();
            next.push(configuration.clone());
            Ok(next)
        })
    }

    /// Drop the active configuration. No-op on a single-element stack;
    /// `on_complete` receives whether anything was popped.
    fn pop_with(&self, on_complete: impl Fn(bool) + 'static) -> NavResult
    where
        Self: Sized,
    {
        self.navigate_with(
            |stack| {
                let keep = if stack.len() > 1 { stack.len() - 1 } else { stack.len() };
                Ok(stack[..keep].to_vec())
            },
            move |new, old| on_complete(new.len() < old.len()),
        )
    }

    fn pop(&self) -> NavResult
    where
        Self: Sized,
    {
        self.pop_with(|_| {})
    }

    /// Pop while the active configuration matches `predicate`, always
    /// keeping the bottom one.
    fn pop_while(&self, predicate: impl Fn(&C) -> bool + 'static) -> NavResult
    where
        Self: Sized,
    {
        self.navigate(move |stack| {
            let mut len = stack.len();
            while len > 1 && predicate(&stack[len - 1]) {
                len -= 1;
            }
            Ok(stack[..len].to_vec())
        })
    }

    /// Keep `[0, index]`. `on_complete` receives whether anything was
    /// popped; it is not called when `index` is out of range.
    ///
    /// # Errors
    ///
    /// [`NavigationError::IndexOutOfBounds`] if `index >= len`.
    fn pop_to_with(&self, index: usize, on_complete: impl Fn(bool) + 'static) -> NavResult
    where
        Self: Sized,
    {
        self.navigate_with(
            move |stack| {
                if index >= stack.len() {
                    return Err(NavigationError::IndexOutOfBounds {
                        index,
                        len: stack.len(),
                    });
                }
                Ok(stack[..=index].to_vec())
            },
            move |new, old| on_complete(new.len() < old.len()),
        )
    }

    fn pop_to(&self, index: usize) -> NavResult
    where
        Self: Sized,
    {
        self.pop_to_with(index, |_| {})
    }

    /// Swap the active configuration for `configuration`.
    fn replace_current(&self, configuration: C) -> NavResult
    where
        Self: Sized,
    {
        self.navigate(move |stack| {
            let mut next = stack[..stack.len().saturating_sub(1)].to_vec();
            next.push(configuration.clone());
            Ok(next)
        })
    }

    /// Replace the whole stack. `configurations` must be non-empty and
    /// unique.
    fn replace_all(&self, configurations: Vec<C>) -> NavResult
    where
        Self: Sized,
    {
        self.navigate(move |_| Ok(configurations.clone()))
    }
}

/// The standard stack navigation source.
pub struct StackNavigation<C> {
    bus: SimpleNavigation<StackEvent<C>>,
}

impl<C> Clone for StackNavigation<C> {
    fn clone(&self) -> Self {
        Self {
            bus: self.bus.clone(),
        }
    }
}

impl<C> fmt::Debug for StackNavigation<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StackNavigation").field(&self.bus).finish()
    }
}

impl<C> Default for StackNavigation<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> StackNavigation<C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bus: SimpleNavigation::new(),
        }
    }

    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            bus: SimpleNavigation::with_max_depth(max_depth),
        }
    }

    /// Number of routers (and other observers) attached.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.bus.observer_count()
    }
}

impl<C> NavigationSource<StackEvent<C>> for StackNavigation<C> {
    fn subscribe(&self, observer: &NavObserver<StackEvent<C>>) {
        self.bus.subscribe(observer);
    }

    fn unsubscribe(&self, observer: &NavObserver<StackEvent<C>>) {
        self.bus.unsubscribe(observer);
    }
}

impl<C: Clone + PartialEq + 'static> StackNavigator<C> for StackNavigation<C> {
    fn navigate_event(&self, event: StackEvent<C>) -> NavResult {
        self.bus.navigate(event)
    }
}

/// Navigation state of a stack router.
#[derive(Debug, Clone, PartialEq)]
pub struct StackNavState<C: Eq + Hash> {
    /// Bottom first; never empty, never repeats.
    configurations: Vec<C>,
    /// Non-active configurations to keep started. Entries not in the stack
    /// are ignored.
    visibility_hint: AHashSet<C>,
}

impl<C: Clone + Eq + Hash> StackNavState<C> {
    /// # Errors
    ///
    /// [`NavigationError::EmptyStack`] if `configurations` is empty.
    pub fn new(configurations: Vec<C>) -> NavResult<Self> {
        if configurations.is_empty() {
            return Err(NavigationError::EmptyStack);
        }
        Ok(Self {
            configurations,
            visibility_hint: AHashSet::new(),
        })
    }

    #[must_use]
    pub fn configurations(&self) -> &[C] {
        &self.configurations
    }

    #[must_use]
    pub fn visibility_hint(&self) -> &AHashSet<C> {
        &self.visibility_hint
    }

    /// Same configurations with a new hint.
    #[must_use]
    pub fn with_visibility_hint(&self, hint: AHashSet<C>) -> Self {
        Self {
            configurations: self.configurations.clone(),
            visibility_hint: hint,
        }
    }

    /// New configurations, keeping the hint.
    ///
    /// # Errors
    ///
    /// [`NavigationError::EmptyStack`] if `configurations` is empty.
    pub fn with_configurations(&self, configurations: Vec<C>) -> NavResult<Self> {
        let mut next = Self::new(configurations)?;
        next.visibility_hint = self.visibility_hint.clone();
        Ok(next)
    }
}

impl<C: Clone + Eq + Hash> NavState<C> for StackNavState<C> {
    fn children(&self) -> Vec<ChildNavState<C>> {
        derive_stack_statuses(&self.configurations, &self.visibility_hint)
    }
}

pub(crate) enum StackRouterEvent<C> {
    Navigate(StackEvent<C>),
    VisibilityHint(AHashSet<C>),
}

pub(crate) struct StackPolicy<C> {
    codec: StateCodec<Vec<C>>,
    handle_back_button: bool,
}

impl<C: Clone + Eq + Hash + 'static> RouterPolicy for StackPolicy<C> {
    type Configuration = C;
    type Event = StackRouterEvent<C>;
    type State = StackNavState<C>;

    fn save_state(&self, state: &Self::State) -> Option<SerializableContainer> {
        self.codec.save(&state.configurations)
    }

    fn restore_state(&self, container: &SerializableContainer) -> Option<Self::State> {
        self.codec
            .restore(container)
            .and_then(|list| StackNavState::new(list).ok())
    }

    fn reduce(&self, state: &Self::State, event: &Self::Event) -> NavResult<Self::State> {
        match event {
            StackRouterEvent::Navigate(event) => {
                state.with_configurations(event.transform(&state.configurations)?)
            }
            StackRouterEvent::VisibilityHint(hint) => Ok(state.with_visibility_hint(hint.clone())),
        }
    }

    fn on_event_complete(&self, event: &Self::Event, new: &Self::State, old: &Self::State) {
        if let StackRouterEvent::Navigate(event) = event {
            event.complete(&new.configurations, &old.configurations);
        }
    }

    fn back_transform(&self, state: &Self::State) -> Option<Self::State> {
        if !self.handle_back_button || state.configurations.len() < 2 {
            return None;
        }
        let remaining = state.configurations[..state.configurations.len() - 1].to_vec();
        state.with_configurations(remaining).ok()
    }
}

/// Consumer-facing snapshot of a stack router.
pub struct ChildStack<C, T> {
    /// The top of the stack, resumed while the parent is.
    pub active: CreatedChild<C, T>,
    /// Bottom first, ending one below `active`.
    pub back_stack: Vec<CreatedChild<C, T>>,
}

impl<C, T> ChildStack<C, T> {
    #[must_use]
    pub fn new(active: CreatedChild<C, T>, back_stack: Vec<CreatedChild<C, T>>) -> Self {
        Self { active, back_stack }
    }

    /// A one-element stack.
    #[must_use]
    pub fn single(configuration: C, instance: T) -> Self {
        Self::new(CreatedChild::new(configuration, Rc::new(instance)), Vec::new())
    }

    /// Split children into back stack and active. `None` if empty.
    #[must_use]
    pub fn from_children(mut children: Vec<CreatedChild<C, T>>) -> Option<Self> {
        let active = children.pop()?;
        Some(Self::new(active, children))
    }

    /// Every child, bottom first.
    pub fn items(&self) -> impl Iterator<Item = &CreatedChild<C, T>> {
        self.back_stack.iter().chain(std::iter::once(&self.active))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.back_stack.len() + 1
    }

    /// Always `false`; a stack holds at least its active child.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<C: Clone, T> Clone for ChildStack<C, T> {
    fn clone(&self) -> Self {
        Self {
            active: self.active.clone(),
            back_stack: self.back_stack.clone(),
        }
    }
}

impl<C: PartialEq, T> PartialEq for ChildStack<C, T> {
    fn eq(&self, other: &Self) -> bool {
        self.active == other.active && self.back_stack == other.back_stack
    }
}

impl<C: fmt::Debug, T> fmt::Debug for ChildStack<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildStack")
            .field("active", &self.active)
            .field("back_stack", &self.back_stack)
            .finish()
    }
}

enum StackSource<C: Clone + Eq + Hash + 'static, T: 'static> {
    /// Backed by a running router.
    Live(Router<StackPolicy<C>, T, ChildStack<C, T>>),
    /// Built by [`child_stack_value_of`]; never changes.
    Fixed(ChildStack<C, T>),
}

/// Observable [`ChildStack`] produced by [`child_stack`] or
/// [`child_stack_value_of`].
pub struct ChildStackValue<C: Clone + Eq + Hash + 'static, T: 'static> {
    source: Rc<StackSource<C, T>>,
}

impl<C: Clone + Eq + Hash + 'static, T: 'static> Clone for ChildStackValue<C, T> {
    fn clone(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
        }
    }
}

impl<C: Clone + Eq + Hash + fmt::Debug + 'static, T: 'static> fmt::Debug for ChildStackValue<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.source {
            StackSource::Live(router) => f.debug_tuple("ChildStackValue").field(router).finish(),
            StackSource::Fixed(stack) => f.debug_tuple("ChildStackValue").field(stack).finish(),
        }
    }
}

impl<C: Clone + Eq + Hash + 'static, T: 'static> ChildStackValue<C, T> {
    /// Mark non-active configurations as visible (`Started`). Replaces the
    /// previous hint. Ignored by fixed values.
    ///
    /// # Errors
    ///
    /// [`NavigationError::RouterDestroyed`] after the router is destroyed.
    pub fn on_visibility_hint(&self, hint: impl IntoIterator<Item = C>) -> NavResult {
        match &*self.source {
            StackSource::Live(router) => {
                router.dispatch(StackRouterEvent::VisibilityHint(hint.into_iter().collect()))
            }
            StackSource::Fixed(_) => Ok(()),
        }
    }

    /// Current configuration list, bottom first.
    #[must_use]
    pub fn configurations(&self) -> Vec<C> {
        match &*self.source {
            StackSource::Live(router) => router.state().configurations,
            StackSource::Fixed(stack) => stack.items().map(|c| c.configuration.clone()).collect(),
        }
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        match &*self.source {
            StackSource::Live(router) => router.is_destroyed(),
            StackSource::Fixed(_) => false,
        }
    }

    /// Destroy the router and every child. Idempotent.
    pub fn destroy(&self) {
        if let StackSource::Live(router) = &*self.source {
            router.destroy();
        }
    }
}

impl<C: Clone + Eq + Hash + 'static, T: 'static> Value<ChildStack<C, T>> for ChildStackValue<C, T> {
    fn value(&self) -> ChildStack<C, T> {
        match &*self.source {
            StackSource::Live(router) => router.value(),
            StackSource::Fixed(stack) => stack.clone(),
        }
    }

    fn subscribe_boxed(&self, observer: Box<dyn Fn(&ChildStack<C, T>)>) -> Subscription {
        match &*self.source {
            StackSource::Live(router) => router.subscribe_boxed(observer),
            StackSource::Fixed(stack) => {
                observer(stack);
                Subscription::empty()
            }
        }
    }
}

/// Build a stack router under `context`, driven by `source`.
///
/// `factory` is called synchronously for every configuration that needs an
/// instance. It receives the child's own context.
///
/// Events published on `source` while the initial children are being created
/// (for example by a factory) are held back and applied, in order, once the
/// router is running, before this returns.
///
/// # Errors
///
/// - [`NavigationError::EmptyStack`] if the initial stack is empty.
/// - [`NavigationError::DuplicateConfiguration`] if it repeats a
///   configuration.
/// - [`NavigationError::State`] if the key is already taken under `context`.
pub fn child_stack<C, T, S>(
    context: &ComponentContext,
    source: &S,
    config: StackConfig<C>,
    factory: impl Fn(&C, ComponentContext) -> T + 'static,
) -> NavResult<ChildStackValue<C, T>>
where
    C: Clone + Eq + Hash + 'static,
    T: 'static,
    S: NavigationSource<StackEvent<C>> + Clone + 'static,
{
    let StackConfig {
        initial_stack,
        router: router_config,
        codec,
    } = config;
    let policy = StackPolicy {
        codec,
        handle_back_button: router_config.handle_back_button,
    };
    let backlog = Backlog::<StackEvent<C>, S>::capture(source);
    let router = Router::new(
        context,
        &router_config,
        policy,
        move || StackNavState::new(initial_stack()),
        factory,
        |_, children| {
            ChildStack::from_children(children).expect("stack state is never empty")
        },
    )?;
    router.listen_with_backlog(source, backlog, |event: &StackEvent<C>| {
        StackRouterEvent::Navigate(event.clone())
    });
    Ok(ChildStackValue {
        source: Rc::new(StackSource::Live(router)),
    })
}

/// A [`ChildStackValue`] that never changes.
#[must_use]
pub fn child_stack_value_of<C, T>(stack: ChildStack<C, T>) -> ChildStackValue<C, T>
where
    C: Clone + Eq + Hash + 'static,
    T: 'static,
{
    ChildStackValue {
        source: Rc::new(StackSource::Fixed(stack)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn apply(stack: &[char], event: StackEvent<char>) -> NavResult<Vec<char>> {
        event.transform(stack)
    }

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<StackEvent<char>>>,
    }

    impl StackNavigator<char> for Recorder {
        fn navigate_event(&self, event: StackEvent<char>) -> NavResult {
            self.events.borrow_mut().push(event);
            Ok(())
        }
    }

    fn transform_of(op: impl FnOnce(&Recorder) -> NavResult, stack: &[char]) -> NavResult<Vec<char>> {
        let recorder = Recorder::default();
        op(&recorder).unwrap();
        let event = recorder.events.borrow_mut().pop().unwrap();
        apply(stack, event)
    }

    #[test]
    fn push_appends() {
        assert_eq!(transform_of(|n| n.push('b'), &['a']).unwrap(), vec!['a', 'b']);
    }

    #[test]
    fn pop_keeps_last_element() {
        assert_eq!(transform_of(|n| n.pop(), &['a', 'b']).unwrap(), vec!['a']);
        assert_eq!(transform_of(|n| n.pop(), &['a']).unwrap(), vec!['a']);
    }

    #[test]
    fn pop_to_truncates_inclusive_and_rejects_out_of_range() {
        assert_eq!(transform_of(|n| n.pop_to(0), &['a', 'b', 'c']).unwrap(), vec!['a']);
        assert_eq!(transform_of(|n| n.pop_to(2), &['a', 'b', 'c']).unwrap(), vec!['a', 'b', 'c']);
        let err = transform_of(|n| n.pop_to(3), &['a', 'b', 'c']).unwrap_err();
        assert!(matches!(err, NavigationError::IndexOutOfBounds { index: 3, len: 3 }));
    }

    #[test]
    fn push_new_skips_active_duplicate() {
        assert_eq!(transform_of(|n| n.push_new('b'), &['a', 'b']).unwrap(), vec!['a', 'b']);
        assert_eq!(transform_of(|n| n.push_new('a'), &['a', 'b']).unwrap(), vec!['a', 'b', 'a']);
    }

    #[test]
    fn push_to_front_moves_existing() {
        assert_eq!(
            transform_of(|n| n.push_to_front('a'), &['a', 'b', 'c']).unwrap(),
            vec!['b', 'c', 'a']
        );
        assert_eq!(transform_of(|n| n.push_to_front('d'), &['a']).unwrap(), vec!['a', 'd']);
    }

    #[test]
    fn bring_to_front_removes_same_kind() {
        let stack = ['a', 'B', 'c', 'D'];
        let out = transform_of(|n| n.bring_to_front('E', |c| c.is_uppercase()), &stack).unwrap();
        assert_eq!(out, vec!['a', 'c', 'E']);
    }

    #[test]
    fn pop_while_stops_at_bottom() {
        assert_eq!(
            transform_of(|n| n.pop_while(|c| *c != 'a'), &['a', 'b', 'c']).unwrap(),
            vec!['a']
        );
        assert_eq!(transform_of(|n| n.pop_while(|_| true), &['a', 'b']).unwrap(), vec!['a']);
    }

    #[test]
    fn replace_current_and_all() {
        assert_eq!(
            transform_of(|n| n.replace_current('z'), &['a', 'b']).unwrap(),
            vec!['a', 'z']
        );
        assert_eq!(
            transform_of(|n| n.replace_all(vec!['x', 'y']), &['a']).unwrap(),
            vec!['x', 'y']
        );
    }

    #[test]
    fn pop_completion_reports_success() {
        let recorder = Recorder::default();
        let result = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&result);
        recorder.pop_with(move |ok| sink.borrow_mut().push(ok)).unwrap();
        let event = recorder.events.borrow_mut().pop().unwrap();
        event.complete(&['a'], &['a', 'b']);
        event.complete(&['a'], &['a']);
        assert_eq!(*result.borrow(), vec![true, false]);
    }

    #[test]
    fn reducer_rejects_empty_result() {
        let policy = StackPolicy {
            codec: StateCodec::disabled(),
            handle_back_button: true,
        };
        let state = StackNavState::new(vec!['a']).unwrap();
        let event = StackRouterEvent::Navigate(StackEvent::new(|_: &[char]| Ok(Vec::new())));
        assert!(matches!(policy.reduce(&state, &event), Err(NavigationError::EmptyStack)));
    }

    #[test]
    fn hint_event_leaves_configurations() {
        let policy = StackPolicy {
            codec: StateCodec::disabled(),
            handle_back_button: false,
        };
        let state = StackNavState::new(vec!['a', 'b']).unwrap();
        let hinted = policy
            .reduce(&state, &StackRouterEvent::VisibilityHint(AHashSet::from_iter(['a'])))
            .unwrap();
        assert_eq!(hinted.configurations(), state.configurations());
        assert!(hinted.visibility_hint().contains(&'a'));
    }

    #[test]
    fn back_transform_requires_flag_and_depth() {
        let enabled = StackPolicy::<char> {
            codec: StateCodec::disabled(),
            handle_back_button: true,
        };
        let disabled = StackPolicy::<char> {
            codec: StateCodec::disabled(),
            handle_back_button: false,
        };
        let deep = StackNavState::new(vec!['a', 'b']).unwrap();
        let shallow = StackNavState::new(vec!['a']).unwrap();
        assert_eq!(
            enabled.back_transform(&deep).map(|s| s.configurations().to_vec()),
            Some(vec!['a'])
        );
        assert!(enabled.back_transform(&shallow).is_none());
        assert!(disabled.back_transform(&deep).is_none());
    }

    #[test]
    fn fixed_value_ignores_hints() {
        let value = child_stack_value_of(ChildStack::single('a', 1));
        assert!(value.on_visibility_hint(['a']).is_ok());
        assert_eq!(value.value().active.configuration, 'a');
        assert_eq!(value.configurations(), vec!['a']);
        assert!(!value.is_destroyed());
    }
}
