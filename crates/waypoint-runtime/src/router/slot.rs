#![forbid(unsafe_code)]

//! Slot router: zero or one child, resumed while present.
//!
//! Typical for dialogs and bottom sheets. With back handling enabled, a back
//! press dismisses the child.

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use waypoint_core::{ComponentContext, SerializableContainer, Subscription};

use super::child::CreatedChild;
use super::config::SlotConfig;
use super::engine::{Router, RouterPolicy};
use super::persistence::StateCodec;
use crate::error::NavResult;
use crate::nav::{Backlog, ChildNavState, NavObserver, NavState, NavigationSource, SimpleNavigation, derive_slot_statuses};
use crate::reactive::Value;

type Transformer<C> = Rc<dyn Fn(Option<&C>) -> NavResult<Option<C>>>;
type Completion<C> = Rc<dyn Fn(Option<&C>, Option<&C>)>;

/// A slot navigation command.
pub struct SlotEvent<C> {
    transformer: Transformer<C>,
    on_complete: Option<Completion<C>>,
}

impl<C> Clone for SlotEvent<C> {
    fn clone(&self) -> Self {
        Self {
            transformer: Rc::clone(&self.transformer),
            on_complete: self.on_complete.clone(),
        }
    }
}

impl<C> fmt::Debug for SlotEvent<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotEvent")
            .field("has_on_complete", &self.on_complete.is_some())
            .finish_non_exhaustive()
    }
}

impl<C> SlotEvent<C> {
    pub fn new(transformer: impl Fn(Option<&C>) -> NavResult<Option<C>> + 'static) -> Self {
        Self {
            transformer: Rc::new(transformer),
            on_complete: None,
        }
    }

    #[must_use]
    pub fn with_on_complete(mut self, on_complete: impl Fn(Option<&C>, Option<&C>) + 'static) -> Self {
        self.on_complete = Some(Rc::new(on_complete));
        self
    }

    pub fn transform(&self, configuration: Option<&C>) -> NavResult<Option<C>> {
        (self.transformer)(configuration)
    }

    pub fn complete(&self, new: Option<&C>, old: Option<&C>) {
        if let Some(on_complete) = &self.on_complete {
            on_complete(new, old);
        }
    }
}

/// Slot navigation commands.
pub trait SlotNavigator<C: Clone + 'static> {
    fn navigate_event(&self, event: SlotEvent<C>) -> NavResult;

    fn navigate(&self, transformer: impl Fn(Option<&C>) -> NavResult<Option<C>> + 'static) -> NavResult
    where
        Self: Sized,
    {
        self.navigate_event(SlotEvent::new(transformer))
    }

    /// Show `configuration`, replacing whatever is shown.
    fn activate_with(&self, configuration: C, on_complete: impl Fn() + 'static) -> NavResult
    where
        Self: Sized,
    {
        self.navigate_event(
            SlotEvent::new(move |_| Ok(Some(configuration.clone())))
                .with_on_complete(move |_, _| on_complete()),
        )
    }

    fn activate(&self, configuration: C) -> NavResult
    where
        Self: Sized,
    {
        self.activate_with(configuration, || {})
    }

    /// Remove the child. `on_complete` receives whether one was shown.
    fn dismiss_with(&self, on_complete: impl Fn(bool) + 'static) -> NavResult
    where
        Self: Sized,
    {
        self.navigate_event(
            SlotEvent::new(|_| Ok(None)).with_on_complete(move |_, old| on_complete(old.is_some())),
        )
    }

    fn dismiss(&self) -> NavResult
    where
        Self: Sized,
    {
        self.dismiss_with(|_| {})
    }
}

/// The standard slot navigation source.
pub struct SlotNavigation<C> {
    bus: SimpleNavigation<SlotEvent<C>>,
}

impl<C> Clone for SlotNavigation<C> {
    fn clone(&self) -> Self {
        Self {
            bus: self.bus.clone(),
        }
    }
}

impl<C> fmt::Debug for SlotNavigation<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SlotNavigation").field(&self.bus).finish()
    }
}

impl<C> Default for SlotNavigation<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> SlotNavigation<C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bus: SimpleNavigation::new(),
        }
    }

    /// Number of routers (and other observers) attached.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.bus.observer_count()
    }
}

impl<C> NavigationSource<SlotEvent<C>> for SlotNavigation<C> {
    fn subscribe(&self, observer: &NavObserver<SlotEvent<C>>) {
        self.bus.subscribe(observer);
    }

    fn unsubscribe(&self, observer: &NavObserver<SlotEvent<C>>) {
        self.bus.unsubscribe(observer);
    }
}

impl<C: Clone + 'static> SlotNavigator<C> for SlotNavigation<C> {
    fn navigate_event(&self, event: SlotEvent<C>) -> NavResult {
        self.bus.navigate(event)
    }
}

/// Navigation state of a slot router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotNavState<C> {
    configuration: Option<C>,
}

impl<C> SlotNavState<C> {
    #[must_use]
    pub fn new(configuration: Option<C>) -> Self {
        Self { configuration }
    }

    #[must_use]
    pub fn configuration(&self) -> Option<&C> {
        self.configuration.as_ref()
    }
}

impl<C: Clone> NavState<C> for SlotNavState<C> {
    fn children(&self) -> Vec<ChildNavState<C>> {
        derive_slot_statuses(self.configuration.as_ref())
    }
}

pub(crate) struct SlotPolicy<C> {
    codec: StateCodec<Option<C>>,
    handle_back_button: bool,
}

impl<C: Clone + Eq + Hash + 'static> RouterPolicy for SlotPolicy<C> {
    type Configuration = C;
    type Event = SlotEvent<C>;
    type State = SlotNavState<C>;

    fn save_state(&self, state: &Self::State) -> Option<SerializableContainer> {
        self.codec.save(&state.configuration)
    }

    fn restore_state(&self, container: &SerializableContainer) -> Option<Self::State> {
        self.codec.restore(container).map(SlotNavState::new)
    }

    fn reduce(&self, state: &Self::State, event: &Self::Event) -> NavResult<Self::State> {
        event.transform(state.configuration()).map(SlotNavState::new)
    }

    fn on_event_complete(&self, event: &Self::Event, new: &Self::State, old: &Self::State) {
        event.complete(new.configuration(), old.configuration());
    }

    fn back_transform(&self, state: &Self::State) -> Option<Self::State> {
        (self.handle_back_button && state.configuration.is_some()).then(|| SlotNavState::new(None))
    }
}

/// Consumer-facing snapshot of a slot router.
pub struct ChildSlot<C, T> {
    pub child: Option<CreatedChild<C, T>>,
}

impl<C, T> ChildSlot<C, T> {
    #[must_use]
    pub fn new(child: Option<CreatedChild<C, T>>) -> Self {
        Self { child }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self { child: None }
    }
}

impl<C: Clone, T> Clone for ChildSlot<C, T> {
    fn clone(&self) -> Self {
        Self {
            child: self.child.clone(),
        }
    }
}

impl<C: PartialEq, T> PartialEq for ChildSlot<C, T> {
    fn eq(&self, other: &Self) -> bool {
        self.child == other.child
    }
}

impl<C: fmt::Debug, T> fmt::Debug for ChildSlot<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildSlot").field("child", &self.child).finish()
    }
}

enum SlotSource<C: Clone + Eq + Hash + 'static, T: 'static> {
    /// Backed by a running router.
    Live(Router<SlotPolicy<C>, T, ChildSlot<C, T>>),
    /// Built by [`child_slot_value_of`]; never changes.
    Fixed(ChildSlot<C, T>),
}

/// Observable [`ChildSlot`] produced by [`child_slot`] or
/// [`child_slot_value_of`].
pub struct ChildSlotValue<C: Clone + Eq + Hash + 'static, T: 'static> {
    source: Rc<SlotSource<C, T>>,
}

impl<C: Clone + Eq + Hash + 'static, T: 'static> Clone for ChildSlotValue<C, T> {
    fn clone(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
        }
    }
}

impl<C: Clone + Eq + Hash + fmt::Debug + 'static, T: 'static> fmt::Debug for ChildSlotValue<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.source {
            SlotSource::Live(router) => f.debug_tuple("ChildSlotValue").field(router).finish(),
            SlotSource::Fixed(slot) => f.debug_tuple("ChildSlotValue").field(slot).finish(),
        }
    }
}

impl<C: Clone + Eq + Hash + 'static, T: 'static> ChildSlotValue<C, T> {
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        match &*self.source {
            SlotSource::Live(router) => router.is_destroyed(),
            SlotSource::Fixed(_) => false,
        }
    }

    /// Destroy the router and its child. Idempotent.
    pub fn destroy(&self) {
        if let SlotSource::Live(router) = &*self.source {
            router.destroy();
        }
    }
}

impl<C: Clone + Eq + Hash + 'static, T: 'static> Value<ChildSlot<C, T>> for ChildSlotValue<C, T> {
    fn value(&self) -> ChildSlot<C, T> {
        match &*self.source {
            SlotSource::Live(router) => router.value(),
            SlotSource::Fixed(slot) => slot.clone(),
        }
    }

    fn subscribe_boxed(&self, observer: Box<dyn Fn(&ChildSlot<C, T>)>) -> Subscription {
        match &*self.source {
            SlotSource::Live(router) => router.subscribe_boxed(observer),
            SlotSource::Fixed(slot) => {
                observer(slot);
                Subscription::empty()
            }
        }
    }
}

/// Build a slot router under `context`, driven by `source`.
///
/// As with [`child_stack`](super::child_stack), events published while the
/// initial child is being created are applied once the router is running.
///
/// # Errors
///
/// [`NavigationError::State`](crate::NavigationError::State) if the key is
/// already taken under `context`.
pub fn child_slot<C, T, S>(
    context: &ComponentContext,
    source: &S,
    config: SlotConfig<C>,
    factory: impl Fn(&C, ComponentContext) -> T + 'static,
) -> NavResult<ChildSlotValue<C, T>>
where
    C: Clone + Eq + Hash + 'static,
    T: 'static,
    S: NavigationSource<SlotEvent<C>> + Clone + 'static,
{
    let SlotConfig {
        initial_configuration,
        router: router_config,
        codec,
    } = config;
    let policy = SlotPolicy {
        codec,
        handle_back_button: router_config.handle_back_button,
    };
    let backlog = Backlog::<SlotEvent<C>, S>::capture(source);
    let router = Router::new(
        context,
        &router_config,
        policy,
        move || Ok(SlotNavState::new(initial_configuration())),
        factory,
        |_, mut children| ChildSlot::new(children.pop()),
    )?;
    router.listen_with_backlog(source, backlog, |event: &SlotEvent<C>| event.clone());
    Ok(ChildSlotValue {
        source: Rc::new(SlotSource::Live(router)),
    })
}

/// A [`ChildSlotValue`] that never changes.
#[must_use]
pub fn child_slot_value_of<C, T>(slot: ChildSlot<C, T>) -> ChildSlotValue<C, T>
where
    C: Clone + Eq + Hash + 'static,
    T: 'static,
{
    ChildSlotValue {
        source: Rc::new(SlotSource::Fixed(slot)),
    }
}
