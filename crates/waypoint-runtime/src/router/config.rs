#![forbid(unsafe_code)]

//! Router configuration.

use std::fmt;
use std::rc::Rc;

use super::persistence::StateCodec;

/// Settings shared by every router kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Key under which the router persists its state. Must be unique among
    /// routers sharing a parent.
    pub key: String,
    /// Whether the router pops/dismisses on a back signal.
    pub handle_back_button: bool,
    /// Most navigation jobs drained by one outermost call before the rest are
    /// dropped with [`NavigationError::ReentrancyLimit`](crate::NavigationError::ReentrancyLimit).
    pub max_pending_events: usize,
}

impl RouterConfig {
    pub const DEFAULT_MAX_PENDING_EVENTS: usize = 1024;

    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            handle_back_button: false,
            max_pending_events: Self::DEFAULT_MAX_PENDING_EVENTS,
        }
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn handle_back_button(mut self, enabled: bool) -> Self {
        self.handle_back_button = enabled;
        self
    }

    #[must_use]
    pub fn max_pending_events(mut self, limit: usize) -> Self {
        self.max_pending_events = limit.max(1);
        self
    }
}

/// Configuration for [`child_stack`](super::stack::child_stack).
pub struct StackConfig<C> {
    pub(crate) initial_stack: Rc<dyn Fn() -> Vec<C>>,
    pub(crate) router: RouterConfig,
    pub(crate) codec: StateCodec<Vec<C>>,
}

impl<C> fmt::Debug for StackConfig<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackConfig")
            .field("router", &self.router)
            .field("persistent", &self.codec.is_enabled())
            .finish_non_exhaustive()
    }
}

impl<C: 'static> StackConfig<C> {
    pub const DEFAULT_KEY: &'static str = "DefaultChildStack";

    /// Stack seeded lazily by `initial_stack`, consulted only when nothing
    /// is restored. The list must be non-empty and free of duplicates.
    #[must_use]
    pub fn new(initial_stack: impl Fn() -> Vec<C> + 'static) -> Self {
        Self {
            initial_stack: Rc::new(initial_stack),
            router: RouterConfig::new(Self::DEFAULT_KEY),
            codec: StateCodec::disabled(),
        }
    }

    /// Stack seeded with one configuration.
    #[must_use]
    pub fn single(configuration: C) -> Self
    where
        C: Clone,
    {
        Self::new(move || vec![configuration.clone()])
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.router = self.router.key(key);
        self
    }

    #[must_use]
    pub fn handle_back_button(mut self, enabled: bool) -> Self {
        self.router = self.router.handle_back_button(enabled);
        self
    }

    #[must_use]
    pub fn max_pending_events(mut self, limit: usize) -> Self {
        self.router = self.router.max_pending_events(limit);
        self
    }

    /// Persist the configuration list with `codec`.
    #[must_use]
    pub fn codec(mut self, codec: StateCodec<Vec<C>>) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn router_config(&self) -> &RouterConfig {
        &self.router
    }
}

/// Configuration for [`child_slot`](super::slot::child_slot).
pub struct SlotConfig<C> {
    pub(crate) initial_configuration: Rc<dyn Fn() -> Option<C>>,
    pub(crate) router: RouterConfig,
    pub(crate) codec: StateCodec<Option<C>>,
}

impl<C> fmt::Debug for SlotConfig<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotConfig")
            .field("router", &self.router)
            .field("persistent", &self.codec.is_enabled())
            .finish_non_exhaustive()
    }
}

impl<C: 'static> Default for SlotConfig<C> {
    fn default() -> Self {
        Self::new(|| None)
    }
}

impl<C: 'static> SlotConfig<C> {
    pub const DEFAULT_KEY: &'static str = "DefaultChildSlot";

    #[must_use]
    pub fn new(initial_configuration: impl Fn() -> Option<C> + 'static) -> Self {
        Self {
            initial_configuration: Rc::new(initial_configuration),
            router: RouterConfig::new(Self::DEFAULT_KEY),
            codec: StateCodec::disabled(),
        }
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.router = self.router.key(key);
        self
    }

    #[must_use]
    pub fn handle_back_button(mut self, enabled: bool) -> Self {
        self.router = self.router.handle_back_button(enabled);
        self
    }

    #[must_use]
    pub fn max_pending_events(mut self, limit: usize) -> Self {
        self.router = self.router.max_pending_events(limit);
        self
    }

    #[must_use]
    pub fn codec(mut self, codec: StateCodec<Option<C>>) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn router_config(&self) -> &RouterConfig {
        &self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let stack = StackConfig::single('a');
        assert_eq!(stack.router_config().key, "DefaultChildStack");
        assert!(!stack.router_config().handle_back_button);
        assert_eq!(
            stack.router_config().max_pending_events,
            RouterConfig::DEFAULT_MAX_PENDING_EVENTS
        );
        assert_eq!((stack.initial_stack)(), vec!['a']);

        let slot = SlotConfig::<char>::default();
        assert_eq!(slot.router_config().key, "DefaultChildSlot");
        assert_eq!((slot.initial_configuration)(), None);
    }

    #[test]
    fn builders_override() {
        let config = StackConfig::single(1u8)
            .key("tabs")
            .handle_back_button(true)
            .max_pending_events(0);
        assert_eq!(config.router_config().key, "tabs");
        assert!(config.router_config().handle_back_button);
        assert_eq!(config.router_config().max_pending_events, 1);
    }
}
