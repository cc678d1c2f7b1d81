#![forbid(unsafe_code)]

//! Bridge between a router's navigation state and the parent's state keeper.
//!
//! A [`StateCodec`] turns the router's configuration list into a
//! [`SerializableContainer`] and back. A disabled codec (the default) means
//! the router is never persisted: every process start uses the initial
//! configuration.
//!
//! The router stores one [`SavedRouterState`] under its key: the encoded
//! list plus one [`SavedState`] per child, in list order.

use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use waypoint_core::{SavedState, SerializableContainer};

type SaveFn<L> = Rc<dyn Fn(&L) -> Option<SerializableContainer>>;
type RestoreFn<L> = Rc<dyn Fn(&SerializableContainer) -> Option<L>>;

/// Save/restore pair for a router's configuration list `L`.
pub struct StateCodec<L> {
    save: Option<SaveFn<L>>,
    restore: Option<RestoreFn<L>>,
}

impl<L> Clone for StateCodec<L> {
    fn clone(&self) -> Self {
        Self {
            save: self.save.clone(),
            restore: self.restore.clone(),
        }
    }
}

impl<L> fmt::Debug for StateCodec<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCodec")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl<L> Default for StateCodec<L> {
    fn default() -> Self {
        Self::disabled()
    }
}

impl<L> StateCodec<L> {
    /// No persistence.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            save: None,
            restore: None,
        }
    }

    /// Caller-supplied functions. Either may return `None` to skip.
    #[must_use]
    pub fn custom(
        save: impl Fn(&L) -> Option<SerializableContainer> + 'static,
        restore: impl Fn(&SerializableContainer) -> Option<L> + 'static,
    ) -> Self {
        Self {
            save: Some(Rc::new(save)),
            restore: Some(Rc::new(restore)),
        }
    }

    /// Encode with serde. Failures are logged and treated as "nothing
    /// saved" / "nothing restored".
    #[must_use]
    pub fn serde() -> Self
    where
        L: Serialize + DeserializeOwned + 'static,
    {
        Self::custom(
            |list| match SerializableContainer::encode(list) {
                Ok(container) => Some(container),
                Err(err) => {
                    tracing::warn!(message = "router.encode_failed", error = %err);
                    None
                }
            },
            |container| match container.decode() {
                Ok(list) => Some(list),
                Err(err) => {
                    tracing::warn!(message = "router.decode_failed", error = %err);
                    None
                }
            },
        )
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.save.is_some()
    }

    #[must_use]
    pub fn save(&self, list: &L) -> Option<SerializableContainer> {
        self.save.as_ref().and_then(|save| save(list))
    }

    #[must_use]
    pub fn restore(&self, container: &SerializableContainer) -> Option<L> {
        self.restore.as_ref().and_then(|restore| restore(container))
    }
}

/// What a router stores under its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SavedRouterState {
    pub(crate) nav: SerializableContainer,
    pub(crate) children: Vec<SavedState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_saves_nothing() {
        let codec = StateCodec::<Vec<u8>>::disabled();
        assert!(!codec.is_enabled());
        assert!(codec.save(&vec![1]).is_none());
    }

    #[test]
    fn serde_codec_round_trips() {
        let codec = StateCodec::<Vec<String>>::serde();
        let list = vec!["a".to_string(), "b".to_string()];
        let container = codec.save(&list).unwrap();
        assert_eq!(codec.restore(&container), Some(list));
    }

    #[test]
    fn incompatible_schema_restores_none() {
        let codec = StateCodec::<Vec<u32>>::serde();
        let container = SerializableContainer::encode("not a list").unwrap();
        assert_eq!(codec.restore(&container), None);
    }

    #[test]
    fn saved_router_state_survives_json() {
        let mut child = SavedState::new();
        child.insert("count", SerializableContainer::encode(&3).unwrap());
        let saved = SavedRouterState {
            nav: SerializableContainer::encode(&vec!['a']).unwrap(),
            children: vec![child],
        };
        let container = SerializableContainer::encode(&saved).unwrap();
        let back: SavedRouterState = container.decode().unwrap();
        assert_eq!(back, saved);
    }
}
