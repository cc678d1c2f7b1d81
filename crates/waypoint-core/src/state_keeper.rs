#![forbid(unsafe_code)]

//! Key-scoped state retention across process recreation.
//!
//! A [`StateKeeper`] is created with the [`SavedState`] restored by the host
//! (or an empty one on first launch). Components:
//!
//! 1. [`consume`](StateKeeper::consume) their previous state once, at
//!    construction, under a key unique among siblings;
//! 2. [`register`](StateKeeper::register) a supplier under the same key;
//! 3. [`unregister`](StateKeeper::unregister) it when they are torn down.
//!
//! At save time the host calls [`StateKeeper::save`], which asks every
//! registered supplier for a [`SerializableContainer`].
//!
//! # Layout
//!
//! `SavedState` is a sorted map from key to container. Containers hold a
//! `serde_json::Value`, so nested components nest their own `SavedState`
//! inside a container. The whole tree round-trips through JSON, or through
//! base64-encoded JSON for hosts that persist opaque text.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StateKeeperError};

/// Opaque persisted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializableContainer(serde_json::Value);

impl SerializableContainer {
    /// Encode any serializable value.
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self(serde_json::to_value(value)?))
    }

    /// Decode the held value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.0)?)
    }

    #[must_use]
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    #[must_use]
    pub fn into_json(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for SerializableContainer {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Snapshot of every registered supplier, keyed by component key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedState {
    entries: BTreeMap<String, SerializableContainer>,
}

impl SavedState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SerializableContainer> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, container: SerializableContainer) {
        self.entries.insert(key.into(), container);
    }

    pub fn remove(&mut self, key: &str) -> Option<SerializableContainer> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Base64 of the JSON encoding.
    pub fn to_base64(&self) -> Result<String> {
        Ok(BASE64.encode(serde_json::to_vec(self)?))
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = BASE64.decode(encoded)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

type Supplier = Rc<dyn Fn() -> Option<SerializableContainer>>;

struct KeeperInner {
    restored: RefCell<SavedState>,
    suppliers: RefCell<BTreeMap<String, Supplier>>,
}

/// Shared handle to one component's state scope.
#[derive(Clone)]
pub struct StateKeeper {
    inner: Rc<KeeperInner>,
}

impl Default for StateKeeper {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateKeeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateKeeper")
            .field("restored", &self.inner.restored.borrow().len())
            .field("registered", &self.inner.suppliers.borrow().len())
            .finish()
    }
}

impl StateKeeper {
    /// A keeper with nothing to restore.
    #[must_use]
    pub fn new() -> Self {
        Self::restored(SavedState::default())
    }

    /// A keeper seeded with state saved by a previous process.
    #[must_use]
    pub fn restored(saved: SavedState) -> Self {
        Self {
            inner: Rc::new(KeeperInner {
                restored: RefCell::new(saved),
                suppliers: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    /// Take the restored container for `key`. Returns `None` on a second call.
    pub fn consume(&self, key: &str) -> Option<SerializableContainer> {
        self.inner.restored.borrow_mut().remove(key)
    }

    /// [`consume`](Self::consume) and decode in one step.
    pub fn consume_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.consume(key).map(|c| c.decode()).transpose()
    }

    /// Register the supplier polled by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// [`StateKeeperError::KeyCollision`] if `key` is already registered.
    pub fn register(
        &self,
        key: impl Into<String>,
        supplier: impl Fn() -> Option<SerializableContainer> + 'static,
    ) -> Result<()> {
        let key = key.into();
        let mut suppliers = self.inner.suppliers.borrow_mut();
        if suppliers.contains_key(&key) {
            return Err(StateKeeperError::collision(key));
        }
        suppliers.insert(key, Rc::new(supplier));
        Ok(())
    }

    /// Register a supplier of a plain serializable value.
    ///
    /// Encoding failures are logged and skip the entry for that save.
    pub fn register_value<T: Serialize>(
        &self,
        key: impl Into<String>,
        supplier: impl Fn() -> T + 'static,
    ) -> Result<()> {
        let key = key.into();
        let log_key = key.clone();
        self.register(key, move || match SerializableContainer::encode(&supplier()) {
            Ok(container) => Some(container),
            Err(err) => {
                tracing::warn!(message = "state.encode_failed", key = %log_key, error = %err);
                None
            }
        })
    }

    /// Remove a supplier. Returns whether one was registered.
    pub fn unregister(&self, key: &str) -> bool {
        let removed = self.inner.suppliers.borrow_mut().remove(key);
        removed.is_some()
    }

    #[must_use]
    pub fn is_registered(&self, key: &str) -> bool {
        self.inner.suppliers.borrow().contains_key(key)
    }

    /// Poll every supplier.
    #[must_use]
    pub fn save(&self) -> SavedState {
        let suppliers: Vec<(String, Supplier)> = self
            .inner
            .suppliers
            .borrow()
            .iter()
            .map(|(k, s)| (k.clone(), Rc::clone(s)))
            .collect();
        let mut saved = SavedState::new();
        for (key, supplier) in suppliers {
            if let Some(container) = supplier() {
                saved.insert(key, container);
            }
        }
        tracing::trace!(message = "state.save", entries = saved.len());
        saved
    }
}
