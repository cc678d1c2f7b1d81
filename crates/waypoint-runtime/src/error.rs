#![forbid(unsafe_code)]

//! Navigation errors.
//!
//! Every variant is a contract violation surfaced to the caller of the
//! navigation call (or router construction) that caused it. The navigation
//! state is left exactly as it was before the failing call.

use thiserror::Error;
use waypoint_core::StateKeeperError;

pub type NavResult<T = ()> = Result<T, NavigationError>;

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("configuration stack must not be empty")]
    EmptyStack,

    #[error("duplicate configuration at index {index}")]
    DuplicateConfiguration { index: usize },

    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("re-entrant navigation exceeded the limit of {limit}")]
    ReentrancyLimit { limit: usize },

    #[error("router has been destroyed")]
    RouterDestroyed,

    #[error(transparent)]
    State(#[from] StateKeeperError),
}
