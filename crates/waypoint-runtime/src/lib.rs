#![forbid(unsafe_code)]

//! Navigation runtime for waypoint.
//!
//! # Role in waypoint
//! `waypoint-runtime` turns navigation commands into a live, lifecycle-aware
//! tree of child components. It owns the reduce → derive → reconcile → emit
//! pass and the stack/slot policies built on it.
//!
//! # Primary responsibilities
//! - **reactive**: [`Observable`](reactive::Observable) and the read-only
//!   [`Value`](reactive::Value) views routers hand out.
//! - **nav**: the synchronous event bus and status derivation.
//! - **router**: the reconciliation engine, persistence bridge, and the stack
//!   and slot routers.
//!
//! # How it fits in the system
//! Components receive a [`ComponentContext`](waypoint_core::ComponentContext)
//! from `waypoint-core`. A router built under that context creates children
//! with their own contexts, drives their lifecycles beneath the parent's,
//! persists through the parent's state keeper, and handles back presses
//! through the parent's back dispatcher.

pub mod error;
pub mod nav;
pub mod reactive;
pub mod router;

pub use error::{NavResult, NavigationError};
