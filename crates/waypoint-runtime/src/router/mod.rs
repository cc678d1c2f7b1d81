#![forbid(unsafe_code)]

//! Routers: navigation state in, live children out.
//!
//! [`Router`] is the generic engine; [`child_stack`] and [`child_slot`]
//! configure it with stack and slot semantics.

pub(crate) mod child;
pub mod config;
pub mod engine;
pub mod persistence;
pub(crate) mod reconcile;
pub mod slot;
pub mod stack;

pub use child::CreatedChild;
pub use config::{RouterConfig, SlotConfig, StackConfig};
pub use engine::{Router, RouterPolicy};
pub use persistence::StateCodec;
pub use slot::{
    ChildSlot, ChildSlotValue, SlotEvent, SlotNavState, SlotNavigation, SlotNavigator, child_slot,
    child_slot_value_of,
};
pub use stack::{
    ChildStack, ChildStackValue, StackEvent, StackNavState, StackNavigation, StackNavigator,
    child_stack, child_stack_value_of,
};
