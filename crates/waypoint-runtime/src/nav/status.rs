#![forbid(unsafe_code)]

//! Desired lifecycle tiers for navigation children.
//!
//! A navigation state is reduced to an ordered list of [`ChildNavState`]
//! before every reconciliation. The list is always recomputed from scratch,
//! never patched, so statuses cannot drift from the state they describe.

use std::hash::Hash;

use ahash::AHashSet;
use waypoint_core::LifecycleState;

use crate::error::{NavResult, NavigationError};

/// Desired lifecycle tier of a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    /// Alive, not visible.
    Created,
    /// Visible, not interactive.
    Started,
    /// Visible and interactive.
    Resumed,
}

impl Status {
    #[must_use]
    pub const fn lifecycle_state(self) -> LifecycleState {
        match self {
            Self::Created => LifecycleState::Created,
            Self::Started => LifecycleState::Started,
            Self::Resumed => LifecycleState::Resumed,
        }
    }
}

/// A configuration paired with the status it should have.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChildNavState<C> {
    pub configuration: C,
    pub status: Status,
}

impl<C> ChildNavState<C> {
    #[must_use]
    pub fn new(configuration: C, status: Status) -> Self {
        Self {
            configuration,
            status,
        }
    }
}

/// A navigation state that can be flattened into per-child statuses.
pub trait NavState<C> {
    /// Children in presentation order.
    fn children(&self) -> Vec<ChildNavState<C>>;
}

/// Stack rule: the last configuration is resumed, hinted ones are started,
/// the rest are created.
#[must_use]
pub fn derive_stack_statuses<C: Clone + Eq + Hash>(
    configurations: &[C],
    visibility_hint: &AHashSet<C>,
) -> Vec<ChildNavState<C>> {
    let last = configurations.len().saturating_sub(1);
    configurations
        .iter()
        .enumerate()
        .map(|(index, configuration)| {
            let status = if index == last {
                Status::Resumed
            } else if visibility_hint.contains(configuration) {
                Status::Started
            } else {
                Status::Created
            };
            ChildNavState::new(configuration.clone(), status)
        })
        .collect()
}

/// Slot rule: the configuration, if any, is resumed.
#[must_use]
pub fn derive_slot_statuses<C: Clone>(configuration: Option<&C>) -> Vec<ChildNavState<C>> {
    configuration
        .map(|c| ChildNavState::new(c.clone(), Status::Resumed))
        .into_iter()
        .collect()
}

/// Reject a child list containing the same configuration twice.
///
/// # Errors
///
/// [`NavigationError::DuplicateConfiguration`] with the index of the second
/// occurrence.
pub fn ensure_unique<C: Eq + Hash>(children: &[ChildNavState<C>]) -> NavResult {
    let mut seen = AHashSet::with_capacity(children.len());
    for (index, child) in children.iter().enumerate() {
        if !seen.insert(&child.configuration) {
            return Err(NavigationError::DuplicateConfiguration { index });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(children: &[ChildNavState<char>]) -> Vec<(char, Status)> {
        children.iter().map(|c| (c.configuration, c.status)).collect()
    }

    #[test]
    fn last_is_resumed_rest_created() {
        let derived = derive_stack_statuses(&['a', 'b', 'c'], &AHashSet::new());
        assert_eq!(
            statuses(&derived),
            vec![
                ('a', Status::Created),
                ('b', Status::Created),
                ('c', Status::Resumed)
            ]
        );
    }

    #[test]
    fn single_element_is_resumed() {
        let derived = derive_stack_statuses(&['a'], &AHashSet::from_iter(['a']));
        assert_eq!(statuses(&derived), vec![('a', Status::Resumed)]);
    }

    #[test]
    fn hint_starts_non_active_only() {
        let hint = AHashSet::from_iter(['a', 'b']);
        let derived = derive_stack_statuses(&['a', 'b'], &hint);
        assert_eq!(
            statuses(&derived),
            vec![('a', Status::Started), ('b', Status::Resumed)]
        );
    }

    #[test]
    fn slot_is_empty_or_resumed() {
        assert!(derive_slot_statuses::<char>(None).is_empty());
        assert_eq!(
            statuses(&derive_slot_statuses(Some(&'x'))),
            vec![('x', Status::Resumed)]
        );
    }

    #[test]
    fn duplicates_rejected_at_second_index() {
        let children = derive_stack_statuses(&['a', 'b', 'a'], &AHashSet::new());
        let err = ensure_unique(&children).unwrap_err();
        assert!(matches!(err, NavigationError::DuplicateConfiguration { index: 2 }));
        let unique = derive_stack_statuses(&['a', 'b'], &AHashSet::new());
        assert!(ensure_unique(&unique).is_ok());
    }

    #[test]
    fn status_maps_onto_lifecycle() {
        assert_eq!(Status::Created.lifecycle_state(), LifecycleState::Created);
        assert_eq!(Status::Started.lifecycle_state(), LifecycleState::Started);
        assert_eq!(Status::Resumed.lifecycle_state(), LifecycleState::Resumed);
        assert!(Status::Created < Status::Resumed);
    }
}
