#![forbid(unsafe_code)]

//! Diff a new child list against the live one.
//!
//! # Algorithm
//!
//! 1. Index live children by configuration. Each target either claims the
//!    live child with an equal configuration (same instance, new status) or
//!    is spawned fresh.
//! 2. Live children nobody claimed are marked [`Child::Destroyed`].
//! 3. Retained children whose status dropped are driven down first, so the
//!    previously active child pauses before anything else resumes.
//! 4. Doomed children are destroyed, topmost first.
//! 5. Every remaining child is driven up to its status in list order.
//!
//! All lifecycle movement is an ordered walk; intermediate callbacks are
//! never skipped. Destruction completes before the caller emits a snapshot.

use std::hash::Hash;
use std::rc::Rc;

use ahash::AHashMap;
use waypoint_core::LifecycleState;

use super::child::{Child, LiveChild};
use crate::nav::ChildNavState;

pub(crate) struct Reconciliation<C, T> {
    pub(crate) children: Vec<Rc<LiveChild<C, T>>>,
    pub(crate) created: usize,
    pub(crate) retained: usize,
    pub(crate) destroyed: usize,
}

/// Reconcile `live` against `targets` under a parent in `parent` state.
///
/// `spawn(position, configuration)` builds a missing child. `targets` must be
/// free of duplicate configurations.
pub(crate) fn reconcile<C, T>(
    live: &[Rc<LiveChild<C, T>>],
    targets: &[ChildNavState<C>],
    parent: LifecycleState,
    mut spawn: impl FnMut(usize, &C) -> Rc<LiveChild<C, T>>,
) -> Reconciliation<C, T>
where
    C: Clone + Eq + Hash,
{
    let index: AHashMap<&C, usize> = live
        .iter()
        .enumerate()
        .map(|(i, child)| (child.configuration(), i))
        .collect();
    let mut claimed = vec![false; live.len()];
    let mut plan: Vec<Child<C, T>> = Vec::with_capacity(targets.len() + live.len());
    let mut created = 0;

    for (position, target) in targets.iter().enumerate() {
        let child = match index.get(&target.configuration) {
            Some(&i) if !claimed[i] => {
                claimed[i] = true;
                Rc::clone(&live[i])
            }
            _ => {
                created += 1;
                spawn(position, &target.configuration)
            }
        };
        child.set_status(target.status);
        plan.push(Child::Created(child));
    }
    for (i, child) in live.iter().enumerate() {
        if !claimed[i] {
            plan.push(Child::Destroyed(Rc::clone(child)));
        }
    }

    for step in &plan {
        if let Child::Created(child) = step {
            if child.target(parent) < child.lifecycle_state() {
                child.drive(parent);
            }
        }
    }

    let mut destroyed = 0;
    for step in plan.iter().rev() {
        if let Child::Destroyed(child) = step {
            child.destroy();
            destroyed += 1;
        }
    }

    let children: Vec<Rc<LiveChild<C, T>>> = plan
        .into_iter()
        .filter_map(|step| match step {
            Child::Created(child) => Some(child),
            Child::Destroyed(_) => None,
        })
        .collect();
    for child in &children {
        child.drive(parent);
    }

    Reconciliation {
        retained: children.len() - created,
        children,
        created,
        destroyed,
    }
}
