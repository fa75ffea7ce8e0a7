//! Commit and propagation.
//!
//! A commit is the unit of atomicity. It runs in four steps:
//!
//! 1. Increment the tick.
//! 2. Apply every staged source update: move the pending value into place,
//!    stamp the source with the new tick, notify its subscribers. The staged
//!    set is drained in full before propagation starts, so no dependant ever
//!    sees a mix of old and new source values.
//! 3. If force-notify was requested, stamp and notify every source the
//!    staged pass skipped, broadcasting its unchanged value. This exists to
//!    drive an initial notification pass right after construction.
//! 4. Walk the dependant graph and recompute every dependant whose tick is
//!    stale, prerequisites first.
//!
//! # Propagation
//!
//! Step 4 uses an explicit stack instead of recursion, so stack depth is
//! bounded on arbitrarily deep graphs. The stack is seeded with every stale
//! dependant, in arena order. For the node on top:
//!
//! - if it already carries the current tick it is a duplicate entry,
//!   finalized through another path this tick; pop it. This is what keeps
//!   notification at most-once per property per commit.
//! - otherwise scan its dependencies. Any dependant dependency with a stale
//!   tick is pushed on top while the current node stays in place for a
//!   deferred revisit. If such a dependency is already in progress (it is
//!   an ancestor in this very traversal), the graph has a cycle and the
//!   commit fails instead of looping forever.
//! - if every dependency is current, pop the node, run its compute function
//!   over the dependency values in declared order, stamp it, and notify.
//!
//! Finalization requires all prerequisites to already carry the current
//! tick, so every dependant is recomputed from a consistent same-tick view
//! of its inputs, exactly once per commit.

use std::collections::HashSet;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::DepotError;
use crate::property::{Kind, PropertyId};

use super::registry::Depot;

impl<T> Depot<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Apply all staged source updates and propagate through the dependant
    /// graph.
    ///
    /// With `force_notify_unchanged` set, sources without a staged update
    /// are stamped and notified with their current committed value as well.
    ///
    /// Fails with [`DepotError::CyclicDependency`] if the dependant graph is
    /// not acyclic; on a DAG the call always terminates and leaves every
    /// dependant equal to its function over same-tick dependency values.
    pub fn commit(&mut self, force_notify_unchanged: bool) -> Result<(), DepotError> {
        self.tick += 1;
        let tick = self.tick;

        let staged = std::mem::take(&mut self.staged);
        trace!(tick, staged = staged.len(), "commit: applying staged updates");
        for (id, value) in staged {
            let slot = &mut self.slots[id.index()];
            slot.value = Some(value);
            slot.updated = tick;
            slot.notify();
        }

        if force_notify_unchanged {
            for slot in self.slots.iter_mut() {
                if !slot.is_dependant() && slot.updated != tick {
                    slot.updated = tick;
                    slot.notify();
                }
            }
        }

        self.propagate(tick)
    }

    /// Recompute every stale dependant in dependency order.
    fn propagate(&mut self, tick: u64) -> Result<(), DepotError> {
        let mut stack: Vec<PropertyId> = Vec::new();
        let mut in_progress: HashSet<PropertyId> = HashSet::new();

        for index in 0..self.slots.len() {
            let seed = PropertyId::from_index(index);
            if !self.slots[index].is_dependant() || self.slots[index].updated == tick {
                continue;
            }
            stack.push(seed);

            while let Some(&current) = stack.last() {
                if self.slots[current.index()].updated == tick {
                    // Duplicate entry; finalized through another path.
                    stack.pop();
                    continue;
                }
                in_progress.insert(current);

                let mut blocked = false;
                for dep in self.dependency_list(current) {
                    let slot = &self.slots[dep.index()];
                    if slot.is_dependant() && slot.updated != tick {
                        if in_progress.contains(&dep) {
                            debug!(property = %slot.name, "cycle detected during propagation");
                            return Err(DepotError::CyclicDependency(slot.name.clone()));
                        }
                        // Deferred revisit: the current node stays in place
                        // underneath its unresolved prerequisite.
                        stack.push(dep);
                        blocked = true;
                    }
                }
                if blocked {
                    continue;
                }

                self.finalize(current, tick);
                in_progress.remove(&current);
                stack.pop();
            }
        }
        Ok(())
    }

    /// Recompute one dependant from its (already current) dependencies,
    /// stamp it, and notify its subscribers.
    fn finalize(&mut self, id: PropertyId, tick: u64) {
        let (dependencies, compute) = match &self.slots[id.index()].kind {
            Kind::Dependant {
                dependencies,
                compute,
            } => (dependencies.clone(), Rc::clone(compute)),
            Kind::Source => unreachable!("only dependants are finalized"),
        };

        let inputs: SmallVec<[T; 4]> = dependencies
            .iter()
            .map(|dep| {
                self.slots[dep.index()]
                    .value
                    .clone()
                    .expect("current-tick dependency must hold a value")
            })
            .collect();
        let value = compute(&inputs);

        let slot = &mut self.slots[id.index()];
        trace!(name = %slot.name, tick, "finalized dependant");
        slot.value = Some(value);
        slot.updated = tick;
        slot.notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn commit_applies_staged_updates_and_clears_the_staged_set() {
        let mut depot = Depot::new();
        let x = depot.source("x", 10).unwrap();

        depot.set(x, 42).unwrap();
        depot.commit(false).unwrap();

        assert_eq!(*depot.value(x).unwrap(), 42);
        assert_eq!(depot.staged_sources().count(), 0);
        assert_eq!(depot.tick(), 1);
        assert!(depot.updated(x));
    }

    #[test]
    fn commit_recomputes_dependants_in_dependency_order() {
        let mut depot = Depot::new();
        let x = depot.source("x", 10).unwrap();
        let y = depot.dependant("y", &[x], |v: &[i64]| 2 * v[0]).unwrap();
        let z = depot.dependant("z", &[y], |v: &[i64]| 3 * v[0]).unwrap();

        depot.commit(false).unwrap();
        assert_eq!(*depot.value(z).unwrap(), 60);
    }

    #[test]
    fn every_dependant_is_computed_once_per_commit() {
        let computes = Rc::new(RefCell::new(0));

        let mut depot = Depot::new();
        let a = depot.source("a", 10).unwrap();
        let b = {
            let computes = Rc::clone(&computes);
            depot
                .dependant("b", &[a], move |v: &[i64]| {
                    *computes.borrow_mut() += 1;
                    2 * v[0]
                })
                .unwrap()
        };
        // Two paths to `b`: directly and through `c`.
        let c = depot.dependant("c", &[b], |v: &[i64]| 3 * v[0]).unwrap();
        depot
            .dependant("d", &[b, c], |v: &[i64]| v[0] + 4 * v[1])
            .unwrap();

        depot.commit(false).unwrap();
        assert_eq!(*computes.borrow(), 1);
    }

    #[test]
    fn force_notify_stamps_and_notifies_unmutated_sources() {
        let notified = Rc::new(RefCell::new(Vec::new()));

        let mut depot = Depot::new();
        let x = depot.source("x", 7).unwrap();
        {
            let notified = Rc::clone(&notified);
            depot.subscribe(x, move |value: &i64| notified.borrow_mut().push(*value));
        }

        depot.commit(false).unwrap();
        assert!(notified.borrow().is_empty());

        depot.commit(true).unwrap();
        assert_eq!(*notified.borrow(), vec![7]);
        assert!(depot.updated(x));
    }

    #[test]
    fn self_referential_dependant_fails_with_cycle_error() {
        let mut depot: Depot<i64> = Depot::new();
        depot.source("x", 1).unwrap();
        depot
            .dependant_named("p", &["x", "p"], |v| v[0] + v[1])
            .unwrap();

        assert!(matches!(
            depot.commit(false),
            Err(DepotError::CyclicDependency(name)) if name == "p"
        ));
    }

    #[test]
    fn tick_advances_once_per_commit() {
        let mut depot: Depot<i64> = Depot::new();
        depot.source("x", 1).unwrap();

        depot.commit(false).unwrap();
        depot.commit(false).unwrap();
        depot.commit(true).unwrap();
        assert_eq!(depot.tick(), 3);
    }
}
