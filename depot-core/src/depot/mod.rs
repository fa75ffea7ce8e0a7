//! The Depot
//!
//! The depot is the central registry and transactional scheduler of the
//! property graph. It owns every property, batches staged source mutations,
//! and drives the per-commit propagation that recomputes dependants in
//! dependency order.
//!
//! # Transaction model
//!
//! Mutations never take effect when they are made. `set` only stages a
//! pending value; `commit` applies all staged values at once, then walks the
//! dependant graph so that every derived value is recomputed from a
//! consistent view of the same tick. Callers never observe a half-applied
//! batch or a dependant computed from mixed-tick inputs.
//!
//! # Design decisions
//!
//! 1. The depot owns the whole graph in an arena rather than handing out
//!    reference-counted property objects. Handles are indices, validated
//!    once at creation; name lookup is a thin convenience layer on top.
//!
//! 2. Propagation revisits the whole dependant set every commit. There is
//!    no dirty-flag tracking seeded from mutated sources; simplicity is the
//!    point, and the tick stamp already makes each visit idempotent.
//!
//! 3. Everything is single-threaded and synchronous. The depot takes
//!    `&mut self` for every mutation, so the borrow checker enforces the
//!    one-owner rule that a lock would otherwise have to.

mod propagate;
mod registry;

pub use registry::Depot;
