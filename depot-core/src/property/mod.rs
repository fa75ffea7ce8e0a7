//! Property Model
//!
//! Properties are the nodes of the dependency graph:
//!
//! - A **source** is a leaf. Its value changes only through the depot's
//!   stage-and-commit protocol; writes are batched and become visible
//!   atomically at the next commit.
//! - A **dependant** is a derived value. It holds a fixed, ordered list of
//!   dependency handles and a pure compute function; the depot recomputes it
//!   during each commit, in dependency order.
//!
//! Callers never hold property objects directly. Creation returns an opaque
//! [`PropertyId`] into the depot's arena, and all access goes through the
//! depot. This keeps ownership in one place and makes the id the proof of
//! registration: names are validated once, when the property is created.

mod handle;
mod slot;

pub use handle::{PropertyId, SubscriptionId};

pub(crate) use slot::{Kind, Slot};
