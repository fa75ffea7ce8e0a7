//! Depot Core
//!
//! A small in-process reactive dependency-graph engine. Callers mutate leaf
//! ("source") properties through a stage-and-commit protocol; derived
//! ("dependant") properties recompute automatically in dependency order;
//! subscribers are notified of the resulting values.
//!
//! # Architecture
//!
//! - [`property`]: the node model: opaque handles and the arena slots that
//!   hold each property's value, tick stamp, and subscribers
//! - [`depot`]: the registry and the transactional commit/propagation
//!   algorithm
//! - [`error`]: the [`DepotError`] taxonomy
//!
//! # Example
//!
//! ```
//! use depot_core::Depot;
//!
//! let mut depot = Depot::new();
//!
//! // A leaf value and two derived values.
//! let x = depot.source("x", 10).unwrap();
//! let y = depot.dependant("y", &[x], |v: &[i64]| 2 * v[0]).unwrap();
//! let z = depot.dependant("z", &[y], |v: &[i64]| 3 * v[0]).unwrap();
//!
//! // Nothing recomputes until a commit.
//! depot.commit(false).unwrap();
//! assert_eq!(*depot.value(z).unwrap(), 60);
//!
//! // Mutations are staged, then applied atomically.
//! depot.set(x, 6).unwrap();
//! assert_eq!(*depot.value(x).unwrap(), 10);
//! depot.commit(false).unwrap();
//! assert_eq!(*depot.value(z).unwrap(), 36);
//! ```

pub mod depot;
pub mod error;
pub mod property;

pub use depot::Depot;
pub use error::DepotError;
pub use property::{PropertyId, SubscriptionId};
