//! Property slots.
//!
//! A slot is one arena cell owned by the depot. It carries everything a
//! property needs: its name, whether it is a source or a dependant, the
//! committed value, the tick of its last finalization, and its subscribers.
//!
//! The committed value is `Option<T>` because a dependant has no value at
//! all until its first commit finalizes it. Sources are constructed with a
//! value and therefore always hold `Some`.

use std::rc::Rc;

use smallvec::SmallVec;

use super::handle::{PropertyId, SubscriptionId};

/// Subscriber callback. Invoked with the just-committed value, in
/// subscription order, only by the owning depot during a commit.
pub(crate) type Callback<T> = Box<dyn FnMut(&T)>;

/// Compute function of a dependant. Receives the dependency values in the
/// declared dependency order, exactly one per dependency.
pub(crate) type ComputeFn<T> = Rc<dyn Fn(&[T]) -> T>;

/// What kind of property a slot holds.
pub(crate) enum Kind<T> {
    /// A leaf. Mutated only through the depot's stage-and-commit protocol.
    Source,

    /// A derived property. The dependency list is fixed at construction and
    /// ordered; the compute function is assumed pure and deterministic.
    Dependant {
        dependencies: SmallVec<[PropertyId; 4]>,
        compute: ComputeFn<T>,
    },
}

/// One arena cell in the depot.
pub(crate) struct Slot<T> {
    pub(crate) name: String,
    pub(crate) kind: Kind<T>,

    /// Last committed value. `None` for a dependant that has never been
    /// finalized.
    pub(crate) value: Option<T>,

    /// Tick of the last finalization. 0 means never updated.
    pub(crate) updated: u64,

    /// Subscribers in registration order. Delivery order equals insertion
    /// order.
    pub(crate) subscribers: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T> Slot<T> {
    pub(crate) fn source(name: String, initial: T) -> Self {
        Self {
            name,
            kind: Kind::Source,
            value: Some(initial),
            updated: 0,
            subscribers: Vec::new(),
        }
    }

    pub(crate) fn dependant(
        name: String,
        dependencies: SmallVec<[PropertyId; 4]>,
        compute: ComputeFn<T>,
    ) -> Self {
        Self {
            name,
            kind: Kind::Dependant {
                dependencies,
                compute,
            },
            value: None,
            updated: 0,
            subscribers: Vec::new(),
        }
    }

    pub(crate) fn is_dependant(&self) -> bool {
        matches!(self.kind, Kind::Dependant { .. })
    }

    /// Deliver the committed value to every subscriber in order.
    ///
    /// Only called by the depot after the slot has been stamped, so the
    /// value is always present.
    pub(crate) fn notify(&mut self) {
        let value = self
            .value
            .as_ref()
            .expect("notified property must hold a committed value");
        for (_, callback) in self.subscribers.iter_mut() {
            callback(value);
        }
    }
}
