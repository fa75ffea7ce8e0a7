//! Depot registry.
//!
//! The depot owns every property outright: properties live in an arena and
//! are addressed by the [`PropertyId`] handed out at registration. A name →
//! id map sits next to the arena as a convenience layer; names are checked
//! exactly once, when the property is created, and never re-validated on id
//! access.
//!
//! Registration is the only lifecycle event. There is no removal, so ids
//! stay valid for as long as the depot lives.

use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::trace;

use crate::error::DepotError;
use crate::property::{Kind, PropertyId, Slot, SubscriptionId};

/// Registry and transactional scheduler for one property graph.
///
/// All properties in a depot share one value type `T`. The depot holds the
/// arena of property slots, the staged (pending) source updates, and the
/// global tick counter. It performs no locking: a depot is single-threaded
/// by design and must be confined to one owner.
///
/// # Example
///
/// ```
/// use depot_core::Depot;
///
/// let mut depot = Depot::new();
/// let x = depot.source("x", 10).unwrap();
/// let y = depot.dependant("y", &[x], |v: &[i64]| 2 * v[0]).unwrap();
///
/// depot.commit(false).unwrap();
/// assert_eq!(*depot.value(y).unwrap(), 20);
///
/// depot.set(x, 6).unwrap();
/// depot.commit(false).unwrap();
/// assert_eq!(*depot.value(y).unwrap(), 12);
/// ```
pub struct Depot<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Arena of property slots, indexed by [`PropertyId`]. Arena order is
    /// registration order.
    pub(super) slots: Vec<Slot<T>>,

    /// Name → id lookup. Sources and dependants share this namespace.
    pub(super) names: IndexMap<String, PropertyId>,

    /// Pending source values, keyed by source id. Re-staging before a
    /// commit overwrites in place (last write wins).
    pub(super) staged: IndexMap<PropertyId, T>,

    /// Commit counter. Incremented exactly once per commit, never reset.
    /// A slot whose `updated` equals this value was finalized this tick.
    pub(super) tick: u64,

    next_subscription: u64,
}

impl<T> Depot<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create an empty depot with the tick counter at zero.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            names: IndexMap::new(),
            staged: IndexMap::new(),
            tick: 0,
            next_subscription: 0,
        }
    }

    /// Register a source property with an initial value.
    ///
    /// The initial value is readable immediately via [`Depot::value`], but
    /// the source is not stamped (and subscribers are not notified) until a
    /// commit, or a force-notify pass, reaches it.
    pub fn source(
        &mut self,
        name: impl Into<String>,
        initial: T,
    ) -> Result<PropertyId, DepotError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(DepotError::DuplicateName(name));
        }
        let id = PropertyId::from_index(self.slots.len());
        trace!(name = %name, id = id.raw(), "registered source");
        self.names.insert(name.clone(), id);
        self.slots.push(Slot::source(name, initial));
        Ok(id)
    }

    /// Register a dependant with an explicit, ordered dependency list.
    ///
    /// The compute function receives the dependency values in exactly the
    /// order given here, one per dependency, and must be pure and
    /// deterministic. The dependency list is fixed for the life of the
    /// property.
    ///
    /// The dependant holds no value until the first commit finalizes it;
    /// reading it before then fails with [`DepotError::UnsetValue`].
    pub fn dependant<F>(
        &mut self,
        name: impl Into<String>,
        dependencies: &[PropertyId],
        compute: F,
    ) -> Result<PropertyId, DepotError>
    where
        F: Fn(&[T]) -> T + 'static,
    {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(DepotError::DuplicateName(name));
        }
        let id = PropertyId::from_index(self.slots.len());
        trace!(
            name = %name,
            id = id.raw(),
            dependencies = dependencies.len(),
            "registered dependant"
        );
        self.names.insert(name.clone(), id);
        self.slots.push(Slot::dependant(
            name,
            SmallVec::from_slice(dependencies),
            Rc::new(compute),
        ));
        Ok(id)
    }

    /// Register a dependant whose dependencies are given by name.
    ///
    /// Convenience layer over [`Depot::dependant`]: each name is resolved
    /// through the registry, failing with [`DepotError::UnknownProperty`] on
    /// the first miss, in which case nothing is registered. The dependant's
    /// own name is in scope during resolution; a self-referential dependency
    /// is accepted here and rejected at commit time as a cycle.
    pub fn dependant_named<F>(
        &mut self,
        name: impl Into<String>,
        dependency_names: &[&str],
        compute: F,
    ) -> Result<PropertyId, DepotError>
    where
        F: Fn(&[T]) -> T + 'static,
    {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(DepotError::DuplicateName(name));
        }
        let id = PropertyId::from_index(self.slots.len());
        let mut dependencies = SmallVec::new();
        for dep in dependency_names {
            if *dep == name {
                dependencies.push(id);
            } else {
                dependencies.push(self.resolve_one(dep)?);
            }
        }
        trace!(
            name = %name,
            id = id.raw(),
            dependencies = dependencies.len(),
            "registered dependant (by name)"
        );
        self.names.insert(name.clone(), id);
        self.slots
            .push(Slot::dependant(name, dependencies, Rc::new(compute)));
        Ok(id)
    }

    /// Resolve an ordered list of names to property ids.
    ///
    /// Fails with [`DepotError::UnknownProperty`] on the first unresolved
    /// name.
    pub fn resolve(&self, names: &[&str]) -> Result<Vec<PropertyId>, DepotError> {
        names.iter().map(|name| self.resolve_one(name)).collect()
    }

    fn resolve_one(&self, name: &str) -> Result<PropertyId, DepotError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| DepotError::UnknownProperty(name.to_string()))
    }

    /// Look up a property id by name.
    pub fn lookup(&self, name: &str) -> Option<PropertyId> {
        self.names.get(name).copied()
    }

    /// Get a property's name.
    pub fn name(&self, id: PropertyId) -> &str {
        &self.slots[id.index()].name
    }

    /// Read the last committed value.
    ///
    /// Fails with [`DepotError::UnsetValue`] for a dependant that has never
    /// completed a commit. Staged source values are never visible here.
    pub fn value(&self, id: PropertyId) -> Result<&T, DepotError> {
        let slot = &self.slots[id.index()];
        slot.value
            .as_ref()
            .ok_or_else(|| DepotError::UnsetValue(slot.name.clone()))
    }

    /// Whether the property has been finalized by any commit (or
    /// force-notify pass) since construction.
    pub fn updated(&self, id: PropertyId) -> bool {
        self.slots[id.index()].updated != 0
    }

    /// Stage a new value for a source property.
    ///
    /// The value stays invisible until the next commit. Staging the value
    /// already committed is a no-op: nothing is recorded and the source will
    /// not be notified on the next commit. Repeated staging before a commit
    /// keeps only the most recent value.
    pub fn set(&mut self, id: PropertyId, value: T) -> Result<(), DepotError> {
        let slot = &self.slots[id.index()];
        if slot.is_dependant() {
            return Err(DepotError::NotASource(slot.name.clone()));
        }
        if slot.value.as_ref() == Some(&value) {
            return Ok(());
        }
        trace!(name = %slot.name, "staged source update");
        self.staged.insert(id, value);
        Ok(())
    }

    /// Append a subscriber to a property.
    ///
    /// The callback runs during commits, after the property's value for the
    /// current tick is in place. Callbacks on one property fire in
    /// subscription order. Returns a token for [`Depot::unsubscribe`].
    pub fn subscribe<F>(&mut self, id: PropertyId, callback: F) -> SubscriptionId
    where
        F: FnMut(&T) + 'static,
    {
        let token = SubscriptionId::new(self.next_subscription);
        self.next_subscription += 1;
        self.slots[id.index()]
            .subscribers
            .push((token, Box::new(callback)));
        token
    }

    /// Remove a subscription. Returns whether the token was found.
    pub fn unsubscribe(&mut self, id: PropertyId, token: SubscriptionId) -> bool {
        let subscribers = &mut self.slots[id.index()].subscribers;
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != token);
        subscribers.len() != before
    }

    /// The current commit tick. 0 before the first commit.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Sources with a staged update awaiting the next commit.
    pub fn staged_sources(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.staged.keys().copied()
    }

    /// Total number of registered properties.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the depot has no properties.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(super) fn dependency_list(&self, id: PropertyId) -> SmallVec<[PropertyId; 4]> {
        match &self.slots[id.index()].kind {
            Kind::Dependant { dependencies, .. } => dependencies.clone(),
            Kind::Source => SmallVec::new(),
        }
    }
}

impl<T> Default for Depot<T>
where
    T: Clone + PartialEq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_value_is_readable_before_first_commit() {
        let mut depot = Depot::new();
        let x = depot.source("x", 10).unwrap();

        assert_eq!(*depot.value(x).unwrap(), 10);
        assert!(!depot.updated(x));
        assert_eq!(depot.tick(), 0);
    }

    #[test]
    fn names_are_unique_across_sources_and_dependants() {
        let mut depot = Depot::new();
        let x = depot.source("x", 1).unwrap();

        assert!(matches!(
            depot.source("x", 2),
            Err(DepotError::DuplicateName(name)) if name == "x"
        ));
        assert!(matches!(
            depot.dependant("x", &[x], |v: &[i64]| v[0]),
            Err(DepotError::DuplicateName(name)) if name == "x"
        ));
        assert_eq!(depot.len(), 1);
    }

    #[test]
    fn resolve_is_ordered_and_fails_on_first_miss() {
        let mut depot = Depot::new();
        let a = depot.source("a", 1).unwrap();
        let b = depot.source("b", 2).unwrap();

        assert_eq!(depot.resolve(&["b", "a"]).unwrap(), vec![b, a]);
        assert!(matches!(
            depot.resolve(&["a", "missing", "b"]),
            Err(DepotError::UnknownProperty(name)) if name == "missing"
        ));
    }

    #[test]
    fn dependant_named_leaves_registry_unchanged_on_unknown_name() {
        let mut depot: Depot<i64> = Depot::new();
        depot.source("a", 1).unwrap();

        let result = depot.dependant_named("d", &["a", "missing"], |v| v[0]);
        assert!(matches!(result, Err(DepotError::UnknownProperty(_))));
        assert_eq!(depot.len(), 1);
        assert!(depot.lookup("d").is_none());
    }

    #[test]
    fn staging_the_committed_value_records_nothing() {
        let mut depot = Depot::new();
        let x = depot.source("x", 10).unwrap();

        depot.set(x, 10).unwrap();
        assert_eq!(depot.staged_sources().count(), 0);
    }

    #[test]
    fn staging_is_last_write_wins_and_invisible_until_commit() {
        let mut depot = Depot::new();
        let x = depot.source("x", 10).unwrap();

        depot.set(x, 20).unwrap();
        depot.set(x, 30).unwrap();

        assert_eq!(depot.staged_sources().count(), 1);
        assert_eq!(*depot.value(x).unwrap(), 10);
    }

    #[test]
    fn staging_against_a_dependant_fails() {
        let mut depot = Depot::new();
        let x = depot.source("x", 1).unwrap();
        let y = depot.dependant("y", &[x], |v: &[i64]| v[0]).unwrap();

        assert!(matches!(
            depot.set(y, 5),
            Err(DepotError::NotASource(name)) if name == "y"
        ));
    }

    #[test]
    fn unset_dependant_read_fails() {
        let mut depot = Depot::new();
        let x = depot.source("x", 1).unwrap();
        let y = depot.dependant("y", &[x], |v: &[i64]| v[0]).unwrap();

        assert!(matches!(
            depot.value(y),
            Err(DepotError::UnsetValue(name)) if name == "y"
        ));
    }

    #[test]
    fn unsubscribe_reports_whether_the_token_existed() {
        let mut depot = Depot::new();
        let x = depot.source("x", 1).unwrap();

        let token = depot.subscribe(x, |_: &i64| {});
        assert!(depot.unsubscribe(x, token));
        assert!(!depot.unsubscribe(x, token));
    }

    #[test]
    fn lookup_finds_registered_names() {
        let mut depot = Depot::new();
        let x = depot.source("x", 1).unwrap();

        assert_eq!(depot.lookup("x"), Some(x));
        assert_eq!(depot.lookup("y"), None);
        assert_eq!(depot.name(x), "x");
    }
}
