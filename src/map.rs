#![forbid(unsafe_code)]

//! Keyed reactive container over `HashMap<K, V>` snapshots.
//!
//! # Design
//!
//! [`MapStore`] is a handle: cloning shares the same backing store, initial
//! snapshot, and notifier. Mutations commit the next snapshot through the
//! backing strategy and fan out one notification per committed change.
//!
//! The bail-out contract follows the backing strategy: under
//! [`ReplaceStore`] (the default), `set` of an equal value and `remove` of
//! an absent key are no-ops with no notification; under [`CounterStore`],
//! both always commit and always notify.
//!
//! # Invariants
//!
//! 1. `get`/`require`/`contains_key` observe the current backing value at
//!    call time, notified or not.
//! 2. `reset()` restores the snapshot captured at construction.
//! 3. `set_all` and `reset` always notify, even when idempotent.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use tracing::trace;

use crate::backing::{Backing, CounterStore, ReplaceStore};
use crate::error::StoreError;
use crate::notify::{Notifier, Subscription};

/// Keyed container using the in-place counter strategy.
pub type CounterMapStore<K, V> = MapStore<K, V, CounterStore<HashMap<K, V>>>;

/// A keyed mapping with snapshot reads and change notification.
///
/// Cloning a `MapStore` creates a new handle to the **same** inner state, so
/// the mutation surface keeps one stable identity for the container's whole
/// lifetime regardless of how often the snapshot changes.
pub struct MapStore<K, V, B = ReplaceStore<HashMap<K, V>>> {
    backing: B,
    initial: Rc<HashMap<K, V>>,
    notifier: Notifier,
}

impl<K, V, B> MapStore<K, V, B>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
    B: Backing<HashMap<K, V>>,
{
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial(HashMap::new())
    }

    /// Create a container seeded with `initial`, which is also the snapshot
    /// that [`reset`](Self::reset) restores.
    #[must_use]
    pub fn with_initial(initial: HashMap<K, V>) -> Self {
        Self {
            backing: B::new(initial.clone()),
            initial: Rc::new(initial),
            notifier: Notifier::new(),
        }
    }

    /// The current snapshot. Never mutated after being handed out.
    #[must_use]
    pub fn snapshot(&self) -> Rc<HashMap<K, V>> {
        self.backing.snapshot()
    }

    /// Look up `key` in the current backing value. `None` when absent.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.backing.with(|m| m.get(key).cloned())
    }

    /// Like [`get`](Self::get), but absent keys are an error.
    pub fn require(&self, key: &K) -> Result<V, StoreError> {
        self.get(key).ok_or(StoreError::KeyNotFound)
    }

    /// Whether `key` is present in the current backing value.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.backing.with(|m| m.contains_key(key))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backing.with(HashMap::len)
    }

    /// Whether the container holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backing.with(HashMap::is_empty)
    }

    /// Insert or update one entry.
    ///
    /// The edit closure reports "unchanged" when the existing value equals
    /// `value`; whether that skips the commit and notification is the
    /// backing strategy's call.
    pub fn set(&self, key: K, value: V) {
        let changed = self.backing.edit(move |m| {
            if m.get(&key) == Some(&value) {
                return false;
            }
            m.insert(key, value);
            true
        });
        if changed {
            self.notifier.notify();
        }
    }

    /// Replace the entire snapshot. Always notifies.
    pub fn set_all(&self, next: HashMap<K, V>) {
        trace!(target: "reactive_store::map", entries = next.len(), "set_all");
        self.backing.replace(next);
        self.notifier.notify();
    }

    /// Remove one entry, leaving all others untouched.
    ///
    /// Removing an absent key reports "unchanged"; the counter strategy
    /// still commits and notifies.
    pub fn remove(&self, key: &K) {
        let changed = self.backing.edit(|m| m.remove(key).is_some());
        if changed {
            self.notifier.notify();
        }
    }

    /// Restore the snapshot captured at construction. Always notifies.
    pub fn reset(&self) {
        trace!(target: "reactive_store::map", entries = self.initial.len(), "reset");
        self.backing.replace((*self.initial).clone());
        self.notifier.notify();
    }

    /// Register a change callback. See [`Notifier::subscribe`].
    #[must_use]
    pub fn subscribe(&self, f: impl Fn() + 'static) -> Subscription {
        self.notifier.subscribe(f)
    }

    /// Committed-write counter of the backing store.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.backing.generation()
    }

    /// Total notifications delivered so far.
    #[must_use]
    pub fn notification_count(&self) -> u64 {
        self.notifier.notification_count()
    }

    /// Whether two handles share the same container state.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.initial, &other.initial)
    }
}

impl<K, V, B> Default for MapStore<K, V, B>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
    B: Backing<HashMap<K, V>>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, B: Clone> Clone for MapStore<K, V, B> {
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
            initial: Rc::clone(&self.initial),
            notifier: self.notifier.clone(),
        }
    }
}

impl<K, V, B> FromIterator<(K, V)> for MapStore<K, V, B>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
    B: Backing<HashMap<K, V>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::with_initial(iter.into_iter().collect())
    }
}

impl<K, V, B> fmt::Debug for MapStore<K, V, B>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone + PartialEq + fmt::Debug,
    B: Backing<HashMap<K, V>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.backing.with(|m| {
            f.debug_struct("MapStore")
                .field("current", m)
                .field("generation", &self.backing.generation())
                .finish()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn notify_probe<K, V, B>(store: &MapStore<K, V, B>) -> (Rc<Cell<u64>>, Subscription)
    where
        K: Eq + Hash + Clone + 'static,
        V: Clone + PartialEq + 'static,
        B: Backing<HashMap<K, V>>,
    {
        let hits = Rc::new(Cell::new(0u64));
        let hits_clone = Rc::clone(&hits);
        let sub = store.subscribe(move || hits_clone.set(hits_clone.get() + 1));
        (hits, sub)
    }

    #[test]
    fn set_and_get() {
        let store: MapStore<&str, i32> = MapStore::new();
        store.set("a", 1);
        assert_eq!(store.get(&"a"), Some(1));
        assert_eq!(store.get(&"b"), None);
        assert_eq!(store.require(&"b"), Err(StoreError::KeyNotFound));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn set_equal_value_bails_out() {
        let store: MapStore<&str, i32> = MapStore::new();
        store.set("a", 1);
        let before = store.snapshot();
        let (hits, _sub) = notify_probe(&store);

        store.set("a", 1);
        assert_eq!(hits.get(), 0);
        assert!(Rc::ptr_eq(&before, &store.snapshot()));

        store.set("a", 2);
        assert_eq!(hits.get(), 1);
        assert_eq!(store.get(&"a"), Some(2));
    }

    #[test]
    fn counter_strategy_always_notifies() {
        let store: CounterMapStore<&str, i32> = MapStore::new();
        store.set("a", 1);
        let (hits, _sub) = notify_probe(&store);

        store.set("a", 1);
        assert_eq!(hits.get(), 1);
        store.remove(&"missing");
        assert_eq!(hits.get(), 2);
        // Observable value unchanged despite the notifications.
        assert_eq!(store.get(&"a"), Some(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_absent_is_silent_noop() {
        let store: MapStore<&str, i32> = MapStore::new();
        store.set("a", 1);
        let (hits, _sub) = notify_probe(&store);

        store.remove(&"b");
        assert_eq!(hits.get(), 0);
        store.remove(&"a");
        assert_eq!(hits.get(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn reset_restores_construction_snapshot() {
        let store: MapStore<&str, i32> =
            MapStore::with_initial(HashMap::from([("seed", 7)]));
        store.set("a", 1);
        store.set_all(HashMap::from([("x", 9)]));
        store.reset();
        assert_eq!(*store.snapshot(), HashMap::from([("seed", 7)]));

        // Mutate again, then reset: still the original initial, not the
        // state as of the previous reset.
        store.set("seed", 100);
        store.reset();
        assert_eq!(store.get(&"seed"), Some(7));
    }

    #[test]
    fn reset_and_set_all_always_notify() {
        let store: MapStore<&str, i32> = MapStore::new();
        let (hits, _sub) = notify_probe(&store);

        store.reset();
        assert_eq!(hits.get(), 1);
        store.set_all(HashMap::new());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn get_reads_latest_before_host_reacts() {
        // A subscriber observing mid-notification must already see the
        // committed value through get().
        let store: MapStore<&str, i32> = MapStore::new();
        let seen = Rc::new(Cell::new(None));
        let seen_clone = Rc::clone(&seen);
        let reader = store.clone();
        let _sub = store.subscribe(move || seen_clone.set(reader.get(&"a")));

        store.set("a", 42);
        assert_eq!(seen.get(), Some(42));
    }

    #[test]
    fn handle_identity_stable_across_mutations() {
        let store: MapStore<&str, i32> = MapStore::new();
        let handle = store.clone();
        for i in 0..20 {
            store.set("k", i);
        }
        store.set_all(HashMap::from([("x", 9)]));
        store.reset();
        assert!(store.ptr_eq(&handle));
        // The clone observes every mutation made through the original.
        assert_eq!(handle.len(), 0);
        assert_eq!(handle.generation(), store.generation());
    }

    #[test]
    fn snapshot_immutable_after_handout() {
        let store: CounterMapStore<&str, i32> = MapStore::new();
        store.set("a", 1);
        let held = store.snapshot();
        store.set("a", 2);
        store.set("b", 3);
        assert_eq!(*held, HashMap::from([("a", 1)]));
    }

    #[test]
    fn from_iterator_seeds_initial() {
        let store: MapStore<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();
        store.set("c", 3);
        store.reset();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&"b"), Some(2));
    }
}
