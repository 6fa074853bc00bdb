#![forbid(unsafe_code)]

//! Unique-element reactive container over `HashSet<K>` snapshots.
//!
//! Symmetric with [`MapStore`](crate::MapStore), with one contract
//! difference: membership is decidable with a cheap pre-check, so `add`,
//! `remove`, and `clear` bail out of logical no-ops under **both** backing
//! strategies. `toggle` always changes state, so it always notifies.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use tracing::trace;

use crate::backing::{Backing, CounterStore, ReplaceStore};
use crate::notify::{Notifier, Subscription};

/// Unique collection using the in-place counter strategy.
pub type CounterSetStore<K> = SetStore<K, CounterStore<HashSet<K>>>;

/// A set of unique elements with snapshot reads and change notification.
///
/// Cloning a `SetStore` creates a new handle to the **same** inner state.
pub struct SetStore<K, B = ReplaceStore<HashSet<K>>> {
    backing: B,
    initial: Rc<HashSet<K>>,
    notifier: Notifier,
}

impl<K, B> SetStore<K, B>
where
    K: Eq + Hash + Clone,
    B: Backing<HashSet<K>>,
{
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial(HashSet::new())
    }

    /// Create a collection seeded with `initial`, which is also the snapshot
    /// that [`reset`](Self::reset) restores.
    #[must_use]
    pub fn with_initial(initial: HashSet<K>) -> Self {
        Self {
            backing: B::new(initial.clone()),
            initial: Rc::new(initial),
            notifier: Notifier::new(),
        }
    }

    /// The current snapshot. Never mutated after being handed out.
    #[must_use]
    pub fn snapshot(&self) -> Rc<HashSet<K>> {
        self.backing.snapshot()
    }

    /// Whether `key` is a member of the current backing value.
    #[must_use]
    pub fn has(&self, key: &K) -> bool {
        self.backing.with(|s| s.contains(key))
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backing.with(HashSet::len)
    }

    /// Whether the collection holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backing.with(HashSet::is_empty)
    }

    /// Insert one element. No-op, no notification, if already present.
    pub fn add(&self, key: K) {
        if self.has(&key) {
            return;
        }
        let changed = self.backing.edit(move |s| s.insert(key));
        if changed {
            self.notifier.notify();
        }
    }

    /// Remove one element. No-op, no notification, if absent.
    pub fn remove(&self, key: &K) {
        if !self.has(key) {
            return;
        }
        let changed = self.backing.edit(|s| s.remove(key));
        if changed {
            self.notifier.notify();
        }
    }

    /// Flip membership of `key`. Always changes state, always notifies.
    pub fn toggle(&self, key: K) {
        self.backing.edit(move |s| {
            if !s.insert(key.clone()) {
                s.remove(&key);
            }
            true
        });
        self.notifier.notify();
    }

    /// Drop every element. No-op, no notification, if already empty.
    pub fn clear(&self) {
        if self.is_empty() {
            return;
        }
        let changed = self.backing.edit(|s| {
            s.clear();
            true
        });
        if changed {
            self.notifier.notify();
        }
    }

    /// Restore the snapshot captured at construction. Always notifies.
    pub fn reset(&self) {
        trace!(target: "reactive_store::set", elements = self.initial.len(), "reset");
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

impl<K, B> Default for SetStore<K, B>
where
    K: Eq + Hash + Clone,
    B: Backing<HashSet<K>>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, B: Clone> Clone for SetStore<K, B> {
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
            initial: Rc::clone(&self.initial),
            notifier: self.notifier.clone(),
        }
    }
}

impl<K, B> FromIterator<K> for SetStore<K, B>
where
    K: Eq + Hash + Clone,
    B: Backing<HashSet<K>>,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self::with_initial(iter.into_iter().collect())
    }
}

impl<K, B> fmt::Debug for SetStore<K, B>
where
    K: Eq + Hash + Clone + fmt::Debug,
    B: Backing<HashSet<K>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.backing.with(|s| {
            f.debug_struct("SetStore")
                .field("current", s)
                .field("generation", &self.backing.generation())
                .finish()
        })
    }
}
