#![forbid(unsafe_code)]

//! Reactive keyed and set containers for a re-evaluating host.
//!
//! This crate provides two small change-tracking containers:
//!
//! - [`MapStore`]: a keyed mapping (`HashMap<K, V>` snapshots).
//! - [`SetStore`]: a unique-element collection (`HashSet<K>` snapshots).
//!
//! Each container owns a current snapshot, a captured initial snapshot (used
//! by `reset`), and a [`Notifier`] through which the host subscribes to
//! change notifications. A mutation computes the next snapshot, commits it to
//! the backing store, and fans out one notification per committed change; the
//! host then re-reads via [`MapStore::snapshot`] / [`SetStore::snapshot`].
//!
//! # Architecture
//!
//! Containers are handles: `Rc<RefCell<..>>` inside, so cloning a container
//! yields a new handle to the **same** state. All mutation methods live on
//! the shared handle, which is what keeps action identity stable across any
//! number of snapshot changes (observable via `ptr_eq`).
//!
//! Two backing strategies implement the same [`Backing`] contract:
//!
//! - [`CounterStore`]: mutates the snapshot in place behind an opaque cell
//!   and bumps a generation counter on every committed write. Snapshot reads
//!   hand out a fresh shallow copy.
//! - [`ReplaceStore`]: swaps an immutable `Rc` snapshot wholesale. An edit
//!   that does not change the value bails out: the current `Rc` stays
//!   pointer-identical and no notification fires.
//!
//! # Invariants
//!
//! 1. A snapshot handed to any caller is never mutated afterwards.
//! 2. No notification is skipped when a real value change occurred.
//! 3. Bail-out, where present, compares against the true current value.
//! 4. `reset()` restores the snapshot captured at construction, not the
//!    state as of any later point.
//! 5. Subscribers are notified in registration order.
//!
//! Single-threaded by design: one logical writer, no suspension point inside
//! any action. Multi-threaded use requires external synchronization.

pub mod backing;
pub mod error;
pub mod map;
pub mod notify;
pub mod set;

pub use backing::{Backing, CounterStore, ReplaceStore};
pub use error::StoreError;
pub use map::{CounterMapStore, MapStore};
pub use notify::{Notifier, Subscription};
pub use set::{CounterSetStore, SetStore};
