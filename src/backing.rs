#![forbid(unsafe_code)]

//! Backing-store strategies for container snapshots.
//!
//! Two interchangeable implementations of one contract:
//!
//! - [`CounterStore`]: the snapshot lives in an opaque mutable cell and is
//!   edited in place; a generation counter is bumped on every committed
//!   write. Snapshot reads hand out a fresh shallow copy, so callers never
//!   observe a later in-place edit.
//! - [`ReplaceStore`]: the snapshot is an immutable `Rc<T>` replaced
//!   wholesale. An edit whose closure reports "unchanged" is discarded: the
//!   current `Rc` stays pointer-identical and no notification is owed.
//!
//! The asymmetry is deliberate and part of the contract: `CounterStore` has
//! no previous value to compare against, so its incremental edits always
//! commit and always request notification, while `ReplaceStore` bails out of
//! logical no-ops.
//!
//! # Invariants
//!
//! 1. `snapshot()` returns a value that is never mutated after the call.
//! 2. `generation()` is monotonic and increments exactly once per commit.
//! 3. `ReplaceStore`: an uncommitted edit leaves the current `Rc` untouched.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Storage strategy for a container's current snapshot.
///
/// Implementations are handles: cloning shares the same underlying store
/// (single-threaded `Rc` interior).
pub trait Backing<T: Clone>: Clone {
    /// Create a store holding `initial`.
    fn new(initial: T) -> Self;

    /// Read the current value by reference.
    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R;

    /// A snapshot safe to hand out: never mutated after this call returns.
    fn snapshot(&self) -> Rc<T>;

    /// Apply an incremental edit. The closure reports whether it changed the
    /// value; the return value says whether observers must be notified.
    fn edit(&self, f: impl FnOnce(&mut T) -> bool) -> bool;

    /// Replace the value wholesale. Always a commit.
    fn replace(&self, next: T);

    /// Committed-write counter (monotonic).
    fn generation(&self) -> u64;
}

// ─── Counter strategy ────────────────────────────────────────────────────────

struct CounterInner<T> {
    value: RefCell<T>,
    generation: Cell<u64>,
}

/// In-place mutable store with a forced-notification generation counter.
///
/// Edits mutate the held value directly and always commit; the closure's
/// changed-flag is ignored because there is no pending previous value to
/// compare against. `snapshot()` clones at read time.
pub struct CounterStore<T> {
    inner: Rc<CounterInner<T>>,
}

impl<T: Clone> Backing<T> for CounterStore<T> {
    fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(CounterInner {
                value: RefCell::new(initial),
                generation: Cell::new(0),
            }),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    fn snapshot(&self) -> Rc<T> {
        // Fresh shallow copy per read: the cell keeps mutating in place.
        Rc::new(self.inner.value.borrow().clone())
    }

    fn edit(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let _ = f(&mut self.inner.value.borrow_mut());
        self.inner.generation.set(self.inner.generation.get() + 1);
        true
    }

    fn replace(&self, next: T) {
        *self.inner.value.borrow_mut() = next;
        self.inner.generation.set(self.inner.generation.get() + 1);
    }

    fn generation(&self) -> u64 {
        self.inner.generation.get()
    }
}

impl<T> Clone for CounterStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CounterStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterStore")
            .field("value", &self.inner.value.borrow())
            .field("generation", &self.inner.generation.get())
            .finish()
    }
}

// ─── Replacement strategy ────────────────────────────────────────────────────

struct ReplaceInner<T> {
    current: RefCell<Rc<T>>,
    generation: Cell<u64>,
}

/// Immutable-snapshot store with functional replacement and edit bail-out.
///
/// The held `Rc<T>` is never mutated, only swapped. `snapshot()` is an
/// `Rc::clone`, so bail-out correctness is observable as pointer identity.
pub struct ReplaceStore<T> {
    inner: Rc<ReplaceInner<T>>,
}

impl<T: Clone> Backing<T> for ReplaceStore<T> {
    fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(ReplaceInner {
                current: RefCell::new(Rc::new(initial)),
                generation: Cell::new(0),
            }),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let current = Rc::clone(&self.inner.current.borrow());
        f(&current)
    }

    fn snapshot(&self) -> Rc<T> {
        Rc::clone(&self.inner.current.borrow())
    }

    fn edit(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let mut next = self.with(T::clone);
        if !f(&mut next) {
            return false;
        }
        *self.inner.current.borrow_mut() = Rc::new(next);
        self.inner.generation.set(self.inner.generation.get() + 1);
        true
    }

    fn replace(&self, next: T) {
        *self.inner.current.borrow_mut() = Rc::new(next);
        self.inner.generation.set(self.inner.generation.get() + 1);
    }

    fn generation(&self) -> u64 {
        self.inner.generation.get()
    }
}

impl<T> Clone for ReplaceStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReplaceStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplaceStore")
            .field("current", &self.inner.current.borrow())
            .field("generation", &self.inner.generation.get())
            .finish()
    }
}
