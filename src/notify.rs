#![forbid(unsafe_code)]

//! Change-notification bridge between a container and its host.
//!
//! A container owns one [`Notifier`]; the host registers callbacks via
//! [`Notifier::subscribe`] and receives one call per committed change. The
//! container side never knows how the host schedules re-evaluation — it only
//! calls [`Notifier::notify`].
//!
//! # Design
//!
//! Subscribers are stored as `Weak` callbacks and cleaned up lazily during
//! notification. [`Subscription`] is an RAII guard: it holds the only strong
//! reference to the callback and unsubscribes on drop, so a dropped guard is
//! never invoked again.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 3. A callback may drop its own `Subscription` (or subscribe a new one)
//!    mid-notification without invalidating the fan-out.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

type Callback = dyn Fn();

struct Subscriber {
    id: u64,
    callback: Weak<Callback>,
}

struct NotifierInner {
    subscribers: RefCell<Vec<Subscriber>>,
    next_id: Cell<u64>,
    notifications: Cell<u64>,
}

/// Fan-out point for change notifications.
///
/// Cloning a `Notifier` creates a new handle to the **same** subscriber list.
pub struct Notifier {
    inner: Rc<NotifierInner>,
}

impl Notifier {
    /// Create a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(NotifierInner {
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
                notifications: Cell::new(0),
            }),
        }
    }

    /// Register a callback invoked once per committed change.
    ///
    /// The returned [`Subscription`] keeps the callback alive; dropping it
    /// unsubscribes.
    #[must_use]
    pub fn subscribe(&self, f: impl Fn() + 'static) -> Subscription {
        let callback: Rc<Callback> = Rc::new(f);
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.subscribers.borrow_mut().push(Subscriber {
            id,
            callback: Rc::downgrade(&callback),
        });
        Subscription {
            id,
            notifier: Rc::downgrade(&self.inner),
            _callback: callback,
        }
    }

    /// Invoke every live subscriber, in registration order.
    ///
    /// Dead entries (dropped guards) are pruned before the fan-out. Strong
    /// references are collected first so no `RefCell` borrow is held while a
    /// callback runs.
    pub(crate) fn notify(&self) {
        self.inner
            .notifications
            .set(self.inner.notifications.get() + 1);
        let live: Vec<Rc<Callback>> = {
            let mut subs = self.inner.subscribers.borrow_mut();
            subs.retain(|s| s.callback.strong_count() > 0);
            subs.iter().filter_map(|s| s.callback.upgrade()).collect()
        };
        trace!(
            target: "reactive_store::notify",
            subscribers = live.len(),
            notification = self.inner.notifications.get(),
            "notifying"
        );
        for callback in live {
            callback();
        }
    }

    /// Total notifications delivered through this notifier.
    #[must_use]
    pub fn notification_count(&self) -> u64 {
        self.inner.notifications.get()
    }

    /// Number of currently registered (live) subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.callback.strong_count() > 0)
            .count()
    }
}

impl Clone for Notifier {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscriber_count())
            .field("notifications", &self.inner.notifications.get())
            .finish()
    }
}

/// RAII guard for a registered callback. Unsubscribes on drop.
pub struct Subscription {
    id: u64,
    notifier: Weak<NotifierInner>,
    _callback: Rc<Callback>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Eager removal when possible; a failed borrow (drop inside a
        // notification) falls back to lazy cleanup in notify().
        if let Some(inner) = self.notifier.upgrade() {
            if let Ok(mut subs) = inner.subscribers.try_borrow_mut() {
                subs.retain(|s| s.id != self.id);
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_receives_notifications() {
        let notifier = Notifier::new();
        let hits = Rc::new(Cell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let _sub = notifier.subscribe(move || hits_clone.set(hits_clone.get() + 1));

        notifier.notify();
        notifier.notify();
        assert_eq!(hits.get(), 2);
        assert_eq!(notifier.notification_count(), 2);
    }

    #[test]
    fn drop_unsubscribes() {
        let notifier = Notifier::new();
        let hits = Rc::new(Cell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let sub = notifier.subscribe(move || hits_clone.set(hits_clone.get() + 1));
        assert_eq!(notifier.subscriber_count(), 1);

        drop(sub);
        assert_eq!(notifier.subscriber_count(), 0);
        notifier.notify();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn registration_order_preserved() {
        let notifier = Notifier::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let log_a = Rc::clone(&log);
        let _a = notifier.subscribe(move || log_a.borrow_mut().push('a'));
        let log_b = Rc::clone(&log);
        let _b = notifier.subscribe(move || log_b.borrow_mut().push('b'));
        let log_c = Rc::clone(&log);
        let _c = notifier.subscribe(move || log_c.borrow_mut().push('c'));

        notifier.notify();
        assert_eq!(*log.borrow(), vec!['a', 'b', 'c']);
    }

    #[test]
    fn callback_may_drop_own_subscription() {
        let notifier = Notifier::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0u32));

        let slot_clone = Rc::clone(&slot);
        let hits_clone = Rc::clone(&hits);
        let sub = notifier.subscribe(move || {
            hits_clone.set(hits_clone.get() + 1);
            // One-shot: drop ourselves on first delivery.
            slot_clone.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        notifier.notify();
        notifier.notify();
        assert_eq!(hits.get(), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn clone_shares_subscriber_list() {
        let notifier = Notifier::new();
        let other = notifier.clone();
        let hits = Rc::new(Cell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let _sub = notifier.subscribe(move || hits_clone.set(hits_clone.get() + 1));

        other.notify();
        assert_eq!(hits.get(), 1);
        assert_eq!(notifier.notification_count(), 1);
    }

    #[test]
    fn debug_format() {
        let notifier = Notifier::new();
        let _sub = notifier.subscribe(|| {});
        let dbg = format!("{:?}", notifier);
        assert!(dbg.contains("Notifier"));
        assert!(dbg.contains("subscribers: 1"));
    }
}
