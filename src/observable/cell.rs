//! Reactive cell - the primitive the whole pipeline is built on.
//!
//! An [`Observable`] is a mutable cell holding a current value plus a list of
//! subscribers. Propagation is single-threaded and fully synchronous: an
//! [`Observable::update`] call does not return until every subscriber has
//! processed the new value, so subscribers always observe a strictly ordered
//! sequence of values and no two notifications for the same update interleave.
//!
//! # Phases
//!
//! Subscribers are tagged with a [`Phase`]:
//!
//! - [`Phase::BeforeChange`] callbacks run with the *outgoing* value, before
//!   it is replaced in the cell.
//! - [`Phase::Change`] callbacks run with the new value, after assignment.
//!
//! All `BeforeChange` subscribers complete before any `Change` subscriber
//! observes the same update. The pipeline relies on this to destroy an old
//! renderer before its replacement becomes visible downstream.
//!
//! # Ownership
//!
//! Derived cells (see [`combinators`](super::combinators)) hold their sources
//! strongly through [`Subscription`] guards, while a source only holds weak
//! references back to its dependents. Owning the tail of a dataflow graph
//! therefore keeps the whole chain alive, and dropping it releases every
//! intermediate cell without reference cycles.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Notification phase for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Runs with the outgoing value, before the cell is reassigned.
    BeforeChange,
    /// Runs with the new value, after the cell is reassigned. The default.
    Change,
}

struct Entry<T> {
    id: u64,
    phase: Phase,
    callback: Rc<dyn Fn(&T)>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Entry {
            id: self.id,
            phase: self.phase,
            callback: Rc::clone(&self.callback),
        }
    }
}

struct Inner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<Entry<T>>>,
    next_id: Cell<u64>,
    // Upstream subscription guards for derived cells. A derived cell keeps
    // its sources alive exactly as long as it lives itself.
    guards: RefCell<Vec<Subscription>>,
}

/// A reactive value cell.
///
/// Cheap to clone - clones share the same underlying cell.
///
/// # Example
///
/// ```
/// use gridflow::observable::observable;
///
/// let count = observable(0);
/// let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
/// let seen2 = seen.clone();
/// let _sub = count.subscribe(move |v| seen2.borrow_mut().push(*v));
///
/// count.update(1);
/// count.update(2);
/// assert_eq!(count.read(), 2);
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// ```
pub struct Observable<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Create a new observable cell. Mirrors the lowercase constructor style of
/// signal libraries; equivalent to [`Observable::new`].
pub fn observable<T: Clone + 'static>(initial: T) -> Observable<T> {
    Observable::new(initial)
}

impl<T: Clone + 'static> Observable<T> {
    /// Create a cell seeded with `initial`.
    pub fn new(initial: T) -> Self {
        Observable {
            inner: Rc::new(Inner {
                value: RefCell::new(initial),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                guards: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Read the current value synchronously (clones it out).
    pub fn read(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Replace the value and synchronously notify all subscribers.
    ///
    /// Notification order: every `BeforeChange` subscriber runs with the
    /// outgoing value, then the cell is reassigned, then every `Change`
    /// subscriber runs with the new value. Within a phase, subscribers run
    /// in subscription order.
    ///
    /// Note that subscribers are notified on every update, even when the new
    /// value equals the old one; use
    /// [`with_deep_equals`](super::combinators::with_deep_equals) to suppress
    /// redundant re-emissions.
    pub fn update(&self, value: T) {
        let outgoing = self.read();
        for entry in self.snapshot(Phase::BeforeChange) {
            (entry.callback)(&outgoing);
        }
        *self.inner.value.borrow_mut() = value;
        let current = self.read();
        for entry in self.snapshot(Phase::Change) {
            (entry.callback)(&current);
        }
    }

    /// Subscribe at the default [`Phase::Change`] phase.
    ///
    /// The returned [`Subscription`] detaches the callback when dropped.
    #[must_use = "dropping the subscription detaches the callback"]
    pub fn subscribe(&self, on_next: impl Fn(&T) + 'static) -> Subscription {
        self.subscribe_phase(Phase::Change, on_next)
    }

    /// Subscribe at a named phase.
    #[must_use = "dropping the subscription detaches the callback"]
    pub fn subscribe_phase(&self, phase: Phase, on_next: impl Fn(&T) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.subscribers.borrow_mut().push(Entry {
            id,
            phase,
            callback: Rc::new(on_next),
        });

        let inner = Rc::clone(&self.inner);
        Subscription::new(move || {
            inner.subscribers.borrow_mut().retain(|e| e.id != id);
        })
    }

    /// Downgrade to a weak handle that does not keep the cell alive.
    pub fn downgrade(&self) -> WeakObservable<T> {
        WeakObservable {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Attach an upstream subscription guard to this cell's lifetime.
    /// Used by combinators so a derived cell owns its sources.
    pub(crate) fn retain(&self, guard: Subscription) {
        self.inner.guards.borrow_mut().push(guard);
    }

    // Snapshot the subscriber list for one phase so callbacks may freely
    // subscribe/unsubscribe without holding a borrow across the loop.
    fn snapshot(&self, phase: Phase) -> Vec<Entry<T>> {
        self.inner
            .subscribers
            .borrow()
            .iter()
            .filter(|e| e.phase == phase)
            .cloned()
            .collect()
    }
}

impl<T: std::fmt::Debug + Clone + 'static> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Observable").field(&self.read()).finish()
    }
}

/// Weak handle to an [`Observable`], used by combinator callbacks so a source
/// never keeps its dependents alive.
pub struct WeakObservable<T> {
    inner: Weak<Inner<T>>,
}

impl<T> Clone for WeakObservable<T> {
    fn clone(&self) -> Self {
        WeakObservable {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> WeakObservable<T> {
    /// Upgrade back to a strong handle if the cell is still alive.
    pub fn upgrade(&self) -> Option<Observable<T>> {
        self.inner.upgrade().map(|inner| Observable { inner })
    }
}

/// RAII guard for a subscription. Detaches the callback on drop.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(detach: impl FnOnce() + 'static) -> Self {
        Subscription {
            detach: Some(Box::new(detach)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_and_update() {
        let cell = observable(1);
        assert_eq!(cell.read(), 1);
        cell.update(2);
        assert_eq!(cell.read(), 2);
    }

    #[test]
    fn test_subscribers_see_ordered_sequence() {
        let cell = observable(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        let _sub = cell.subscribe(move |v| seen2.borrow_mut().push(*v));

        cell.update(1);
        cell.update(2);
        cell.update(3);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_before_change_runs_first_with_outgoing_value() {
        let cell = observable(10);
        let log = Rc::new(RefCell::new(Vec::new()));

        let log_before = log.clone();
        let _before = cell.subscribe_phase(Phase::BeforeChange, move |v| {
            log_before.borrow_mut().push(format!("before:{v}"));
        });
        let log_after = log.clone();
        let _after = cell.subscribe(move |v| {
            log_after.borrow_mut().push(format!("change:{v}"));
        });

        cell.update(20);
        assert_eq!(*log.borrow(), vec!["before:10", "change:20"]);
    }

    #[test]
    fn test_update_is_synchronous() {
        let cell = observable(0);
        let seen = Rc::new(Cell::new(0));
        let seen2 = seen.clone();
        let _sub = cell.subscribe(move |v| seen2.set(*v));

        cell.update(7);
        // Subscriber has already run by the time update returns.
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn test_dropping_subscription_detaches() {
        let cell = observable(0);
        let count = Rc::new(Cell::new(0));
        let count2 = count.clone();
        let sub = cell.subscribe(move |_| count2.set(count2.get() + 1));

        cell.update(1);
        drop(sub);
        cell.update(2);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_notifies_even_when_value_unchanged() {
        let cell = observable(5);
        let count = Rc::new(Cell::new(0));
        let count2 = count.clone();
        let _sub = cell.subscribe(move |_| count2.set(count2.get() + 1));

        cell.update(5);
        cell.update(5);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_clones_share_the_cell() {
        let a = observable(String::from("x"));
        let b = a.clone();
        b.update(String::from("y"));
        assert_eq!(a.read(), "y");
    }
}
