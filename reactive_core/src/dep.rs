use crate::{effect::Effect, runtime};
use std::{
    cell::RefCell,
    fmt::{self, Debug},
    rc::Rc,
};

/// The set of effects subscribed to one dependency.
///
/// This is a linear set built on a `Vec<_>`, on the assumption that the
/// number of subscribers per dependency is usually small, so a linear search
/// is not significantly more expensive than a hash and lookup.
#[derive(Default)]
pub(crate) struct SubscriberSet(Vec<Effect>);

impl SubscriberSet {
    pub fn new() -> Self {
        Self(Vec::with_capacity(2))
    }

    /// Returns `true` if the effect was not already subscribed.
    pub fn subscribe(&mut self, subscriber: Effect) -> bool {
        if self.0.contains(&subscriber) {
            false
        } else {
            self.0.push(subscriber);
            true
        }
    }

    pub fn unsubscribe(&mut self, subscriber: &Effect) {
        if let Some(pos) = self.0.iter().position(|s| s == subscriber) {
            // note: do not use `.swap_remove()` here.
            // using `.remove()` is slower because it shifts other items
            // but it maintains the order of the subscribers, which matters
            // when effects assume an earlier-subscribed effect has already
            // seen the change
            self.0.remove(pos);
        }
    }

    pub fn snapshot(&self) -> Vec<Effect> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// A dependency set: the node of the dependency graph that connects one
/// tracked source to the effects subscribed to it.
///
/// Every tracked `(object, key)` pair owns one `Dep` inside the global
/// registry. A standalone `Dep` can also be used directly as a data-less
/// reactive primitive, to notify reactive code of changes to data the
/// tracking layer cannot see.
///
/// ```
/// # use reactive_core::*;
/// use std::{cell::RefCell, rc::Rc};
///
/// let external_data = Rc::new(RefCell::new(1));
/// let output = Rc::new(RefCell::new(String::new()));
///
/// let rerun_on_data = Dep::new();
///
/// let o = output.clone();
/// let e = external_data.clone();
/// let d = rerun_on_data.clone();
/// create_effect(move || {
///     d.track();
///     let current = e.borrow().to_string();
///     o.borrow_mut().push_str(&current);
///     *e.borrow_mut() += 1;
/// });
/// assert_eq!(*output.borrow(), "1");
///
/// rerun_on_data.trigger(); // reruns the above effect
///
/// assert_eq!(*output.borrow(), "12");
/// ```
#[derive(Clone, Default)]
pub struct Dep {
    inner: Rc<DepInner>,
}

#[derive(Default)]
pub(crate) struct DepInner {
    pub(crate) subscribers: RefCell<SubscriberSet>,
}

impl Dep {
    /// Creates a dependency set with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DepInner {
                subscribers: RefCell::new(SubscriberSet::new()),
            }),
        }
    }

    /// Subscribes the running effect to this dependency.
    ///
    /// Does nothing when called outside an effect, or while tracking is
    /// paused. An effect is linked to a dependency at most once, no matter
    /// how many times it tracks it during a single run.
    pub fn track(&self) {
        if let Some(observer) = runtime::tracking_observer() {
            self.track_with(&observer);
        }
    }

    pub(crate) fn track_with(&self, observer: &Effect) {
        let newly_subscribed = self
            .inner
            .subscribers
            .borrow_mut()
            .subscribe(observer.clone());
        if newly_subscribed {
            observer.add_dependency(Rc::downgrade(&self.inner));
        }
    }

    /// Notifies every subscribed effect that this dependency changed.
    ///
    /// The subscriber set is snapshotted first, so effects that subscribe or
    /// unsubscribe while the notification is running are not affected by this
    /// call. Effects that have been stopped are skipped, and so is the
    /// currently running effect, so an effect writing to its own dependency
    /// does not retrigger itself.
    pub fn trigger(&self) {
        let subscribers = self.inner.subscribers.borrow().snapshot();
        let current = runtime::current_observer();
        for subscriber in subscribers {
            if !subscriber.is_active() {
                continue;
            }
            if current.as_ref() == Some(&subscriber) {
                continue;
            }
            subscriber.notify();
        }
    }
}

impl Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}
