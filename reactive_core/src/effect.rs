#![forbid(unsafe_code)]
use crate::{
    dep::DepInner,
    object::{Key, RawObject},
    runtime,
};
use std::{
    any::Any,
    cell::{Cell, RefCell},
    fmt::{self, Debug},
    hash::Hash,
    marker::PhantomData,
    rc::{Rc, Weak},
};

/// Handle to a running effect: the unit of reactive execution.
///
/// An effect is created by [`create_effect`], runs its computation once
/// immediately, and reruns it whenever a dependency it read during its last
/// run is triggered. Handles compare and hash by identity.
///
/// Dependency sets hold strong handles to their subscribers, so an effect
/// stays alive as long as it is subscribed anywhere, even after every
/// user-held handle is dropped. [`Effect::stop`] severs those subscriptions.
pub struct Effect {
    inner: Rc<EffectInner>,
}

struct EffectInner {
    computation: RefCell<Box<dyn FnMut() -> Box<dyn Any>>>,
    scheduler: Option<Box<dyn Fn()>>,
    active: Cell<bool>,
    deps: RefCell<Vec<Weak<DepInner>>>,
    on_stop: RefCell<Option<Box<dyn FnOnce()>>>,
    #[cfg(debug_assertions)]
    defined_at: &'static std::panic::Location<'static>,
}

impl Effect {
    #[track_caller]
    fn new(
        computation: Box<dyn FnMut() -> Box<dyn Any>>,
        scheduler: Option<Box<dyn Fn()>>,
        on_stop: Option<Box<dyn FnOnce()>>,
    ) -> Self {
        Self {
            inner: Rc::new(EffectInner {
                computation: RefCell::new(computation),
                scheduler,
                active: Cell::new(true),
                deps: RefCell::new(Vec::new()),
                on_stop: RefCell::new(on_stop),
                #[cfg(debug_assertions)]
                defined_at: std::panic::Location::caller(),
            }),
        }
    }

    fn run_with(&self, computation: &mut Box<dyn FnMut() -> Box<dyn Any>>) -> Box<dyn Any> {
        if !self.inner.active.get() {
            // a stopped effect still runs, it just no longer tracks
            return computation();
        }
        // subscriptions from the previous run are dropped here, and the run
        // below re-adds the ones it still reads
        self.cleanup();
        let _guard = runtime::enter(self.clone());
        computation()
    }

    pub(crate) fn run_erased(&self) -> Box<dyn Any> {
        let mut computation = self.inner.computation.borrow_mut();
        self.run_with(&mut computation)
    }

    /// Reruns the computation, or hands off to the scheduler if the effect
    /// has one. Called by [`Dep::trigger`](crate::Dep::trigger).
    pub(crate) fn notify(&self) {
        if let Some(scheduler) = &self.inner.scheduler {
            scheduler();
            return;
        }
        match self.inner.computation.try_borrow_mut() {
            Ok(mut computation) => {
                self.run_with(&mut computation);
            }
            Err(_) => {
                tracing::warn!("skipping notification for an effect that is already running");
            }
        }
    }

    fn cleanup(&self) {
        for dep in self.inner.deps.take() {
            if let Some(dep) = dep.upgrade() {
                dep.subscribers.borrow_mut().unsubscribe(self);
            }
        }
    }

    pub(crate) fn add_dependency(&self, dep: Weak<DepInner>) {
        self.inner.deps.borrow_mut().push(dep);
    }

    /// Stops the effect: unsubscribes it from every dependency, so it never
    /// reruns automatically again. Idempotent. The `on_stop` callback, if
    /// any, runs on the first call only.
    pub fn stop(&self) {
        if !self.inner.active.replace(false) {
            return;
        }
        self.cleanup();
        if let Some(on_stop) = self.inner.on_stop.take() {
            on_stop();
        }
    }

    /// Returns `true` until the effect is stopped.
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl PartialEq for Effect {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Effect {}

impl Hash for Effect {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.inner), state);
    }
}

impl Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Effect");
        s.field("active", &self.inner.active.get());
        #[cfg(debug_assertions)]
        s.field("defined_at", &self.inner.defined_at);
        s.finish()
    }
}

/// Handle returned by [`create_effect`]: reruns the effect's computation on
/// demand and returns its value.
pub struct EffectRunner<T> {
    effect: Effect,
    ty: PhantomData<fn() -> T>,
}

impl<T: 'static> EffectRunner<T> {
    /// Reruns the computation under tracking, exactly as an automatic rerun
    /// would, and returns its value. On a stopped effect the computation
    /// still runs and returns, but nothing is tracked.
    ///
    /// Panics if called from inside this effect's own computation.
    pub fn run(&self) -> T {
        *self
            .effect
            .run_erased()
            .downcast()
            .expect("effect computation returned a value of an unexpected type")
    }

    /// The underlying [`Effect`].
    pub fn effect(&self) -> &Effect {
        &self.effect
    }
}

impl<T> Clone for EffectRunner<T> {
    fn clone(&self) -> Self {
        Self {
            effect: self.effect.clone(),
            ty: PhantomData,
        }
    }
}

impl<T> PartialEq for EffectRunner<T> {
    fn eq(&self, other: &Self) -> bool {
        self.effect == other.effect
    }
}

impl<T> Eq for EffectRunner<T> {}

impl<T> Debug for EffectRunner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRunner")
            .field("effect", &self.effect)
            .finish()
    }
}

/// Options for [`create_effect_with`].
#[derive(Default)]
pub struct EffectOptions {
    scheduler: Option<Box<dyn Fn()>>,
    on_stop: Option<Box<dyn FnOnce()>>,
}

impl EffectOptions {
    /// Invokes `scheduler` instead of rerunning the computation when a
    /// dependency is triggered. The initial run is never scheduled, and
    /// manual [`EffectRunner::run`] calls bypass the scheduler as well.
    pub fn scheduler(mut self, scheduler: impl Fn() + 'static) -> Self {
        self.scheduler = Some(Box::new(scheduler));
        self
    }

    /// Invokes `on_stop` when the effect is stopped. Runs at most once, no
    /// matter how many times [`stop`] is called.
    pub fn on_stop(mut self, on_stop: impl FnOnce() + 'static) -> Self {
        self.on_stop = Some(Box::new(on_stop));
        self
    }
}

impl Debug for EffectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectOptions")
            .field("scheduler", &self.scheduler.is_some())
            .field("on_stop", &self.on_stop.is_some())
            .finish()
    }
}

/// Creates an effect that immediately runs `f` under tracking, and reruns it
/// whenever a dependency it read during its last run changes.
///
/// Every read through a [`reactive`](crate::reactive) proxy inside `f`
/// subscribes the effect to that `(object, key)` pair; writes through a
/// proxy trigger the subscribed effects. The returned runner reruns the
/// computation on demand and returns its value.
///
/// ```
/// # use reactive_core::*;
/// use std::{cell::Cell, rc::Rc};
///
/// let user = reactive(&object! { "age": 10 });
///
/// let seen = Rc::new(Cell::new(0));
/// let runner = create_effect({
///     let user = user.clone();
///     let seen = seen.clone();
///     move || {
///         let next = user.get("age").and_then(|age| age.as_int()).unwrap_or(0) + 1;
///         seen.set(next);
///         next
///     }
/// });
///
/// // the effect has already run once
/// assert_eq!(seen.get(), 11);
///
/// // writing the tracked key reruns it
/// user.set("age", 20).unwrap();
/// assert_eq!(seen.get(), 21);
///
/// // rerunning manually returns the computation's value
/// assert_eq!(runner.run(), 21);
/// ```
#[cfg_attr(debug_assertions, tracing::instrument(level = "trace", skip_all))]
#[track_caller]
pub fn create_effect<T: 'static>(f: impl FnMut() -> T + 'static) -> EffectRunner<T> {
    create_effect_with(f, EffectOptions::default())
}

/// Creates an effect with [`EffectOptions`].
///
/// With a scheduler, a triggered dependency invokes the scheduler instead of
/// rerunning the computation, and the caller decides when, or whether, to
/// rerun via [`EffectRunner::run`]:
///
/// ```
/// # use reactive_core::*;
/// use std::{cell::Cell, rc::Rc};
///
/// let counter = reactive(&object! { "count": 1 });
///
/// let scheduled = Rc::new(Cell::new(0));
/// let runner = create_effect_with(
///     {
///         let counter = counter.clone();
///         move || counter.get("count").and_then(|count| count.as_int()).unwrap_or(0)
///     },
///     EffectOptions::default().scheduler({
///         let scheduled = scheduled.clone();
///         move || scheduled.set(scheduled.get() + 1)
///     }),
/// );
///
/// // the first run is never scheduled
/// assert_eq!(scheduled.get(), 0);
/// assert_eq!(runner.run(), 1);
///
/// counter.set("count", 2).unwrap();
/// assert_eq!(scheduled.get(), 1);
///
/// // the computation itself has not rerun; running it picks up the change
/// assert_eq!(runner.run(), 2);
/// ```
#[cfg_attr(debug_assertions, tracing::instrument(level = "trace", skip_all))]
#[track_caller]
pub fn create_effect_with<T: 'static>(
    mut f: impl FnMut() -> T + 'static,
    options: EffectOptions,
) -> EffectRunner<T> {
    let effect = Effect::new(
        Box::new(move || Box::new(f()) as Box<dyn Any>),
        options.scheduler,
        options.on_stop,
    );
    effect.run_erased();
    EffectRunner {
        effect,
        ty: PhantomData,
    }
}

/// Stops an effect, so it never reruns automatically again. Idempotent.
///
/// A stopped runner can still be [run](EffectRunner::run) manually; the
/// computation executes without tracking.
///
/// ```
/// # use reactive_core::*;
/// use std::{cell::Cell, rc::Rc};
///
/// let data = reactive(&object! { "n": 1 });
///
/// let runs = Rc::new(Cell::new(0));
/// let runner = create_effect({
///     let data = data.clone();
///     let runs = runs.clone();
///     move || {
///         let _ = data.get("n");
///         runs.set(runs.get() + 1);
///     }
/// });
/// assert_eq!(runs.get(), 1);
///
/// stop(&runner);
/// data.set("n", 2).unwrap();
/// assert_eq!(runs.get(), 1);
/// ```
#[cfg_attr(debug_assertions, tracing::instrument(level = "trace", skip_all))]
pub fn stop<T>(runner: &EffectRunner<T>) {
    runner.effect.stop();
}

/// Which kind of read is being tracked.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TrackOp {
    /// A value read.
    Get,
    /// An existence check.
    Has,
}

/// Which kind of write caused a trigger.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TriggerOp {
    /// An existing entry was overwritten.
    Set,
    /// A new entry was added.
    Add,
    /// An entry was removed.
    Delete,
}

/// Subscribes the running effect to `(target, key)`.
///
/// Proxies call this on every tracked read; call it directly to make an
/// effect depend on data the proxy layer cannot see. A no-op unless a
/// tracking effect is running, so it never grows the registry for reads
/// that nothing observes.
pub fn track(target: &RawObject, op: TrackOp, key: &Key) {
    let Some(observer) = runtime::tracking_observer() else {
        return;
    };
    let dep = runtime::with_runtime(|runtime| runtime.target_dep(target.id(), key));
    tracing::trace!(object = ?target.id(), ?op, key = %key, "track");
    dep.track_with(&observer);
}

/// Notifies every effect subscribed to `(target, key)`.
///
/// Proxies call this on every successful write. Triggering a pair that has
/// never been tracked is a no-op.
pub fn trigger(target: &RawObject, op: TriggerOp, key: &Key) {
    let Some(dep) =
        runtime::with_runtime(|runtime| runtime.existing_target_dep(target.id(), key))
    else {
        return;
    };
    tracing::trace!(object = ?target.id(), ?op, key = %key, "trigger");
    dep.trigger();
}

/// Returns `true` while an effect is running and tracking is not paused,
/// which is exactly when a read would subscribe the running effect.
pub fn is_tracking() -> bool {
    runtime::is_tracking()
}

/// Runs `f` with tracking paused: reads inside `f` do not subscribe the
/// running effect. Tracking resumes when `f` returns, even if it panics.
///
/// ```
/// # use reactive_core::*;
/// use std::{cell::Cell, rc::Rc};
///
/// let data = reactive(&object! { "watched": 1, "peeked": 1 });
///
/// let runs = Rc::new(Cell::new(0));
/// create_effect({
///     let data = data.clone();
///     let runs = runs.clone();
///     move || {
///         runs.set(runs.get() + 1);
///         let _ = data.get("watched");
///         untrack(|| {
///             let _ = data.get("peeked");
///         });
///     }
/// });
/// assert_eq!(runs.get(), 1);
///
/// // a peeked read is not a subscription
/// data.set("peeked", 2).unwrap();
/// assert_eq!(runs.get(), 1);
///
/// data.set("watched", 2).unwrap();
/// assert_eq!(runs.get(), 2);
/// ```
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let _pause = runtime::pause_tracking();
    f()
}
