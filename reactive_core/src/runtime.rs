#![forbid(unsafe_code)]
use crate::{
    dep::Dep,
    effect::Effect,
    handlers::Handlers,
    object::{Key, ObjectId},
    proxy::ProxyInner,
};
use rustc_hash::FxHashMap;
use std::{
    cell::{Cell, RefCell},
    fmt::Debug,
    rc::Weak,
};

thread_local! {
    pub(crate) static RUNTIME: Runtime = Runtime::new();
}

/// Runs `f` with the runtime for the current thread. Everything reactive on
/// a thread lives in this one runtime.
pub(crate) fn with_runtime<T>(f: impl FnOnce(&Runtime) -> T) -> T {
    RUNTIME.with(f)
}

pub(crate) struct Runtime {
    observer: RefCell<Option<Effect>>,
    tracking: Cell<bool>,
    next_object_id: Cell<u64>,
    targets: RefCell<FxHashMap<ObjectId, FxHashMap<Key, Dep>>>,
    mutable_proxies: RefCell<FxHashMap<ObjectId, Weak<ProxyInner>>>,
    readonly_proxies: RefCell<FxHashMap<ObjectId, Weak<ProxyInner>>>,
    shallow_readonly_proxies: RefCell<FxHashMap<ObjectId, Weak<ProxyInner>>>,
}

impl Runtime {
    fn new() -> Self {
        Self {
            observer: Default::default(),
            tracking: Default::default(),
            next_object_id: Default::default(),
            targets: Default::default(),
            mutable_proxies: Default::default(),
            readonly_proxies: Default::default(),
            shallow_readonly_proxies: Default::default(),
        }
    }

    pub(crate) fn next_object_id(&self) -> ObjectId {
        let id = self.next_object_id.get();
        self.next_object_id.set(id + 1);
        ObjectId(id)
    }

    /// The dependency set registered for `(target, key)`, created on first
    /// track. Returns a clone, so the registry borrow is not held while the
    /// caller subscribes to it.
    pub(crate) fn target_dep(&self, target: ObjectId, key: &Key) -> Dep {
        let mut targets = self.targets.borrow_mut();
        let deps = targets.entry(target).or_default();
        if let Some(dep) = deps.get(key) {
            dep.clone()
        } else {
            let dep = Dep::new();
            deps.insert(key.clone(), dep.clone());
            dep
        }
    }

    /// The dependency set registered for `(target, key)`, if that pair has
    /// ever been tracked.
    pub(crate) fn existing_target_dep(&self, target: ObjectId, key: &Key) -> Option<Dep> {
        self.targets
            .borrow()
            .get(&target)
            .and_then(|deps| deps.get(key))
            .cloned()
    }

    pub(crate) fn proxy_cache(
        &self,
        handlers: &Handlers,
    ) -> &RefCell<FxHashMap<ObjectId, Weak<ProxyInner>>> {
        match (handlers.readonly, handlers.shallow) {
            (false, _) => &self.mutable_proxies,
            (true, false) => &self.readonly_proxies,
            (true, true) => &self.shallow_readonly_proxies,
        }
    }
}

impl Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("observer", &self.observer)
            .field("tracking", &self.tracking)
            .field("targets", &self.targets.borrow().len())
            .finish()
    }
}

/// The innermost running effect, whether or not tracking is paused.
pub(crate) fn current_observer() -> Option<Effect> {
    with_runtime(|runtime| runtime.observer.borrow().clone())
}

/// The innermost running effect, unless tracking is paused.
pub(crate) fn tracking_observer() -> Option<Effect> {
    with_runtime(|runtime| {
        if runtime.tracking.get() {
            runtime.observer.borrow().clone()
        } else {
            None
        }
    })
}

pub(crate) fn is_tracking() -> bool {
    with_runtime(|runtime| runtime.tracking.get() && runtime.observer.borrow().is_some())
}

/// Makes `observer` the running effect and enables tracking until the guard
/// drops. The previous observer and tracking flag are restored on drop, so
/// they survive a panic in the effect's computation.
pub(crate) fn enter(observer: Effect) -> ObserverGuard {
    with_runtime(|runtime| ObserverGuard {
        prev_observer: runtime.observer.replace(Some(observer)),
        prev_tracking: runtime.tracking.replace(true),
    })
}

pub(crate) struct ObserverGuard {
    prev_observer: Option<Effect>,
    prev_tracking: bool,
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        let _ = RUNTIME.try_with(|runtime| {
            *runtime.observer.borrow_mut() = self.prev_observer.take();
            runtime.tracking.set(self.prev_tracking);
        });
    }
}

/// Pauses tracking until the guard drops. The observer stays in place, so a
/// paused effect still does not retrigger itself through its own writes.
pub(crate) fn pause_tracking() -> PauseGuard {
    with_runtime(|runtime| PauseGuard {
        prev_tracking: runtime.tracking.replace(false),
    })
}

pub(crate) struct PauseGuard {
    prev_tracking: bool,
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        let _ = RUNTIME.try_with(|runtime| runtime.tracking.set(self.prev_tracking));
    }
}

/// Purges every trace of a dead object from the runtime: its dependency sets
/// and any cached proxies. Runs from object destructors, so it must tolerate
/// a runtime that is itself being torn down.
pub(crate) fn forget(target: ObjectId) {
    let _ = RUNTIME.try_with(|runtime| {
        let removed = runtime.targets.borrow_mut().remove(&target);
        runtime.mutable_proxies.borrow_mut().remove(&target);
        runtime.readonly_proxies.borrow_mut().remove(&target);
        runtime.shallow_readonly_proxies.borrow_mut().remove(&target);
        // the removed dependency sets may own the last handle to other
        // objects, and those objects' destructors re-enter this function;
        // drop them only once every registry borrow above has been released
        drop(removed);
    });
}
