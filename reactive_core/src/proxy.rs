#![forbid(unsafe_code)]
use crate::{
    handlers::{self, Handlers},
    object::{Key, RawObject, Value},
    runtime,
};
use serde::{Serialize, Serializer};
use std::{
    fmt::{self, Debug},
    hash::Hash,
    rc::{Rc, Weak},
};
use thiserror::Error;

/// Error returned when writing through a readonly proxy.
///
/// A rejected write leaves the underlying object untouched and triggers
/// nothing.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum WriteError {
    /// A `set` was rejected.
    #[error("cannot set key `{key}` on a readonly object")]
    Set {
        /// The key the write addressed.
        key: Key,
    },
    /// A `remove` was rejected.
    #[error("cannot remove key `{key}` from a readonly object")]
    Remove {
        /// The key the removal addressed.
        key: Key,
    },
}

/// A tracked view over a [`RawObject`].
///
/// Obtained from [`reactive`], [`readonly`], or [`shallow_readonly`]. All
/// views over one object share its storage; they differ in whether reads
/// track, whether writes are allowed, and how nested objects come back.
/// Handles compare by identity, and one `(object, variant)` pair always
/// yields the same handle.
///
/// A view holds a strong handle to its target, so the target outlives every
/// view over it.
pub struct Reactive {
    inner: Rc<ProxyInner>,
}

pub(crate) struct ProxyInner {
    target: RawObject,
    handlers: &'static Handlers,
}

impl Reactive {
    /// Reads the value under `key`.
    ///
    /// On tracking variants this subscribes the running effect to the key,
    /// whether or not it exists yet, so a later insertion reruns the effect.
    /// Deep variants return nested objects wrapped in the same variant;
    /// [`shallow_readonly`] returns them raw.
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        let key = key.into();
        self.inner.handlers.get(&self.inner.target, &key)
    }

    /// Writes `value` under `key` and triggers the effects subscribed to
    /// that key. Returns the previous value, if any.
    ///
    /// On readonly variants the write fails without mutating anything or
    /// triggering anyone.
    pub fn set(
        &self,
        key: impl Into<Key>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, WriteError> {
        self.inner
            .handlers
            .set(&self.inner.target, key.into(), value.into())
    }

    /// Removes the entry under `key`, triggering the effects subscribed to
    /// that key if it existed. Returns the removed value.
    ///
    /// On readonly variants the removal fails without mutating anything or
    /// triggering anyone.
    pub fn remove(&self, key: impl Into<Key>) -> Result<Option<Value>, WriteError> {
        let key = key.into();
        self.inner.handlers.remove(&self.inner.target, &key)
    }

    /// Returns `true` if an entry is stored under `key`. Tracks the key on
    /// tracking variants, like [`Reactive::get`].
    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        self.inner.handlers.has(&self.inner.target, &key)
    }

    /// The raw object this view wraps.
    pub fn target(&self) -> &RawObject {
        &self.inner.target
    }

    /// Returns `true` for [`readonly`] and [`shallow_readonly`] views.
    pub fn is_readonly(&self) -> bool {
        self.inner.handlers.readonly
    }

    /// Returns `true` for [`shallow_readonly`] views.
    pub fn is_shallow(&self) -> bool {
        self.inner.handlers.shallow
    }
}

impl Clone for Reactive {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl PartialEq for Reactive {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Reactive {}

impl Hash for Reactive {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.inner), state);
    }
}

impl Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("target", &self.inner.target)
            .field("readonly", &self.inner.handlers.readonly)
            .field("shallow", &self.inner.handlers.shallow)
            .finish()
    }
}

impl Serialize for Reactive {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.inner.target.serialize(serializer)
    }
}

fn create_proxy(target: &RawObject, handlers: &'static Handlers) -> Reactive {
    runtime::with_runtime(|runtime| {
        let cache = runtime.proxy_cache(handlers);
        let existing = cache.borrow().get(&target.id()).and_then(Weak::upgrade);
        match existing {
            Some(inner) => Reactive { inner },
            None => {
                let inner = Rc::new(ProxyInner {
                    target: target.clone(),
                    handlers,
                });
                cache
                    .borrow_mut()
                    .insert(target.id(), Rc::downgrade(&inner));
                Reactive { inner }
            }
        }
    })
}

/// Returns the tracking, writable view over `target`.
///
/// Reads through the view subscribe the running effect; writes trigger the
/// effects subscribed to the written key. Nested objects come back wrapped
/// with `reactive` themselves, lazily, on each read.
///
/// ```
/// # use reactive_core::*;
/// let raw = object! { "city": "Oslo" };
/// let state = reactive(&raw);
///
/// // one target, one view: requesting it again yields the same handle
/// assert_eq!(state, reactive(&raw));
/// assert_eq!(state.target().id(), raw.id());
/// ```
#[cfg_attr(
    debug_assertions,
    tracing::instrument(level = "trace", skip_all, fields(object = ?target.id()))
)]
pub fn reactive(target: &RawObject) -> Reactive {
    create_proxy(target, &handlers::MUTABLE)
}

/// Returns the readonly view over `target`.
///
/// Reads do not track, and writes fail with [`WriteError`] without mutating
/// anything or triggering anyone. Nested objects come back wrapped with
/// `readonly` themselves.
///
/// ```
/// # use reactive_core::*;
/// let config = readonly(&object! { "retries": 3 });
///
/// assert_eq!(config.get("retries"), Some(Value::Int(3)));
/// assert!(config.set("retries", 4).is_err());
/// assert_eq!(config.get("retries"), Some(Value::Int(3)));
/// ```
#[cfg_attr(
    debug_assertions,
    tracing::instrument(level = "trace", skip_all, fields(object = ?target.id()))
)]
pub fn readonly(target: &RawObject) -> Reactive {
    create_proxy(target, &handlers::READONLY)
}

/// Returns the shallow readonly view over `target`: the top level rejects
/// writes like [`readonly`], but nested objects come back raw and fully
/// writable.
///
/// ```
/// # use reactive_core::*;
/// let raw = object! { "nested": object! { "n": 1 } };
/// let view = shallow_readonly(&raw);
///
/// assert!(view.set("nested", 2).is_err());
///
/// // the nested object comes back raw, not wrapped
/// let nested = view.get("nested").unwrap();
/// assert!(!is_proxy(&nested));
/// ```
#[cfg_attr(
    debug_assertions,
    tracing::instrument(level = "trace", skip_all, fields(object = ?target.id()))
)]
pub fn shallow_readonly(target: &RawObject) -> Reactive {
    create_proxy(target, &handlers::SHALLOW_READONLY)
}

/// Returns `true` if `value` is a tracking, writable proxy.
pub fn is_reactive(value: &Value) -> bool {
    matches!(value, Value::Proxy(proxy) if !proxy.is_readonly())
}

/// Returns `true` if `value` is a readonly proxy, deep or shallow.
pub fn is_readonly(value: &Value) -> bool {
    matches!(value, Value::Proxy(proxy) if proxy.is_readonly())
}

/// Returns `true` if `value` is any proxy at all.
pub fn is_proxy(value: &Value) -> bool {
    matches!(value, Value::Proxy(_))
}

/// Strips the proxy from `value`: a proxy becomes its raw target, every
/// other value comes back unchanged.
///
/// ```
/// # use reactive_core::*;
/// let raw = object! { "n": 1 };
/// let wrapped = Value::from(reactive(&raw));
///
/// assert_eq!(to_raw(&wrapped), Value::from(raw));
/// ```
pub fn to_raw(value: &Value) -> Value {
    match value {
        Value::Proxy(proxy) => Value::Object(proxy.target().clone()),
        other => other.clone(),
    }
}
