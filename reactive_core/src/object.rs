use crate::{proxy::Reactive, runtime};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::{ser::SerializeMap, Serialize, Serializer};
use std::{
    borrow::Borrow,
    cell::RefCell,
    fmt::{self, Debug, Display},
    rc::Rc,
};

/// Key under which a [`Value`] is stored in a [`RawObject`].
///
/// Keys are cheaply clonable shared strings. Anything string-like converts
/// into one, and numeric indices convert to their decimal form, so `"0"`,
/// `"1"`, etc. address array-style entries.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Key(Rc<str>);

impl Key {
    /// The key as a plain string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(Rc::from(key))
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(Rc::from(key))
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self(Rc::from(index.to_string()))
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Unique ID assigned to a [`RawObject`].
///
/// IDs are allocated from a per-thread counter and never reused, so a dead
/// object's ID can never be mistaken for a live one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObjectId(pub(crate) u64);

/// A value stored under a key in a [`RawObject`].
///
/// Scalars compare by value. [`Value::Object`] and [`Value::Proxy`] compare
/// by identity, so two distinct objects with the same entries are not equal.
/// [`Value::Int`] and [`Value::Float`] never compare equal to each other.
#[derive(Clone, Debug)]
pub enum Value {
    /// The absence of a value, serialized as JSON `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A shared string.
    Str(Rc<str>),
    /// A plain, untracked object.
    Object(RawObject),
    /// A tracked view over an object. See [`reactive`](crate::reactive).
    Proxy(Reactive),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The integer, if this is a [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// The float, if this is a [`Value::Float`].
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// The string, if this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    /// The object, if this is a [`Value::Object`].
    pub fn as_object(&self) -> Option<&RawObject> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The proxy, if this is a [`Value::Proxy`].
    pub fn as_proxy(&self) -> Option<&Reactive> {
        match self {
            Value::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Proxy(a), Value::Proxy(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<RawObject> for Value {
    fn from(object: RawObject) -> Self {
        Value::Object(object)
    }
}

impl From<Reactive> for Value {
    fn from(proxy: Reactive) -> Self {
        Value::Proxy(proxy)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(value) => Value::Bool(value),
            serde_json::Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Value::Int(int)
                } else {
                    Value::Float(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(value) => Value::Str(Rc::from(value)),
            serde_json::Value::Array(items) => {
                let object = RawObject::new();
                for (index, item) in items.into_iter().enumerate() {
                    object.insert(index, Value::from(item));
                }
                Value::Object(object)
            }
            serde_json::Value::Object(entries) => {
                let object = RawObject::new();
                for (key, value) in entries {
                    object.insert(key, Value::from(value));
                }
                Value::Object(object)
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Int(value) => serializer.serialize_i64(*value),
            Value::Float(value) => serializer.serialize_f64(*value),
            Value::Str(value) => serializer.serialize_str(value),
            Value::Object(object) => object.serialize(serializer),
            Value::Proxy(proxy) => proxy.serialize(serializer),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// A plain, untracked key-value object: the raw storage every proxy wraps.
///
/// Reads and writes through a `RawObject` never touch the dependency graph.
/// Wrap it with [`reactive`](crate::reactive), [`readonly`](crate::readonly),
/// or [`shallow_readonly`](crate::shallow_readonly) to get a tracked view over
/// the same storage. Entries keep insertion order.
///
/// Cloning a `RawObject` clones the handle, not the storage: both handles
/// point at the same entries and compare equal.
///
/// ```
/// # use reactive_core::*;
/// let user = object! {
///     "name": "Alice",
///     "age": 33,
/// };
///
/// assert_eq!(user.get("name"), Some(Value::from("Alice")));
///
/// user.insert("age", 34);
/// assert_eq!(user.get("age"), Some(Value::Int(34)));
/// ```
pub struct RawObject {
    inner: Rc<ObjectInner>,
}

struct ObjectInner {
    id: ObjectId,
    entries: RefCell<IndexMap<Key, Value, FxBuildHasher>>,
}

impl Drop for ObjectInner {
    fn drop(&mut self) {
        runtime::forget(self.id);
    }
}

impl RawObject {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                id: runtime::with_runtime(|runtime| runtime.next_object_id()),
                entries: RefCell::new(IndexMap::default()),
            }),
        }
    }

    /// The unique ID of this object.
    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    /// Returns a clone of the value stored under `key`, without tracking.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.entries.borrow().get(key).cloned()
    }

    /// Stores `value` under `key`, without triggering. Returns the previous
    /// value, if any.
    pub fn insert(&self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        self.inner
            .entries
            .borrow_mut()
            .insert(key.into(), value.into())
    }

    /// Removes the entry under `key`, without triggering. Returns the removed
    /// value, if any.
    pub fn remove(&self, key: &str) -> Option<Value> {
        // shift_remove keeps the iteration order of the remaining entries
        self.inner.entries.borrow_mut().shift_remove(key)
    }

    /// Returns `true` if an entry is stored under `key`, without tracking.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.entries.borrow().contains_key(key)
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// Returns `true` if the object has no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    /// A snapshot of the keys, in insertion order.
    pub fn keys(&self) -> Vec<Key> {
        self.inner.entries.borrow().keys().cloned().collect()
    }
}

impl Default for RawObject {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RawObject {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl PartialEq for RawObject {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for RawObject {}

impl std::hash::Hash for RawObject {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.inner), state);
    }
}

impl Debug for RawObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawObject")
            .field("id", &self.inner.id)
            .field("len", &self.len())
            .finish()
    }
}

impl Serialize for RawObject {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries = self.inner.entries.borrow();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries.iter() {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}

impl Display for RawObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl From<serde_json::Value> for RawObject {
    fn from(value: serde_json::Value) -> Self {
        match Value::from(value) {
            Value::Object(object) => object,
            scalar => {
                let object = RawObject::new();
                object.insert(0, scalar);
                object
            }
        }
    }
}
