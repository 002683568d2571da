// Per-variant read/write policy for proxies. A proxy's behavior is fully
// described by two flags: whether writes are rejected, and whether nested
// objects come back raw instead of wrapped.

use crate::{
    effect::{track, trigger, TrackOp, TriggerOp},
    object::{Key, RawObject, Value},
    proxy::{reactive, readonly, WriteError},
};

pub(crate) struct Handlers {
    pub(crate) readonly: bool,
    pub(crate) shallow: bool,
}

pub(crate) static MUTABLE: Handlers = Handlers {
    readonly: false,
    shallow: false,
};

pub(crate) static READONLY: Handlers = Handlers {
    readonly: true,
    shallow: false,
};

pub(crate) static SHALLOW_READONLY: Handlers = Handlers {
    readonly: true,
    shallow: true,
};

impl Handlers {
    pub(crate) fn get(&self, target: &RawObject, key: &Key) -> Option<Value> {
        // the key is tracked whether or not it exists yet, so adding it
        // later retriggers the effect that looked for it
        if !self.readonly {
            track(target, TrackOp::Get, key);
        }
        let value = target.get(key.as_str())?;
        if self.shallow {
            return Some(value);
        }
        Some(self.wrap_nested(value))
    }

    // nested objects come back wrapped in the same flavor as the view that
    // read them
    fn wrap_nested(&self, value: Value) -> Value {
        match value {
            Value::Object(object) => {
                if self.readonly {
                    Value::Proxy(readonly(&object))
                } else {
                    Value::Proxy(reactive(&object))
                }
            }
            other => other,
        }
    }

    pub(crate) fn has(&self, target: &RawObject, key: &Key) -> bool {
        if !self.readonly {
            track(target, TrackOp::Has, key);
        }
        target.contains_key(key.as_str())
    }

    pub(crate) fn set(
        &self,
        target: &RawObject,
        key: Key,
        value: Value,
    ) -> Result<Option<Value>, WriteError> {
        if self.readonly {
            return Err(WriteError::Set { key });
        }
        let prev = target.insert(key.clone(), value);
        let op = if prev.is_some() {
            TriggerOp::Set
        } else {
            TriggerOp::Add
        };
        trigger(target, op, &key);
        Ok(prev)
    }

    pub(crate) fn remove(
        &self,
        target: &RawObject,
        key: &Key,
    ) -> Result<Option<Value>, WriteError> {
        if self.readonly {
            return Err(WriteError::Remove { key: key.clone() });
        }
        let removed = target.remove(key.as_str());
        if removed.is_some() {
            trigger(target, TriggerOp::Delete, key);
        }
        Ok(removed)
    }
}
