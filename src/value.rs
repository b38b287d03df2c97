use crate::context::Context;
use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use std::fmt;
use std::sync::Arc;

/// Layout used by [`default_timestamp`]: millisecond precision wall clock.
pub const DEFAULT_TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Frames skipped by [`default_caller`] before the caller search starts.
pub const DEFAULT_CALLER_SKIP: usize = 0;

/// A value computed from the request [`Context`] at emission time.
///
/// A `Valuer` is a reusable template: cloning it is cheap and resolving it
/// never mutates it, so one instance can be shared by every log call in a
/// process while each call still gets a fresh result.
#[derive(Clone)]
pub struct Valuer(Arc<dyn Fn(&Context) -> serde_json::Value + Send + Sync>);

impl Valuer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context) -> serde_json::Value + Send + Sync + 'static,
    {
        Valuer(Arc::new(f))
    }

    pub fn call(&self, ctx: &Context) -> serde_json::Value {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Valuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Valuer(..)")
    }
}

/// One entry of a key/value argument list.
///
/// Keys and values share this type so that callers can pass any value in a
/// key position; the record builder drops pairs whose key is not a string.
#[derive(Debug, Clone)]
pub enum Value {
    Plain(serde_json::Value),
    Deferred(Valuer),
}

impl Value {
    /// The empty string used to pad odd-length lists.
    pub fn empty() -> Self {
        Value::Plain(serde_json::Value::String(String::new()))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Value::Deferred(_))
    }

    pub fn as_plain(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Plain(v) => Some(v),
            Value::Deferred(_) => None,
        }
    }

    /// Resolve a deferred value against `ctx`; plain values pass through.
    pub fn resolve_with(self, ctx: &Context) -> serde_json::Value {
        match self {
            Value::Plain(v) => v,
            Value::Deferred(f) => f.call(ctx),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Plain(a), Value::Plain(b)) => a == b,
            (Value::Deferred(a), Value::Deferred(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl From<Valuer> for Value {
    fn from(v: Valuer) -> Self {
        Value::Deferred(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Plain(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Plain(serde_json::Value::String(v.clone()))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Plain(serde_json::Value::Null),
        }
    }
}

macro_rules! impl_from_plain {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Plain(serde_json::Value::from(v))
                }
            }
        )*
    };
}

impl_from_plain!(&str, String, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// Whether `value` is computed at emission time.
pub fn is_deferred(value: &Value) -> bool {
    value.is_deferred()
}

/// Whether any value position (odd index) of `keyvals` holds a deferred value.
///
/// Keys are not inspected: a deferred value in a key position is not a
/// string and gets dropped by the builder instead.
pub fn contains_deferred(keyvals: &[Value]) -> bool {
    keyvals.iter().skip(1).step_by(2).any(is_deferred)
}

/// Replace every deferred value position of `keyvals` with its result
/// against `ctx`. Each position is evaluated at most once; plain values
/// are left untouched.
pub fn resolve(ctx: &Context, keyvals: &mut [Value]) {
    for slot in keyvals.iter_mut().skip(1).step_by(2) {
        if let Value::Deferred(f) = slot {
            let resolved = f.call(ctx);
            *slot = Value::Plain(resolved);
        }
    }
}

/// A valuer reporting the `file:function():line` of the logging call site.
///
/// See [`crate::caller`] for how frames are selected. A call site already
/// stored in the context under [`CALL_SITE_KEY`](crate::caller::CALL_SITE_KEY)
/// wins over the stack walk.
pub fn caller(skip: usize) -> Valuer {
    Valuer::new(move |ctx| match ctx.get(crate::caller::CALL_SITE_KEY) {
        Some(site) => site.clone(),
        None => serde_json::Value::String(crate::caller::locate(skip).to_string()),
    })
}

/// A valuer producing the current local time formatted with a chrono
/// strftime `layout`, evaluated anew on every resolution.
///
/// An invalid layout falls back to [`DEFAULT_TIMESTAMP_LAYOUT`].
pub fn timestamp(layout: &str) -> Valuer {
    let layout = if layout_is_valid(layout) {
        layout.to_string()
    } else {
        tracing::warn!(layout, "invalid timestamp layout, using default");
        DEFAULT_TIMESTAMP_LAYOUT.to_string()
    };
    Valuer::new(move |_| serde_json::Value::String(Local::now().format(&layout).to_string()))
}

/// A valuer reading `key` from the request context, `null` when absent.
pub fn from_context(key: impl Into<String>) -> Valuer {
    let key = key.into();
    Valuer::new(move |ctx| ctx.get(&key).cloned().unwrap_or(serde_json::Value::Null))
}

pub fn default_caller() -> Valuer {
    caller(DEFAULT_CALLER_SKIP)
}

pub fn default_timestamp() -> Valuer {
    timestamp(DEFAULT_TIMESTAMP_LAYOUT)
}

pub(crate) fn layout_is_valid(layout: &str) -> bool {
    !StrftimeItems::new(layout).any(|item| matches!(item, Item::Error))
}
