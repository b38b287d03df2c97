use std::collections::BTreeMap;

/// Request-scoped data handed to every deferred value at resolution time.
///
/// The logger never looks inside; it only threads the context through to
/// each [`Valuer`](crate::value::Valuer).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: BTreeMap<String, serde_json::Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this context with `key` set to `value`.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }
}
