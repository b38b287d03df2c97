use crate::level::Severity;
use crate::value::Value;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;

/// Field mapping of a record. Keys are unique; the last write wins.
pub type Fields = BTreeMap<String, serde_json::Value>;

/// Key whose value becomes the record message.
pub const MESSAGE_KEY: &str = "message";
/// Key carrying stack-trace text; also becomes the record message.
pub const STACK_KEY: &str = "stack";

/// A normalized record ready for a [`Sink`](crate::sink::Sink).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub level: Severity,
    pub message: String,
    /// `None` when no field survived normalization, so sinks can render a
    /// bare message differently from a message with fields.
    pub fields: Option<Fields>,
}

impl LogRecord {
    /// Normalize an already-resolved key/value list into a record.
    ///
    /// - an odd-length list is padded with an empty string value;
    /// - a pair whose key is not a string is dropped;
    /// - `message`, `stack` and the empty key set the message, the last one
    ///   in list order wins, and a non-string value yields an empty message;
    /// - every other key lands in `fields`, later duplicates overwriting
    ///   earlier ones.
    ///
    /// A value that is still deferred is recorded as `null`; callers are
    /// expected to [`resolve`](crate::value::resolve) first.
    pub fn from_keyvals(level: Severity, keyvals: Vec<Value>) -> Self {
        let mut message = String::new();
        let mut fields = Fields::new();

        let mut iter = keyvals.into_iter();
        while let Some(key) = iter.next() {
            let value = iter.next().unwrap_or_else(Value::empty);
            let key = match key {
                Value::Plain(serde_json::Value::String(key)) => key,
                _ => continue,
            };
            let value = match value {
                Value::Plain(v) => v,
                Value::Deferred(_) => serde_json::Value::Null,
            };

            if is_message_key(&key) {
                message = match value {
                    serde_json::Value::String(s) => s,
                    _ => String::new(),
                };
            } else {
                fields.insert(key, value);
            }
        }

        LogRecord {
            timestamp: Local::now(),
            level,
            message,
            fields: if fields.is_empty() { None } else { Some(fields) },
        }
    }

    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.as_ref().and_then(|f| f.get(key))
    }
}

/// Some framework adapters emit an empty key for the message; it is
/// treated like `message`.
fn is_message_key(key: &str) -> bool {
    key.is_empty() || key == MESSAGE_KEY || key == STACK_KEY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv;
    use serde_json::json;

    fn build(keyvals: Vec<Value>) -> LogRecord {
        LogRecord::from_keyvals(Severity::Info, keyvals)
    }

    #[test]
    fn odd_lists_are_padded_with_empty_string() {
        let record = build(kv!["x", 1, "y"]);
        assert_eq!(record.message, "");
        assert_eq!(record.fields, Some(Fields::from([
            ("x".to_string(), json!(1)),
            ("y".to_string(), json!("")),
        ])));
    }

    #[test]
    fn non_string_keys_drop_only_their_pair() {
        let record = build(kv!["a", 1, 7, "dropped", "b", 2, true, "also dropped"]);
        assert_eq!(record.fields, Some(Fields::from([
            ("a".to_string(), json!(1)),
            ("b".to_string(), json!(2)),
        ])));
        assert_eq!(record.message, "");
    }

    #[test]
    fn last_reserved_key_wins() {
        let record = build(kv!["message", "first", "stack", "trace"]);
        assert_eq!(record.message, "trace");
        let record = build(kv!["stack", "trace", "message", "second"]);
        assert_eq!(record.message, "second");
        assert!(record.fields.is_none());
    }

    #[test]
    fn empty_key_sets_the_message() {
        let record = build(kv!["", "from adapter", "k", "v"]);
        assert_eq!(record.message, "from adapter");
        assert_eq!(record.field("k"), Some(&json!("v")));
        assert_eq!(record.field(""), None);
    }

    #[test]
    fn non_string_message_becomes_empty() {
        let record = build(kv!["message", "hello", "message", 5]);
        assert_eq!(record.message, "");
    }

    #[test]
    fn later_duplicate_fields_overwrite() {
        let record = build(kv!["user", "alice", "user", "bob"]);
        assert_eq!(record.field("user"), Some(&json!("bob")));
    }

    #[test]
    fn message_only_has_no_fields() {
        let record = build(kv!["message", "hello"]);
        assert_eq!(record.message, "hello");
        assert_eq!(record.fields, None);
    }
}
