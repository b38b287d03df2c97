pub mod level;
pub mod context;
pub mod value;
pub mod caller;
pub mod record;
pub mod sink;
pub mod logger;
pub mod noop_sink;
pub mod writer;
pub mod rotating;
pub mod forward;
pub mod tracing_bridge;

pub mod config;
pub mod env;
pub mod init;

pub use context::Context;
pub use level::Severity;
pub use logger::Logger;
pub use record::LogRecord;
pub use sink::{Sink, SinkError};
pub use value::{Value, Valuer};

/// Build a key/value argument list.
///
/// Every argument is converted with [`Value::from`], so keys and values may
/// be strings, numbers, booleans, JSON values or [`Valuer`]s:
///
/// ```
/// use structlog_sink::{kv, value};
///
/// let keyvals = kv!["message", "hello", "user", "alice", "ts", value::default_timestamp()];
/// assert_eq!(keyvals.len(), 6);
/// ```
#[macro_export]
macro_rules! kv {
    () => {
        ::std::vec::Vec::<$crate::value::Value>::new()
    };
    ($($item:expr),+ $(,)?) => {
        ::std::vec![$($crate::value::Value::from($item)),+]
    };
}
