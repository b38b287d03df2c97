//! Best-effort call site lookup for the [`caller`](crate::value::caller) valuer.
//!
//! The stack is walked with the `backtrace` crate. Frames of the walker
//! itself (unwinder, `backtrace` and this module) are never counted. After
//! `skip` further frames, at most [`MAX_CALLER_DEPTH`] frames are searched
//! for the first one that does not belong to this crate; that frame is the
//! call site.

use std::fmt;
use std::path::{Component, Path};

/// Upper bound on frames inspected after `skip`. Tunable, it only guards
/// against runaway scans when the internal frame count is miscounted.
pub const MAX_CALLER_DEPTH: usize = 11;

/// Symbol prefix of this module; its frames mark the end of the walker.
const MODULE_PREFIX: &str = "structlog_sink::caller::";

/// Frames tolerated before this module shows up. Without symbols it never
/// does, and the lookup gives up.
const MAX_WALKER_FRAMES: usize = 32;

/// Context key under which an entry point that already knows the call
/// site (such as the `tracing` bridge) hands it to the caller valuer.
pub const CALL_SITE_KEY: &str = "structlog_sink.call_site";

const INTERNAL_PREFIXES: &[&str] = &[
    "structlog_sink::",
    "<structlog_sink::",
    "tracing::",
    "<tracing::",
    "tracing_core::",
    "<tracing_core::",
    "tracing_subscriber::",
    "<tracing_subscriber::",
    "core::ops::function::",
    "<alloc::boxed::Box<F",
    "<alloc::sync::Arc<",
];

/// A resolved source location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSite {
    /// Last two segments of the source path, e.g. `src/handler.rs`.
    pub file: String,
    pub function: String,
    pub line: u32,
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}():{}", self.file, self.function, self.line)
    }
}

struct Frame {
    symbol: String,
    file: String,
    line: u32,
}

/// Find the first non-internal frame within the search window, or an empty
/// [`CallSite`] when there is none.
pub fn locate(skip: usize) -> CallSite {
    let frames = collect_frames(skip + MAX_CALLER_DEPTH);
    frames
        .into_iter()
        .skip(skip)
        .take(MAX_CALLER_DEPTH)
        .find(|frame| !is_internal(&frame.symbol))
        .map(|frame| CallSite {
            function: function_name(&frame.symbol).to_string(),
            file: frame.file,
            line: frame.line,
        })
        .unwrap_or_default()
}

/// Collect up to `limit` logical frames (inlined functions count as
/// frames) above the walker. The walker is everything up to and including
/// the frames of this module, which also covers unwinder and `backtrace`
/// internals of unknown depth.
fn collect_frames(limit: usize) -> Vec<Frame> {
    let mut frames = Vec::with_capacity(limit);
    let mut walker_frames = 0;
    let mut phase = Phase::BeforeWalker;

    backtrace::trace(|raw| {
        backtrace::resolve_frame(raw, |symbol| {
            let name = symbol.name().map(|n| format!("{:#}", n)).unwrap_or_default();
            let in_module = name.starts_with(MODULE_PREFIX);
            phase = match (phase, in_module) {
                (Phase::BeforeWalker, false) => {
                    walker_frames += 1;
                    Phase::BeforeWalker
                }
                (Phase::BeforeWalker, true) | (Phase::InWalker, true) => Phase::InWalker,
                (Phase::InWalker, false) | (Phase::Above, _) => Phase::Above,
            };
            if phase == Phase::Above && frames.len() < limit {
                frames.push(Frame {
                    symbol: name,
                    file: symbol.filename().map(shorten_path).unwrap_or_default(),
                    line: symbol.lineno().unwrap_or(0),
                });
            }
        });
        frames.len() < limit && walker_frames < MAX_WALKER_FRAMES
    });

    frames
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    BeforeWalker,
    InWalker,
    Above,
}

fn is_internal(symbol: &str) -> bool {
    INTERNAL_PREFIXES.iter().any(|p| symbol.starts_with(p))
}

pub(crate) fn function_name(symbol: &str) -> &str {
    symbol.rsplit("::").next().unwrap_or(symbol)
}

/// Keep only the last two path segments.
pub(crate) fn shorten_path(path: &Path) -> String {
    let tail: Vec<_> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    let start = tail.len().saturating_sub(2);
    tail[start..].join("/")
}
