//! Structured logging helpers shared by the planner and region driver.
//!
//! Everything here is a thin layer over `tracing`; this module exists only
//! to give the rest of the crate a single place to call for "say this at
//! most once" warnings, since spec.md §4.4c asks for exactly one log line
//! per non-CPU processor rather than one per task that would have used it.

use std::collections::HashSet;
use std::fmt::Display;
use std::sync::{Mutex, OnceLock};

fn seen() -> &'static Mutex<HashSet<&'static str>> {
    static SEEN: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();
    SEEN.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Emits `tracing::warn!` the first time a given `key` is seen in this
/// process, and silently does nothing on every later call with the same
/// key. `key` should be a `'static` string identifying the *site*, not the
/// formatted message — e.g. `"non-cpu-processor"`, not the processor id.
pub fn warn_once(key: &'static str, message: impl Display) {
    let mut guard = seen().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if guard.insert(key) {
        tracing::warn!(%message, key, "one-time warning");
    }
}
