//! `taskdeps`: the core of a data-dependency task scheduler.
//!
//! Accepts an unordered stream of task submissions whose arguments carry
//! read/write access annotations ([`access::in_`], [`access::out`],
//! [`access::inout`], [`access::deps`]) and produces an execution plan that
//! preserves the sequential semantics of the submissions, inserts
//! data-movement operations between memory spaces as needed, and assigns
//! tasks to processors — all while interleaving user tasks with
//! scheduler-synthesised copy tasks.
//!
//! The executor that actually runs tasks, the topology/processor discovery
//! service, and the data-movement primitive are deliberately external: this
//! crate only depends on the [`exec`], [`topology`], and [`datamove`]
//! traits, never a concrete implementation of them. A region opens a fresh
//! dependency recorder, runs the caller's submissions against it, and — in
//! static mode — runs the placement & copy planner before waiting for
//! everything to settle:
//!
//! ```ignore
//! use std::sync::Arc;
//! use taskdeps::access::{in_, out};
//! use taskdeps::region::{with_region, RegionOptions};
//!
//! with_region(data_move, &topology, &executor, scope, RegionOptions::new(), |rec| {
//!     rec.enqueue(handle, task_spec)
//! })?;
//! ```

pub mod access;
pub mod alias;
pub mod datamove;
pub mod diagnostics;
pub mod error;
pub mod exec;
pub mod identity;
pub mod planner;
pub mod recorder;
pub mod region;
pub mod topology;

#[cfg(feature = "test-util")]
pub mod testing;

pub use crate::access::{deps, in_, inout, out, Access, AccessTag, Arg, SubAccess, Unwrapped};
pub use crate::alias::{AliasOracle, IdentityMode};
pub use crate::error::{Error, Result};
pub use crate::exec::{TaskBarrier, TaskHandle, TaskQueue, TaskSpec};
pub use crate::identity::{TrackedValue, ValueId};
pub use crate::region::{with_region, RegionOptions, RegionOptionsBuilder};
pub use taskdeps_extras::Traversal;
