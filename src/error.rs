//! Standard error type for the planner and region driver.

use std;

use crate::exec::TaskHandle;

pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned by every fallible operation in this crate.
///
/// Implements the usual error traits.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `Deps` access contained something other than an `In`/`Out`/`InOut`
    /// tag constructor.
    #[error("invalid access: {0}")]
    InvalidAccess(String),

    /// A dynamic-mode task's scope could not be intersected with the local
    /// worker's scope.
    #[error("incompatible scope for task {0:?}: scopes do not intersect")]
    IncompatibleScope(TaskHandle),

    /// `with_region`'s `traversal` option was not one of `inorder`, `bfs`,
    /// `dfs`.
    #[error("invalid traversal order: {0:?}")]
    InvalidTraversal(String),

    /// `has_writedep(v, T)` or `is_writedep(v, T)` was asked about a task
    /// that never went through `enqueue`. This can only mean a planner bug.
    #[error("internal error: task {0:?} has no dependency record")]
    MissingTaskInLog(TaskHandle),

    /// After rewriting a task's arguments to their placed locations, an
    /// argument the task writes did not end up on the task's own space.
    /// This can only mean a planner bug.
    #[error("internal error: placement assertion failed for task {0:?}")]
    PlacementAssertion(TaskHandle),

    /// A task forwarded to the executor failed. The region surfaces the
    /// first such failure once all outstanding tasks have settled.
    #[error("task failed: {0}")]
    UserTaskFailure(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// An error surfaced by the topology contract (`taskdeps::topology`).
    #[error("topology error: {0}")]
    Topology(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// An error surfaced by the executor contract (`taskdeps::exec`).
    #[error("executor error: {0}")]
    Exec(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// An error surfaced by the data-move contract (`taskdeps::datamove`).
    #[error("data-move error: {0}")]
    DataMove(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    /// `MissingTaskInLog` and `PlacementAssertion` indicate a broken
    /// planner invariant rather than a recoverable condition: per spec,
    /// these are fatal and should not be retried or suppressed the way
    /// an ordinary `UserTaskFailure` can be.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::MissingTaskInLog(_) | Error::PlacementAssertion(_))
    }
}
