//! The executor contract (consumed, spec.md §6): task identity, task
//! specs, and the `enqueue` operation the region driver and planner both
//! forward onto. This crate never runs a task body itself — only the
//! external executor does — but it needs a stable, equality-comparable
//! handle for "the thing that was submitted" and a place to stash the
//! `syncdeps`/`scope` options spec.md §3 says every dependency record and
//! placement decision is keyed on.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::access::AnyAccess;
use crate::identity::{TrackedValue, ValueId};
use crate::topology::{MemorySpace, ProcessorScope};

pub type TaskError = Box<dyn std::error::Error + Send + Sync + 'static>;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(0);

struct TaskHandleInner {
    id: u64,
    /// Set once the task starts: the identity of its output data object.
    /// `None` means unstarted — spans must not be probed yet (spec.md
    /// §4.2, §9).
    started: OnceLock<ValueId>,
}

/// An opaque, equality-comparable identity for a submitted task.
///
/// May be unstarted (its output not yet materialised as a value) or
/// started (its output is addressable by the scheduler). Task handles are
/// themselves values and may appear as arguments to later tasks.
#[derive(Clone)]
pub struct TaskHandle(Arc<TaskHandleInner>);

impl TaskHandle {
    pub fn new() -> TaskHandle {
        let id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
        TaskHandle(Arc::new(TaskHandleInner { id, started: OnceLock::new() }))
    }

    /// Marks this handle as started, recording the identity of the data
    /// object its output now addresses. Idempotent: a handle started twice
    /// with the same identity is a no-op; started twice with a *different*
    /// identity is a logic error in the caller and panics, since a task's
    /// result identity cannot change after it is first observed.
    pub fn mark_started(&self, result: ValueId) {
        if let Err(_already) = self.started.set(result) {
            assert_eq!(
                *self.started.get().unwrap(),
                result,
                "TaskHandle started twice with different result identities"
            );
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.get().is_some()
    }

    /// Marks this handle as started, using its own identity as the result.
    /// The common case: most tasks exist only to gate downstream work
    /// (scenario: `t2 = consume(In(t1))`) rather than to hand back a
    /// distinct output value — real payloads still flow through ordinary
    /// `Out` arguments the caller supplied. An executor with a genuine
    /// distinct output identity should call `mark_started` directly
    /// instead.
    pub fn mark_started_self(&self) {
        let id = self.own_identity();
        self.mark_started(id);
    }

    pub fn result(&self) -> Option<ValueId> {
        self.started.get().copied()
    }

    fn own_identity(&self) -> ValueId {
        ValueId::from_addr(Arc::as_ptr(&self.0) as *const () as usize)
    }
}

impl Default for TaskHandle {
    fn default() -> Self {
        TaskHandle::new()
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TaskHandle({})", self.0.id)
    }
}

impl PartialEq for TaskHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}
impl Eq for TaskHandle {}

impl std::hash::Hash for TaskHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PartialOrd for TaskHandle {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for TaskHandle {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl TrackedValue for TaskHandle {
    /// Per spec.md §4.3 step 2: a started handle's dependency key is the
    /// underlying data object; an unstarted handle's key is the handle
    /// itself.
    fn value_id(&self) -> ValueId {
        self.result().unwrap_or_else(|| self.own_identity())
    }

    fn as_task_handle(&self) -> Option<TaskHandle> {
        Some(self.clone())
    }
}

/// One resolved argument: where a task's argument `position` actually
/// lives once the planner has placed the task (spec.md §4.4f step 2). Only
/// populated in static mode; dynamic mode performs no placement.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedArg {
    pub position: usize,
    pub value: ValueId,
    pub space: MemorySpace,
}

/// The `syncdeps`/`scope` options every `task_spec` carries (spec.md §6).
#[derive(Default)]
pub struct TaskOptions {
    pub syncdeps: BTreeSet<TaskHandle>,
    pub scope: Option<ProcessorScope>,
    pub resolved_args: Vec<ResolvedArg>,
}

impl fmt::Debug for TaskOptions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TaskOptions")
            .field("syncdeps", &self.syncdeps)
            .field("scope", &self.scope)
            .field("resolved_args", &self.resolved_args)
            .finish()
    }
}

/// One positional argument: its declared access plus its position in the
/// task's argument list.
pub struct ArgEntry {
    pub position: usize,
    pub access: Box<dyn AnyAccess>,
}

/// A function the executor invokes once a task's dependencies are
/// satisfied. Receives the resolved placement of every argument (empty in
/// dynamic mode, since no placement occurs there).
pub type TaskBody = Box<dyn FnOnce(&[ResolvedArg]) -> Result<(), TaskError> + Send>;

/// Everything needed to submit one task: its body, its declared argument
/// accesses, and its (initially empty) options.
pub struct TaskSpec {
    pub body: TaskBody,
    pub args: Vec<ArgEntry>,
    pub options: TaskOptions,
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("args", &self.args.iter().map(|a| a.position).collect::<Vec<_>>())
            .field("options", &self.options)
            .finish()
    }
}

impl TaskSpec {
    pub fn new(body: TaskBody, args: Vec<ArgEntry>) -> TaskSpec {
        TaskSpec { body, args, options: TaskOptions::default() }
    }
}

/// The executor contract (consumed): `enqueue` is the only operation the
/// core calls on it. `syncdeps` is honoured as a happens-before
/// constraint; `scope` restricts execution to a set of processors.
pub trait TaskQueue {
    type Error: std::error::Error + Send + Sync + 'static;

    fn enqueue(&self, spec: TaskSpec, handle: TaskHandle) -> Result<(), Self::Error>;
}

/// The region-wait barrier (consumed). spec.md §1 lists "the ambient
/// 'region' construct that waits for outstanding tasks" as a collaborator
/// deliberately excluded from the core, separate from the executor's
/// `enqueue` — §6 enumerates the executor contract as `enqueue` alone,
/// with no completion signal. This trait is that missing half: whatever
/// runs task bodies also has to be asked, separately, to block until they
/// settle. Most real executors implement both on the same type (the mock
/// in `taskdeps::testing` does), but the core only ever depends on the
/// trait, never a concrete queue.
pub trait TaskBarrier {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Blocks until every task enqueued through this barrier so far has
    /// completed. Returns the first task failure encountered, if any
    /// (spec.md §7: "the region surfaces the first such failure after
    /// waiting for the rest").
    fn wait_all(&self) -> Result<(), Self::Error>;
}
