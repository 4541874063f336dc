//! The dependency recorder (C3, spec.md §4.3).
//!
//! `enqueue` is called once per submitted task. For each positional
//! argument it resolves the argument's spans, compares them against
//! everything previously recorded under the same value identity, and
//! either buffers the resulting edges into a static DAG or materialises
//! them as an immediate `syncdeps` set forwarded to the executor.

use std::collections::HashMap;

use taskdeps_extras::TaskGraph;

use crate::access::AnyAccess;
use crate::alias::AliasOracle;
use crate::datamove::{DataMove, MemorySpan};
use crate::error::{Error, Result};
use crate::exec::{ArgEntry, TaskHandle, TaskQueue, TaskSpec};
use crate::identity::{TrackedValue, ValueId};
use crate::access::AccessTag;
use crate::topology::ProcessorScope;

/// One positional argument's resolved record: its declared tag and the
/// spans it touches (flattened across sub-accesses for a `Deps` argument).
/// Spans are empty for an as-yet-unstarted task-handle argument, and —
/// per the open question spec.md §9 flags — for a task's own synthetic
/// result entry, which is never span-qualified.
#[derive(Debug, Clone)]
pub struct ArgRecord {
    /// Position of the originating argument in the task's argument list.
    /// A `Deps` argument contributes one `ArgRecord` per sub-access, all
    /// sharing this position — the planner groups them back together to
    /// place the argument as a whole (spec.md §4.4f).
    pub position: usize,
    pub value: ValueId,
    pub tag: AccessTag,
    pub spans: Vec<MemorySpan>,
    /// True iff this entry's spans are empty *because* the argument is an
    /// unstarted task handle (spec.md §4.2, §9), rather than because the
    /// data-move contract legitimately reported zero spans. The planner
    /// treats such a value as unconditionally written (it is the product
    /// of the referenced task completing) and resolves its sync through
    /// the task's own identity rather than span-based ownership.
    pub is_task_result: bool,
}

impl ArgRecord {
    pub fn writes(&self) -> bool {
        self.tag.write
    }
}

/// The full dependency record for one task (spec.md §3): one entry per
/// argument plus the synthetic self-entry.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub args: Vec<ArgRecord>,
    /// The identity the task's own result is keyed under (spec.md §4.3
    /// step 7's synthetic `(T,T)` self-entry). Recorded at submission
    /// time, when the handle is necessarily still unstarted, so this is
    /// always the handle's own identity rather than a later-assigned
    /// result identity — consumers that reference this task by handle
    /// resolve to the same key (`TrackedValue::value_id` for an unstarted
    /// handle), so the planner's write-dep summary lines up.
    pub self_value: ValueId,
}

type LogEntry = (AccessTag, Vec<MemorySpan>, TaskHandle);

/// Computes dependency edges against the per-value access log
/// (spec.md §4.3 step 5): a read conflicts with any prior write; a write
/// conflicts with any prior entry. Spans with no recorded extent (an
/// unstarted task handle, or a task's own synthetic self-entry) are
/// treated as matching unconditionally — they can only ever recur under
/// the exact same value identity, so there is nothing to disambiguate by
/// overlap.
fn spans_overlap<D: DataMove>(oracle: &AliasOracle<D>, a: &[MemorySpan], b: &[MemorySpan]) -> bool {
    if a.is_empty() || b.is_empty() {
        return true;
    }
    a.iter().any(|sa| b.iter().any(|sb| oracle.may_alias(sa, sb)))
}

/// Buffers dependency edges into a static DAG instead of dispatching
/// immediately (spec.md §4.3, "Static" mode).
pub struct StaticRecorder<'a, D: DataMove> {
    oracle: AliasOracle<'a, D>,
    graph: TaskGraph,
    records: Vec<TaskRecord>,
    handle_index: HashMap<TaskHandle, usize>,
    access_log: HashMap<ValueId, Vec<LogEntry>>,
    tasks: Vec<(TaskHandle, TaskSpec)>,
}

impl<'a, D: DataMove> StaticRecorder<'a, D> {
    pub fn new(oracle: AliasOracle<'a, D>) -> StaticRecorder<'a, D> {
        StaticRecorder {
            oracle,
            graph: TaskGraph::new(),
            records: Vec::new(),
            handle_index: HashMap::new(),
            access_log: HashMap::new(),
            tasks: Vec::new(),
        }
    }

    pub fn enqueue(&mut self, handle: TaskHandle, spec: TaskSpec) -> Result<()> {
        let vertex = self.graph.add_vertex();
        debug_assert_eq!(vertex, self.records.len());
        self.handle_index.insert(handle.clone(), vertex);

        let self_key = handle.value_id();
        let mut record = TaskRecord { args: Vec::new(), self_value: self_key };
        for arg in &spec.args {
            self.record_arg(vertex, arg, &handle, &mut record)?;
        }

        // Synthetic self-entry (spec.md §4.3 step 7): the task's own
        // result, tagged (T,T). Per the open question in spec.md §9, its
        // spans are not recorded — aliasing checks against it fall back
        // to the unconditional-match rule above.
        self.access_log.entry(self_key).or_default().push((AccessTag::INOUT, Vec::new(), handle.clone()));

        self.records.push(record);
        self.tasks.push((handle, spec));
        Ok(())
    }

    fn record_arg(
        &mut self,
        vertex: usize,
        arg: &ArgEntry,
        handle: &TaskHandle,
        record: &mut TaskRecord,
    ) -> Result<()> {
        let value = arg.access.value_id();
        let entries = effective_entries(&self.oracle, arg.access.as_ref());

        let prior = self.access_log.get(&value).cloned().unwrap_or_default();
        for (tag, spans, is_task_result) in &entries {
            for (prior_tag, prior_spans, prior_task) in &prior {
                let conflicts = tag.write || prior_tag.write;
                if conflicts && spans_overlap(&self.oracle, spans, prior_spans) {
                    let &prior_vertex = self
                        .handle_index
                        .get(prior_task)
                        .expect("every logged task has a vertex");
                    if prior_vertex != vertex {
                        tracing::trace!(from = prior_vertex, to = vertex, ?value, "dag edge");
                        self.graph.add_edge(prior_vertex, vertex);
                    }
                }
            }
            record.args.push(ArgRecord {
                position: arg.position,
                value,
                tag: *tag,
                spans: spans.clone(),
                is_task_result: *is_task_result,
            });
        }

        let bucket = self.access_log.entry(value).or_default();
        for (tag, spans, _) in entries {
            bucket.push((tag, spans, handle.clone()));
        }
        Ok(())
    }

    /// Consumes the recorder, handing the DAG, per-task dependency
    /// records, and buffered tasks to the planner (spec.md §4.4).
    pub fn into_parts(self) -> (TaskGraph, Vec<TaskRecord>, Vec<(TaskHandle, TaskSpec)>) {
        (self.graph, self.records, self.tasks)
    }
}

/// Materialises dependency edges as an immediate `syncdeps` set and
/// forwards the task to the executor right away (spec.md §4.3, "Dynamic"
/// mode). No DAG, no placement — C4 never runs in this mode.
pub struct DynamicRecorder<'a, D: DataMove, Q: TaskQueue> {
    oracle: AliasOracle<'a, D>,
    queue: &'a Q,
    local_scope: ProcessorScope,
    access_log: HashMap<ValueId, Vec<LogEntry>>,
}

impl<'a, D: DataMove, Q: TaskQueue> DynamicRecorder<'a, D, Q> {
    pub fn new(oracle: AliasOracle<'a, D>, queue: &'a Q, local_scope: ProcessorScope) -> Self {
        DynamicRecorder { oracle, queue, local_scope, access_log: HashMap::new() }
    }

    pub fn enqueue(&mut self, handle: TaskHandle, mut spec: TaskSpec) -> Result<()> {
        // Scope constraint (dynamic mode only, spec.md §4.3): the task's
        // configured scope is intersected with the local-worker scope.
        let configured = spec.options.scope.clone().unwrap_or(ProcessorScope::All);
        let constrained = configured
            .constrain(&self.local_scope)
            .ok_or_else(|| Error::IncompatibleScope(handle.clone()))?;
        spec.options.scope = Some(constrained);

        for arg in &spec.args {
            let value = arg.access.value_id();
            let entries = effective_entries(&self.oracle, arg.access.as_ref());
            let prior = self.access_log.get(&value).cloned().unwrap_or_default();
            for (tag, spans, _) in &entries {
                for (prior_tag, prior_spans, prior_task) in &prior {
                    let conflicts = tag.write || prior_tag.write;
                    if conflicts && spans_overlap(&self.oracle, spans, prior_spans) {
                        tracing::trace!(?value, task = ?prior_task, "dynamic syncdep");
                        spec.options.syncdeps.insert(prior_task.clone());
                    }
                }
            }
            let bucket = self.access_log.entry(value).or_default();
            for (tag, spans, _) in entries {
                bucket.push((tag, spans, handle.clone()));
            }
        }

        let self_key = handle.value_id();
        self.access_log.entry(self_key).or_default().push((AccessTag::INOUT, Vec::new(), handle.clone()));

        self.queue.enqueue(spec, handle).map_err(|e| Error::Exec(Box::new(e)))
    }
}

/// Resolves one argument down to its `(tag, spans, is_task_result)`
/// entries — one per sub-access for a `Deps` argument, or a single entry
/// otherwise. `is_task_result` is set when the spans are empty *because*
/// the argument is an unstarted task handle (spec.md §4.2, §9); the
/// planner treats such an argument as unconditionally written, since it is
/// the product of the referenced task completing rather than a span the
/// data-move contract ever got a chance to report on.
fn effective_entries<D: DataMove>(
    oracle: &AliasOracle<D>,
    arg: &dyn AnyAccess,
) -> Vec<(AccessTag, Vec<MemorySpan>, bool)> {
    if let Some(task_handle) = arg.as_task_handle() {
        if !task_handle.is_started() {
            return vec![(arg.access_tag(), Vec::new(), true)];
        }
    }

    let unwrapped = arg.unwrap();
    match unwrapped.subs {
        None => vec![(unwrapped.tag, oracle.spans(unwrapped.value, None), false)],
        Some(subs) => subs
            .iter()
            .map(|sub| (sub.tag, oracle.spans(unwrapped.value, Some(&sub.selector)), false))
            .collect(),
    }
}
