//! The placement & copy planner (C4, spec.md §4.4). Runs once, at region
//! close, over the static DAG the recorder built. Walks the DAG in the
//! requested traversal order, round-robins tasks onto CPU processors,
//! and synthesises copy-in tasks whenever an argument's current location
//! does not match the processor it is about to run on. At the end,
//! synthesises writeback copies for anything left away from where the
//! caller originally handed it in.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use taskdeps_extras::{OwnershipMap, TaskGraph, Traversal};

use crate::access::AccessTag;
use crate::alias::{AliasOracle, IdentityMode};
use crate::datamove::{DataMove, MemorySpan};
use crate::diagnostics::warn_once;
use crate::error::{Error, Result};
use crate::exec::{ResolvedArg, TaskBody, TaskError, TaskHandle, TaskQueue, TaskSpec};
use crate::identity::{TrackedValue, ValueId};
use crate::recorder::TaskRecord;
use crate::topology::{MemorySpace, Processor, ProcessorKind, ProcessorScope, Topology};

/// One argument's write-dep touch: which task (by submission index) read
/// or wrote which spans of a value. Built once, up front, from every
/// task's dependency record (spec.md §4.4a).
struct Touch {
    task_index: usize,
    tag: AccessTag,
    spans: Vec<MemorySpan>,
}

/// Where a tracked value currently lives, and where it originally came
/// from (spec.md §3's locality map). `origin` is immutable after first
/// insertion.
#[derive(Debug, Clone, Copy)]
struct Locality {
    origin: MemorySpace,
    current: MemorySpace,
}

pub struct Planner<'p, D: DataMove, T: Topology, Q: TaskQueue> {
    data_move: Arc<D>,
    mode: IdentityMode,
    topology: &'p T,
    queue: &'p Q,
    /// The ambient scope processor enumeration is filtered against (spec.md
    /// §4.4b: "gather all processors from all workers, filter by the
    /// ambient scope, and retain only those of the CPU kind"), separate
    /// from the per-task scope placement assigns afterward.
    scope: ProcessorScope,
    touches: HashMap<ValueId, Vec<Touch>>,
    self_values: HashSet<ValueId>,
    ownership: OwnershipMap<MemorySpan, TaskHandle>,
    locality: HashMap<ValueId, Locality>,
    /// `(space, value)` pairs for which the synchronous slot-allocation
    /// call (spec.md §4.4d) has already run, so a value relocated once and
    /// then read again from the same space is not re-allocated.
    allocated_slots: HashSet<(ValueId, MemorySpace)>,
}

impl<'p, D: DataMove, T: Topology, Q: TaskQueue> Planner<'p, D, T, Q> {
    pub fn new(
        data_move: Arc<D>,
        mode: IdentityMode,
        topology: &'p T,
        queue: &'p Q,
        scope: ProcessorScope,
    ) -> Self {
        Planner {
            data_move,
            mode,
            topology,
            queue,
            scope,
            touches: HashMap::new(),
            self_values: HashSet::new(),
            ownership: OwnershipMap::new(),
            locality: HashMap::new(),
            allocated_slots: HashSet::new(),
        }
    }

    fn oracle(&self) -> AliasOracle<'_, D> {
        AliasOracle::new(&*self.data_move, self.mode)
    }

    /// Runs the full pipeline (spec.md §4.4 a–g) over a DAG the recorder
    /// produced. Consumes `tasks` since every task's body and options are
    /// rewritten in place before being handed to the executor.
    pub fn plan(
        mut self,
        graph: &TaskGraph,
        records: &[TaskRecord],
        traversal: Traversal,
        tasks: Vec<(TaskHandle, TaskSpec)>,
    ) -> Result<()> {
        self.build_write_dep_summary(records);
        let procs = self.enumerate_processors()?;
        if procs.is_empty() {
            // Nothing to place on; an empty region (no tasks) reaches
            // here too, so this is not by itself an error condition.
            return Ok(());
        }
        self.seed_initial_locality(records);

        // Which task produced each self-value, so a consumer referencing
        // a producer's task handle can be made to wait on it explicitly —
        // the ownership map never gets an entry for a task-result argument
        // (its spans are always empty), so that sync cannot come from the
        // span-based machinery the way an ordinary argument's does.
        let self_handle_by_value: HashMap<ValueId, TaskHandle> =
            tasks.iter().map(|(h, _)| (h.value_id(), h.clone())).collect();

        let mut slots: Vec<Option<(TaskHandle, TaskSpec)>> = tasks.into_iter().map(Some).collect();
        let order = graph.traverse(traversal);
        let mut proc_idx = 0usize;

        for vertex in order {
            let (handle, mut spec) = slots[vertex].take().expect("each vertex visited once");
            let record = &records[vertex];
            let our_proc = procs[proc_idx % procs.len()];
            let our_space = self.space_of(our_proc)?;
            proc_idx += 1;

            // Group this task's ArgRecords by argument position: a `Deps`
            // argument contributes several entries (one per sub-access)
            // that all describe the same underlying value and must be
            // placed together (spec.md §4.4f).
            let mut by_position: Vec<(usize, ValueId, bool, Vec<&crate::recorder::ArgRecord>)> = Vec::new();
            for arg in &record.args {
                if let Some(slot) = by_position.iter_mut().find(|(pos, _, _, _)| *pos == arg.position) {
                    slot.3.push(arg);
                } else {
                    by_position.push((arg.position, arg.value, arg.is_task_result, vec![arg]));
                }
            }

            // Extra syncdeps owed to task-handle arguments: their sync
            // cannot come from span-based ownership (they have none), so
            // the producing task's handle is threaded through here
            // instead and merged into T's syncdeps below.
            let mut extra_syncdeps: BTreeSet<TaskHandle> = BTreeSet::new();

            for (position, value, is_task_result, group) in &by_position {
                let value = *value;
                let group_spans: Vec<MemorySpan> =
                    group.iter().flat_map(|a| a.spans.iter().cloned()).collect();
                let writes = group.iter().any(|a| a.writes());
                let producer = self_handle_by_value.get(&value).cloned();

                let needs_copy = *is_task_result
                    || self.has_writedep_at_or_before(value, &group_spans, vertex);

                if needs_copy {
                    let src = self
                        .locality
                        .get(&value)
                        .map(|l| l.current)
                        .or_else(|| self.topology.memory_space_of(value))
                        .unwrap_or(our_space);

                    if src != our_space {
                        self.allocate_slot(value, src, our_proc)?;

                        let mut syncdeps = self.write_deps_for(&group_spans);
                        if *is_task_result {
                            syncdeps.extend(producer.clone());
                        }
                        tracing::trace!(?value, from = ?src, to = ?our_space, "synthesizing copy-in task");
                        let copy_handle = TaskHandle::new();
                        let dm = self.data_move.clone();
                        let body: TaskBody = Box::new(move |_resolved: &[ResolvedArg]| -> std::result::Result<(), TaskError> {
                            dm.copy_to(value, src, our_space).map_err(|e| Box::new(e) as TaskError)
                        });
                        let mut copy_spec = TaskSpec::new(body, Vec::new());
                        copy_spec.options.scope = Some(ProcessorScope::single(our_proc.id));
                        copy_spec.options.syncdeps = syncdeps;
                        self.queue
                            .enqueue(copy_spec, copy_handle.clone())
                            .map_err(|e| Error::Exec(Box::new(e)))?;

                        if *is_task_result {
                            extra_syncdeps.insert(copy_handle.clone());
                        } else {
                            for span in &group_spans {
                                self.ownership.record_write(span.clone(), copy_handle.clone());
                            }
                        }
                        self.locality
                            .entry(value)
                            .and_modify(|l| l.current = our_space)
                            .or_insert(Locality { origin: src, current: our_space });
                    } else {
                        if *is_task_result {
                            extra_syncdeps.extend(producer.clone());
                        }
                        self.locality
                            .entry(value)
                            .or_insert(Locality { origin: our_space, current: our_space });
                    }
                }

                let resolved_space = if needs_copy {
                    our_space
                } else {
                    self.locality
                        .get(&value)
                        .map(|l| l.current)
                        .or_else(|| self.topology.memory_space_of(value))
                        .unwrap_or(our_space)
                };

                // Placement assertion (spec.md §4.4f step 3): any argument
                // T itself writes must end up on T's own space.
                if writes && resolved_space != our_space {
                    return Err(Error::PlacementAssertion(handle.clone()));
                }

                spec.options.resolved_args.push(ResolvedArg { position: *position, value, space: resolved_space });
            }

            // T's own syncdeps (spec.md §4.4f step 4), computed from the
            // ownership state as updated by every copy-in above.
            let mut syncdeps = extra_syncdeps;
            for (_, _value, is_task_result, group) in &by_position {
                if *is_task_result {
                    continue;
                }
                let spans: Vec<MemorySpan> = group.iter().flat_map(|a| a.spans.iter().cloned()).collect();
                let writes = group.iter().any(|a| a.writes());
                if writes {
                    syncdeps.extend(self.write_deps_for(&spans));
                } else {
                    syncdeps.extend(self.read_deps_for(&spans));
                }
            }
            spec.options.syncdeps.extend(syncdeps);
            spec.options.scope = Some(ProcessorScope::single(our_proc.id));

            self.queue.enqueue(spec, handle.clone()).map_err(|e| Error::Exec(Box::new(e)))?;

            // Ownership update (spec.md §4.4f step 7): the writer counts
            // as a reader for subsequent read-after-write queries.
            for (_, value, is_task_result, group) in &by_position {
                if *is_task_result {
                    continue;
                }
                let writes = group.iter().any(|a| a.writes());
                for span in group.iter().flat_map(|a| a.spans.iter().cloned()) {
                    if writes {
                        self.ownership.record_write(span, handle.clone());
                    } else {
                        self.ownership.record_read(span, handle.clone());
                    }
                }
                if writes {
                    self.locality.entry(*value).and_modify(|l| l.current = our_space);
                }
            }
            self.locality.insert(record.self_value, Locality { origin: our_space, current: our_space });
        }

        self.writeback(records)
    }

    /// spec.md §4.4a: one pass over every task's dependency record,
    /// building the per-value touch list the rest of planning queries.
    fn build_write_dep_summary(&mut self, records: &[TaskRecord]) {
        for (index, record) in records.iter().enumerate() {
            self.self_values.insert(record.self_value);
            for arg in &record.args {
                self.touches.entry(arg.value).or_default().push(Touch {
                    task_index: index,
                    tag: arg.tag,
                    spans: arg.spans.clone(),
                });
            }
        }
    }

    /// `has_writedep(v, T)` (spec.md §4.4a): any writer at or before `T`
    /// in submission order whose spans may alias `spans` (or either side
    /// is the empty-spans sentinel, which always matches).
    fn has_writedep_at_or_before(&self, value: ValueId, spans: &[MemorySpan], at_or_before: usize) -> bool {
        let oracle = self.oracle();
        match self.touches.get(&value) {
            None => false,
            Some(touches) => touches.iter().any(|t| {
                t.tag.write
                    && t.task_index <= at_or_before
                    && (spans.is_empty() || t.spans.is_empty() || spans.iter().any(|s| t.spans.iter().any(|ts| oracle.may_alias(s, ts))))
            }),
        }
    }

    /// `get_write_deps` (spec.md §4.4f step 4): owner ∪ readers of every
    /// tracked span aliasing `spans`.
    fn write_deps_for(&self, spans: &[MemorySpan]) -> BTreeSet<TaskHandle> {
        let oracle = self.oracle();
        let mut deps = BTreeSet::new();
        for tracked in self.ownership.tracked_spans() {
            if spans.iter().any(|s| oracle.may_alias(s, tracked)) {
                if let Some(owner) = self.ownership.owner(tracked) {
                    deps.insert(owner.clone());
                }
                deps.extend(self.ownership.readers(tracked).cloned());
            }
        }
        deps
    }

    /// `get_read_deps` (spec.md §4.4f step 4): owner only.
    fn read_deps_for(&self, spans: &[MemorySpan]) -> BTreeSet<TaskHandle> {
        let oracle = self.oracle();
        let mut deps = BTreeSet::new();
        for tracked in self.ownership.tracked_spans() {
            if spans.iter().any(|s| oracle.may_alias(s, tracked)) {
                if let Some(owner) = self.ownership.owner(tracked) {
                    deps.insert(owner.clone());
                }
            }
        }
        deps
    }

    /// spec.md §4.4b: gather all processors from all workers, filter by
    /// the ambient scope, and retain only those of the CPU kind. Non-CPU
    /// processors are dropped with a one-shot warning rather than an error
    /// (spec.md §7); processors outside the ambient scope are dropped
    /// silently, the same way a scope restriction silently narrows
    /// placement everywhere else in the spec.
    fn enumerate_processors(&self) -> Result<Vec<Processor>> {
        let mut procs = Vec::new();
        for worker in self.topology.workers() {
            let worker_procs = self.topology.processors(worker).map_err(|e| Error::Topology(Box::new(e)))?;
            for proc in worker_procs {
                if !self.scope.contains(proc.id) {
                    continue;
                }
                match proc.kind {
                    ProcessorKind::Cpu => procs.push(proc),
                    ProcessorKind::Other => {
                        warn_once(
                            "non-cpu-processor-filtered",
                            format!("processor {:?} on worker {:?} is not CPU-class and was skipped", proc.id, proc.worker),
                        );
                    }
                }
            }
        }
        Ok(procs)
    }

    fn space_of(&self, proc: Processor) -> Result<MemorySpace> {
        let spaces = self.topology.memory_spaces(proc.id).map_err(|e| Error::Topology(Box::new(e)))?;
        Ok(spaces.into_iter().next().unwrap_or(MemorySpace(proc.id.0)))
    }

    /// spec.md §4.4d: pre-allocates the destination slot for `value` in
    /// `dest_proc`'s memory space, synchronously, before any copy-in task
    /// that will later populate it is scheduled. Per spec.md §5, this call
    /// is the planner's only suspension point; everything else it does is
    /// either pure bookkeeping or handed to the executor as an async task.
    /// A no-op past the first call for a given `(space, value)` pair — the
    /// slot, once allocated, is reused by every later task placed on the
    /// same space.
    fn allocate_slot(&mut self, value: ValueId, src: MemorySpace, dest_proc: Processor) -> Result<()> {
        let dest_space = self.space_of(dest_proc)?;
        if !self.allocated_slots.insert((value, dest_space)) {
            return Ok(());
        }
        let src_proc = self
            .topology
            .space_processors(src)
            .map_err(|e| Error::Topology(Box::new(e)))?
            .into_iter()
            .next()
            .unwrap_or(dest_proc.id);
        tracing::debug!(?value, from = ?src, to = ?dest_space, "allocating remote slot");
        self.data_move
            .move_value(src_proc, dest_proc.id, value)
            .map_err(|e| Error::DataMove(Box::new(e)))?;
        Ok(())
    }

    /// spec.md §4.4c: seed origin/current for every value the region
    /// writes — per invariant 2, a value appears in the locality map iff
    /// at least one task has written it. Values that are themselves a
    /// task's own result are excluded here; their locality is set when
    /// that task is placed (step 7 below), since no topology lookup can
    /// answer "where does this not-yet-run task's output live".
    fn seed_initial_locality(&mut self, records: &[TaskRecord]) {
        let written: HashSet<ValueId> = records
            .iter()
            .flat_map(|r| r.args.iter())
            .filter(|a| a.writes())
            .map(|a| a.value)
            .collect();
        for value in written {
            if self.self_values.contains(&value) {
                continue;
            }
            if let Some(space) = self.topology.memory_space_of(value) {
                self.locality.insert(value, Locality { origin: space, current: space });
            }
        }
    }

    /// spec.md §4.4g: for every written value left away from where it
    /// came from, synthesise a copy-out task back to `origin`.
    fn writeback(&mut self, records: &[TaskRecord]) -> Result<()> {
        let written: HashSet<ValueId> = records
            .iter()
            .flat_map(|r| r.args.iter())
            .filter(|a| a.writes())
            .map(|a| a.value)
            .collect();

        for value in written {
            if self.self_values.contains(&value) {
                continue;
            }
            let Some(locality) = self.locality.get(&value).copied() else { continue };
            if locality.current == locality.origin {
                continue;
            }
            let value_spans = self.touches.get(&value).map(|ts| {
                ts.iter().flat_map(|t| t.spans.iter().cloned()).collect::<Vec<_>>()
            }).unwrap_or_default();
            let syncdeps = self.write_deps_for(&value_spans);
            let dest_procs = self
                .topology
                .space_processors(locality.origin)
                .map_err(|e| Error::Topology(Box::new(e)))?;
            let Some(&dest_proc) = dest_procs.first() else { continue };

            tracing::trace!(?value, from = ?locality.current, to = ?locality.origin, "synthesizing writeback task");
            let dm = self.data_move.clone();
            let (src, dst) = (locality.current, locality.origin);
            let body: TaskBody = Box::new(move |_resolved: &[ResolvedArg]| -> std::result::Result<(), TaskError> {
                dm.copy_to(value, src, dst).map_err(|e| Box::new(e) as TaskError)
            });
            let mut copy_spec = TaskSpec::new(body, Vec::new());
            copy_spec.options.scope = Some(ProcessorScope::single(dest_proc));
            copy_spec.options.syncdeps = syncdeps;
            self.queue
                .enqueue(copy_spec, TaskHandle::new())
                .map_err(|e| Error::Exec(Box::new(e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{in_, out, AnyAccess};
    use crate::alias::IdentityMode;
    use crate::exec::{ArgEntry, TaskBarrier, TaskBody, TaskSpec};
    use crate::identity::TrackedValue;
    use crate::recorder::StaticRecorder;
    use crate::testing::mock::{MockDataMove, MockExecutor, MockTopology};
    use crate::topology::{Processor, ProcessorId, ProcessorKind, WorkerId};
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    fn noop() -> TaskBody {
        Box::new(|_args| Ok(()))
    }

    fn arg(position: usize, access: Box<dyn AnyAccess>) -> ArgEntry {
        ArgEntry { position, access }
    }

    /// A reader placed on a processor other than the value's origin
    /// forces a copy-in synthesised ahead of it; once the value is left
    /// there, region close synthesises a writeback back to origin.
    #[test]
    fn relocated_reader_gets_a_copy_in_and_a_final_writeback() {
        let dm = Arc::new(MockDataMove::new());
        let topo = MockTopology::new(2);
        let exec = MockExecutor::new();

        let x = Arc::new(1u32);
        topo.place(x.value_id(), MemorySpace(0));

        let oracle = AliasOracle::new(&*dm, IdentityMode::Aliasing);
        let mut rec = StaticRecorder::new(oracle);
        let writer = TaskHandle::new();
        let reader = TaskHandle::new();
        rec.enqueue(writer.clone(), TaskSpec::new(noop(), vec![arg(0, Box::new(out(x.clone())))])).unwrap();
        rec.enqueue(reader.clone(), TaskSpec::new(noop(), vec![arg(0, Box::new(in_(x.clone())))])).unwrap();
        let (graph, records, tasks) = rec.into_parts();

        let planner = Planner::new(dm.clone(), IdentityMode::Aliasing, &topo, &exec, ProcessorScope::All);
        planner.plan(&graph, &records, Traversal::Inorder, tasks).unwrap();
        exec.wait_all().unwrap();

        let copies = dm.copy_log();
        assert_eq!(copies.len(), 2, "expected one copy-in and one writeback, got {copies:?}");
        assert_eq!(copies[0], (x.value_id(), MemorySpace(0), MemorySpace(1)));
        assert_eq!(copies[1], (x.value_id(), MemorySpace(1), MemorySpace(0)));

        // The copy-in is preceded by a synchronous slot allocation
        // (spec.md §4.4d) — a distinct call from the scheduled `copy_to`
        // task above, not folded into it.
        let moves = dm.move_log();
        assert_eq!(moves, vec![(x.value_id(), ProcessorId(0), ProcessorId(1))]);
    }

    /// A value no task ever writes never enters the locality map and is
    /// never copied, regardless of where it is placed (spec.md §8
    /// scenario 6).
    #[test]
    fn read_only_value_never_allocated_a_slot() {
        let dm = Arc::new(MockDataMove::new());
        let topo = MockTopology::new(2);
        let exec = MockExecutor::new();

        let x = Arc::new(1u32);
        topo.place(x.value_id(), MemorySpace(0));

        let oracle = AliasOracle::new(&*dm, IdentityMode::Aliasing);
        let mut rec = StaticRecorder::new(oracle);
        rec.enqueue(TaskHandle::new(), TaskSpec::new(noop(), vec![arg(0, Box::new(in_(x.clone())))])).unwrap();
        rec.enqueue(TaskHandle::new(), TaskSpec::new(noop(), vec![arg(0, Box::new(in_(x.clone())))])).unwrap();
        let (graph, records, tasks) = rec.into_parts();

        let planner = Planner::new(dm.clone(), IdentityMode::Aliasing, &topo, &exec, ProcessorScope::All);
        planner.plan(&graph, &records, Traversal::Inorder, tasks).unwrap();
        exec.wait_all().unwrap();

        assert!(dm.copy_log().is_empty());
    }

    struct RecordingQueue {
        log: Mutex<Vec<(ProcessorScope, Vec<ResolvedArg>)>>,
    }

    impl RecordingQueue {
        fn new() -> RecordingQueue {
            RecordingQueue { log: Mutex::new(Vec::new()) }
        }
    }

    impl TaskQueue for RecordingQueue {
        type Error = Infallible;

        fn enqueue(&self, spec: TaskSpec, _handle: TaskHandle) -> Result<(), Infallible> {
            self.log.lock().unwrap().push((spec.options.scope.clone().unwrap(), spec.options.resolved_args.clone()));
            Ok(())
        }
    }

    /// Round-robin: task i (1-indexed, traversal order) lands on processor
    /// `((i-1) mod P)+1` (spec.md §8).
    #[test]
    fn tasks_are_round_robined_across_processors() {
        let dm = Arc::new(MockDataMove::new());
        let topo = MockTopology::new(2);
        let queue = RecordingQueue::new();

        let oracle = AliasOracle::new(&*dm, IdentityMode::Aliasing);
        let mut rec = StaticRecorder::new(oracle);
        for _ in 0..3 {
            let v = Arc::new(1u32);
            rec.enqueue(TaskHandle::new(), TaskSpec::new(noop(), vec![arg(0, Box::new(in_(v)))])).unwrap();
        }
        let (graph, records, tasks) = rec.into_parts();

        let planner = Planner::new(dm, IdentityMode::Aliasing, &topo, &queue, ProcessorScope::All);
        planner.plan(&graph, &records, Traversal::Inorder, tasks).unwrap();

        let log = queue.log.into_inner().unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].0, ProcessorScope::single(ProcessorId(0)));
        assert_eq!(log[1].0, ProcessorScope::single(ProcessorId(1)));
        assert_eq!(log[2].0, ProcessorScope::single(ProcessorId(0)));
    }

    struct MixedTopology;

    impl Topology for MixedTopology {
        type Error = Infallible;

        fn workers(&self) -> Vec<WorkerId> {
            vec![WorkerId(0)]
        }

        fn processors(&self, _worker: WorkerId) -> std::result::Result<Vec<Processor>, Infallible> {
            Ok(vec![
                Processor { id: ProcessorId(0), worker: WorkerId(0), kind: ProcessorKind::Cpu },
                Processor { id: ProcessorId(1), worker: WorkerId(0), kind: ProcessorKind::Other },
            ])
        }

        fn memory_spaces(&self, proc: ProcessorId) -> std::result::Result<Vec<MemorySpace>, Infallible> {
            Ok(vec![MemorySpace(proc.0)])
        }

        fn space_processors(&self, space: MemorySpace) -> std::result::Result<Vec<ProcessorId>, Infallible> {
            Ok(vec![ProcessorId(space.0)])
        }

        fn memory_space_of(&self, _value: ValueId) -> Option<MemorySpace> {
            None
        }
    }

    /// Non-CPU processors are filtered out of placement entirely rather
    /// than rejected (spec.md §9 "Non-CPU support").
    #[test]
    fn non_cpu_processors_are_filtered_from_placement() {
        let dm = Arc::new(MockDataMove::new());
        let topo = MixedTopology;
        let exec = MockExecutor::new();
        let planner = Planner::new(dm, IdentityMode::Aliasing, &topo, &exec, ProcessorScope::All);
        let procs = planner.enumerate_processors().unwrap();
        assert_eq!(procs, vec![Processor { id: ProcessorId(0), worker: WorkerId(0), kind: ProcessorKind::Cpu }]);
    }

    /// A processor outside the ambient scope is dropped during enumeration
    /// even though it is CPU-class (spec.md §4.4b: "gather all processors
    /// from all workers, filter by the ambient scope, and retain only
    /// those of the CPU kind").
    #[test]
    fn processors_outside_the_ambient_scope_are_dropped() {
        let dm = Arc::new(MockDataMove::new());
        let topo = MockTopology::new(3);
        let exec = MockExecutor::new();
        let scope = ProcessorScope::of_worker([ProcessorId(0), ProcessorId(2)]);
        let planner = Planner::new(dm, IdentityMode::Aliasing, &topo, &exec, scope);
        let procs = planner.enumerate_processors().unwrap();
        let ids: Vec<_> = procs.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![ProcessorId(0), ProcessorId(2)]);
    }
}
