//! Minimal in-memory `Topology`, `DataMove`, and `TaskQueue` implementations
//! used by this crate's own integration tests (and available to downstream
//! callers prototyping against the planner).

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::channel::oneshot;
use futures::executor::ThreadPool;
use futures::future::Shared;
use futures::FutureExt;

use crate::datamove::{DataMove, MemorySpan};
use crate::exec::{ResolvedArg, TaskBarrier, TaskHandle, TaskQueue, TaskSpec};
use crate::identity::ValueId;
use crate::topology::{MemorySpace, Processor, ProcessorId, ProcessorKind, Topology, WorkerId};

/// A single `Cpu` processor per worker, one memory space per processor,
/// attached 1:1. Good enough for exercising placement without pretending
/// to model a heterogeneous machine.
#[derive(Default)]
pub struct MockTopology {
    processors: Vec<Processor>,
    spaces: Mutex<HashMap<ValueId, MemorySpace>>,
}

impl MockTopology {
    /// Builds a topology of `worker_count` workers, one `Cpu` processor
    /// each, processor/space ids assigned in worker order.
    pub fn new(worker_count: usize) -> MockTopology {
        let processors = (0..worker_count)
            .map(|i| Processor { id: ProcessorId(i), worker: WorkerId(i), kind: ProcessorKind::Cpu })
            .collect();
        MockTopology { processors, spaces: Mutex::new(HashMap::new()) }
    }

    /// Seeds the known location of a value, as a real topology service's
    /// discovery step would have.
    pub fn place(&self, value: ValueId, space: MemorySpace) {
        self.spaces.lock().unwrap().insert(value, space);
    }
}

impl Topology for MockTopology {
    type Error = Infallible;

    fn workers(&self) -> Vec<WorkerId> {
        self.processors.iter().map(|p| p.worker).collect()
    }

    fn processors(&self, worker: WorkerId) -> Result<Vec<Processor>, Self::Error> {
        Ok(self.processors.iter().filter(|p| p.worker == worker).copied().collect())
    }

    fn memory_spaces(&self, proc: ProcessorId) -> Result<Vec<MemorySpace>, Self::Error> {
        Ok(vec![MemorySpace(proc.0)])
    }

    fn space_processors(&self, space: MemorySpace) -> Result<Vec<ProcessorId>, Self::Error> {
        Ok(vec![ProcessorId(space.0)])
    }

    fn memory_space_of(&self, value: ValueId) -> Option<MemorySpace> {
        self.spaces.lock().unwrap().get(&value).copied()
    }
}

/// Token `0` is reserved to mean "the whole value" and aliases every
/// selector-qualified span of the same value in the same space; any other
/// token is a stable hash of its selector string.
fn selector_token(selector: Option<&str>) -> u64 {
    match selector {
        None => 0,
        Some(s) => {
            use std::collections::hash_map::DefaultHasher;
            use std::hash::{Hash, Hasher};
            let mut hasher = DefaultHasher::new();
            s.hash(&mut hasher);
            let hashed = hasher.finish();
            if hashed == 0 { 1 } else { hashed }
        }
    }
}

/// An in-memory "data mover": values live in a space until `copy_to` or
/// `move_value` relocates them. Does not move any actual bytes — this is
/// the planner's contract being exercised, not a real transport.
#[derive(Default)]
pub struct MockDataMove {
    location: Mutex<HashMap<ValueId, MemorySpace>>,
    proc_spaces: Mutex<HashMap<ProcessorId, MemorySpace>>,
    copies: Mutex<Vec<(ValueId, MemorySpace, MemorySpace)>>,
    moves: Mutex<Vec<(ValueId, ProcessorId, ProcessorId)>>,
}

impl MockDataMove {
    pub fn new() -> MockDataMove {
        MockDataMove::default()
    }

    pub fn place(&self, value: ValueId, space: MemorySpace) {
        self.location.lock().unwrap().insert(value, space);
    }

    pub fn attach(&self, proc: ProcessorId, space: MemorySpace) {
        self.proc_spaces.lock().unwrap().insert(proc, space);
    }

    /// Every `(value, src, dst)` triple recorded by `copy_to`, in call
    /// order — what a test asserts copy-task synthesis against.
    pub fn copy_log(&self) -> Vec<(ValueId, MemorySpace, MemorySpace)> {
        self.copies.lock().unwrap().clone()
    }

    /// Every `(value, from, to)` triple recorded by `move_value`, in call
    /// order — what a test asserts the synchronous slot-allocation step
    /// against, distinct from `copy_log`'s scheduled copy tasks.
    pub fn move_log(&self) -> Vec<(ValueId, ProcessorId, ProcessorId)> {
        self.moves.lock().unwrap().clone()
    }
}

impl DataMove for MockDataMove {
    type Error = Infallible;

    fn memory_spans(&self, value: ValueId, selector: Option<&str>) -> Vec<MemorySpan> {
        let space = self.location.lock().unwrap().get(&value).copied().unwrap_or(MemorySpace(0));
        vec![MemorySpan::new(space, selector_token(selector))]
    }

    fn may_alias(&self, a: &MemorySpan, b: &MemorySpan) -> bool {
        a.space == b.space && (a.token == 0 || b.token == 0 || a.token == b.token)
    }

    fn move_value(&self, from: ProcessorId, to: ProcessorId, value: ValueId) -> Result<MemorySpace, Self::Error> {
        let space = self.proc_spaces.lock().unwrap().get(&to).copied().unwrap_or(MemorySpace(to.0));
        self.location.lock().unwrap().insert(value, space);
        self.moves.lock().unwrap().push((value, from, to));
        Ok(space)
    }

    fn copy_to(&self, value: ValueId, src: MemorySpace, dst: MemorySpace) -> Result<(), Self::Error> {
        self.copies.lock().unwrap().push((value, src, dst));
        self.location.lock().unwrap().insert(value, dst);
        Ok(())
    }
}

/// Runs task bodies on a `futures` thread pool, honouring each task's
/// `syncdeps` as a happens-before constraint before invoking its body.
/// Also plays the role of the region-wait barrier (`TaskBarrier`):
/// `wait_all` blocks on every task enqueued so far and surfaces the first
/// body failure, matching spec.md §7's `UserTaskFailure` policy.
pub struct MockExecutor {
    pool: ThreadPool,
    completions: Mutex<HashMap<TaskHandle, Shared<oneshot::Receiver<()>>>>,
    all: Mutex<Vec<Shared<oneshot::Receiver<()>>>>,
    first_failure: Arc<Mutex<Option<String>>>,
    completed_count: Arc<AtomicUsize>,
}

impl MockExecutor {
    pub fn new() -> MockExecutor {
        MockExecutor {
            pool: ThreadPool::new().expect("failed to start mock executor thread pool"),
            completions: Mutex::new(HashMap::new()),
            all: Mutex::new(Vec::new()),
            first_failure: Arc::new(Mutex::new(None)),
            completed_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many tasks have run their body to completion so far. Useful for
    /// tests that need to wait without holding a reference to any one
    /// task's handle.
    pub fn completed_count(&self) -> usize {
        self.completed_count.load(Ordering::Acquire)
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        MockExecutor::new()
    }
}

impl TaskQueue for MockExecutor {
    type Error = Infallible;

    fn enqueue(&self, spec: TaskSpec, handle: TaskHandle) -> Result<(), Self::Error> {
        let waits: Vec<Shared<oneshot::Receiver<()>>> = {
            let completions = self.completions.lock().unwrap();
            spec.options
                .syncdeps
                .iter()
                .filter_map(|dep| completions.get(dep).cloned())
                .collect()
        };

        let (tx, rx) = oneshot::channel();
        let shared_rx = rx.shared();
        self.completions.lock().unwrap().insert(handle.clone(), shared_rx.clone());
        self.all.lock().unwrap().push(shared_rx);

        let resolved: Vec<ResolvedArg> = spec.options.resolved_args.clone();
        let body = spec.body;
        let done_handle = handle.clone();
        let counter = self.completed_count.clone();
        let first_failure = self.first_failure.clone();

        self.pool.spawn_ok(async move {
            for wait in waits {
                let _ = wait.await;
            }
            if let Err(e) = body(&resolved) {
                let mut guard = first_failure.lock().unwrap();
                if guard.is_none() {
                    *guard = Some(e.to_string());
                }
            }
            done_handle.mark_started_self();
            counter.fetch_add(1, Ordering::AcqRel);
            let _ = tx.send(());
        });

        Ok(())
    }
}

impl TaskBarrier for MockExecutor {
    type Error = MockTaskFailure;

    fn wait_all(&self) -> Result<(), Self::Error> {
        let waits = self.all.lock().unwrap().clone();
        futures::executor::block_on(futures::future::join_all(
            waits.into_iter().map(|w| async move { let _ = w.await; }),
        ));
        match self.first_failure.lock().unwrap().take() {
            Some(message) => Err(MockTaskFailure(message)),
            None => Ok(()),
        }
    }
}

/// The error `MockExecutor::wait_all` surfaces for the first task body
/// that returned `Err`.
#[derive(Debug, thiserror::Error)]
#[error("mock task failed: {0}")]
pub struct MockTaskFailure(String);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{ArgEntry, TaskSpec};
    use crate::access::{in_, AnyAccess};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn identity_only_aliasing_is_exercised_through_the_mock() {
        let dm = MockDataMove::new();
        let a = ValueId::from_addr(10);
        dm.place(a, MemorySpace(0));
        let whole = dm.memory_spans(a, None).remove(0);
        let sub = dm.memory_spans(a, Some("field")).remove(0);
        assert!(dm.may_alias(&whole, &sub));
    }

    #[test]
    fn executor_runs_a_task_and_marks_its_handle_started() {
        let exec = MockExecutor::new();
        let handle = TaskHandle::new();
        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let ran2 = ran.clone();
        let body: crate::exec::TaskBody = Box::new(move |_args| {
            ran2.store(true, Ordering::SeqCst);
            Ok(())
        });
        let access: Box<dyn AnyAccess> = Box::new(in_::<Arc<u32>>(Arc::new(1)));
        let spec = TaskSpec::new(body, vec![ArgEntry { position: 0, access }]);
        exec.enqueue(spec, handle.clone()).unwrap();

        for _ in 0..200 {
            if handle.is_started() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(handle.is_started());
        assert!(ran.load(Ordering::SeqCst));
    }
}
