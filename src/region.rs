//! The region driver (C5, spec.md §4.5): `with_region` opens a fresh
//! recorder, runs the caller's body against it, then — in static mode —
//! hands the recorded DAG to the planner before waiting for every
//! outstanding submission to settle and surfacing the first failure.

use std::sync::Arc;

use taskdeps_extras::Traversal;

use crate::alias::{AliasOracle, IdentityMode};
use crate::datamove::DataMove;
use crate::error::{Error, Result};
use crate::exec::{TaskBarrier, TaskHandle, TaskQueue, TaskSpec};
use crate::planner::Planner;
use crate::recorder::{DynamicRecorder, StaticRecorder};
use crate::topology::{ProcessorScope, Topology};

/// The `static`/`traversal`/`aliasing` options spec.md §6 recognises,
/// defaults matching `with_region(body; static=true, traversal=:inorder,
/// aliasing=true)`.
#[derive(Debug, Clone)]
pub struct RegionOptions {
    static_: bool,
    traversal: Traversal,
    aliasing: bool,
}

impl Default for RegionOptions {
    fn default() -> Self {
        RegionOptions { static_: true, traversal: Traversal::Inorder, aliasing: true }
    }
}

impl RegionOptions {
    pub fn new() -> RegionOptions {
        RegionOptions::default()
    }

    pub fn builder() -> RegionOptionsBuilder {
        RegionOptionsBuilder { opts: RegionOptions::default() }
    }

    fn identity_mode(&self) -> IdentityMode {
        if self.aliasing { IdentityMode::Aliasing } else { IdentityMode::IdentityOnly }
    }
}

/// Fluent setter for [`RegionOptions`], matching the teacher's
/// `ContextBuilder`/`ProQueBuilder` idiom for multi-field option structs
/// rather than requiring callers to write out the struct literal.
pub struct RegionOptionsBuilder {
    opts: RegionOptions,
}

impl RegionOptionsBuilder {
    pub fn static_(mut self, value: bool) -> Self {
        self.opts.static_ = value;
        self
    }

    pub fn traversal(mut self, value: Traversal) -> Self {
        self.opts.traversal = value;
        self
    }

    /// Parses the `traversal` region option's keyword form (`"inorder"`,
    /// `"bfs"`, `"dfs"`), the entry point for a dynamically-configured
    /// region (e.g. built from a config file).
    pub fn traversal_str(mut self, value: &str) -> Result<Self> {
        self.opts.traversal =
            Traversal::parse(value).map_err(|e| Error::InvalidTraversal(e.to_string()))?;
        Ok(self)
    }

    pub fn aliasing(mut self, value: bool) -> Self {
        self.opts.aliasing = value;
        self
    }

    pub fn build(self) -> RegionOptions {
        self.opts
    }
}

impl Default for RegionOptionsBuilder {
    fn default() -> Self {
        RegionOptionsBuilder { opts: RegionOptions::default() }
    }
}

/// Everything a submission sink needs to forward a task: static mode
/// buffers into a [`StaticRecorder`], dynamic mode dispatches immediately
/// through a [`DynamicRecorder`]. Exposed to the region's `body` closure so
/// it can submit tasks without caring which mode is active.
pub enum Recorder<'a, D: DataMove, Q: TaskQueue> {
    Static(StaticRecorder<'a, D>),
    Dynamic(DynamicRecorder<'a, D, Q>),
}

impl<'a, D: DataMove, Q: TaskQueue> Recorder<'a, D, Q> {
    pub fn enqueue(&mut self, handle: TaskHandle, spec: TaskSpec) -> Result<()> {
        match self {
            Recorder::Static(r) => r.enqueue(handle, spec),
            Recorder::Dynamic(r) => r.enqueue(handle, spec),
        }
    }
}

/// Opens a region: publishes a fresh recorder as the active submission
/// sink, invokes `body`, then — per spec.md §4.5 — plans (static mode
/// only), waits for every outstanding submission, and surfaces the first
/// failure.
///
/// `local_scope` is the ambient scope: in dynamic mode it is what each
/// submission's own scope is intersected against (spec.md §4.3); in static
/// mode it is what processor enumeration is filtered against before the
/// planner assigns each task's own per-processor scope (spec.md §4.4b).
pub fn with_region<D, T, Q, R>(
    data_move: Arc<D>,
    topology: &T,
    queue: &Q,
    local_scope: ProcessorScope,
    opts: RegionOptions,
    body: impl FnOnce(&mut Recorder<'_, D, Q>) -> Result<R>,
) -> Result<R>
where
    D: DataMove,
    T: Topology,
    Q: TaskQueue + TaskBarrier,
{
    let span = tracing::debug_span!("region", static_ = opts.static_, scope = %local_scope);
    let _enter = span.enter();
    tracing::debug!("region open");

    let mode = opts.identity_mode();
    let oracle = AliasOracle::new(&*data_move, mode);

    let mut recorder = if opts.static_ {
        Recorder::Static(StaticRecorder::new(oracle))
    } else {
        Recorder::Dynamic(DynamicRecorder::new(oracle, queue, local_scope.clone()))
    };

    let result = body(&mut recorder);

    if let Recorder::Static(static_recorder) = recorder {
        let (graph, records, tasks) = static_recorder.into_parts();
        tracing::debug!(tasks = tasks.len(), "planning static region");
        let planner = Planner::new(data_move, mode, topology, queue, local_scope);
        planner.plan(&graph, &records, opts.traversal, tasks)?;
    }

    // Wait for every outstanding submission (static mode's own planner
    // submissions included) before deciding the region's outcome — a
    // failed body still has to drain, per spec.md §4.5 step 4.
    let wait_result = TaskBarrier::wait_all(queue).map_err(|e| Error::UserTaskFailure(Box::new(e)));

    let body_result = result?;
    wait_result?;
    tracing::debug!("region close");
    Ok(body_result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{in_, out, AnyAccess};
    use crate::exec::{ArgEntry, TaskBody, TaskHandle};
    use crate::testing::mock::{MockDataMove, MockExecutor, MockTopology};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn noop(arg_count: usize) -> TaskBody {
        let _ = arg_count;
        Box::new(|_args| Ok(()))
    }

    #[test]
    fn static_region_runs_three_independent_readers_and_returns_body_value() {
        let dm = Arc::new(MockDataMove::new());
        let topo = MockTopology::new(2);
        let exec = MockExecutor::new();

        let x = Arc::new(7u32);
        let ran = Arc::new(AtomicUsize::new(0));

        let out_value = with_region(
            dm,
            &topo,
            &exec,
            ProcessorScope::All,
            RegionOptions::new(),
            |rec| {
                for _ in 0..3 {
                    let ran = ran.clone();
                    let body: TaskBody = Box::new(move |_args| {
                        ran.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    });
                    let access: Box<dyn AnyAccess> = Box::new(in_(x.clone()));
                    let spec = TaskSpec::new(body, vec![ArgEntry { position: 0, access }]);
                    rec.enqueue(TaskHandle::new(), spec)?;
                }
                Ok(42)
            },
        )
        .unwrap();

        assert_eq!(out_value, 42);
        assert_eq!(ran.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn dynamic_region_dispatches_eagerly_with_no_planner_pass() {
        let dm = Arc::new(MockDataMove::new());
        let topo = MockTopology::new(1);
        let exec = MockExecutor::new();

        let y = Arc::new(1u32);
        let opts = RegionOptions::builder().static_(false).build();

        with_region(dm, &topo, &exec, ProcessorScope::All, opts, |rec| {
            let access: Box<dyn AnyAccess> = Box::new(out(y.clone()));
            let spec = TaskSpec::new(noop(1), vec![ArgEntry { position: 0, access }]);
            rec.enqueue(TaskHandle::new(), spec)
        })
        .unwrap();

        assert_eq!(exec.completed_count(), 1);
    }

    #[test]
    fn first_task_failure_is_surfaced_after_the_rest_settle() {
        let dm = Arc::new(MockDataMove::new());
        let topo = MockTopology::new(1);
        let exec = MockExecutor::new();

        let z = Arc::new(1u32);
        let result = with_region(dm, &topo, &exec, ProcessorScope::All, RegionOptions::new(), |rec| {
            let access: Box<dyn AnyAccess> = Box::new(in_(z.clone()));
            let body: TaskBody = Box::new(|_args| Err("boom".into()));
            let spec = TaskSpec::new(body, vec![ArgEntry { position: 0, access }]);
            rec.enqueue(TaskHandle::new(), spec)
        });

        assert!(result.is_err());
    }

    #[test]
    fn invalid_traversal_keyword_is_rejected_before_the_region_opens() {
        assert!(RegionOptionsBuilder::default().traversal_str("postorder").is_err());
        assert!(RegionOptionsBuilder::default().traversal_str("bfs").is_ok());
    }

    #[test]
    fn region_open_and_close_emit_debug_spans() {
        use std::sync::Mutex;
        use tracing_subscriber::fmt::MakeWriter;

        #[derive(Clone, Default)]
        struct SharedBuf(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for SharedBuf {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        impl<'a> MakeWriter<'a> for SharedBuf {
            type Writer = SharedBuf;
            fn make_writer(&'a self) -> Self::Writer {
                self.clone()
            }
        }

        let buf = SharedBuf::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buf.clone())
            .with_max_level(tracing::Level::DEBUG)
            .without_time()
            .finish();

        let dm = Arc::new(MockDataMove::new());
        let topo = MockTopology::new(1);
        let exec = MockExecutor::new();
        let v = Arc::new(1u32);

        tracing::subscriber::with_default(subscriber, || {
            with_region(dm, &topo, &exec, ProcessorScope::All, RegionOptions::new(), |rec| {
                let access: Box<dyn AnyAccess> = Box::new(out(v.clone()));
                let spec = TaskSpec::new(noop(1), vec![ArgEntry { position: 0, access }]);
                rec.enqueue(TaskHandle::new(), spec)
            })
            .unwrap();
        });

        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("region open"), "expected a region-open log line, got: {output}");
        assert!(output.contains("region close"), "expected a region-close log line, got: {output}");
    }
}
