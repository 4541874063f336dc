//! The topology/processor-discovery contract.
//!
//! This crate does not discover hardware itself — that is the topology
//! service's job, deliberately excluded from the core (spec.md §1). What
//! lives here is the narrow interface the planner consumes: workers,
//! processors, the memory spaces they attach to, and the scope algebra
//! used to restrict a task to one processor.

use std::collections::BTreeSet;
use std::fmt;

use crate::identity::ValueId;

/// Identifies one worker (a host process, a NUMA node, a device driver
/// instance — whatever the topology service considers a unit of
/// discovery).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub usize);

/// Identifies one processor within a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessorId(pub usize);

/// Identifies one memory space. Two spans in different spaces never
/// alias (§3: memory spans are scoped to one memory space).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemorySpace(pub usize);

/// The kind of a processor. Only `Cpu` processors currently participate
/// in placement (spec.md §1 Non-goals: heterogeneous-processor
/// scheduling). Other kinds are enumerable so the planner can filter
/// them out and log a one-shot warning rather than silently losing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorKind {
    Cpu,
    Other,
}

/// A processor exposed by the topology service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Processor {
    pub id: ProcessorId,
    pub worker: WorkerId,
    pub kind: ProcessorKind,
}

/// A restriction on which processors a task may run on.
///
/// `constrain` implements the intersection operation spec.md §6 requires
/// for dynamic-mode scope checking: a task's configured scope intersected
/// with the scope restricting it to the local worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorScope {
    /// No restriction: any known processor.
    All,
    /// Restricted to exactly this set of processors.
    Set(BTreeSet<ProcessorId>),
}

impl ProcessorScope {
    pub fn single(proc: ProcessorId) -> ProcessorScope {
        let mut set = BTreeSet::new();
        set.insert(proc);
        ProcessorScope::Set(set)
    }

    pub fn of_worker(procs: impl IntoIterator<Item = ProcessorId>) -> ProcessorScope {
        ProcessorScope::Set(procs.into_iter().collect())
    }

    pub fn contains(&self, proc: ProcessorId) -> bool {
        match self {
            ProcessorScope::All => true,
            ProcessorScope::Set(set) => set.contains(&proc),
        }
    }

    /// Intersects two scopes. Returns `None` ("invalid") when the result
    /// would be empty — the caller in dynamic mode turns that into
    /// `Error::IncompatibleScope`.
    pub fn constrain(&self, other: &ProcessorScope) -> Option<ProcessorScope> {
        match (self, other) {
            (ProcessorScope::All, ProcessorScope::All) => Some(ProcessorScope::All),
            (ProcessorScope::All, ProcessorScope::Set(s))
            | (ProcessorScope::Set(s), ProcessorScope::All) => {
                if s.is_empty() { None } else { Some(ProcessorScope::Set(s.clone())) }
            }
            (ProcessorScope::Set(a), ProcessorScope::Set(b)) => {
                let intersection: BTreeSet<_> = a.intersection(b).cloned().collect();
                if intersection.is_empty() { None } else { Some(ProcessorScope::Set(intersection)) }
            }
        }
    }
}

impl fmt::Display for ProcessorScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProcessorScope::All => write!(f, "<all processors>"),
            ProcessorScope::Set(set) => write!(f, "{:?}", set),
        }
    }
}

/// The topology/processor-discovery contract the planner consumes.
///
/// An implementation backs `procs()`/`get_processors(worker)` from
/// spec.md §6 plus the value→space lookup used to seed the locality map.
pub trait Topology {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Enumerates worker ids.
    fn workers(&self) -> Vec<WorkerId>;

    /// Enumerates the processors belonging to a worker.
    fn processors(&self, worker: WorkerId) -> Result<Vec<Processor>, Self::Error>;

    /// Enumerates the memory spaces a processor can directly access.
    fn memory_spaces(&self, proc: ProcessorId) -> Result<Vec<MemorySpace>, Self::Error>;

    /// Enumerates the processors attached to a memory space.
    fn space_processors(&self, space: MemorySpace) -> Result<Vec<ProcessorId>, Self::Error>;

    /// Returns the space currently backing a tracked value, if known.
    /// `None` for values whose location is not yet determined (e.g. an
    /// unstarted task handle).
    fn memory_space_of(&self, value: ValueId) -> Option<MemorySpace>;
}
