//! The data-move contract (consumed, spec.md §6): the primitive that knows
//! how to enumerate a value's storage, test two spans for aliasing, and
//! physically move or copy data between memory spaces. The core only ever
//! calls through this trait; it never moves bytes itself.

use crate::identity::ValueId;
use crate::topology::{MemorySpace, ProcessorId};

/// An abstract identifier for a contiguous region of storage within one
/// memory space (spec.md §3). Two spans in different spaces never alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemorySpan {
    pub space: MemorySpace,
    /// Opaque within-space identifier (an offset, a sub-buffer id, a
    /// field tag — whatever the data-move implementation uses to tell
    /// regions apart).
    pub token: u64,
}

impl MemorySpan {
    pub fn new(space: MemorySpace, token: u64) -> MemorySpan {
        MemorySpan { space, token }
    }
}

/// The data-move primitive (consumed). Implementations back real
/// transfers (host↔device, NUMA-node↔NUMA-node, …); this crate's `testing`
/// module ships an in-memory one for exercising the planner without real
/// hardware.
pub trait DataMove {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Enumerates the storage spans of a value, optionally restricted to
    /// one named sub-region (a `Deps` selector). Must not be called for
    /// values whose location is not yet known (unstarted task handles) —
    /// the alias oracle (§4.2) is responsible for skipping those.
    fn memory_spans(&self, value: ValueId, selector: Option<&str>) -> Vec<MemorySpan>;

    /// Conservative overlap test. Must be symmetric. False negatives are
    /// forbidden; false positives are allowed (they only cost parallelism).
    fn may_alias(&self, a: &MemorySpan, b: &MemorySpan) -> bool;

    /// Synchronous transfer used during slot allocation (spec.md §4.4d):
    /// moves `value` so that it is addressable from `to`, returning the
    /// space it now lives in.
    fn move_value(
        &self,
        from: ProcessorId,
        to: ProcessorId,
        value: ValueId,
    ) -> Result<MemorySpace, Self::Error>;

    /// The body of a synthesized copy task: copies `value` from `src` to
    /// `dst`.
    fn copy_to(&self, value: ValueId, src: MemorySpace, dst: MemorySpace) -> Result<(), Self::Error>;
}
