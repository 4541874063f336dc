//! The alias oracle (C2, spec.md §4.2): turns a value into its memory
//! spans and decides whether two spans may overlap. Thin wrapper over the
//! data-move contract that also implements the `aliasing` region option —
//! when disabled, spans collapse to the value's own identity and `may_alias`
//! degenerates to identity comparison.

use crate::datamove::{DataMove, MemorySpan};
use crate::identity::ValueId;
use crate::topology::MemorySpace;

/// Sentinel space used to tag identity-only "spans" so they never compare
/// equal to a real `MemorySpan` produced by a `DataMove` implementation
/// (real space ids are assigned by the topology service and are never
/// negative-cast from a pointer-sized `ValueId`).
const IDENTITY_SPACE: MemorySpace = MemorySpace(usize::MAX);

/// Selects whether the recorder and planner consult the data-move
/// contract for real aliasing, or fall back to comparing values by
/// identity only (the `aliasing` region option, spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMode {
    Aliasing,
    IdentityOnly,
}

pub struct AliasOracle<'a, D: ?Sized + DataMove> {
    data_move: &'a D,
    mode: IdentityMode,
}

impl<'a, D: ?Sized + DataMove> AliasOracle<'a, D> {
    pub fn new(data_move: &'a D, mode: IdentityMode) -> AliasOracle<'a, D> {
        AliasOracle { data_move, mode }
    }

    /// Enumerates the storage spans of `value`, restricted to `selector`
    /// if it is a `Deps` sub-access. The caller (the recorder) must not
    /// invoke this for a value it knows to be an unstarted task handle —
    /// that deferral is the recorder's responsibility (spec.md §4.2, §9),
    /// not this oracle's.
    pub fn spans(&self, value: ValueId, selector: Option<&str>) -> Vec<MemorySpan> {
        match self.mode {
            IdentityMode::IdentityOnly => vec![MemorySpan::new(IDENTITY_SPACE, value.as_u64())],
            IdentityMode::Aliasing => self.data_move.memory_spans(value, selector),
        }
    }

    /// Conservative, symmetric overlap test (spec.md §4.2). Never produces
    /// false negatives.
    pub fn may_alias(&self, a: &MemorySpan, b: &MemorySpan) -> bool {
        match self.mode {
            IdentityMode::IdentityOnly => a == b,
            IdentityMode::Aliasing => self.data_move.may_alias(a, b) || self.data_move.may_alias(b, a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock::MockDataMove;

    #[test]
    fn identity_only_mode_never_aliases_distinct_values() {
        let dm = MockDataMove::new();
        let oracle = AliasOracle::new(&dm, IdentityMode::IdentityOnly);
        let a = ValueId::from_addr(1);
        let b = ValueId::from_addr(2);
        let span_a = oracle.spans(a, None).pop().unwrap();
        let span_b = oracle.spans(b, None).pop().unwrap();
        assert!(!oracle.may_alias(&span_a, &span_b));
        let span_a2 = oracle.spans(a, None).pop().unwrap();
        assert!(oracle.may_alias(&span_a, &span_a2));
    }
}
