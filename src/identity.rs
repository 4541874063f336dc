//! Identity-keyed lookups over tracked values.
//!
//! Per-value access logs, locality, and ownership must key on *pointer*
//! identity, not structural equality: two structurally-equal arguments
//! passed separately by the caller are different values as far as the
//! dependency recorder is concerned. Rust has no ambient object identity
//! the way some host languages do, so every value the planner tracks must
//! arrive wrapped in something that carries one — an `Arc` (identity =
//! address of the shared allocation) or a [`TaskHandle`](crate::exec::TaskHandle)
//! (identity = the handle's own generation-checked id).

use std::sync::Arc;

/// The identity of a tracked value, usable as a hash map key.
///
/// Two `ValueId`s compare equal iff they were derived from the same
/// underlying allocation (or the same task handle), never from
/// structurally-equal-but-distinct values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(usize);

impl ValueId {
    /// Builds a `ValueId` from a raw, already-unique address. Used by
    /// [`TrackedValue`] implementors; callers should prefer going through
    /// `TrackedValue::value_id`.
    pub fn from_addr(addr: usize) -> ValueId {
        ValueId(addr)
    }

    pub fn as_u64(&self) -> u64 {
        self.0 as u64
    }
}

/// Implemented by anything the planner can track across task submissions.
pub trait TrackedValue {
    fn value_id(&self) -> ValueId;

    /// `Some` iff this tracked value is itself a task handle. Overridden by
    /// `TaskHandle`'s impl; every other tracked value is a plain data
    /// value and keeps the default.
    fn as_task_handle(&self) -> Option<crate::exec::TaskHandle> {
        None
    }
}

impl<T: ?Sized> TrackedValue for Arc<T> {
    fn value_id(&self) -> ValueId {
        ValueId::from_addr(Arc::as_ptr(self) as *const () as usize)
    }
}

impl<T: TrackedValue + ?Sized> TrackedValue for &T {
    fn value_id(&self) -> ValueId {
        (**self).value_id()
    }

    fn as_task_handle(&self) -> Option<crate::exec::TaskHandle> {
        (**self).as_task_handle()
    }
}
