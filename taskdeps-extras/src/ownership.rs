//! Ownership and reader tracking for memory spans.
//!
//! For each span touched in a region: the current *owner* (the most
//! recent writer, or none) and the set of *readers* since the last writer
//! (spec.md §3). This is the generalisation of the teacher's
//! `RwCmdIdxs` — a buffer-indexed writers/readers pair — to arbitrary
//! aliasing spans rather than opaque buffer ids. Generic over both the
//! span type `S` and the task-identity type `T` so this crate does not
//! need to depend on the main crate's concrete `MemorySpan`/`TaskHandle`.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// Tracks, per span, who owns it (wrote it most recently) and who has
/// read it since.
#[derive(Debug)]
pub struct OwnershipMap<S, T> {
    owner: HashMap<S, T>,
    readers: HashMap<S, BTreeSet<T>>,
}

impl<S, T> Default for OwnershipMap<S, T> {
    fn default() -> Self {
        OwnershipMap { owner: HashMap::new(), readers: HashMap::new() }
    }
}

impl<S: Eq + Hash + Clone + Ord, T: Clone + Ord + Hash> OwnershipMap<S, T> {
    pub fn new() -> OwnershipMap<S, T> {
        OwnershipMap::default()
    }

    pub fn owner(&self, span: &S) -> Option<&T> {
        self.owner.get(span)
    }

    pub fn readers(&self, span: &S) -> impl Iterator<Item = &T> {
        self.readers.get(span).into_iter().flatten()
    }

    /// Every span this map has an opinion about — the set a caller must
    /// scan when cross-span aliasing (rather than exact-span lookup) is
    /// needed.
    pub fn tracked_spans(&self) -> impl Iterator<Item = &S> {
        let mut spans: BTreeSet<&S> = self.owner.keys().collect();
        spans.extend(self.readers.keys());
        spans.into_iter()
    }

    /// Records `task` as the new owner of `span`, clearing prior readers.
    /// The writer itself counts as a reader for subsequent
    /// read-after-write queries (spec.md §4.4f step 7).
    pub fn record_write(&mut self, span: S, task: T) {
        self.owner.insert(span.clone(), task.clone());
        let mut readers = BTreeSet::new();
        readers.insert(task);
        self.readers.insert(span, readers);
    }

    /// Adds `task` to the reader set of `span`, leaving the owner as-is.
    pub fn record_read(&mut self, span: S, task: T) {
        self.readers.entry(span).or_default().insert(task);
    }
}
