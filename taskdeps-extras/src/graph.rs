//! A directional sequence-dependency graph representing the temporal
//! requirements between submitted tasks.
//!
//! This is the arena-plus-index structure spec.md's design notes call for:
//! vertices are plain `usize`s (assigned in submission order), edges only
//! ever go from an older vertex to a younger one, so the graph is acyclic
//! by construction and a `Vec`-backed adjacency list is sufficient — no
//! generic graph crate needed.

use std::collections::BTreeSet;

/// Returned by [`Traversal::parse`] for an unrecognised keyword.
#[derive(Debug, thiserror::Error)]
#[error("`{0}` is not a recognised traversal order (expected `inorder`, `bfs`, or `dfs`)")]
pub struct ParseTraversalError(String);

/// The order in which [`TaskGraph::traverse`] visits vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Submission order.
    Inorder,
    /// Breadth-first from vertex 0, following out-edges. A vertex is
    /// emitted on first discovery.
    Bfs,
    /// Iterative depth-first, following out-edges. A vertex is emitted on
    /// first visit; already-emitted vertices reached again through a
    /// second predecessor are simply skipped rather than re-emitted.
    Dfs,
}

impl Traversal {
    /// Parses the `traversal` region option's keyword form. Reachable from
    /// a dynamically-configured region (e.g. built from a config file)
    /// where the option never went through the `Traversal` enum directly.
    pub fn parse(s: &str) -> Result<Traversal, ParseTraversalError> {
        match s {
            "inorder" => Ok(Traversal::Inorder),
            "bfs" => Ok(Traversal::Bfs),
            "dfs" => Ok(Traversal::Dfs),
            other => Err(ParseTraversalError(other.to_string())),
        }
    }
}

/// A directed, acyclic dependency graph over task vertices.
///
/// Obviously this is overkill for a handful of tasks, but it scales
/// correctly and without surprises to arbitrarily many parallel tasks with
/// arbitrary fan-in/fan-out.
#[derive(Debug, Default)]
pub struct TaskGraph {
    predecessors: Vec<BTreeSet<usize>>,
    successors: Vec<BTreeSet<usize>>,
}

impl TaskGraph {
    pub fn new() -> TaskGraph {
        TaskGraph::default()
    }

    /// Adds a new vertex and returns its index (= the current vertex
    /// count, per spec.md §4.3).
    pub fn add_vertex(&mut self) -> usize {
        self.predecessors.push(BTreeSet::new());
        self.successors.push(BTreeSet::new());
        self.predecessors.len() - 1
    }

    /// Records that `from` must precede `to`. `from` must be a
    /// lower-numbered (older) vertex than `to`; duplicate edges are
    /// silently elided (spec.md §4.3: "the resulting edge set is
    /// order-independent so duplicate edges are elided").
    pub fn add_edge(&mut self, from: usize, to: usize) {
        debug_assert!(from < to, "edges only ever go from an older submission to a younger one");
        self.successors[from].insert(to);
        self.predecessors[to].insert(from);
    }

    pub fn len(&self) -> usize {
        self.predecessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predecessors.is_empty()
    }

    pub fn predecessors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.predecessors[v].iter().copied()
    }

    pub fn successors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.successors[v].iter().copied()
    }

    /// Visits every vertex exactly once, in the requested order.
    pub fn traverse(&self, order: Traversal) -> Vec<usize> {
        match order {
            Traversal::Inorder => (0..self.len()).collect(),
            Traversal::Bfs => self.bfs(),
            Traversal::Dfs => self.dfs(),
        }
    }

    /// Breadth-first **within the constraint that a vertex is only
    /// eligible once every predecessor has been emitted** (Kahn's
    /// algorithm, FIFO frontier). A plain successor-following BFS/DFS that
    /// ignores in-degree is not safe here: on a diamond (0→1, 0→2, 1→3,
    /// 2→3) a naive DFS reaches 3 via the 0→1→3 path before 2 has been
    /// emitted, even though 2→3 requires 2 first. The planner's ownership
    /// walk (spec.md §4.4f) relies on `syncdeps` being rebuilt
    /// incrementally in the same order `traverse` hands back, so that
    /// order must itself be a valid topological sort, not merely "every
    /// vertex reachable from some root."
    ///
    /// Ties (several vertices becoming eligible at once, or independent
    /// roots with no edges between them — spec.md §8 scenario 1) are
    /// broken by ascending vertex index, i.e. submission order.
    fn bfs(&self) -> Vec<usize> {
        self.kahn(Frontier::Fifo)
    }

    /// Depth-first, same topological constraint as [`TaskGraph::bfs`] but
    /// with a LIFO frontier: a vertex freed by the one just emitted is
    /// explored before returning to older, still-eligible vertices.
    fn dfs(&self) -> Vec<usize> {
        self.kahn(Frontier::Lifo)
    }

    fn kahn(&self, discipline: Frontier) -> Vec<usize> {
        let mut remaining: Vec<usize> = self.predecessors.iter().map(|p| p.len()).collect();
        let mut order = Vec::with_capacity(self.len());
        let mut frontier: Vec<usize> = (0..self.len()).filter(|&v| remaining[v] == 0).collect();

        while let Some(v) = match discipline {
            Frontier::Fifo => (!frontier.is_empty()).then(|| frontier.remove(0)),
            Frontier::Lifo => frontier.pop(),
        } {
            order.push(v);
            for s in self.successors(v) {
                remaining[s] -= 1;
                if remaining[s] == 0 {
                    frontier.push(s);
                }
            }
        }
        order
    }
}

#[derive(Clone, Copy)]
enum Frontier {
    Fifo,
    Lifo,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> TaskGraph {
        let mut g = TaskGraph::new();
        for _ in 0..4 {
            g.add_vertex();
        }
        g.add_edge(0, 1);
        g.add_edge(0, 2);
        g.add_edge(1, 3);
        g.add_edge(2, 3);
        g
    }

    #[test]
    fn inorder_is_submission_order() {
        let g = diamond();
        assert_eq!(g.traverse(Traversal::Inorder), vec![0, 1, 2, 3]);
    }

    #[test]
    fn bfs_visits_level_by_level() {
        let g = diamond();
        assert_eq!(g.traverse(Traversal::Bfs), vec![0, 1, 2, 3]);
    }

    #[test]
    fn dfs_explores_the_most_recently_freed_vertex_first() {
        // 0 frees both 1 and 2 at once; LIFO explores 2 (pushed last)
        // before returning to 1. 3 only becomes eligible once both of its
        // predecessors (1 and 2) have been emitted, same as `bfs` — the
        // two traversals only differ in which of several simultaneously
        // eligible vertices they pick first.
        let g = diamond();
        assert_eq!(g.traverse(Traversal::Dfs), vec![0, 2, 1, 3]);
    }

    #[test]
    fn every_vertex_emitted_exactly_once() {
        let g = diamond();
        for order in [Traversal::Inorder, Traversal::Bfs, Traversal::Dfs] {
            let mut visited = g.traverse(order);
            visited.sort_unstable();
            assert_eq!(visited, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn disconnected_vertices_are_all_emitted() {
        // Three independent vertices, no edges among them (spec.md §8
        // scenario 1: pure read parallelism). A single-source traversal
        // from vertex 0 alone would miss 1 and 2 entirely. All three are
        // eligible from the start, so `inorder`/`bfs` (FIFO ties) keep
        // submission order; `dfs` (LIFO ties) explores the most recently
        // queued one first.
        let mut g = TaskGraph::new();
        g.add_vertex();
        g.add_vertex();
        g.add_vertex();
        assert_eq!(g.traverse(Traversal::Inorder), vec![0, 1, 2]);
        assert_eq!(g.traverse(Traversal::Bfs), vec![0, 1, 2]);
        assert_eq!(g.traverse(Traversal::Dfs), vec![2, 1, 0]);
        for order in [Traversal::Inorder, Traversal::Bfs, Traversal::Dfs] {
            let mut visited = g.traverse(order);
            visited.sort_unstable();
            assert_eq!(visited, vec![0, 1, 2]);
        }
    }

    #[test]
    fn duplicate_edges_are_elided() {
        let mut g = TaskGraph::new();
        g.add_vertex();
        g.add_vertex();
        g.add_edge(0, 1);
        g.add_edge(0, 1);
        assert_eq!(g.predecessors(1).count(), 1);
    }

    #[test]
    fn parse_rejects_unknown_traversal() {
        assert!(Traversal::parse("inorder").is_ok());
        assert!(Traversal::parse("postorder").is_err());
    }
}
