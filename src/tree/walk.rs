//! Deciding which nodes to recalculate, and in what order.
//!
//! Given the reference graph below, where `4` is an output node and `2`, `10`
//! were edited:
//!
//! ```text
//!  1----2-----3-----4
//!            / \
//!  8---9----5   6---7
//!     /
//!   10
//! ```
//!
//! * Nodes connected to an output are everything upstream of `4`, so all but
//!   `6` and `7`. Only topology changes can alter this set.
//! * Nodes affected by changes are everything downstream of an outdated node,
//!   so all but `1` and `8`. Every edit can alter this set.
//!
//! Only the intersection is worth recalculating. The two sets are cached
//! separately because the first one is rarely invalidated while the second
//! one is invalidated on every edit.
//!
//! The [`Walker`] then produces the worth-recalculating nodes in dependency
//! order using Kahn's algorithm restricted to that set, grouped into
//! generations of mutually independent nodes.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use petgraph::Graph;
use petgraph::algo::tarjan_scc;

use crate::core::NodeId;
use crate::error::{CyclicGraphError, StaleWalker};
use crate::tree::search::SearchTree;

/// Shared counter bumped every time a walk set is recalculated. Walkers
/// remember the value they were created at and refuse to continue once it
/// moves on.
#[derive(Debug, Clone, Default)]
pub(crate) struct Epoch(Arc<AtomicU64>);

impl Epoch {
    fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    fn advance(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }
}

/// The cached reachability sets of a tree.
#[derive(Debug, Default)]
pub struct Walk {
    pub(crate) output_nodes: HashSet<NodeId>,
    pub(crate) nodes_connected_to_output: HashSet<NodeId>,
    pub(crate) effected_by_changes_nodes: HashSet<NodeId>,
    pub(crate) epoch: Epoch,
}

impl Walk {
    pub fn output_nodes(&self) -> &HashSet<NodeId> {
        &self.output_nodes
    }

    /// Ancestors of the output nodes, the output nodes included.
    pub fn nodes_connected_to_output(&self) -> &HashSet<NodeId> {
        &self.nodes_connected_to_output
    }

    /// Descendants of the outdated nodes, the outdated nodes included.
    pub fn effected_by_changes_nodes(&self) -> &HashSet<NodeId> {
        &self.effected_by_changes_nodes
    }

    pub fn worth_recalculating_nodes(&self) -> HashSet<NodeId> {
        self.nodes_connected_to_output
            .intersection(&self.effected_by_changes_nodes)
            .cloned()
            .collect()
    }

    pub(crate) fn recalculate_connected_to_output_nodes<'a>(
        &mut self,
        search: &SearchTree,
        seeds: impl IntoIterator<Item = &'a NodeId>,
    ) {
        self.nodes_connected_to_output = reach(seeds, search.predecessors());
        self.epoch.advance();

        tracing::debug!(
            "{} nodes connected to {} outputs",
            self.nodes_connected_to_output.len(),
            self.output_nodes.len()
        );
    }

    pub(crate) fn recalculate_effected_by_changes_nodes<'a>(
        &mut self,
        search: &SearchTree,
        seeds: impl IntoIterator<Item = &'a NodeId>,
    ) {
        self.effected_by_changes_nodes = reach(seeds, search.successors());
        self.epoch.advance();

        tracing::debug!(
            "{} nodes affected by changes",
            self.effected_by_changes_nodes.len()
        );
    }

    pub(crate) fn walker(&self, search: &SearchTree) -> Walker {
        Walker::new(self.epoch.clone(), self.worth_recalculating_nodes(), search)
    }
}

/// Multi-source traversal. Seeds are part of the result, every node is
/// visited at most once so cycles terminate.
fn reach<'a>(
    seeds: impl IntoIterator<Item = &'a NodeId>,
    edges: &HashMap<NodeId, HashSet<NodeId>>,
) -> HashSet<NodeId> {
    let mut visited = HashSet::new();
    let mut queue: VecDeque<&NodeId> = VecDeque::new();

    for seed in seeds {
        if visited.insert(seed.clone()) {
            queue.push_back(seed);
        }
    }

    while let Some(node) = queue.pop_front() {
        for next in edges.get(node).into_iter().flatten() {
            if visited.insert(next.clone()) {
                queue.push_back(next);
            }
        }
    }

    visited
}

/// Lazy, single-use topological walk over the nodes worth recalculating.
///
/// Iterating yields single nodes; [`Walker::generations`] yields whole
/// generations instead. A node is produced only after every predecessor it
/// has inside the walked set. When the remaining nodes are stuck behind a
/// cycle, one [`CyclicGraphError`] is produced and the walk ends.
///
/// # Panics
///
/// Advancing a walker after the tree recalculated its walk sets panics with
/// [`StaleWalker`]: the order it would produce no longer matches the tree.
#[derive(Debug)]
pub struct Walker {
    epoch: Epoch,
    seen: u64,
    indegree: HashMap<NodeId, usize>,
    successors: HashMap<NodeId, Vec<NodeId>>,
    predecessors: HashMap<NodeId, Vec<NodeId>>,
    frontier: Vec<NodeId>,
    buffer: VecDeque<NodeId>,
    finished: bool,
}

impl Walker {
    fn new(epoch: Epoch, worth: HashSet<NodeId>, search: &SearchTree) -> Self {
        let mut indegree = HashMap::with_capacity(worth.len());
        let mut successors = HashMap::with_capacity(worth.len());
        let mut predecessors = HashMap::with_capacity(worth.len());
        let mut frontier = Vec::new();

        for node in &worth {
            let before: Vec<NodeId> = search
                .from_nodes(node)
                .filter(|n| worth.contains(*n))
                .cloned()
                .collect();
            let after: Vec<NodeId> = search
                .to_nodes(node)
                .filter(|n| worth.contains(*n))
                .cloned()
                .collect();

            if before.is_empty() {
                frontier.push(node.clone());
            }

            indegree.insert(node.clone(), before.len());
            predecessors.insert(node.clone(), before);
            successors.insert(node.clone(), after);
        }

        Self {
            seen: epoch.current(),
            epoch,
            indegree,
            successors,
            predecessors,
            frontier,
            buffer: VecDeque::new(),
            finished: false,
        }
    }

    fn check_fresh(&self) {
        if self.epoch.current() != self.seen {
            panic!("{}", StaleWalker);
        }
    }

    /// Nodes not yielded yet.
    pub fn remaining(&self) -> usize {
        self.indegree.len() + self.buffer.len()
    }

    /// Predecessors of `node` that are part of this walk.
    pub fn predecessors(&self, node: &NodeId) -> &[NodeId] {
        self.predecessors.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Takes the next whole generation. Nodes inside a generation do not
    /// depend on each other; generation `k + 1` only depends on `0..=k`.
    pub fn next_generation(&mut self) -> Option<Result<Vec<NodeId>, CyclicGraphError>> {
        self.check_fresh();

        if self.finished {
            return None;
        }

        if self.frontier.is_empty() {
            self.finished = true;
            if self.indegree.is_empty() {
                return None;
            }
            return Some(Err(self.cycle_error()));
        }

        let mut generation = std::mem::take(&mut self.frontier);
        generation.sort();

        for node in &generation {
            self.indegree.remove(node);
            for next in &self.successors[node] {
                if let Some(count) = self.indegree.get_mut(next) {
                    *count -= 1;
                    if *count == 0 {
                        self.frontier.push(next.clone());
                    }
                }
            }
        }

        Some(Ok(generation))
    }

    pub fn generations(self) -> Generations {
        Generations(self)
    }

    /// Splits the stuck nodes into those inside a cycle and those merely
    /// waiting on one.
    fn cycle_error(&self) -> CyclicGraphError {
        let mut graph = Graph::<&NodeId, ()>::new();
        let index: HashMap<&NodeId, _> = self
            .indegree
            .keys()
            .map(|node| (node, graph.add_node(node)))
            .collect();

        for (node, &from) in &index {
            for next in &self.successors[*node] {
                if let Some(&to) = index.get(next) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        let mut cycle = Vec::new();
        for component in tarjan_scc(&graph) {
            let looped = component.len() > 1
                || graph.find_edge(component[0], component[0]).is_some();
            if looped {
                cycle.extend(component.into_iter().map(|i| NodeId::clone(graph[i])));
            }
        }
        cycle.sort();

        let mut blocked: Vec<NodeId> = self
            .indegree
            .keys()
            .filter(|node| !cycle.contains(*node))
            .cloned()
            .collect();
        blocked.sort();

        CyclicGraphError { cycle, blocked }
    }
}

impl Iterator for Walker {
    type Item = Result<NodeId, CyclicGraphError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(node) = self.buffer.pop_front() {
            self.check_fresh();
            return Some(Ok(node));
        }

        match self.next_generation()? {
            Ok(generation) => {
                self.buffer.extend(generation);
                self.buffer.pop_front().map(Ok)
            }
            Err(err) => Some(Err(err)),
        }
    }
}

/// Generation-at-a-time view of a [`Walker`].
#[derive(Debug)]
pub struct Generations(Walker);

impl Generations {
    pub fn remaining(&self) -> usize {
        self.0.remaining()
    }

    pub fn predecessors(&self, node: &NodeId) -> &[NodeId] {
        self.0.predecessors(node)
    }
}

impl Iterator for Generations {
    type Item = Result<Vec<NodeId>, CyclicGraphError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_generation()
    }
}
