use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt::Write;
use std::time::{Duration, Instant};

use crate::core::NodeId;
use crate::tree::{SearchTree, Tree};

#[derive(Debug, Clone)]
pub struct NodeExecution {
    pub start: Instant,
    pub duration: Duration,
}

/// Timing of the nodes that ran during one pass.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    /// Completed nodes and how long they took.
    pub execution_times: HashMap<NodeId, NodeExecution>,
    pub failed: HashSet<NodeId>,
}

impl Diagnostics {
    /// Renders the tree as a Mermaid diagram, color-coded by execution duration.
    ///
    /// * **Green**: Fast
    /// * **Yellow**: Moderate
    /// * **Red**: Slow
    /// * **Blue**: Cached (not run in this pass)
    /// * **Grey**: Failed
    pub fn render_mermaid(&self, tree: &Tree) -> String {
        let mut f = String::new();
        let _ = writeln!(f, "graph LR");

        let times = &self.execution_times;
        let mut min_time = f64::MAX;
        let mut max_time = f64::MIN;

        for t in times.values() {
            let secs = t.duration.as_secs_f64();
            min_time = min_time.min(secs);
            max_time = max_time.max(secs);
        }

        if min_time > max_time {
            min_time = 0.0;
            max_time = 0.0;
        }

        if (max_time - min_time).abs() < f64::EPSILON {
            max_time = min_time + 1.0;
        }

        let mut nodes: Vec<_> = tree.nodes().filter(|node| !node.is_reroute()).collect();
        nodes.sort_by(|a, b| a.id().cmp(b.id()));
        let index: HashMap<&NodeId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id(), i))
            .collect();

        for (i, node) in nodes.iter().enumerate() {
            let name = node.name().replace('"', "\\\"");

            let (label_extra, color_code) = if let Some(exec) = times.get(node.id()) {
                let t = (exec.duration.as_secs_f64() - min_time) / (max_time - min_time);
                (format!("{:.2?}", exec.duration), heat(t))
            } else if self.failed.contains(node.id()) {
                ("Failed".to_string(), "#A9A9A9".to_string())
            } else {
                ("Cached".to_string(), "#ADD8E6".to_string())
            };

            let _ = writeln!(f, "    n{i}[\"{name}\\n{label_extra}\"]");
            let _ = writeln!(f, "    style n{i} fill:{color_code}");

            if tree.output_nodes().contains(node.id()) {
                let _ = writeln!(f, "    n{i} --> Output");
            }
        }

        let _ = writeln!(f, "    Output[Output]");

        let mut edges: Vec<_> = tree.search_tree().connections().collect();
        edges.sort();
        for (from, to) in edges {
            if let (Some(a), Some(b)) = (index.get(&from.node), index.get(&to.node)) {
                let _ = writeln!(f, "    n{a} -- \"{}\" --> n{b}", to.name);
            }
        }

        f
    }
}

/// Green (0.0) to yellow (0.5) to red (1.0).
fn heat(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let (r, g, b) = if t < 0.5 {
        ((255.0 * t * 2.0) as u8, 255, 0)
    } else {
        (255, (255.0 * (1.0 - (t - 0.5) * 2.0)) as u8, 0)
    };
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Time it takes to produce each node from scratch: its own last recorded
/// time plus that of every ancestor, each ancestor counted once.
///
/// Nodes whose last run failed or that never ran map to `None`, and ancestors
/// without a time contribute nothing.
pub(crate) fn cumulative_times<'a>(
    search: &SearchTree,
    nodes: impl IntoIterator<Item = &'a NodeId>,
    times: &HashMap<NodeId, Option<Duration>>,
) -> BTreeMap<NodeId, Option<f64>> {
    let own = |node: &NodeId| times.get(node).copied().flatten();

    nodes
        .into_iter()
        .map(|node| {
            let Some(time) = own(node) else {
                return (node.clone(), None);
            };

            let mut total = time;
            let mut seen = HashSet::from([node]);
            let mut queue = VecDeque::from([node]);
            while let Some(current) = queue.pop_front() {
                for prev in search.from_nodes(current) {
                    if seen.insert(prev) {
                        total += own(prev).unwrap_or_default();
                        queue.push_back(prev);
                    }
                }
            }

            (node.clone(), Some(total.as_secs_f64()))
        })
        .collect()
}
