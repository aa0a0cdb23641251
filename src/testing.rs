//! Fixtures shared by the unit tests.
//!
//! The example tree is wired as follows, with every node having inputs `a`,
//! `b` and a single output `out`:
//!
//! ```text
//!  1----2-----3-----4
//!            / \
//!  8---9----5   6---7
//!     /
//!   10
//! ```

use std::collections::{HashMap, HashSet};

use crate::core::{NodeId, SocketRef};
use crate::tree::{Link, Node, Tree};

pub(crate) const EXAMPLE_EDGES: &[(&str, &str, &str)] = &[
    ("1", "2", "a"),
    ("2", "3", "a"),
    ("5", "3", "b"),
    ("3", "4", "a"),
    ("3", "6", "a"),
    ("6", "7", "a"),
    ("8", "9", "a"),
    ("10", "9", "b"),
    ("9", "5", "a"),
];

pub(crate) fn node(id: &str) -> Node {
    Node::new(id, format!("Node {id}"))
        .with_input("a")
        .with_input("b")
        .with_output("out")
}

pub(crate) fn link(from: &str, to: &str, socket: &str) -> Link {
    Link::between(SocketRef::new(from, "out"), SocketRef::new(to, socket))
}

pub(crate) fn example_nodes() -> HashMap<NodeId, Node> {
    (1..=10)
        .map(|i| {
            let node = node(&i.to_string());
            (node.id().clone(), node)
        })
        .collect()
}

pub(crate) fn example_links() -> Vec<Link> {
    EXAMPLE_EDGES
        .iter()
        .map(|(from, to, socket)| link(from, to, socket))
        .collect()
}

pub(crate) fn ids(ids: &[&str]) -> HashSet<NodeId> {
    ids.iter().map(|id| NodeId::from(*id)).collect()
}

/// Marks every node as up to date and brings the cached sets in line.
pub(crate) fn settle(tree: &mut Tree) {
    let all: Vec<NodeId> = tree.nodes().map(|node| node.id().clone()).collect();
    for id in &all {
        tree.set_updated(id);
    }
    tree.refresh();
}

/// The example tree with `4` as the only output and nothing outdated.
pub(crate) fn example_tree() -> Tree {
    let mut builder = Tree::builder("example");
    for node in example_nodes().into_values() {
        builder = builder.node(node);
    }
    for link in example_links() {
        builder = builder.link(link);
    }
    let mut tree = builder.output("4").build();
    settle(&mut tree);
    tree
}
