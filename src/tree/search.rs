//! Reverse index over the links of one tree snapshot.
//!
//! The links of a tree only say "this output feeds that input". Walking the
//! graph needs the same information indexed the other way around, and at two
//! granularities: node to node, and socket to socket. [`SearchTree`] holds all
//! four maps, built together in a single pass so that they can never disagree.
//!
//! Links that cannot be wired (an endpoint is gone, or the input is already
//! driven) are dropped with a [`DanglingLink`] warning instead of failing the
//! build. Muted links are ignored, and reroute nodes are wired out of the
//! graph so that their consumers talk to the real producer directly.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::core::{NodeId, SocketRef};
use crate::error::{DanglingLink, DanglingReason};
use crate::tree::link::Link;
use crate::tree::node::{Node, REROUTE_INPUT};

#[derive(Debug, Default, Clone)]
pub struct SearchTree {
    from_nodes: HashMap<NodeId, HashSet<NodeId>>,
    to_nodes: HashMap<NodeId, HashSet<NodeId>>,
    from_sock: HashMap<SocketRef, SocketRef>,
    to_socks: HashMap<SocketRef, HashSet<SocketRef>>,
    /// Reroute node -> real nodes that receive data through it.
    reroutes: HashMap<NodeId, HashSet<NodeId>>,
    names: HashMap<NodeId, String>,
    warnings: Vec<DanglingLink>,
}

impl SearchTree {
    pub fn build<'a>(
        nodes: &HashMap<NodeId, Node>,
        links: impl IntoIterator<Item = &'a Link>,
    ) -> Self {
        // Sorting makes the choice between two links fighting over one input
        // independent of the order the host handed them over.
        let mut links: Vec<&Link> = links.into_iter().filter(|link| !link.muted).collect();
        links.sort_by(|a, b| a.id.cmp(&b.id));

        let mut warnings = Vec::new();
        let mut raw: HashMap<&SocketRef, &SocketRef> = HashMap::new();

        for link in links {
            if let Err(reason) = check_endpoints(nodes, link) {
                warnings.push(DanglingLink {
                    link: link.id.clone(),
                    reason,
                });
                continue;
            }

            if raw.contains_key(&link.to) {
                warnings.push(DanglingLink {
                    link: link.id.clone(),
                    reason: DanglingReason::InputOccupied,
                });
                continue;
            }

            raw.insert(&link.to, &link.from);
        }

        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        let mut search = SearchTree {
            warnings,
            ..Default::default()
        };

        for (&input, &output) in &raw {
            if nodes[&input.node].is_reroute {
                continue;
            }

            if let Some(producer) = search.resolve(nodes, &raw, input, output) {
                search.insert(nodes, input.clone(), producer);
            }
        }

        search
    }

    /// Follows `output` back through any reroute nodes to the socket that
    /// actually produces the data. Records every reroute passed on the way.
    fn resolve<'r>(
        &mut self,
        nodes: &HashMap<NodeId, Node>,
        raw: &HashMap<&'r SocketRef, &'r SocketRef>,
        input: &SocketRef,
        output: &'r SocketRef,
    ) -> Option<SocketRef> {
        let mut socket = output;
        let mut hops = HashSet::new();

        while nodes[&socket.node].is_reroute {
            self.reroutes
                .entry(socket.node.clone())
                .or_default()
                .insert(input.node.clone());

            if !hops.insert(&socket.node) {
                return None;
            }

            let reroute_input = SocketRef::new(socket.node.clone(), REROUTE_INPUT);
            socket = *raw.get(&reroute_input)?;
        }

        Some(socket.clone())
    }

    fn insert(&mut self, nodes: &HashMap<NodeId, Node>, input: SocketRef, output: SocketRef) {
        for id in [&input.node, &output.node] {
            if !self.names.contains_key(id) {
                self.names.insert(id.clone(), nodes[id].name.clone());
            }
        }

        self.from_nodes
            .entry(input.node.clone())
            .or_default()
            .insert(output.node.clone());
        self.to_nodes
            .entry(output.node.clone())
            .or_default()
            .insert(input.node.clone());
        self.to_socks
            .entry(output.clone())
            .or_default()
            .insert(input.clone());
        self.from_sock.insert(input, output);
    }

    /// Direct predecessors of a node.
    pub fn from_nodes(&self, node: &NodeId) -> impl Iterator<Item = &NodeId> {
        self.from_nodes.get(node).into_iter().flatten()
    }

    /// Direct successors of a node.
    pub fn to_nodes(&self, node: &NodeId) -> impl Iterator<Item = &NodeId> {
        self.to_nodes.get(node).into_iter().flatten()
    }

    /// The single producer of an input socket, if it is connected.
    pub fn from_sock(&self, input: &SocketRef) -> Option<&SocketRef> {
        self.from_sock.get(input)
    }

    /// Every input socket fed by an output socket.
    pub fn to_socks(&self, output: &SocketRef) -> impl Iterator<Item = &SocketRef> {
        self.to_socks.get(output).into_iter().flatten()
    }

    /// Real nodes that receive data through the given reroute node.
    pub(crate) fn reroute_targets(&self, reroute: &NodeId) -> impl Iterator<Item = &NodeId> {
        self.reroutes.get(reroute).into_iter().flatten()
    }

    /// All wired connections as `(output, input)` pairs.
    pub fn connections(&self) -> impl Iterator<Item = (&SocketRef, &SocketRef)> {
        self.from_sock.iter().map(|(input, output)| (output, input))
    }

    pub(crate) fn successors(&self) -> &HashMap<NodeId, HashSet<NodeId>> {
        &self.to_nodes
    }

    pub(crate) fn predecessors(&self) -> &HashMap<NodeId, HashSet<NodeId>> {
        &self.from_nodes
    }

    /// Links that were dropped while building.
    pub fn warnings(&self) -> &[DanglingLink] {
        &self.warnings
    }

    /// The connections of this tree keyed by node and socket names instead of
    /// ids: `(from node, from socket, to node, to socket)`.
    pub fn canonical(&self) -> BTreeSet<(&str, &str, &str, &str)> {
        self.from_sock
            .iter()
            .map(|(input, output)| {
                (
                    self.names[&output.node].as_str(),
                    &*output.name,
                    self.names[&input.node].as_str(),
                    &*input.name,
                )
            })
            .collect()
    }

    /// Whether two trees describe the same wiring, assuming node names are the
    /// correspondence between them.
    pub fn is_equivalent(&self, other: &SearchTree) -> bool {
        self.canonical() == other.canonical()
    }
}

impl PartialEq for SearchTree {
    fn eq(&self, other: &Self) -> bool {
        self.from_nodes == other.from_nodes
            && self.to_nodes == other.to_nodes
            && self.from_sock == other.from_sock
            && self.to_socks == other.to_socks
            && self.reroutes == other.reroutes
    }
}

impl Eq for SearchTree {}

pub(crate) fn check_endpoints(
    nodes: &HashMap<NodeId, Node>,
    link: &Link,
) -> Result<(), DanglingReason> {
    let from = nodes
        .get(&link.from.node)
        .ok_or(DanglingReason::MissingNode)?;
    let to = nodes.get(&link.to.node).ok_or(DanglingReason::MissingNode)?;

    if from.output(&link.from.name).is_none() || to.input(&link.to.name).is_none() {
        return Err(DanglingReason::MissingSocket);
    }

    Ok(())
}
