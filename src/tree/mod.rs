//! The graph model: nodes, links, and the tree that owns them.
//!
//! A [`Tree`] keeps three lazily refreshed caches on top of its nodes and
//! links: the [`SearchTree`] (rebuilt when the topology changes), the set of
//! nodes connected to an output (recomputed when the topology or the output
//! set changes), and the set of nodes affected by changes (recomputed when
//! anything becomes outdated). [`Tree::refresh`] brings all of them up to
//! date in that order.

mod link;
mod node;
pub(crate) mod search;
mod walk;

use std::collections::HashMap;
use std::collections::HashSet;

pub use link::Link;
pub use node::{Context, Direction, Node, Process, REROUTE_INPUT, REROUTE_OUTPUT, Socket};
pub use search::SearchTree;
pub use walk::{Generations, Walk, Walker};

use crate::core::{LinkId, NodeId};
use crate::error::{DanglingLink, DanglingReason, TreeError};

/// An incremental change to the structure of a tree.
#[derive(Debug, Clone)]
pub enum TreeEdit {
    AddNode(Node),
    RemoveNode(NodeId),
    AddLink(Link),
    RemoveLink(LinkId),
    MuteLink(LinkId, bool),
}

#[derive(Debug)]
pub struct Tree {
    id: String,
    nodes: HashMap<NodeId, Node>,
    links: HashMap<LinkId, Link>,
    search: SearchTree,
    walk: Walk,
    topology_dirty: bool,
    outputs_dirty: bool,
    dirtiness_dirty: bool,
}

impl Tree {
    pub fn builder(id: impl Into<String>) -> TreeBuilder {
        TreeBuilder {
            id: id.into(),
            nodes: HashMap::new(),
            links: HashMap::new(),
            outputs: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn link(&self, id: &LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn search_tree(&self) -> &SearchTree {
        &self.search
    }

    pub fn walk(&self) -> &Walk {
        &self.walk
    }

    /// Links that are present in the tree but could not be wired during the
    /// last search tree rebuild.
    pub fn warnings(&self) -> &[DanglingLink] {
        self.search.warnings()
    }

    pub fn output_nodes(&self) -> &HashSet<NodeId> {
        &self.walk.output_nodes
    }

    pub fn nodes_connected_to_output(&self) -> &HashSet<NodeId> {
        self.walk.nodes_connected_to_output()
    }

    pub fn effected_by_changes_nodes(&self) -> &HashSet<NodeId> {
        self.walk.effected_by_changes_nodes()
    }

    pub fn outdated_nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes
            .values()
            .filter(|node| node.is_outdated)
            .map(|node| &node.id)
    }

    /// Flags nodes for recomputation. Unknown ids are logged and skipped.
    pub fn mark_outdated<I>(&mut self, ids: impl IntoIterator<Item = I>)
    where
        I: Into<NodeId>,
    {
        for id in ids {
            let id = id.into();
            match self.nodes.get_mut(&id) {
                Some(node) => node.is_outdated = true,
                None => tracing::warn!("Ignoring change notification for unknown node '{id}'"),
            }
        }
        self.dirtiness_dirty = true;
    }

    pub(crate) fn set_updated(&mut self, id: &NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.is_outdated = false;
            self.dirtiness_dirty = true;
        }
    }

    /// Replaces the output node set. Unknown ids are logged and skipped.
    pub fn set_output_nodes<I>(&mut self, ids: impl IntoIterator<Item = I>)
    where
        I: Into<NodeId>,
    {
        let mut outputs = HashSet::new();
        for id in ids {
            let id = id.into();
            if self.nodes.contains_key(&id) {
                outputs.insert(id);
            } else {
                tracing::warn!("Ignoring unknown output node '{id}'");
            }
        }
        self.walk.output_nodes = outputs;
        self.outputs_dirty = true;
    }

    /// Nodes whose kind matches any of the patterns.
    pub fn nodes_of_kind(&self, patterns: &[glob::Pattern]) -> Vec<NodeId> {
        let mut found: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|node| patterns.iter().any(|p| p.matches(&node.kind)))
            .map(|node| node.id.clone())
            .collect();
        found.sort();
        found
    }

    pub fn apply(&mut self, edit: TreeEdit) -> Result<(), TreeError> {
        match edit {
            TreeEdit::AddNode(node) => self.add_node(node),
            TreeEdit::RemoveNode(id) => self.remove_node(&id),
            TreeEdit::AddLink(link) => self.add_link(link),
            TreeEdit::RemoveLink(id) => self.remove_link(&id),
            TreeEdit::MuteLink(id, muted) => self.mute_link(&id, muted),
        }
    }

    pub fn add_node(&mut self, mut node: Node) -> Result<(), TreeError> {
        if self.nodes.contains_key(&node.id) {
            return Err(TreeError::DuplicateNode(node.id));
        }

        node.is_outdated = true;
        self.nodes.insert(node.id.clone(), node);
        self.topology_dirty = true;
        self.dirtiness_dirty = true;
        Ok(())
    }

    /// Removes a node. Its links stay in the tree as dangling links and its
    /// direct consumers become outdated.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<(), TreeError> {
        if self.nodes.remove(id).is_none() {
            return Err(TreeError::UnknownNode(id.clone()));
        }

        let consumers: Vec<NodeId> = self
            .links
            .values()
            .filter(|link| !link.muted && link.from.node == *id)
            .map(|link| link.to.node.clone())
            .collect();
        self.mark_outdated(consumers);

        if self.walk.output_nodes.remove(id) {
            self.outputs_dirty = true;
        }
        self.topology_dirty = true;
        self.dirtiness_dirty = true;
        Ok(())
    }

    pub fn add_link(&mut self, link: Link) -> Result<(), TreeError> {
        if self.links.contains_key(&link.id) {
            return Err(TreeError::DuplicateLink(link.id));
        }

        let dangling = |reason| DanglingLink {
            link: link.id.clone(),
            reason,
        };

        search::check_endpoints(&self.nodes, &link).map_err(dangling)?;

        if !link.muted {
            let live = || {
                self.links.values().filter(|other| {
                    !other.muted && search::check_endpoints(&self.nodes, other).is_ok()
                })
            };
            if live().any(|other| other.to == link.to) {
                return Err(dangling(DanglingReason::InputOccupied).into());
            }

            // A producer may skip work for outputs nobody reads, so a newly
            // consumed output forces it to run again.
            if !live().any(|other| other.from == link.from) {
                self.mark_outdated([&link.from.node]);
            }
            self.mark_outdated([&link.to.node]);
        }

        self.links.insert(link.id.clone(), link);
        self.topology_dirty = true;
        Ok(())
    }

    pub fn remove_link(&mut self, id: &LinkId) -> Result<(), TreeError> {
        let link = self
            .links
            .remove(id)
            .ok_or_else(|| TreeError::UnknownLink(id.clone()))?;

        if !link.muted && self.nodes.contains_key(&link.to.node) {
            self.mark_outdated([link.to.node]);
        }
        self.topology_dirty = true;
        Ok(())
    }

    pub fn mute_link(&mut self, id: &LinkId, muted: bool) -> Result<(), TreeError> {
        let link = self
            .links
            .get_mut(id)
            .ok_or_else(|| TreeError::UnknownLink(id.clone()))?;

        if link.muted == muted {
            return Ok(());
        }
        link.muted = muted;

        let consumer = link.to.node.clone();
        if self.nodes.contains_key(&consumer) {
            self.mark_outdated([consumer]);
        }
        self.topology_dirty = true;
        Ok(())
    }

    /// Forces the next refresh to rebuild the search tree and the set of nodes
    /// connected to an output, even if no edit went through [`Tree::apply`].
    pub fn invalidate_topology(&mut self) {
        self.topology_dirty = true;
        self.outputs_dirty = true;
    }

    /// Rebuilds whichever cached sets are out of date.
    pub fn refresh(&mut self) {
        if self.topology_dirty {
            let search = SearchTree::build(&self.nodes, self.links.values());
            if search != self.search {
                self.outputs_dirty = true;
                self.dirtiness_dirty = true;
            }
            self.search = search;
            self.topology_dirty = false;
        }

        if self.outputs_dirty {
            self.recalculate_connected_to_output_nodes();
        }

        if self.dirtiness_dirty {
            self.recalculate_effected_by_changes_nodes();
        }
    }

    pub fn recalculate_connected_to_output_nodes(&mut self) {
        let seeds: Vec<NodeId> = self
            .walk
            .output_nodes
            .iter()
            .filter(|id| self.nodes.get(*id).is_some_and(|node| !node.is_reroute))
            .cloned()
            .collect();

        self.walk
            .recalculate_connected_to_output_nodes(&self.search, &seeds);
        self.outputs_dirty = false;
    }

    /// Reroute nodes never run themselves, so an outdated reroute hands its
    /// flag over to the real nodes reading through it.
    pub fn recalculate_effected_by_changes_nodes(&mut self) {
        let reroutes: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|node| node.is_reroute && node.is_outdated)
            .map(|node| node.id.clone())
            .collect();

        for reroute in &reroutes {
            for target in self.search.reroute_targets(reroute) {
                if let Some(node) = self.nodes.get_mut(target) {
                    node.is_outdated = true;
                }
            }
            if let Some(node) = self.nodes.get_mut(reroute) {
                node.is_outdated = false;
            }
        }

        let seeds: HashSet<NodeId> = self
            .nodes
            .values()
            .filter(|node| node.is_outdated)
            .map(|node| node.id.clone())
            .collect();

        self.walk
            .recalculate_effected_by_changes_nodes(&self.search, &seeds);
        self.dirtiness_dirty = false;
    }

    /// The intersection of the two walk sets, after refreshing them.
    pub fn worth_recalculating_nodes(&mut self) -> HashSet<NodeId> {
        self.refresh();
        self.walk.worth_recalculating_nodes()
    }

    /// A walker over the nodes worth recalculating, after refreshing the
    /// walk sets. Any later refresh that changes a walk set invalidates it.
    pub fn walk_on_worth_recalculating_nodes(&mut self) -> Walker {
        self.refresh();
        self.walk.walker(&self.search)
    }
}

pub struct TreeBuilder {
    id: String,
    nodes: HashMap<NodeId, Node>,
    links: HashMap<LinkId, Link>,
    outputs: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn node(mut self, node: Node) -> Self {
        if let Some(old) = self.nodes.insert(node.id.clone(), node) {
            tracing::warn!("Node '{}' defined twice, keeping the last one", old.id);
        }
        self
    }

    pub fn link(mut self, link: Link) -> Self {
        if let Some(old) = self.links.insert(link.id.clone(), link) {
            tracing::warn!("Link '{}' defined twice, keeping the last one", old.id);
        }
        self
    }

    pub fn output(mut self, id: impl Into<NodeId>) -> Self {
        self.outputs.push(id.into());
        self
    }

    /// Builds the tree with every node outdated. Links that cannot be wired
    /// are kept but reported as [`Tree::warnings`].
    pub fn build(self) -> Tree {
        let mut nodes = self.nodes;
        for node in nodes.values_mut() {
            node.is_outdated = true;
        }

        let search = SearchTree::build(&nodes, self.links.values());
        let mut tree = Tree {
            id: self.id,
            nodes,
            links: self.links,
            search,
            walk: Walk::default(),
            topology_dirty: false,
            outputs_dirty: true,
            dirtiness_dirty: true,
        };

        tree.set_output_nodes(self.outputs);
        tree.refresh();

        tracing::debug!(
            "Built tree '{}' with {} nodes and {} links",
            tree.id,
            tree.nodes.len(),
            tree.links.len()
        );

        tree
    }
}
