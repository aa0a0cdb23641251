use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::NodeId;
use crate::engine::runner::Diagnostics;
use crate::error::{CyclicGraphError, DanglingLink};

/// Where a node stands within the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Not part of the pass.
    Clean,
    Outdated,
    Queued,
    Running,
    Done,
    Failed,
    /// Not run because something it depends on failed or sits on a cycle.
    Skipped,
}

impl NodeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeState::Done | NodeState::Failed | NodeState::Skipped)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeFailure {
    pub node: NodeId,
    pub error: String,
}

/// Summary of one update pass, handed to every [`Hook`](crate::Hook).
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassReport {
    /// Nodes that ran to completion, in execution order.
    pub executed: Vec<NodeId>,
    pub skipped: Vec<NodeId>,
    pub failed: Vec<NodeFailure>,
    /// Wall-clock seconds spent in each completed node.
    pub timings: BTreeMap<NodeId, f64>,
    pub generations: Vec<Vec<NodeId>>,
    pub states: BTreeMap<NodeId, NodeState>,
    pub cycle: Option<CyclicGraphError>,
    pub warnings: Vec<DanglingLink>,
    /// Wall-clock seconds for the whole pass.
    pub elapsed: f64,
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

impl PassReport {
    /// No node failed, nothing was skipped and no cycle was found.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty() && self.cycle.is_none()
    }

    pub fn state(&self, node: &NodeId) -> NodeState {
        self.states.get(node).copied().unwrap_or(NodeState::Clean)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
