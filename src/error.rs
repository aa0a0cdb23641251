use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

use crate::core::{LinkId, NodeId};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to build worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid progress bar template")]
    Progress(#[from] indicatif::style::TemplateError),

    #[error("Invalid configuration:\n{0}")]
    Config(#[from] ConfigError),

    #[error("Error while editing the tree:\n{0}")]
    Tree(#[from] TreeError),

    #[error("No tree is loaded")]
    NoTree,

    #[error("Event channel is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Node '{0}' already exists")]
    DuplicateNode(NodeId),

    #[error("Node '{0}' not found")]
    UnknownNode(NodeId),

    #[error("Link '{0}' not found")]
    UnknownLink(LinkId),

    #[error("Link '{0}' already exists")]
    DuplicateLink(LinkId),

    #[error(transparent)]
    Dangling(#[from] DanglingLink),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Couldn't read the configuration file.\n{0}")]
    Io(#[from] std::io::Error),

    #[error("Couldn't parse the configuration.\n{0}")]
    Json(#[from] serde_json::Error),

    #[error("Couldn't compile output kind pattern.\n{0}")]
    Pattern(#[from] glob::PatternError),
}

/// Why a link was left out of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingReason {
    /// One of the endpoint nodes does not exist.
    MissingNode,
    /// The endpoint node exists but has no socket of that name.
    MissingSocket,
    /// The input socket is already driven by another link.
    InputOccupied,
}

impl Display for DanglingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DanglingReason::MissingNode => f.write_str("endpoint node is missing"),
            DanglingReason::MissingSocket => f.write_str("endpoint socket is missing"),
            DanglingReason::InputOccupied => f.write_str("input socket already has a producer"),
        }
    }
}

/// A link that could not be wired into the graph. Non-fatal, the link is
/// dropped and the rest of the graph is built without it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Link '{link}' was dropped: {reason}")]
pub struct DanglingLink {
    pub link: LinkId,
    pub reason: DanglingReason,
}

/// A cycle inside the set of nodes worth recalculating.
///
/// `cycle` holds the nodes that take part in a cycle, `blocked` the nodes that
/// could never run because they sit downstream of one.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Cycle detected between nodes [{}]", join(.cycle))]
pub struct CyclicGraphError {
    pub cycle: Vec<NodeId>,
    pub blocked: Vec<NodeId>,
}

#[derive(Debug, Error)]
pub enum NodeComputationError {
    #[error("Node '{0}':\n{1:#}")]
    Failed(NodeId, anyhow::Error),

    #[error("Node '{0}' panicked: {1}")]
    Panicked(NodeId, String),
}

impl NodeComputationError {
    pub fn node(&self) -> &NodeId {
        match self {
            NodeComputationError::Failed(node, _) => node,
            NodeComputationError::Panicked(node, _) => node,
        }
    }
}

/// Raised (as a panic) when a walker is advanced after the walk sets it was
/// created from have been recalculated.
#[derive(Debug, Error)]
#[error("Topological walker used after its walk sets were recalculated")]
pub struct StaleWalker;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Input '{0}' is not connected and has no default value")]
    MissingInput(String),

    #[error("Input '{0}' does not hold a value of type {1}")]
    WrongType(String, &'static str),

    #[error("Node has no output socket named '{0}'")]
    UnknownOutput(String),
}

fn join(nodes: &[NodeId]) -> String {
    nodes
        .iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
