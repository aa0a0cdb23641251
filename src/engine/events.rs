use std::collections::HashSet;
use std::sync::mpsc::Sender;

use crate::core::NodeId;
use crate::error::EngineError;
use crate::tree::{Tree, TreeEdit};

/// Host events waiting to be applied by the engine.
#[derive(Debug)]
pub(crate) enum Event {
    Changed {
        nodes: HashSet<NodeId>,
        topology_changed: bool,
    },
    SetOutputs(HashSet<NodeId>),
    Edit(TreeEdit),
    Load(Tree),
    Reset,
    Shutdown,
}

/// Cloneable sender side of the engine's event queue.
///
/// Events are applied in the order they were sent, between passes only: a
/// pass that is already running never sees them.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    pub(crate) tx: Sender<Event>,
}

impl EngineHandle {
    fn send(&self, event: Event) -> Result<(), EngineError> {
        self.tx.send(event).map_err(|_| EngineError::Closed)
    }

    pub fn notify<I>(
        &self,
        nodes: impl IntoIterator<Item = I>,
        topology_changed: bool,
    ) -> Result<(), EngineError>
    where
        I: Into<NodeId>,
    {
        self.send(Event::Changed {
            nodes: nodes.into_iter().map(Into::into).collect(),
            topology_changed,
        })
    }

    pub fn set_output_nodes<I>(&self, nodes: impl IntoIterator<Item = I>) -> Result<(), EngineError>
    where
        I: Into<NodeId>,
    {
        self.send(Event::SetOutputs(nodes.into_iter().map(Into::into).collect()))
    }

    pub fn edit(&self, edit: TreeEdit) -> Result<(), EngineError> {
        self.send(Event::Edit(edit))
    }

    pub fn load(&self, tree: Tree) -> Result<(), EngineError> {
        self.send(Event::Load(tree))
    }

    pub fn reset(&self) -> Result<(), EngineError> {
        self.send(Event::Reset)
    }

    /// Makes [`Engine::listen`](crate::Engine::listen) return once every
    /// event sent before this one has been handled.
    pub fn shutdown(&self) -> Result<(), EngineError> {
        self.send(Event::Shutdown)
    }
}
