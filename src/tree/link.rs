use crate::core::{LinkId, NodeId, SocketRef};

/// A directed edge from an output socket to an input socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub(crate) id: LinkId,
    pub(crate) from: SocketRef,
    pub(crate) to: SocketRef,
    pub(crate) muted: bool,
}

impl Link {
    pub fn new(id: impl Into<LinkId>, from: SocketRef, to: SocketRef) -> Self {
        Self {
            id: id.into(),
            from,
            to,
            muted: false,
        }
    }

    /// Creates a link whose id is derived from both endpoints.
    pub fn between(from: SocketRef, to: SocketRef) -> Self {
        let id = format!("{from}->{to}");
        Self::new(id, from, to)
    }

    /// Muted links stay in the tree but carry no data and no dependency.
    pub fn muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    pub fn id(&self) -> &LinkId {
        &self.id
    }

    /// The producing output socket.
    pub fn from(&self) -> &SocketRef {
        &self.from
    }

    /// The consuming input socket.
    pub fn to(&self) -> &SocketRef {
        &self.to
    }

    pub fn from_node(&self) -> &NodeId {
        &self.from.node
    }

    pub fn to_node(&self) -> &NodeId {
        &self.to.node
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }
}
