use std::any::Any;
use std::fmt::{Debug, Display};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A type-erased, thread-safe container for socket values.
///
/// The engine never looks inside these; it only moves them from output
/// sockets to the input sockets that consume them.
pub type Dynamic = Arc<dyn Any + Send + Sync>;

/// Atomic reference-counted string type used for identifiers.
pub(crate) type ArcStr = Arc<str>;

/// Stable identifier of a node within one tree.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(ArcStr);

impl NodeId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Stable identifier of a link within one tree.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(ArcStr);

impl LinkId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! impl_id {
    ($name:ident) => {
        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(Arc::from(value))
            }
        }

        impl From<&$name> for $name {
            fn from(value: &$name) -> Self {
                value.clone()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), &*self.0)
            }
        }
    };
}

impl_id!(NodeId);
impl_id!(LinkId);

/// Address of a socket: the owning node plus the socket name.
///
/// Input and output sockets live in separate namespaces, so a node may have an
/// input and an output with the same name. Which one a `SocketRef` points at
/// is always clear from where it is used.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SocketRef {
    pub node: NodeId,
    pub name: ArcStr,
}

impl SocketRef {
    pub fn new(node: impl Into<NodeId>, name: impl AsRef<str>) -> Self {
        Self {
            node: node.into(),
            name: Arc::from(name.as_ref()),
        }
    }
}

impl Display for SocketRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.node, self.name)
    }
}

impl Debug for SocketRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SocketRef({self})")
    }
}
