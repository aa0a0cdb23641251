use std::any::Any;
use std::collections::HashMap;

use crate::core::{Dynamic, SocketRef};

/// Where output socket values live between passes.
///
/// The engine decides when values are read and written; how they are kept is
/// up to the implementation. Values are only read and written on the thread
/// that drives the pass.
pub trait SocketStore: Send {
    fn get(&self, socket: &SocketRef) -> Option<Dynamic>;

    fn set(&mut self, socket: &SocketRef, value: Dynamic);

    /// Drops every stored value. Called when the tree is replaced.
    fn clear(&mut self) {}
}

/// In-memory store keyed by output socket.
#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<SocketRef, Dynamic>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Typed view of a stored value.
    pub fn get_as<T: Any>(&self, socket: &SocketRef) -> Option<&T> {
        self.values.get(socket)?.downcast_ref()
    }
}

impl SocketStore for MemoryStore {
    fn get(&self, socket: &SocketRef) -> Option<Dynamic> {
        self.values.get(socket).cloned()
    }

    fn set(&mut self, socket: &SocketRef, value: Dynamic) {
        self.values.insert(socket.clone(), value);
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}
