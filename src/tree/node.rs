use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::core::{ArcStr, Dynamic, NodeId};
use crate::error::ContextError;

/// Names of the single input and output socket of a reroute node.
pub const REROUTE_INPUT: &str = "Input";
pub const REROUTE_OUTPUT: &str = "Output";

/// The computation carried by a node.
///
/// Every node type supplies its own implementation. The engine never looks at
/// what a node does, it only cares whether the call succeeded and how long it
/// took.
pub trait Process: Send + Sync {
    fn process(&self, ctx: &mut Context<'_>) -> anyhow::Result<()>;
}

struct FnProcess<F>(F);

impl<F> Process for FnProcess<F>
where
    F: Fn(&mut Context<'_>) -> anyhow::Result<()> + Send + Sync,
{
    fn process(&self, ctx: &mut Context<'_>) -> anyhow::Result<()> {
        (self.0)(ctx)
    }
}

struct Noop;

impl Process for Noop {
    fn process(&self, _: &mut Context<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// A connection point owned by exactly one node.
#[derive(Clone)]
pub struct Socket {
    pub(crate) name: ArcStr,
    pub(crate) direction: Direction,
    /// Value used when an input is not connected.
    pub(crate) default: Option<Dynamic>,
}

impl Socket {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn default_value(&self) -> Option<&Dynamic> {
        self.default.as_ref()
    }
}

impl Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("default", &self.default.is_some())
            .finish()
    }
}

/// A unit of computation in the tree.
#[derive(Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) kind: String,
    pub(crate) is_outdated: bool,
    pub(crate) is_reroute: bool,
    pub(crate) inputs: Vec<Socket>,
    pub(crate) outputs: Vec<Socket>,
    pub(crate) process: Arc<dyn Process>,
}

impl Node {
    /// Creates a node without sockets whose computation does nothing. Freshly
    /// created nodes are always outdated.
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: String::new(),
            is_outdated: true,
            is_reroute: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
            process: Arc::new(Noop),
        }
    }

    /// A pass-through node with one input and one output. Reroutes are wired
    /// out of the graph during search tree construction and never execute.
    pub fn reroute(id: impl Into<NodeId>) -> Self {
        let mut node = Self::new(id, "Reroute")
            .with_kind("NodeReroute")
            .with_input(REROUTE_INPUT)
            .with_output(REROUTE_OUTPUT);
        node.is_reroute = true;
        node
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_input(mut self, name: impl AsRef<str>) -> Self {
        self.inputs.push(Socket {
            name: Arc::from(name.as_ref()),
            direction: Direction::Input,
            default: None,
        });
        self
    }

    pub fn with_input_default<T>(mut self, name: impl AsRef<str>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.inputs.push(Socket {
            name: Arc::from(name.as_ref()),
            direction: Direction::Input,
            default: Some(Arc::new(value)),
        });
        self
    }

    pub fn with_output(mut self, name: impl AsRef<str>) -> Self {
        self.outputs.push(Socket {
            name: Arc::from(name.as_ref()),
            direction: Direction::Output,
            default: None,
        });
        self
    }

    pub fn with_process(mut self, process: impl Process + 'static) -> Self {
        self.process = Arc::new(process);
        self
    }

    pub fn with_process_fn<F>(self, f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.with_process(FnProcess(f))
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn is_outdated(&self) -> bool {
        self.is_outdated
    }

    pub fn is_reroute(&self) -> bool {
        self.is_reroute
    }

    pub fn inputs(&self) -> &[Socket] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Socket] {
        &self.outputs
    }

    pub(crate) fn input(&self, name: &str) -> Option<&Socket> {
        self.inputs.iter().find(|socket| &*socket.name == name)
    }

    pub(crate) fn output(&self, name: &str) -> Option<&Socket> {
        self.outputs.iter().find(|socket| &*socket.name == name)
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("is_outdated", &self.is_outdated)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// What a node body sees while it runs: its resolved inputs and a place to
/// put its outputs.
///
/// Outputs are buffered here and written to the socket store by the scheduler
/// once the node has returned successfully, so a failing node never leaves
/// half-written outputs behind.
pub struct Context<'a> {
    pub(crate) node: &'a NodeId,
    pub(crate) inputs: &'a HashMap<ArcStr, Dynamic>,
    pub(crate) declared: &'a [ArcStr],
    pub(crate) written: Vec<(ArcStr, Dynamic)>,
}

impl<'a> Context<'a> {
    pub fn node(&self) -> &NodeId {
        self.node
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    /// Reads an input value, either from the connected producer or from the
    /// socket default.
    pub fn input<T: Any>(&self, name: &str) -> Result<&T, ContextError> {
        let value = self
            .inputs
            .get(name)
            .ok_or_else(|| ContextError::MissingInput(name.to_string()))?;

        value
            .downcast_ref::<T>()
            .ok_or_else(|| ContextError::WrongType(name.to_string(), type_name::<T>()))
    }

    pub fn set_output<T>(&mut self, name: &str, value: T) -> Result<(), ContextError>
    where
        T: Any + Send + Sync,
    {
        let name = self
            .declared
            .iter()
            .find(|declared| &***declared == name)
            .ok_or_else(|| ContextError::UnknownOutput(name.to_string()))?;

        self.written.retain(|(written, _)| written != name);
        self.written.push((name.clone(), Arc::new(value)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_outdated() {
        let node = Node::new("a", "Alpha").with_input("x").with_output("y");
        assert!(node.is_outdated());
        assert!(!node.is_reroute());
        assert!(node.input("x").is_some());
        assert!(node.input("y").is_none());
        assert!(node.output("y").is_some());
    }

    #[test]
    fn test_reroute_shape() {
        let node = Node::reroute("r");
        assert!(node.is_reroute());
        assert_eq!(node.inputs().len(), 1);
        assert_eq!(node.outputs().len(), 1);
        assert_eq!(node.kind(), "NodeReroute");
    }

    #[test]
    fn test_context_inputs_and_outputs() {
        let id = NodeId::from("a");
        let mut inputs: HashMap<ArcStr, Dynamic> = HashMap::new();
        inputs.insert(Arc::from("x"), Arc::new(3_i64));
        let declared = vec![ArcStr::from("y")];

        let mut ctx = Context {
            node: &id,
            inputs: &inputs,
            declared: &declared,
            written: Vec::new(),
        };

        assert_eq!(*ctx.input::<i64>("x").unwrap(), 3);
        assert!(matches!(
            ctx.input::<String>("x"),
            Err(ContextError::WrongType(..))
        ));
        assert!(matches!(
            ctx.input::<i64>("z"),
            Err(ContextError::MissingInput(..))
        ));

        ctx.set_output("y", 1_i64).unwrap();
        ctx.set_output("y", 2_i64).unwrap();
        assert!(matches!(
            ctx.set_output("nope", 0_i64),
            Err(ContextError::UnknownOutput(..))
        ));
        assert_eq!(ctx.written.len(), 1);
        assert_eq!(ctx.written[0].1.downcast_ref::<i64>(), Some(&2));
    }
}
