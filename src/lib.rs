#![forbid(unsafe_code)]
//! Incremental re-evaluation engine for node-based dataflow graphs.
//!
//! A [`Tree`] holds computation nodes wired output-to-input by links. When the
//! host reports that some nodes changed, the [`Engine`] works out which nodes
//! both depend on a change and feed an output node, orders them into
//! generations of mutually independent nodes, and runs each generation on a
//! worker pool before starting the next one. A failing node only takes its
//! own downstream with it; the rest of the tree still updates.
//!
//! ```
//! use nagare::{Config, Engine, Link, Node, SocketRef, Tree};
//!
//! let number = Node::new("n", "Number")
//!     .with_output("out")
//!     .with_process_fn(|ctx| Ok(ctx.set_output("out", 20_i64)?));
//!
//! let double = Node::new("d", "Double")
//!     .with_input_default("in", 0_i64)
//!     .with_output("out")
//!     .with_process_fn(|ctx| {
//!         let value = *ctx.input::<i64>("in")?;
//!         ctx.set_output("out", value * 2)?;
//!         Ok(())
//!     });
//!
//! let tree = Tree::builder("demo")
//!     .node(number)
//!     .node(double)
//!     .link(Link::between(SocketRef::new("n", "out"), SocketRef::new("d", "in")))
//!     .output("d")
//!     .build();
//!
//! let mut engine = Engine::new(Config::default())?;
//! engine.load(tree);
//!
//! let report = engine.update()?.expect("a freshly loaded tree always runs");
//! assert_eq!(report.executed.len(), 2);
//! assert_eq!(engine.store().get_as::<i64>(&SocketRef::new("d", "out")), Some(&40));
//! # Ok::<(), nagare::EngineError>(())
//! ```

mod config;
mod core;
mod engine;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
mod tree;
mod utils;

#[cfg(test)]
mod testing;

pub use crate::config::Config;
pub use crate::core::{Dynamic, LinkId, NodeId, SocketRef};
pub use crate::engine::{
    Diagnostics, Engine, EngineHandle, Hook, MemoryStore, NodeExecution, NodeFailure, NodeState,
    PassReport, SocketStore,
};
pub use crate::error::*;
pub use crate::tree::{
    Context, Direction, Generations, Link, Node, Process, REROUTE_INPUT, REROUTE_OUTPUT,
    SearchTree, Socket, Tree, TreeBuilder, TreeEdit, Walk, Walker,
};
