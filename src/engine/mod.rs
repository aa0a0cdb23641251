//! The scheduler: owns the current tree, applies host events, and runs
//! update passes.

mod events;
mod report;
mod runner;
mod store;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Debug;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;

pub use events::EngineHandle;
pub use report::{NodeFailure, NodeState, PassReport};
pub use runner::{Diagnostics, NodeExecution};
pub use store::{MemoryStore, SocketStore};

use crate::config::Config;
use crate::core::NodeId;
use crate::engine::events::Event;
use crate::engine::runner::Runner;
use crate::error::EngineError;
use crate::tree::{Tree, TreeEdit};

type HookCallback = Box<dyn Fn(&PassReport) -> anyhow::Result<()> + Send + Sync>;

/// Callback invoked at a fixed point of the engine's lifecycle.
///
/// `PassComplete` runs after every update pass with its report. A failing hook
/// is logged and does not affect the pass or the hooks after it.
pub enum Hook {
    PassComplete(HookCallback),
}

impl Hook {
    pub fn pass_complete<F>(fun: F) -> Self
    where
        F: Fn(&PassReport) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Hook::PassComplete(Box::new(fun))
    }
}

impl Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hook::PassComplete(_) => write!(f, "Hook::PassComplete(*)"),
        }
    }
}

/// Incremental re-evaluation engine for a single tree.
///
/// The engine is driven either directly, by calling [`notify`](Self::notify)
/// and friends followed by [`update`](Self::update), or through an
/// [`EngineHandle`] whose events are applied by `update` or
/// [`listen`](Self::listen). In both cases passes never overlap: whatever
/// arrives while a pass runs is applied once it has finished.
pub struct Engine<S: SocketStore = MemoryStore> {
    config: Config,
    patterns: Vec<glob::Pattern>,
    runner: Runner,
    tree: Option<Tree>,
    store: S,
    hooks: Vec<Hook>,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    /// Output nodes declared by the host, without the ones matched by kind.
    explicit_outputs: HashSet<NodeId>,
    /// Last recorded time of each node, `None` if its last run failed.
    times: HashMap<NodeId, Option<Duration>>,
    last: Option<PassReport>,
    pending: bool,
}

impl Engine<MemoryStore> {
    pub fn new(config: Config) -> Result<Self, EngineError> {
        Self::with_store(config, MemoryStore::new())
    }
}

impl<S: SocketStore> Engine<S> {
    pub fn with_store(config: Config, store: S) -> Result<Self, EngineError> {
        let patterns = config.output_patterns()?;
        let runner = Runner::new(&config)?;
        let (tx, rx) = channel();

        Ok(Self {
            config,
            patterns,
            runner,
            tree: None,
            store,
            hooks: Vec::new(),
            tx,
            rx,
            explicit_outputs: HashSet::new(),
            times: HashMap::new(),
            last: None,
            pending: false,
        })
    }

    pub fn add_hook(&mut self, hook: Hook) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn last_report(&self) -> Option<&PassReport> {
        self.last.as_ref()
    }

    /// State of a node in the most recent pass.
    pub fn state(&self, node: &NodeId) -> NodeState {
        self.last
            .as_ref()
            .map_or(NodeState::Clean, |report| report.state(node))
    }

    /// Replaces the current tree. Stored values and timings of the previous
    /// tree are dropped, every node of the new one runs on the next pass.
    pub fn load(&mut self, tree: Tree) {
        tracing::info!("Loading tree '{}'", tree.id());

        self.store.clear();
        self.times.clear();
        self.last = None;
        self.explicit_outputs = tree.output_nodes().clone();
        self.tree = Some(tree);
        self.apply_outputs();
        self.pending = true;
    }

    /// Forgets the tree and everything derived from it.
    pub fn reset(&mut self) {
        tracing::info!("Resetting engine");

        self.tree = None;
        self.store.clear();
        self.times.clear();
        self.last = None;
        self.explicit_outputs.clear();
        self.pending = false;
    }

    /// Marks nodes as changed. With `topology_changed` the search tree and
    /// the set of nodes connected to an output are rebuilt as well.
    pub fn notify<I>(&mut self, nodes: impl IntoIterator<Item = I>, topology_changed: bool)
    where
        I: Into<NodeId>,
    {
        let Some(tree) = self.tree.as_mut() else {
            tracing::warn!("Ignoring change notification, no tree is loaded");
            return;
        };

        if topology_changed {
            tree.invalidate_topology();
        }
        tree.mark_outdated(nodes);
        self.pending = true;
    }

    /// Declares the output nodes. Nodes matched by the configured output
    /// kinds stay output nodes regardless.
    pub fn set_output_nodes<I>(&mut self, nodes: impl IntoIterator<Item = I>)
    where
        I: Into<NodeId>,
    {
        self.explicit_outputs = nodes.into_iter().map(Into::into).collect();
        self.apply_outputs();
        self.pending = true;
    }

    pub fn edit(&mut self, edit: TreeEdit) -> Result<(), EngineError> {
        let tree = self.tree.as_mut().ok_or(EngineError::NoTree)?;

        let removed = match &edit {
            TreeEdit::RemoveNode(id) => Some(id.clone()),
            _ => None,
        };
        let added = matches!(edit, TreeEdit::AddNode(_));

        tree.apply(edit)?;

        if let Some(id) = removed {
            self.explicit_outputs.remove(&id);
            self.times.remove(&id);
        }
        if added && !self.patterns.is_empty() {
            self.apply_outputs();
        }

        self.pending = true;
        Ok(())
    }

    fn apply_outputs(&mut self) {
        if let Some(tree) = &mut self.tree {
            let mut outputs = self.explicit_outputs.clone();
            outputs.extend(tree.nodes_of_kind(&self.patterns));
            tree.set_output_nodes(outputs);
        }
    }

    /// Applies one event, returns `true` when asked to shut down.
    fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Changed {
                nodes,
                topology_changed,
            } => self.notify(nodes, topology_changed),
            Event::SetOutputs(nodes) => self.set_output_nodes(nodes),
            Event::Edit(edit) => {
                if let Err(err) = self.edit(edit) {
                    tracing::error!("Rejected edit:\n{err}");
                }
            }
            Event::Load(tree) => self.load(tree),
            Event::Reset => self.reset(),
            Event::Shutdown => return true,
        }
        false
    }

    /// Applies every queued event without blocking. Returns `true` if a
    /// shutdown request was among them.
    fn drain(&mut self) -> bool {
        while let Ok(event) = self.rx.try_recv() {
            if self.handle_event(event) {
                return true;
            }
        }
        false
    }

    /// Applies queued events, then runs a pass if anything changed since the
    /// last one.
    pub fn update(&mut self) -> Result<Option<PassReport>, EngineError> {
        if self.drain() {
            tracing::debug!("Shutdown request ignored outside of listen");
        }

        if self.pending && self.tree.is_some() {
            return self.run_pass().map(Some);
        }

        Ok(None)
    }

    /// Runs one update pass right away.
    pub fn run_pass(&mut self) -> Result<PassReport, EngineError> {
        let tree = self.tree.as_mut().ok_or(EngineError::NoTree)?;
        self.pending = false;

        let report = self.runner.run_pass(tree, &mut self.store)?;

        for (id, exec) in &report.diagnostics.execution_times {
            self.times.insert(id.clone(), Some(exec.duration));
        }
        for failure in &report.failed {
            self.times.insert(failure.node.clone(), None);
        }

        for hook in &self.hooks {
            match hook {
                Hook::PassComplete(callback) => {
                    if let Err(err) = callback(&report) {
                        tracing::error!("Hook failed:\n{err}");
                    }
                }
            }
        }

        self.last = Some(report.clone());
        Ok(report)
    }

    /// Blocks on the event queue, running a pass whenever events changed
    /// something, until [`EngineHandle::shutdown`] is called. Events that pile
    /// up during a pass are all applied before the next one starts.
    pub fn listen(&mut self) -> Result<(), EngineError> {
        loop {
            if self.pending && self.tree.is_some() {
                self.run_pass()?;
            }

            // The engine holds a sender itself, so the queue never disconnects.
            let Ok(event) = self.rx.recv() else {
                return Ok(());
            };

            if self.handle_event(event) || self.drain() {
                tracing::debug!("Engine stopped listening");
                return Ok(());
            }
        }
    }

    /// For each node connected to an output: its last recorded time plus the
    /// last recorded times of all of its ancestors, in seconds. `None` for
    /// nodes that failed or never ran.
    pub fn cumulative_times(&self) -> BTreeMap<NodeId, Option<f64>> {
        match &self.tree {
            Some(tree) => runner::cumulative_times(
                tree.search_tree(),
                tree.nodes_connected_to_output(),
                &self.times,
            ),
            None => BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use std::sync::{Arc, Mutex, mpsc};
    use std::time::Instant;

    use super::*;
    use crate::core::SocketRef;
    use crate::testing::{EXAMPLE_EDGES, link, node};
    use crate::tree::{Link, Node, REROUTE_INPUT, REROUTE_OUTPUT};

    fn adder(id: &str) -> Node {
        Node::new(id, format!("Node {id}"))
            .with_input_default("a", 0_i64)
            .with_input_default("b", 0_i64)
            .with_output("out")
            .with_process_fn(|ctx| {
                let sum = ctx.input::<i64>("a")? + ctx.input::<i64>("b")?;
                ctx.set_output("out", sum + 1)?;
                Ok(())
            })
    }

    /// The example graph with custom nodes.
    fn example_with(outputs: &[&str], make: impl Fn(&str) -> Node) -> Tree {
        let mut builder = Tree::builder("example");
        for i in 1..=10 {
            builder = builder.node(make(&i.to_string()));
        }
        for (from, to, socket) in EXAMPLE_EDGES {
            builder = builder.link(link(from, to, socket));
        }
        for output in outputs {
            builder = builder.output(*output);
        }
        builder.build()
    }

    fn value(engine: &Engine, node: &str) -> Option<i64> {
        engine
            .store()
            .get_as::<i64>(&SocketRef::new(node, "out"))
            .copied()
    }

    fn sorted(nodes: &[NodeId]) -> Vec<&str> {
        let mut nodes: Vec<&str> = nodes.iter().map(NodeId::as_str).collect();
        nodes.sort();
        nodes
    }

    #[test]
    fn test_values_propagate_through_passes() {
        let bias = Arc::new(AtomicI64::new(0));
        let tree = {
            let bias = bias.clone();
            example_with(&["4"], move |id| {
                if id != "1" {
                    return adder(id);
                }
                let bias = bias.clone();
                adder(id).with_process_fn(move |ctx| {
                    let sum = ctx.input::<i64>("a")? + ctx.input::<i64>("b")?;
                    ctx.set_output("out", sum + 1 + bias.load(Ordering::SeqCst))?;
                    Ok(())
                })
            })
        };

        let mut engine = Engine::new(Config::default().sequential()).unwrap();
        engine.load(tree);

        let report = engine.update().unwrap().unwrap();
        assert_eq!(
            sorted(&report.executed),
            ["1", "10", "2", "3", "4", "5", "8", "9"]
        );
        assert_eq!(value(&engine, "4"), Some(8));
        assert_eq!(value(&engine, "6"), None);
        assert!(engine.update().unwrap().is_none());

        bias.store(10, Ordering::SeqCst);
        engine.notify(["1"], false);
        let report = engine.update().unwrap().unwrap();

        let executed: Vec<&str> = report.executed.iter().map(NodeId::as_str).collect();
        assert_eq!(executed, ["1", "2", "3", "4"]);
        assert_eq!(value(&engine, "3"), Some(17));
        assert_eq!(value(&engine, "4"), Some(18));
        assert_eq!(value(&engine, "9"), Some(3));
        assert!(report.is_success());
    }

    #[test]
    fn test_change_outside_output_reach_runs_nothing() {
        let mut engine = Engine::new(Config::default()).unwrap();
        engine.load(example_with(&["4"], adder));
        engine.update().unwrap();

        engine.notify(["6"], false);
        let report = engine.update().unwrap().unwrap();
        assert!(report.executed.is_empty());
        assert!(report.generations.is_empty());
        assert_eq!(engine.state(&"6".into()), NodeState::Clean);
    }

    #[test]
    fn test_partial_failure_and_retry() {
        let broken = Arc::new(AtomicBool::new(true));
        let make = {
            let broken = broken.clone();
            move |id: &str| {
                if id != "5" {
                    return adder(id);
                }
                let broken = broken.clone();
                adder(id).with_process_fn(move |ctx| {
                    if broken.load(Ordering::SeqCst) {
                        anyhow::bail!("node five is broken");
                    }
                    ctx.set_output("out", 1_i64)?;
                    Ok(())
                })
            }
        };

        let mut builder = Tree::builder("failing");
        for i in 1..=12 {
            builder = builder.node(make(&i.to_string()));
        }
        for (from, to, socket) in EXAMPLE_EDGES {
            builder = builder.link(link(from, to, socket));
        }
        let tree = builder
            .link(link("11", "12", "a"))
            .output("4")
            .output("7")
            .output("12")
            .build();

        let mut engine = Engine::new(Config::default().with_workers(2)).unwrap();
        engine.load(tree);
        let report = engine.update().unwrap().unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].node, NodeId::from("5"));
        assert!(report.failed[0].error.contains("node five is broken"));
        assert_eq!(sorted(&report.skipped), ["3", "4", "6", "7"]);
        assert_eq!(
            sorted(&report.executed),
            ["1", "10", "11", "12", "2", "8", "9"]
        );
        assert_eq!(engine.state(&"5".into()), NodeState::Failed);
        assert_eq!(engine.state(&"7".into()), NodeState::Skipped);
        assert_eq!(engine.state(&"12".into()), NodeState::Done);
        assert_eq!(value(&engine, "12"), Some(2));
        assert_eq!(value(&engine, "4"), None);
        assert_eq!(engine.cumulative_times()[&NodeId::from("5")], None);

        broken.store(false, Ordering::SeqCst);
        engine.notify(["11"], false);
        let report = engine.update().unwrap().unwrap();

        assert_eq!(sorted(&report.executed), ["11", "12", "3", "4", "5", "6", "7"]);
        assert!(report.is_success());
        assert_eq!(value(&engine, "7"), Some(6));
    }

    #[test]
    fn test_panicking_node_is_isolated() {
        let tree = Tree::builder("panics")
            .node(adder("1"))
            .node(adder("2").with_process_fn(|_| panic!("kaboom")))
            .node(adder("3"))
            .link(link("1", "2", "a"))
            .output("2")
            .output("3")
            .build();

        let mut engine = Engine::new(Config::default()).unwrap();
        engine.load(tree);
        let report = engine.run_pass().unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].node, NodeId::from("2"));
        assert!(report.failed[0].error.contains("kaboom"));
        assert_eq!(sorted(&report.executed), ["1", "3"]);
    }

    #[test]
    fn test_reroute_consumers_run_only_when_upstream_changes() {
        let tree = Tree::builder("reroutes")
            .node(adder("1"))
            .node(Node::reroute("r"))
            .node(adder("2"))
            .node(adder("3"))
            .link(Link::between(
                SocketRef::new("1", "out"),
                SocketRef::new("r", REROUTE_INPUT),
            ))
            .link(Link::between(
                SocketRef::new("r", REROUTE_OUTPUT),
                SocketRef::new("2", "a"),
            ))
            .output("2")
            .output("3")
            .build();

        let mut engine = Engine::new(Config::default()).unwrap();
        engine.load(tree);

        let report = engine.update().unwrap().unwrap();
        assert_eq!(sorted(&report.executed), ["1", "2", "3"]);
        assert_eq!(value(&engine, "2"), Some(2));

        engine.notify(["3"], false);
        let report = engine.update().unwrap().unwrap();
        assert_eq!(sorted(&report.executed), ["3"]);

        engine.notify(["r"], false);
        let report = engine.update().unwrap().unwrap();
        assert_eq!(sorted(&report.executed), ["2"]);
        assert!(engine.update().unwrap().is_none());
    }

    #[test]
    fn test_cycle_blocks_only_its_downstream() {
        let tree = Tree::builder("cyclic")
            .node(node("1"))
            .node(node("2"))
            .node(node("3"))
            .node(node("4"))
            .node(node("5"))
            .node(node("6"))
            .link(link("1", "2", "a"))
            .link(link("2", "3", "a"))
            .link(link("3", "2", "b"))
            .link(link("3", "4", "a"))
            .link(link("5", "6", "a"))
            .output("4")
            .output("6")
            .build();

        let mut engine = Engine::new(Config::default()).unwrap();
        engine.load(tree);
        let report = engine.update().unwrap().unwrap();

        let cycle = report.cycle.clone().unwrap();
        assert_eq!(cycle.cycle, vec![NodeId::from("2"), NodeId::from("3")]);
        assert_eq!(cycle.blocked, vec![NodeId::from("4")]);
        assert_eq!(sorted(&report.executed), ["1", "5", "6"]);
        assert_eq!(sorted(&report.skipped), ["2", "3", "4"]);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"cycle\""));
    }

    #[test]
    fn test_generations_never_overlap() {
        let spans = Arc::new(Mutex::new(Vec::new()));
        let make = |id: &str| {
            let spans = spans.clone();
            node(id).with_process_fn(move |ctx| {
                let start = Instant::now();
                std::thread::sleep(Duration::from_millis(15));
                spans
                    .lock()
                    .unwrap()
                    .push((ctx.node().clone(), start, Instant::now()));
                Ok(())
            })
        };

        let mut engine = Engine::new(Config::default().with_workers(4)).unwrap();
        engine.load(example_with(&["4", "7"], make));
        let report = engine.update().unwrap().unwrap();

        assert_eq!(report.generations.len(), 6);
        assert_eq!(report.executed.len(), 10);

        let spans = spans.lock().unwrap();
        let of = |generation: &Vec<NodeId>| {
            spans
                .iter()
                .filter(|(id, _, _)| generation.contains(id))
                .map(|(_, start, end)| (*start, *end))
                .collect::<Vec<_>>()
        };

        for pair in report.generations.windows(2) {
            let last_end = of(&pair[0]).iter().map(|(_, end)| *end).max().unwrap();
            let first_start = of(&pair[1]).iter().map(|(start, _)| *start).min().unwrap();
            assert!(last_end <= first_start);
        }
    }

    #[test]
    fn test_listen_applies_queued_events() {
        let mut engine = Engine::new(Config::default()).unwrap();
        let handle = engine.handle();

        let (tx, rx) = mpsc::channel();
        engine.add_hook(Hook::pass_complete(move |report| {
            tx.send(report.executed.clone())?;
            Ok(())
        }));

        let worker = std::thread::spawn(move || engine.listen());
        let timeout = Duration::from_secs(10);

        handle.load(example_with(&["4"], adder)).unwrap();
        let first = rx.recv_timeout(timeout).unwrap();
        assert_eq!(first.len(), 8);

        handle.notify(["2"], false).unwrap();
        let second = rx.recv_timeout(timeout).unwrap();
        assert_eq!(sorted(&second), ["2", "3", "4"]);

        handle.shutdown().unwrap();
        worker.join().unwrap().unwrap();

        assert!(matches!(handle.reset(), Err(EngineError::Closed)));
    }

    #[test]
    fn test_events_sent_during_a_pass_wait_for_the_next_one() {
        let mut engine = Engine::new(Config::default()).unwrap();
        let handle = engine.handle();
        let sent = Arc::new(AtomicBool::new(false));

        let tree = example_with(&["4"], |id| {
            if id != "4" {
                return adder(id);
            }
            let handle = handle.clone();
            let sent = sent.clone();
            adder(id).with_process_fn(move |_| {
                if !sent.swap(true, Ordering::SeqCst) {
                    handle.notify(["1"], false)?;
                }
                Ok(())
            })
        });
        engine.load(tree);

        let first = engine.update().unwrap().unwrap();
        assert_eq!(first.executed.len(), 8);
        assert!(sent.load(Ordering::SeqCst));

        let second = engine.update().unwrap().unwrap();
        let executed: Vec<&str> = second.executed.iter().map(NodeId::as_str).collect();
        assert_eq!(executed, ["1", "2", "3", "4"]);
        assert!(engine.update().unwrap().is_none());
    }

    #[test]
    fn test_failing_hook_is_not_fatal() {
        let mut engine = Engine::new(Config::default()).unwrap();
        engine.add_hook(Hook::pass_complete(|_| anyhow::bail!("hook failed")));
        engine.load(example_with(&["4"], adder));
        assert!(engine.run_pass().is_ok());
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut engine = Engine::new(Config::default()).unwrap();
        engine.load(example_with(&["4"], adder));
        engine.update().unwrap();
        assert!(!engine.store().is_empty());

        engine.reset();
        assert!(engine.tree().is_none());
        assert!(engine.store().is_empty());
        assert!(engine.update().unwrap().is_none());
        assert!(matches!(engine.run_pass(), Err(EngineError::NoTree)));
        assert!(matches!(
            engine.edit(TreeEdit::RemoveNode("1".into())),
            Err(EngineError::NoTree)
        ));
    }

    #[test]
    fn test_output_nodes_by_kind() {
        let config = Config::default().with_output_kind("Viewer*");
        let mut engine = Engine::new(config).unwrap();

        let tree = Tree::builder("kinds")
            .node(adder("a").with_kind("Math"))
            .node(adder("v").with_kind("ViewerDraw"))
            .link(link("a", "v", "a"))
            .build();
        engine.load(tree);

        let report = engine.update().unwrap().unwrap();
        assert_eq!(sorted(&report.executed), ["a", "v"]);

        engine
            .edit(TreeEdit::AddNode(adder("w").with_kind("ViewerText")))
            .unwrap();
        engine.set_output_nodes(["a"]);

        let outputs: HashSet<&str> = engine
            .tree()
            .unwrap()
            .output_nodes()
            .iter()
            .map(NodeId::as_str)
            .collect();
        assert_eq!(outputs, HashSet::from(["a", "v", "w"]));

        let report = engine.update().unwrap().unwrap();
        assert_eq!(sorted(&report.executed), ["w"]);
    }

    #[test]
    fn test_edits_schedule_a_pass() {
        let mut engine = Engine::new(Config::default()).unwrap();
        engine.load(example_with(&["4"], adder));
        engine.update().unwrap();

        engine
            .edit(TreeEdit::RemoveLink(link("9", "5", "a").id().clone()))
            .unwrap();
        let report = engine.update().unwrap().unwrap();
        assert_eq!(sorted(&report.executed), ["3", "4", "5"]);
        assert_eq!(value(&engine, "5"), Some(1));
        assert_eq!(value(&engine, "4"), Some(5));

        // A rejected edit changes nothing and schedules nothing.
        assert!(engine.edit(TreeEdit::AddLink(link("1", "2", "a"))).is_err());
        assert!(engine.update().unwrap().is_none());
    }

    #[test]
    fn test_cumulative_times() {
        let mut engine = Engine::new(Config::default()).unwrap();
        engine.load(example_with(&["4"], adder));
        let report = engine.update().unwrap().unwrap();

        let cumulative = engine.cumulative_times();
        assert_eq!(cumulative.len(), 8);
        assert!(!cumulative.contains_key(&NodeId::from("6")));

        let one = NodeId::from("1");
        assert_eq!(cumulative[&one], Some(report.timings[&one]));

        let total: f64 = report.timings.values().sum();
        let four = cumulative[&NodeId::from("4")].unwrap();
        assert!((four - total).abs() < 1e-9);
    }

    #[test]
    fn test_dangling_links_reach_the_report() {
        let tree = Tree::builder("dangling")
            .node(adder("1"))
            .link(link("1", "ghost", "a"))
            .output("1")
            .build();

        let mut engine = Engine::new(Config::default()).unwrap();
        engine.load(tree);
        let report = engine.update().unwrap().unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.executed.len(), 1);
    }
}
