mod diagnostics;

use std::collections::{HashMap, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::ProgressStyle;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{Level, Span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::config::Config;
use crate::core::{ArcStr, Dynamic, NodeId, SocketRef};
use crate::engine::report::{NodeFailure, NodeState, PassReport};
use crate::engine::store::SocketStore;
use crate::error::{EngineError, NodeComputationError};
use crate::tree::{Context, Process, Tree};

pub(crate) use diagnostics::cumulative_times;
pub use diagnostics::{Diagnostics, NodeExecution};

/// Everything a worker needs to run one node, detached from the tree.
struct Job {
    id: NodeId,
    name: String,
    inputs: HashMap<ArcStr, Dynamic>,
    outputs: Vec<ArcStr>,
    process: Arc<dyn Process>,
}

impl Job {
    /// Resolves the inputs of a node: the value of the connected producer if
    /// it has one, the socket default otherwise.
    fn prepare(tree: &Tree, store: &dyn SocketStore, id: &NodeId) -> Option<Self> {
        let node = tree.node(id)?;
        let search = tree.search_tree();

        let mut inputs = HashMap::with_capacity(node.inputs.len());
        for socket in &node.inputs {
            let here = SocketRef {
                node: id.clone(),
                name: socket.name.clone(),
            };
            let value = search
                .from_sock(&here)
                .and_then(|producer| store.get(producer))
                .or_else(|| socket.default.clone());

            if let Some(value) = value {
                inputs.insert(socket.name.clone(), value);
            }
        }

        Some(Self {
            id: id.clone(),
            name: node.name.clone(),
            inputs,
            outputs: node.outputs.iter().map(|s| s.name.clone()).collect(),
            process: node.process.clone(),
        })
    }
}

struct Completed {
    id: NodeId,
    result: Result<Vec<(ArcStr, Dynamic)>, NodeComputationError>,
    start: Instant,
    duration: Duration,
}

fn execute(job: Job, style: &ProgressStyle, parent: &Span) -> Completed {
    let span = tracing::span!(parent: parent, Level::INFO, "node", id = %job.id);
    span.pb_set_style(style);
    span.pb_set_message(&format!("Running {}", job.name));
    let _enter = span.enter();

    let start = Instant::now();

    // The job owns all of its data, a panicking node cannot leave anything
    // shared in a broken state.
    let output = catch_unwind(AssertUnwindSafe(|| {
        let mut ctx = Context {
            node: &job.id,
            inputs: &job.inputs,
            declared: &job.outputs,
            written: Vec::new(),
        };
        job.process.process(&mut ctx).map(|()| ctx.written)
    }));

    let duration = start.elapsed();

    let result = match output {
        Ok(Ok(written)) => Ok(written),
        Ok(Err(err)) => Err(NodeComputationError::Failed(job.id.clone(), err)),
        Err(panic) => {
            let msg = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                String::from("unknown payload")
            };
            Err(NodeComputationError::Panicked(job.id.clone(), msg))
        }
    };

    Completed {
        id: job.id,
        result,
        start,
        duration,
    }
}

/// Runs update passes over a tree, one generation at a time.
pub(crate) struct Runner {
    pool: Option<rayon::ThreadPool>,
}

impl Runner {
    pub(crate) fn new(config: &Config) -> Result<Self, EngineError> {
        let pool = if config.parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.workers.unwrap_or(0))
                .thread_name(|i| format!("nagare-worker-{i}"))
                .build()?;
            Some(pool)
        } else {
            None
        };

        Ok(Self { pool })
    }

    /// Runs every job of one generation and waits for all of them. This is
    /// the generation barrier: nothing from the next generation is handed out
    /// before this returns.
    fn dispatch(&self, jobs: Vec<Job>, style: &ProgressStyle, parent: &Span) -> Vec<Completed> {
        match &self.pool {
            Some(pool) => pool.install(|| {
                jobs.into_par_iter()
                    .map(|job| execute(job, style, parent))
                    .collect()
            }),
            None => jobs
                .into_iter()
                .map(|job| execute(job, style, parent))
                .collect(),
        }
    }

    pub(crate) fn run_pass(
        &self,
        tree: &mut Tree,
        store: &mut dyn SocketStore,
    ) -> Result<PassReport, EngineError> {
        let started = Instant::now();
        let mut walker = tree.walk_on_worth_recalculating_nodes().generations();
        let total = walker.remaining();

        let mut pass = Pass {
            report: PassReport {
                warnings: tree.warnings().to_vec(),
                ..Default::default()
            },
            broken: HashSet::new(),
        };

        if total == 0 {
            tracing::debug!("Nothing worth recalculating in '{}'", tree.id());
            return Ok(pass.finish(started));
        }

        let root_span = tracing::span!(Level::INFO, "update_pass", tree = tree.id());
        root_span.pb_set_length(total as u64);
        root_span.pb_set_style(&crate::utils::get_style_pass()?);
        root_span.pb_set_message("Updating nodes...");
        let _enter = root_span.enter();

        let node_style = crate::utils::get_style_node()?;

        while let Some(generation) = walker.next() {
            let generation = match generation {
                Ok(generation) => generation,
                Err(cycle) => {
                    tracing::error!("{cycle}");
                    for id in cycle.cycle.iter().chain(&cycle.blocked) {
                        pass.skip(id);
                        root_span.pb_inc(1);
                    }
                    pass.report.cycle = Some(cycle);
                    break;
                }
            };

            let mut jobs = Vec::with_capacity(generation.len());
            for id in &generation {
                pass.set_state(id, NodeState::Outdated);

                let upstream_broken = walker
                    .predecessors(id)
                    .iter()
                    .any(|pred| pass.broken.contains(pred));

                if upstream_broken {
                    tracing::warn!("Skipping '{id}', an upstream node did not complete");
                    pass.skip(id);
                    root_span.pb_inc(1);
                    continue;
                }

                if let Some(job) = Job::prepare(tree, store, id) {
                    pass.set_state(id, NodeState::Queued);
                    jobs.push(job);
                }
            }

            for job in &jobs {
                pass.set_state(&job.id, NodeState::Running);
            }

            for done in self.dispatch(jobs, &node_style, &root_span) {
                root_span.pb_inc(1);

                match done.result {
                    Ok(written) => {
                        for (name, value) in written {
                            let socket = SocketRef {
                                node: done.id.clone(),
                                name,
                            };
                            store.set(&socket, value);
                        }

                        tree.set_updated(&done.id);
                        pass.set_state(&done.id, NodeState::Done);
                        pass.report.executed.push(done.id.clone());
                        pass.report
                            .timings
                            .insert(done.id.clone(), done.duration.as_secs_f64());
                        pass.report.diagnostics.execution_times.insert(
                            done.id,
                            NodeExecution {
                                start: done.start,
                                duration: done.duration,
                            },
                        );
                    }
                    Err(err) => {
                        tracing::error!("{err}");
                        pass.set_state(&done.id, NodeState::Failed);
                        pass.broken.insert(done.id.clone());
                        pass.report.diagnostics.failed.insert(done.id.clone());
                        pass.report.failed.push(NodeFailure {
                            node: err.node().clone(),
                            error: err.to_string(),
                        });
                    }
                }
            }

            pass.report.generations.push(generation);
        }

        let report = pass.finish(started);
        tracing::info!(
            "Updated {} nodes in {:.2?} ({} failed, {} skipped)",
            report.executed.len(),
            Duration::from_secs_f64(report.elapsed),
            report.failed.len(),
            report.skipped.len(),
        );

        Ok(report)
    }
}

struct Pass {
    report: PassReport,
    /// Failed or skipped nodes; everything downstream of them is skipped.
    broken: HashSet<NodeId>,
}

impl Pass {
    fn set_state(&mut self, id: &NodeId, state: NodeState) {
        tracing::trace!("{id}: {state:?}");
        self.report.states.insert(id.clone(), state);
    }

    fn skip(&mut self, id: &NodeId) {
        self.set_state(id, NodeState::Skipped);
        self.broken.insert(id.clone());
        self.report.skipped.push(id.clone());
    }

    fn finish(mut self, started: Instant) -> PassReport {
        self.report.elapsed = started.elapsed().as_secs_f64();
        self.report
    }
}
