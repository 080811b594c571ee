//! Compiled state graph: immutable, supports invoke and stream.
//!
//! Built by `StateGraph::compile`. Runs strictly sequentially: exactly one node
//! is in flight at a time, and the loop performs no timeout handling of its own
//! (callers wanting cancellation wrap the whole invocation). Each run owns its
//! state exclusively; concurrent runs of the same compiled graph never share
//! mutable state.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::WorkflowError;
use crate::stream::{StreamEvent, StreamMode};

use super::conditional::NextEntry;
use super::node::Node;
use super::state_graph::END;
use super::Next;

/// Per-run event sink: forwards node completions and failures to a stream
/// consumer according to the enabled modes.
struct EventSink<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    tx: mpsc::Sender<StreamEvent<S>>,
    modes: HashSet<StreamMode>,
}

impl<S> EventSink<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    async fn after_node(&self, node: &str, state: &S) {
        if self.modes.contains(&StreamMode::Values) {
            let _ = self.tx.send(StreamEvent::Values(state.clone())).await;
        }
        if self.modes.contains(&StreamMode::Updates) {
            let _ = self
                .tx
                .send(StreamEvent::Updates {
                    node: node.to_string(),
                    state: state.clone(),
                })
                .await;
        }
    }

    async fn failed(&self, node: &str, err: &WorkflowError) {
        let _ = self
            .tx
            .send(StreamEvent::Error {
                node: node.to_string(),
                message: err.to_string(),
            })
            .await;
    }
}

/// Compiled graph: immutable structure, supports invoke and stream.
#[derive(Clone)]
pub struct CompiledGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// How the first node is chosen: a fixed id or a router over the initial state.
    entry: NextEntry<S>,
    /// Node id → how to pick the next node after it runs.
    next_map: HashMap<String, NextEntry<S>>,
    /// Optional ceiling on node executions per run.
    iteration_limit: Option<usize>,
}

impl<S> CompiledGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub(super) fn new(
        nodes: HashMap<String, Arc<dyn Node<S>>>,
        entry: NextEntry<S>,
        next_map: HashMap<String, NextEntry<S>>,
        iteration_limit: Option<usize>,
    ) -> Self {
        Self {
            nodes,
            entry,
            next_map,
            iteration_limit,
        }
    }

    async fn resolve_entry(&self, state: &S) -> Result<String, WorkflowError> {
        match &self.entry {
            NextEntry::Unconditional(id) => Ok(id.clone()),
            NextEntry::Conditional(router) => router.resolve_next(state).await,
        }
    }

    /// Shared run loop: steps through nodes until END, emitting events when a
    /// sink is attached. The attached sink also receives the terminal error, so
    /// stream consumers observe failures instead of a silently closed channel.
    async fn run_loop(
        &self,
        state: &mut S,
        sink: Option<&EventSink<S>>,
    ) -> Result<(), WorkflowError> {
        tracing::info!("starting graph run");

        let mut current = match self.resolve_entry(state).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, "entry routing failed");
                if let Some(s) = sink {
                    s.failed(super::state_graph::START, &e).await;
                }
                return Err(e);
            }
        };

        let mut steps = 0usize;
        while current != END {
            if let Some(limit) = self.iteration_limit {
                if steps >= limit {
                    let e = WorkflowError::IterationLimit(limit);
                    tracing::error!(node = %current, limit, "iteration limit exceeded");
                    if let Some(s) = sink {
                        s.failed(&current, &e).await;
                    }
                    return Err(e);
                }
            }

            let node = match self.nodes.get(&current).cloned() {
                Some(node) => node,
                None => {
                    let e = WorkflowError::ExecutionFailed(format!("unknown node: {current}"));
                    tracing::error!(node = %current, "routed to unknown node");
                    if let Some(s) = sink {
                        s.failed(&current, &e).await;
                    }
                    return Err(e);
                }
            };

            tracing::debug!(node = %current, state = ?state, "running node");
            let (new_state, next) = match node.run(state.clone()).await {
                Ok(out) => out,
                Err(e) => {
                    tracing::error!(node = %current, error = %e, "node failed");
                    if let Some(s) = sink {
                        s.failed(&current, &e).await;
                    }
                    return Err(e);
                }
            };
            *state = new_state;
            steps += 1;

            if let Some(s) = sink {
                s.after_node(&current, state).await;
            }

            let next_id = match self.next_map.get(&current) {
                Some(NextEntry::Conditional(router)) => match router.resolve_next(state).await {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::error!(node = %current, error = %e, "conditional routing failed");
                        if let Some(s) = sink {
                            s.failed(&current, &e).await;
                        }
                        return Err(e);
                    }
                },
                Some(NextEntry::Unconditional(to)) => match next {
                    Next::End => END.to_string(),
                    Next::Node(id) => id,
                    Next::Continue => to.clone(),
                },
                None => match next {
                    Next::Node(id) => id,
                    Next::Continue | Next::End => END.to_string(),
                },
            };
            tracing::debug!(from = %current, to = %next_id, "transition");
            current = next_id;
        }

        tracing::info!(steps, "graph run complete");
        Ok(())
    }

    /// Runs the graph to completion and returns the final state.
    pub async fn invoke(&self, state: S) -> Result<S, WorkflowError> {
        let mut state = state;
        self.run_loop(&mut state, None).await?;
        Ok(state)
    }

    /// Runs the graph on a spawned task, emitting events per node execution in
    /// execution order. The stream ends after the final node's events, or after
    /// a single `StreamEvent::Error` when the run fails.
    pub fn stream(
        &self,
        state: S,
        modes: impl Into<HashSet<StreamMode>>,
    ) -> ReceiverStream<StreamEvent<S>> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let sink = EventSink {
            tx,
            modes: modes.into(),
        };

        tokio::spawn(async move {
            let mut state = state;
            let _ = graph.run_loop(&mut state, Some(&sink)).await;
        });

        ReceiverStream::new(rx)
    }
}
