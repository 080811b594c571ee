//! State graph builder: nodes + explicit edges (from → to) and conditional edges.
//!
//! Add nodes with `add_node`, define fixed transitions with `add_edge(from, to)`
//! using `START` and `END` for graph entry/exit, and attach `add_conditional_edges`
//! where the next node depends on state. Conditional edges are allowed from
//! `START` itself, so the very first node can be chosen by a predicate over the
//! initial state. Then `compile` to get a `CompiledGraph`.
//!
//! A node must have either one outgoing `add_edge` or `add_conditional_edges`,
//! not both. Cycles through conditional edges are legal; an optional
//! `with_iteration_limit` bounds total node executions per run for graphs whose
//! predicates cannot guarantee termination on their own.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use super::build_error::GraphBuildError;
use super::compiled::CompiledGraph;
use super::conditional::{EdgeRouter, EdgeRouterFn, NextEntry};
use super::node::Node;

/// Sentinel for graph entry: use as `from` in `add_edge(START, first_node)` or
/// as `source` in `add_conditional_edges(START, ...)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to` in `add_edge(last_node, END)` or as a
/// path-map target.
pub const END: &str = "__end__";

/// State graph: nodes plus explicit edges and conditional edges.
///
/// Generic over the state type `S`. Compile to obtain an executable
/// [`CompiledGraph`].
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// Fixed edges (from, to). One outgoing edge per node at most.
    edges: Vec<(String, String)>,
    /// Conditional edges: source node id (or START) → router.
    conditional_edges: HashMap<String, EdgeRouter<S>>,
    /// Optional ceiling on node executions per run. None means unbounded.
    iteration_limit: Option<usize>,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional_edges: HashMap::new(),
            iteration_limit: None,
        }
    }

    /// Bounds the number of node executions per run.
    ///
    /// Runs that would execute more nodes than this fail with
    /// `WorkflowError::IterationLimit` instead of looping. Off by default;
    /// graphs with oracle-driven cycles can use this as a safety valve.
    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = Some(limit);
        self
    }

    /// Adds a node; id must be unique. Replaces on same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds a fixed edge from `from` to `to`.
    ///
    /// Use `START` for entry and `END` for exit. Ids other than the sentinels
    /// must be registered via `add_node` before `compile`.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Adds conditional edges from `source`: after the source runs (or, for
    /// `START`, before the first node), `path` is called with the current
    /// state; its key resolves through `path_map` when provided, otherwise it
    /// is used as the next node id directly.
    pub fn add_conditional_edges(
        &mut self,
        source: impl Into<String>,
        path: EdgeRouterFn<S>,
        path_map: Option<HashMap<String, String>>,
    ) -> &mut Self {
        self.conditional_edges
            .insert(source.into(), EdgeRouter::new(path, path_map));
        self
    }

    /// Validates the graph and builds the executable form.
    ///
    /// Checks that every referenced node exists, that the entry is unambiguous,
    /// that no node mixes fixed and conditional outgoing edges, and that END is
    /// reachable through at least one edge or path map.
    pub fn compile(mut self) -> Result<CompiledGraph<S>, GraphBuildError> {
        for (from, to) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(GraphBuildError::NodeNotFound(from.clone()));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(GraphBuildError::NodeNotFound(to.clone()));
            }
        }
        for (source, router) in &self.conditional_edges {
            if source != START && !self.nodes.contains_key(source) {
                return Err(GraphBuildError::NodeNotFound(source.clone()));
            }
            if let Some(ref path_map) = router.path_map {
                for target in path_map.values() {
                    if target != END && !self.nodes.contains_key(target) {
                        return Err(GraphBuildError::InvalidPathMapTarget(target.clone()));
                    }
                }
            }
        }

        let start_targets: Vec<String> = self
            .edges
            .iter()
            .filter(|(f, _)| f == START)
            .map(|(_, t)| t.clone())
            .collect();
        let start_router = self.conditional_edges.remove(START);
        let entry = match (start_targets.len(), start_router) {
            (0, None) => return Err(GraphBuildError::MissingEntry),
            (0, Some(router)) => NextEntry::Conditional(router),
            (1, None) => NextEntry::Unconditional(start_targets.into_iter().next().unwrap()),
            (1, Some(_)) => return Err(GraphBuildError::EdgeConflict(START.to_string())),
            (_, _) => return Err(GraphBuildError::DuplicateEdge(START.to_string())),
        };

        let has_end = self.edges.iter().any(|(_, t)| t == END)
            || self.conditional_edges.values().any(|r| {
                r.path_map
                    .as_ref()
                    .map_or(true, |m| m.values().any(|v| v == END))
            });
        if !has_end {
            return Err(GraphBuildError::MissingEnd);
        }

        let mut seen_from: HashSet<&str> = HashSet::new();
        for (from, _) in self.edges.iter().filter(|(f, _)| f != START) {
            if !seen_from.insert(from.as_str()) {
                return Err(GraphBuildError::DuplicateEdge(from.clone()));
            }
            if self.conditional_edges.contains_key(from.as_str()) {
                return Err(GraphBuildError::EdgeConflict(from.clone()));
            }
        }

        let mut next_map: HashMap<String, NextEntry<S>> = self
            .edges
            .iter()
            .filter(|(f, _)| f != START)
            .map(|(f, t)| (f.clone(), NextEntry::Unconditional(t.clone())))
            .collect();
        for (source, router) in self.conditional_edges {
            next_map.insert(source, NextEntry::Conditional(router));
        }

        Ok(CompiledGraph::new(
            self.nodes,
            entry,
            next_map,
            self.iteration_limit,
        ))
    }
}
