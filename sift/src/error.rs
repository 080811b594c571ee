//! Workflow execution error types.
//!
//! One crate-wide error enum: collaborators, nodes, and the graph run loop all
//! return `WorkflowError`. Graph assembly problems have their own
//! `GraphBuildError` (see `graph::GraphBuildError`) and fold in via `Graph`.

use thiserror::Error;

use crate::graph::GraphBuildError;

/// Error raised while assembling or running an adaptive retrieval workflow.
///
/// `Configuration`, `RoutingContract`, and `IndexNotReady` abort a query before
/// or at its first side-effecting step; everything a collaborator raises beyond
/// that propagates to the caller as-is. The one deliberate exception is web
/// search, which degrades inside its implementation and never raises here.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A mandatory configuration value (API key, endpoint) is missing.
    /// Checked before any node runs.
    #[error("configuration: {0}")]
    Configuration(String),

    /// The router produced a label outside `{vectorstore, web_search}`.
    /// No node has side effects yet at this edge, so the query aborts.
    #[error("routing contract violation: {0}")]
    RoutingContract(String),

    /// A grader produced a verdict outside `{yes, no}`.
    #[error("grading contract violation: {0}")]
    GradingContract(String),

    /// `retrieve` was called before an index was built or loaded.
    #[error("retrieval index not ready; build or load it before querying")]
    IndexNotReady,

    /// The optional per-query node-execution ceiling was exceeded.
    #[error("iteration limit of {0} node executions exceeded")]
    IterationLimit(usize),

    /// The graph failed validation at compile time.
    #[error("graph: {0}")]
    Graph(#[from] GraphBuildError),

    /// Index or corpus file handling failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Execution failed with a message (e.g. provider call failed).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}
