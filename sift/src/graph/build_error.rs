//! Graph validation errors raised by `StateGraph::compile`.

use thiserror::Error;

/// Why a graph failed to compile.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphBuildError {
    /// An edge or conditional source references a node id that was never added.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// A conditional path map points at a node id that was never added.
    #[error("invalid conditional path map target: {0}")]
    InvalidPathMapTarget(String),

    /// No edge or conditional edges leave START.
    #[error("graph has no entry: add an edge or conditional edges from START")]
    MissingEntry,

    /// More than one plain edge leaves the same node (branching requires
    /// conditional edges).
    #[error("duplicate outgoing edge from: {0}")]
    DuplicateEdge(String),

    /// A node (or START) has both a plain outgoing edge and conditional edges.
    #[error("node has both an outgoing edge and conditional edges: {0}")]
    EdgeConflict(String),

    /// No edge or conditional path can ever reach END.
    #[error("graph has no path to END")]
    MissingEnd,
}
