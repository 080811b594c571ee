//! Next-step result from a graph node: continue along the declared edge, jump
//! to a node, or end.
//!
//! The run loop consults this only for nodes without conditional edges; when a
//! node has conditional edges, its router decides and `Next` is ignored.

/// Next step after running a node.
///
/// - **Continue**: follow the node's declared outgoing edge (or END if none).
/// - **Node(id)**: run the node with the given id next.
/// - **End**: stop; the current state is the final result.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Next {
    /// Follow the declared outgoing edge; END when the node has none.
    Continue,
    /// Run the node with the given id next.
    Node(String),
    /// Stop and return the current state.
    End,
}
