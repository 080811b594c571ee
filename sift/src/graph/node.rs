//! Graph node trait: one step in a `StateGraph`.
//!
//! Receives state `S`, returns updated `S` and `Next`. A node performs at most
//! one collaborator call and no other I/O; the run loop owns sequencing.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::WorkflowError;

use super::Next;

/// One step in a graph: state in, (state out, next step).
///
/// The run loop uses the returned `Next` to pick the following node unless the
/// node has conditional edges, in which case the edge router decides from the
/// updated state.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node id (e.g. `"retrieve"`, `"generate"`). Unique within a graph.
    fn id(&self) -> &str;

    /// One step: state in, (state out, next step).
    async fn run(&self, state: S) -> Result<(S, Next), WorkflowError>;
}
